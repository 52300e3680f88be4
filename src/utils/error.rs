//! Error handling for the dust sweeper.

use thiserror::Error;

/// Main error type for the dust sweeper
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing or invalid settings)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Connection / network errors
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Data-related errors (e.g. malformed balance API response)
    #[error("Data error: {0}")]
    DataError(String),

    /// Wallet-related errors (key loading, signing)
    #[error("Wallet error: {0}")]
    WalletError(String),

    /// Transaction construction errors
    #[error("Transaction build error: {0}")]
    BuildError(String),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Request errors
    #[error("Request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// JSON-RPC node errors
    #[error("Web3 error: {0}")]
    Web3Error(#[from] web3::Error),
}

impl Error {
    /// Errors that abort the process before the polling loop starts.
    /// Everything else is a cycle error: logged, then retried next cycle.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, Error::ConfigError(_) | Error::ConnectionError(_))
    }
}

/// Result type for the dust sweeper
pub type Result<T> = std::result::Result<T, Error>;

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::WalletError(format!("hex decode error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_error = Error::ConfigError("missing field".to_string());
        assert_eq!(config_error.to_string(), "Configuration error: missing field");

        let data_error = Error::DataError("bad body".to_string());
        assert_eq!(data_error.to_string(), "Data error: bad body");
    }

    #[test]
    fn test_startup_fatal_classification() {
        assert!(Error::ConfigError("x".into()).is_startup_fatal());
        assert!(Error::ConnectionError("x".into()).is_startup_fatal());
        assert!(!Error::DataError("x".into()).is_startup_fatal());
        assert!(!Error::WalletError("x".into()).is_startup_fatal());
        assert!(!Error::BuildError("x".into()).is_startup_fatal());
    }

    #[test]
    fn test_hex_error_maps_to_wallet_error() {
        let err: Error = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, Error::WalletError(_)));
    }
}
