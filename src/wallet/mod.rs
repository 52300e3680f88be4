//! Signing key handling.
//!
//! The private key is only materialised for the duration of a signing scope:
//! it is read from the environment into a zeroizing buffer, used, and wiped when
//! the [`SigningKey`] is dropped. Nothing else in the crate stores it.
//!
//! Signing goes through `secp256k1::SecretKey`, which does not wipe itself on
//! drop. Each [`SigningKey::secret_key`] call leaves one such copy on the stack
//! of the signing call; its memory is reused but not zeroed.

use crate::utils::error::{Error, Result};
use std::env;
use std::fmt;
use secp256k1::SecretKey;
use web3::signing::{Key, SecretKeyRef};
use web3::types::Address;
use zeroize::Zeroizing;

/// secp256k1 private key whose bytes are zeroed on drop
pub struct SigningKey {
    bytes: Zeroizing<[u8; 32]>,
}

impl SigningKey {
    /// Parse a 32-byte hex key, with or without the `0x` prefix
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let trimmed = hex_key.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if stripped.len() != 64 {
            return Err(Error::WalletError(format!(
                "Private key must be 32 bytes of hex, got {} characters",
                stripped.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(stripped, &mut bytes[..])?;
        let key = Self { bytes };
        // Rejects zero and out-of-range scalars up front.
        key.secret_key()?;
        Ok(key)
    }

    /// Read the key from environment variable `var`
    pub fn from_env(var: &str) -> Result<Self> {
        let raw = Zeroizing::new(
            env::var(var).map_err(|_| Error::WalletError(format!("{} is not set", var)))?,
        );
        Self::from_hex(&raw)
    }

    /// Address controlled by this key
    pub fn address(&self) -> Result<Address> {
        let secret = self.secret_key()?;
        Ok(SecretKeyRef::new(&secret).address())
    }

    /// Short-lived secp256k1 key for a single signing call. The returned value is
    /// not zeroed on drop; keep it inside the call that signs.
    pub(crate) fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.bytes[..])
            .map_err(|e| Error::WalletError(format!("Invalid private key: {}", e)))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Loads the signing key on demand
pub trait KeyProvider: Send + Sync {
    /// Load a fresh copy of the key; the caller drops it when signing is done
    fn load(&self) -> Result<SigningKey>;
}

/// Reads the key from an environment variable each time it is needed
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    var: String,
}

impl EnvKeyProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl KeyProvider for EnvKeyProvider {
    fn load(&self) -> Result<SigningKey> {
        SigningKey::from_env(&self.var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::TokenUtils;
    use assert_matches::assert_matches;
    use serial_test::serial;

    // Well-known test key (first Hardhat/Anvil account).
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_address_derivation() {
        let key = SigningKey::from_hex(TEST_KEY).unwrap();
        let address = key.address().unwrap();
        assert_eq!(TokenUtils::to_checksum_address(&address), TEST_ADDRESS);

        let unprefixed = SigningKey::from_hex(&TEST_KEY[2..]).unwrap();
        assert_eq!(unprefixed.address().unwrap(), address);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert_matches!(SigningKey::from_hex("0x1234"), Err(Error::WalletError(_)));
        assert_matches!(SigningKey::from_hex(&"zz".repeat(32)), Err(Error::WalletError(_)));
        // Zero is not a valid secp256k1 scalar.
        assert_matches!(SigningKey::from_hex(&"00".repeat(32)), Err(Error::WalletError(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SigningKey::from_hex(TEST_KEY).unwrap();
        let shown = format!("{:?}", key);
        assert!(!shown.contains("ac0974"));
        assert!(shown.contains("redacted"));
    }

    #[test]
    #[serial]
    fn test_env_key_provider() {
        let provider = EnvKeyProvider::new("DUST_SWEEPER_TEST_SIGNING_KEY");
        temp_env::with_var("DUST_SWEEPER_TEST_SIGNING_KEY", Some(TEST_KEY), || {
            let key = provider.load().unwrap();
            assert_eq!(TokenUtils::to_checksum_address(&key.address().unwrap()), TEST_ADDRESS);
        });
        temp_env::with_var_unset("DUST_SWEEPER_TEST_SIGNING_KEY", || {
            assert_matches!(
                provider.load(),
                Err(Error::WalletError(msg)) if msg.contains("not set")
            );
        });
    }
}
