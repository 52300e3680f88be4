//! Logging setup for the dust sweeper.
//!
//! Lines look like `2024-05-01T12:00:00Z INFO  [engine::sweeper] Found 2 dust tokens:`,
//! UTC timestamps and crate-relative module paths, written to stdout.

use chrono::{SecondsFormat, Utc};
use env_logger::{Builder, Env, Target};
use log::info;
use std::io::Write;

/// Env var that overrides the `--log-level` flag, in `env_logger` filter syntax
pub const LOG_ENV: &str = "DUST_SWEEPER_LOG";

/// Initialize the logging system. Repeated calls are ignored.
pub fn init_logging(level: &str) {
    Builder::from_env(Env::default().filter_or(LOG_ENV, level))
        .format(|buf, record| {
            let level = buf.default_styled_level(record.level());
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                level,
                module_label(record.target()),
                record.args()
            )
        })
        .target(Target::Stdout)
        .try_init()
        .ok();

    info!("Logging initialized at level: {}", level);
}

/// Strip the crate prefix from a log target; other crates keep their full path
fn module_label(target: &str) -> &str {
    target
        .strip_prefix(concat!(env!("CARGO_CRATE_NAME"), "::"))
        .unwrap_or(target)
}

#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .try_init();
}
