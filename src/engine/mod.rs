//! Sweep engine: dust selection and the polling loop.

pub mod dust_filter;
pub mod sleeper;
pub mod sweeper;

pub use dust_filter::{filter_dust, is_dust};
pub use sleeper::{Sleeper, TokioSleeper};
pub use sweeper::DustSweeper;
