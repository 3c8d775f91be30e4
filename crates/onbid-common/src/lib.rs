//! Onbid Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the Onbid ingestion workspace.
//!
//! - **Logging**: one place to configure `tracing` output for the server and
//!   the batch binary (console, rolling file, or both; text or JSON)
//!
//! # Example
//!
//! ```no_run
//! use onbid_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig};
