//! CLI command implementations for wpflow.
//!
//! Available commands:
//! - **check**: Run the nonce verification and slashing checks over files
//! - **init**: Write a default `.wpflow.toml`

pub mod check;
pub mod init;

pub use check::{run_check, CheckConfig};
pub use init::init_config;
