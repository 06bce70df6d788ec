//! Command-line host for Herald issue deliveries.
//!
//! Exposes the clap argument model, runtime wiring from flags to the GitHub
//! collaborators, and the command handlers used by the `herald` binary.

pub mod cli_args;
pub mod cli_types;
pub mod commands;
pub mod message_source;
pub mod runtime_config;
pub mod shell_completion;

pub use cli_args::{Cli, CliCommand, FingerprintArgs, SendArgs};
pub use cli_types::*;
pub use commands::{execute_cli, execute_fingerprint, execute_send, render_receipt_summary};
