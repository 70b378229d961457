//! Command-line interface and orchestration for issue-stats
//!
//! This module implements the CLI commands and wires the SQLite database, the GitHub
//! fetcher, and the job runner together. It handles argument parsing, configuration
//! management, and console output.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **update**: Recompute the issue statistics of every registered package, or of a
//!   single package identified by its handle, and print one line per package
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. The update command:
//!
//! 1. Sets up logging and loads the configuration
//! 2. Opens the database and builds the GitHub fetcher
//! 3. Runs the job over the selected packages
//! 4. Prints the per-package outcomes and a summary
//! 5. Decides the exit status from the failures and the `fail_on_error` policy
//!
//! Configuration is managed through an optional TOML file (`issue-stats.toml`).

mod common;
mod config;
mod host;
mod init;
mod run;
mod update;

pub use common::{ColorMode, LogLevel};
pub use config::Config;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use update::{UpdateArgs, update_stats};
