//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction};
pub use commands::{
    handle_config_action, init_config, publish, publish_exit_code, render, CliError,
    EXIT_EXHAUSTED,
};
