//! Terminal host binding the ledger's command surface to an interactive shell.

mod commands;
pub mod output;
mod shell;

use std::io;

use thiserror::Error;

use crate::errors::{ConfigError, LedgerError};

pub use commands::ShellContext;
pub use shell::run_cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    /// Commands are read line by line from stdin without prompts.
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Failures that end the shell session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Prompt(#[from] dialoguer::Error),
}

/// Failures of a single command; reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{message}")]
    InvalidArguments { message: String, usage: String },
    #[error("Unknown command `{name}`")]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
