//! Tracing subscriber setup.

use crate::{CliError, CliResult};
use clap::{ArgAction, Args};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging arguments.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level (0-4). Overridden by `RUST_LOG` when set.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub v: u8,
}

impl LogArgs {
    /// The level filter for the configured verbosity.
    pub const fn level(&self) -> LevelFilter {
        match self.v {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global tracing subscriber.
    pub fn init_tracing(&self) -> CliResult<()> {
        init_tracing_subscriber(self.level(), None)
    }
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `level`; an explicit `filter` takes precedence over both.
pub fn init_tracing_subscriber(level: LevelFilter, filter: Option<EnvFilter>) -> CliResult<()> {
    let filter = match filter {
        Some(filter) => filter,
        None => EnvFilter::builder().with_default_directive(level.into()).from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| CliError::Tracing(err.to_string()))
}
