//! Error types for CLI utilities.

use thiserror::Error;

/// Error type for prometheus server initialization.
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// Failed to bind to the specified address.
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),
    /// Failed to build or install the exporter.
    #[error("failed to install prometheus exporter: {0}")]
    Build(#[from] metrics_exporter_prometheus::BuildError),
}

/// Errors that can occur in CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// The tracing subscriber could not be installed.
    #[error("failed to initialize tracing: {0}")]
    Tracing(String),

    /// Error initializing metrics.
    #[error("failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] PrometheusError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
