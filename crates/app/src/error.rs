//! Application error types.

use domain::{RepositoryError, UserError};
use event_store::EventStoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect to the event store: {0}")]
    Connect(#[source] EventStoreError),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("User {0} was not found after saving")]
    Missing(String),
}
