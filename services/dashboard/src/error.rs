//! services/dashboard/src/error.rs
//!
//! Defines the primary error type for the dashboard service.

use crate::config::ConfigError;
use practice_diff_core::ports::PortError;

/// The primary error type for the `dashboard` service.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the document store driver.
    #[error("Database Error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Represents an error from building or using the HTTP client.
    #[error("HTTP Client Error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
