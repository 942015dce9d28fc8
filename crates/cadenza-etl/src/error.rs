//! Error types for the ETL pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the external catalog service.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The catalog answered with a non-success status.
    #[error("HTTP error from catalog (status {status:?}): {message}")]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// The catalog returned a rate-limit response.
    #[error("rate limited by catalog")]
    RateLimited,

    /// The access token was rejected.
    #[error("catalog rejected credentials: {message}")]
    Unauthorized { message: String },

    /// The catalog could not be reached, or stopped answering.
    #[error("could not connect to catalog: {message}")]
    Connection { message: String },

    /// A response from the catalog could not be parsed.
    #[error("parse error from catalog: {message}")]
    Parse { message: String },
}

impl CatalogError {
    /// Returns `true` when the error is transient and the request may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Connection { .. } => true,
            Self::Http { status, .. } => status.map_or(true, |s| s >= 500),
            Self::Unauthorized { .. } | Self::Parse { .. } => false,
        }
    }

    /// Returns `true` when the whole run must stop.
    ///
    /// Callers only see an error once retries are spent, so a transient error
    /// that reaches them means the catalog is unavailable. Rejected
    /// credentials are fatal on the first attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized { .. }) || self.is_transient()
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Connection {
                message: e.to_string(),
            }
        } else if e.is_decode() {
            Self::Parse {
                message: e.to_string(),
            }
        } else {
            Self::Http {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A history file is not a well-formed list of stream events.
    #[error("malformed history file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Core(#[from] cadenza_core::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
