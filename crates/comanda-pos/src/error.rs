use comanda_browser::DriverError;
use thiserror::Error;

/// Errors surfaced by the POS automation layer.
#[derive(Debug, Error)]
pub enum PosError {
    /// Login did not land on the panel.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A navigation step did not reach its expected view.
    #[error("navigation failed at {step}: {reason}")]
    Navigation { step: String, reason: String },

    /// No table card matched the requested name.
    #[error("table {name:?} not found")]
    TableNotFound { name: String },

    /// No product suggestion matched the requested name.
    #[error("product {name:?} not found")]
    ProductNotFound { name: String },

    /// Failure in the underlying browser layer.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Network or TLS failure talking to the sync target.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sync target answered outside the 2xx range.
    #[error("sync push to {endpoint} rejected with status {status}")]
    Sync { endpoint: String, status: u16 },
}
