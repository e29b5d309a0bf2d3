use thiserror::Error;

/// Errors surfaced by the browser layer.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Raw WebDriver protocol failure.
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// The session could not be created or is in an unusable state.
    #[error("browser session error: {0}")]
    Session(String),

    /// A single lookup matched nothing on the current page.
    #[error("no element matched {selector}")]
    NotFound { selector: String },

    /// A wait expired before its condition held.
    #[error("timed out after {waited_ms}ms waiting for {target} via {strategy}")]
    Timeout {
        target: String,
        strategy: String,
        waited_ms: u64,
    },

    /// Every strategy in a fallback chain failed. Carries one entry per
    /// attempted strategy with its failure.
    #[error("all lookup strategies failed for {target}: {}", attempts.join("; "))]
    LocatorExhausted {
        target: String,
        attempts: Vec<String>,
    },

    /// Native, scripted and keyboard clicks were all rejected.
    #[error("element {target} rejected every click method")]
    ClickRejected { target: String },
}
