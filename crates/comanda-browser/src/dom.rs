//! Backend-neutral page and element handles.
//!
//! Production code drives a real Chrome session over WebDriver; tests drive
//! an in-memory scripted page. Both sides implement the same two traits so
//! everything above this layer is backend-agnostic.

use async_trait::async_trait;

use crate::error::DriverError;
use crate::locator::Strategy;

pub type BoxedElement = Box<dyn Element>;

/// A handle to a single DOM element.
#[async_trait]
pub trait Element: Send + Sync {
    /// Native click, as a user would.
    async fn click(&self) -> Result<(), DriverError>;

    /// Click via injected script. Bypasses overlay interception.
    async fn script_click(&self) -> Result<(), DriverError>;

    async fn clear(&self) -> Result<(), DriverError>;

    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Sends the Enter key to this element.
    async fn press_enter(&self) -> Result<(), DriverError>;

    /// Sends the Escape key to this element.
    async fn press_escape(&self) -> Result<(), DriverError>;

    /// Forces the element's value via injected script. Last resort for
    /// inputs that reject synthetic keystrokes.
    async fn script_set_value(&self, value: &str) -> Result<(), DriverError>;

    async fn text(&self) -> Result<String, DriverError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError>;

    /// Reads a live DOM property. Unlike [`Element::attr`], this reflects
    /// runtime state: `prop("value")` returns what is currently typed into
    /// an input, where the `value` attribute stays at its markup default.
    async fn prop(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn is_displayed(&self) -> Result<bool, DriverError>;

    async fn is_enabled(&self) -> Result<bool, DriverError>;
}

/// A live browser page.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// First visible-or-not element matching the strategy.
    async fn find(&self, strategy: &Strategy) -> Result<BoxedElement, DriverError>;

    /// All elements matching the strategy, in document order.
    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<BoxedElement>, DriverError>;

    /// Full HTML source of the current page.
    async fn page_source(&self) -> Result<String, DriverError>;

    async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError>;

    /// Tears down the session. Idempotent and infallible; failures are
    /// logged, not raised, so cleanup paths can always call it.
    async fn close(&self);
}
