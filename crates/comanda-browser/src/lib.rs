//! Browser session management and element location.
//!
//! Wraps a WebDriver-driven Chrome session behind the [`Browser`] and
//! [`Element`] traits, and layers ordered strategy fallback, composite
//! waits and click escalation on top. The `test-util` feature exposes a
//! scripted in-memory browser so dependent crates can test page flows
//! without chromedriver.

mod dom;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
mod locator;
mod session;

pub use dom::{Browser, BoxedElement, Element};
pub use error::DriverError;
pub use locator::{click_any_way, Hit, Locator, Strategy};
pub use session::ChromeSession;
