//! Chrome-backed implementation of the [`Browser`] seam.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, Key, WebDriver, WebElement};

use crate::dom::{Browser, BoxedElement, Element};
use crate::error::DriverError;
use crate::locator::Strategy;

/// A live Chrome session speaking WebDriver to a chromedriver endpoint.
pub struct ChromeSession {
    driver: WebDriver,
    closed: AtomicBool,
}

impl ChromeSession {
    /// Starts a Chrome session against `webdriver_url`.
    ///
    /// The flag set matches what the POS frontend tolerates in containers;
    /// only headless mode is per-call.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::WebDriver`] when chromedriver is unreachable
    /// or rejects the capabilities.
    pub async fn launch(webdriver_url: &str, headless: bool) -> Result<Self, DriverError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--disable-extensions")?;
        caps.add_arg("--disable-notifications")?;
        caps.add_arg("--disable-infobars")?;
        caps.add_arg("--start-maximized")?;
        caps.add_arg("--window-size=1920,1080")?;
        if headless {
            caps.add_arg("--headless=new")?;
        }

        let driver = WebDriver::new(webdriver_url, caps).await?;
        tracing::info!(webdriver_url, headless, "chrome session started");
        Ok(ChromeSession {
            driver,
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Browser for ChromeSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn find(&self, strategy: &Strategy) -> Result<BoxedElement, DriverError> {
        let elem = self.driver.find(strategy.to_by()).await?;
        Ok(Box::new(ChromeElement {
            elem,
            driver: self.driver.clone(),
        }))
    }

    async fn find_all(&self, strategy: &Strategy) -> Result<Vec<BoxedElement>, DriverError> {
        let elems = self.driver.find_all(strategy.to_by()).await?;
        Ok(elems
            .into_iter()
            .map(|elem| {
                Box::new(ChromeElement {
                    elem,
                    driver: self.driver.clone(),
                }) as BoxedElement
            })
            .collect())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        Ok(self.driver.source().await?)
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, DriverError> {
        Ok(self.driver.screenshot_as_png().await?)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // quit() consumes a handle; WebDriver clones share the session.
        if let Err(err) = self.driver.clone().quit().await {
            tracing::warn!(%err, "failed to quit chrome session");
        } else {
            tracing::info!("chrome session closed");
        }
    }
}

struct ChromeElement {
    elem: WebElement,
    driver: WebDriver,
}

#[async_trait]
impl Element for ChromeElement {
    async fn click(&self) -> Result<(), DriverError> {
        self.elem.click().await?;
        Ok(())
    }

    async fn script_click(&self) -> Result<(), DriverError> {
        self.driver
            .execute("arguments[0].click();", vec![self.elem.to_json()?])
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), DriverError> {
        self.elem.clear().await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.elem.send_keys(text).await?;
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), DriverError> {
        self.elem.send_keys(Key::Enter).await?;
        Ok(())
    }

    async fn press_escape(&self) -> Result<(), DriverError> {
        self.elem.send_keys(Key::Escape).await?;
        Ok(())
    }

    async fn script_set_value(&self, value: &str) -> Result<(), DriverError> {
        self.driver
            .execute(
                "arguments[0].value = arguments[1]; \
                 arguments[0].dispatchEvent(new Event('input', { bubbles: true }));",
                vec![self.elem.to_json()?, serde_json::Value::String(value.to_string())],
            )
            .await?;
        Ok(())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.elem.text().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.elem.attr(name).await?)
    }

    async fn prop(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.elem.prop(name).await?)
    }

    async fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(self.elem.is_displayed().await?)
    }

    async fn is_enabled(&self) -> Result<bool, DriverError> {
        Ok(self.elem.is_enabled().await?)
    }
}
