//! Page-to-page navigation through the POS frontend.

use std::time::Duration;

use comanda_browser::{click_any_way, Browser, Locator};
use comanda_core::{AppConfig, TableStatus};

use crate::error::PosError;
use crate::selectors;

/// Drives login and view changes. Holds credentials and wait budgets; the
/// browser handle is passed per call so one navigator serves any session.
pub struct Navigator {
    base_url: String,
    username: String,
    password: String,
    locator: Locator,
    /// Budget for full page transitions, wider than per-element lookups.
    waiter: Locator,
    click_retries: u32,
    click_pause: Duration,
}

impl Navigator {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Navigator {
            base_url: config.pos_base_url.clone(),
            username: config.pos_username.clone(),
            password: config.pos_password.clone(),
            locator: Locator::new(Duration::from_secs(config.locator_timeout_secs)),
            waiter: Locator::new(Duration::from_secs(config.operation_timeout_secs)),
            click_retries: config.click_retries,
            click_pause: Duration::from_millis(config.click_pause_ms),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_locator(mut self, locator: Locator) -> Self {
        self.locator = locator.clone();
        self.waiter = locator;
        self
    }

    /// Logs in to the POS. No-op when the session is already on the panel,
    /// so callers can invoke it unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`PosError::Authentication`] when the form cannot be found
    /// or the post-submit URL never reaches the panel.
    pub async fn login(&self, browser: &dyn Browser) -> Result<(), PosError> {
        if browser
            .current_url()
            .await?
            .contains(selectors::PANEL_URL_FRAGMENT)
        {
            tracing::debug!("already authenticated, skipping login");
            return Ok(());
        }

        browser.goto(&self.base_url).await?;

        let auth_err = |err: comanda_browser::DriverError| PosError::Authentication(err.to_string());

        let username = self
            .locator
            .locate(browser, "username field", &selectors::username_input())
            .await
            .map_err(auth_err)?
            .element;
        username.clear().await?;
        username.type_text(&self.username).await?;

        let password = self
            .locator
            .locate(browser, "password field", &selectors::password_input())
            .await
            .map_err(auth_err)?
            .element;
        password.clear().await?;
        password.type_text(&self.password).await?;

        let submit = self
            .locator
            .locate(browser, "login button", &selectors::login_button())
            .await
            .map_err(auth_err)?
            .element;
        click_any_way(
            submit.as_ref(),
            "login button",
            self.click_retries,
            self.click_pause,
        )
        .await
        .map_err(auth_err)?;

        self.waiter
            .wait_for_url(browser, selectors::PANEL_URL_FRAGMENT)
            .await
            .map_err(|err| {
                PosError::Authentication(format!("panel never loaded after submit: {err}"))
            })?;
        tracing::info!(username = %self.username, "logged in");
        Ok(())
    }

    /// Opens the table listing from the panel.
    pub async fn to_table_list(&self, browser: &dyn Browser) -> Result<(), PosError> {
        self.enter_section(browser, "table list", &selectors::tables_entry())
            .await?;
        self.waiter
            .locate(browser, "table card heading", &selectors::table_heading())
            .await
            .map_err(|err| PosError::Navigation {
                step: "table list".to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    /// Opens the product category listing from the panel.
    pub async fn to_category_view(&self, browser: &dyn Browser) -> Result<(), PosError> {
        self.enter_section(browser, "category view", &selectors::categories_entry())
            .await
    }

    /// Opens the card of a named table.
    ///
    /// # Errors
    ///
    /// Returns [`PosError::TableNotFound`] when no strategy matches a card.
    pub async fn select_table(&self, browser: &dyn Browser, name: &str) -> Result<(), PosError> {
        let card = self
            .locator
            .locate(
                browser,
                &format!("table card {name:?}"),
                &selectors::table_card_named(name),
            )
            .await
            .map_err(|_| PosError::TableNotFound {
                name: name.to_string(),
            })?
            .element;
        click_any_way(
            card.as_ref(),
            &format!("table card {name:?}"),
            self.click_retries,
            self.click_pause,
        )
        .await
        .map_err(PosError::from)?;
        tracing::info!(table = name, "opened table");
        Ok(())
    }

    /// Opens the first available (green) table card and returns its name.
    pub async fn find_free_table(&self, browser: &dyn Browser) -> Result<String, PosError> {
        let cards = self
            .locator
            .locate_all(browser, "table cards", &selectors::table_cards())
            .await?;
        for card in cards {
            let text = card.text().await.unwrap_or_default();
            let style = card.attr("style").await.unwrap_or_default().unwrap_or_default();
            if table_card_status(&text, &style) != TableStatus::Available {
                continue;
            }
            let name = text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .to_string();
            click_any_way(
                card.as_ref(),
                &format!("free table card {name:?}"),
                self.click_retries,
                self.click_pause,
            )
            .await?;
            tracing::info!(table = %name, "opened free table");
            return Ok(name);
        }
        Err(PosError::Navigation {
            step: "find free table".to_string(),
            reason: "no available table card".to_string(),
        })
    }

    async fn enter_section(
        &self,
        browser: &dyn Browser,
        step: &str,
        entry: &[comanda_browser::Strategy],
    ) -> Result<(), PosError> {
        let nav_err = |reason: String| PosError::Navigation {
            step: step.to_string(),
            reason,
        };
        let card = self
            .locator
            .locate(browser, step, entry)
            .await
            .map_err(|err| nav_err(err.to_string()))?
            .element;
        click_any_way(card.as_ref(), step, self.click_retries, self.click_pause)
            .await
            .map_err(|err| nav_err(err.to_string()))?;
        tracing::debug!(step, "entered section");
        Ok(())
    }
}

/// Status of a table card from its visible label, else its background color.
fn table_card_status(text: &str, style: &str) -> TableStatus {
    for line in text.lines() {
        let status = TableStatus::from_label(line);
        if status != TableStatus::Unknown {
            return status;
        }
    }
    TableStatus::from_style(style)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
