//! Write flows: order line insertion, e-receipt filling, logout.
//!
//! Insertion is best effort per item: each step swallows its own failure
//! into the operation log so one stubborn product cannot sink the rest of
//! the order.

use std::time::Duration;

use comanda_browser::{click_any_way, Browser, Locator, Strategy};
use comanda_core::{AppConfig, LineItem, OperationResult, ReceiptData};

use crate::error::PosError;
use crate::selectors;

pub struct OrderWriter {
    locator: Locator,
    /// Budget for the receipt modal to render, wider than per-element
    /// lookups.
    waiter: Locator,
    click_retries: u32,
    click_pause: Duration,
}

impl OrderWriter {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        OrderWriter {
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

    /// Inserts one line item into the open order. Returns whether the item
    /// landed; failures are recorded in `result` and never propagate.
    pub async fn insert_line_item(
        &self,
        browser: &dyn Browser,
        item: &LineItem,
        result: &mut OperationResult,
    ) -> bool {
        result.log(format!("inserting {:?} x{}", item.name, item.quantity));

        let field = match self
            .locator
            .locate(browser, "product search", &selectors::product_search_input())
            .await
        {
            Ok(hit) => hit.element,
            Err(err) => {
                result.error(format!("{}: product search field: {err}", item.name));
                return false;
            }
        };
        if let Err(err) = field.clear().await {
            result.error(format!("{}: clearing search field: {err}", item.name));
            return false;
        }
        if let Err(err) = field.type_text(&item.name).await {
            result.error(format!("{}: typing name: {err}", item.name));
            return false;
        }

        match self
            .locator
            .locate(browser, "product suggestion", &selectors::suggestion_item())
            .await
        {
            Ok(hit) => {
                if let Err(err) = click_any_way(
                    hit.element.as_ref(),
                    "product suggestion",
                    self.click_retries,
                    self.click_pause,
                )
                .await
                {
                    result.error(format!("{}: selecting suggestion: {err}", item.name));
                    return false;
                }
            }
            Err(_) => {
                result.log(format!(
                    "{}: no suggestion menu, submitting with Enter",
                    item.name
                ));
                // No suggestion and no accepted submit: the POS does not
                // know this product.
                if let Err(err) = field.press_enter().await {
                    tracing::debug!(product = %item.name, %err, "enter fallback rejected");
                    result.error(
                        PosError::ProductNotFound {
                            name: item.name.clone(),
                        }
                        .to_string(),
                    );
                    return false;
                }
            }
        }

        if item.quantity > 1 {
            self.set_optional_field(
                browser,
                "quantity",
                &selectors::quantity_input(),
                &item.quantity.to_string(),
                result,
            )
            .await;
        }
        if let Some(comment) = &item.comment {
            self.set_optional_field(
                browser,
                "comment",
                &selectors::comment_input(),
                comment,
                result,
            )
            .await;
        }

        match self
            .locator
            .locate(browser, "confirm dialog", &selectors::add_confirm_button())
            .await
        {
            Ok(hit) => {
                if let Err(err) = click_any_way(
                    hit.element.as_ref(),
                    "confirm dialog",
                    self.click_retries,
                    self.click_pause,
                )
                .await
                {
                    result.log(format!("{}: confirm click failed: {err}", item.name));
                }
            }
            Err(_) => {
                result.log(format!(
                    "{}: no confirm dialog, dismissing with Escape",
                    item.name
                ));
                let _ = field.press_escape().await;
            }
        }

        result.log(format!("{:?} inserted", item.name));
        true
    }

    /// Opens the e-receipt modal from the order view.
    ///
    /// # Errors
    ///
    /// Fails when the trigger button or the modal itself never shows up.
    pub async fn open_receipt_modal(&self, browser: &dyn Browser) -> Result<(), PosError> {
        let button = self
            .locator
            .locate(browser, "receipt button", &selectors::receipt_button())
            .await?
            .element;
        click_any_way(
            button.as_ref(),
            "receipt button",
            self.click_retries,
            self.click_pause,
        )
        .await?;
        self.waiter
            .locate(browser, "receipt modal", &selectors::receipt_modal())
            .await?;
        Ok(())
    }

    /// Fills the open e-receipt modal, captures a screenshot of the filled
    /// state, and closes the modal without submitting. Field-level failures
    /// are recorded in `result` and the rest of the form is still filled.
    pub async fn fill_receipt(
        &self,
        browser: &dyn Browser,
        data: &ReceiptData,
        result: &mut OperationResult,
    ) {
        self.select_document_type(browser, data, result).await;

        self.fill_verified_field(
            browser,
            "document number",
            &selectors::document_number_input(),
            &data.document_number,
            result,
        )
        .await;
        self.fill_verified_field(
            browser,
            "full name",
            &selectors::full_name_input(),
            &data.full_name,
            result,
        )
        .await;
        self.fill_verified_field(
            browser,
            "address",
            &selectors::address_input(),
            &data.address,
            result,
        )
        .await;
        self.fill_verified_field(
            browser,
            "observation",
            &selectors::observation_input(),
            &data.observation,
            result,
        )
        .await;

        let label = data.receipt_type.label();
        match self
            .locator
            .locate(
                browser,
                &format!("receipt type {label:?}"),
                &selectors::receipt_type_radio(label),
            )
            .await
        {
            Ok(hit) => {
                if let Err(err) = click_any_way(
                    hit.element.as_ref(),
                    &format!("receipt type {label:?}"),
                    self.click_retries,
                    self.click_pause,
                )
                .await
                {
                    result.error(format!("receipt type {label:?}: {err}"));
                } else {
                    result.log(format!("receipt type set to {label}"));
                }
            }
            Err(err) => result.error(format!("receipt type {label:?}: {err}")),
        }

        match browser.screenshot_png().await {
            Ok(png) => {
                result.log("captured receipt screenshot".to_string());
                result.screenshot = Some(png);
            }
            Err(err) => result.error(format!("receipt screenshot: {err}")),
        }

        // Filled, photographed, never submitted.
        self.close_modal(browser).await;
        result.log("receipt modal closed without submitting".to_string());
    }

    /// Logs out: closes lingering overlays with bounded retries, then walks
    /// the nav menu to "Cerrar Sesion". Callers on teardown paths log a
    /// failure and move on; it must never block session close.
    pub async fn logout(&self, browser: &dyn Browser) -> Result<(), PosError> {
        for round in 0..3 {
            let Ok(hit) = self
                .locator
                .locate(browser, "lingering overlay", &selectors::active_overlay())
                .await
            else {
                break;
            };
            tracing::debug!(round, "closing lingering overlay");
            self.close_modal(browser).await;
            if !hit.element.is_displayed().await.unwrap_or(false) {
                break;
            }
        }

        let menu = self
            .locator
            .locate(browser, "nav menu", &selectors::nav_menu_button())
            .await?
            .element;
        click_any_way(
            menu.as_ref(),
            "nav menu",
            self.click_retries,
            self.click_pause,
        )
        .await?;

        let entry = self
            .locator
            .locate(browser, "logout entry", &selectors::logout_entry())
            .await?
            .element;
        click_any_way(
            entry.as_ref(),
            "logout entry",
            self.click_retries,
            self.click_pause,
        )
        .await?;
        tracing::info!("logged out");
        Ok(())
    }

    async fn select_document_type(
        &self,
        browser: &dyn Browser,
        data: &ReceiptData,
        result: &mut OperationResult,
    ) {
        let label = data.document_type.label();
        let select = match self
            .locator
            .locate(
                browser,
                "document type select",
                &selectors::document_type_select(),
            )
            .await
        {
            Ok(hit) => hit.element,
            Err(err) => {
                result.error(format!("document type select: {err}"));
                return;
            }
        };
        if let Err(err) = click_any_way(
            select.as_ref(),
            "document type select",
            self.click_retries,
            self.click_pause,
        )
        .await
        {
            result.error(format!("document type select: {err}"));
            return;
        }
        match self
            .locator
            .locate(
                browser,
                &format!("document type option {label:?}"),
                &selectors::document_type_option(label),
            )
            .await
        {
            Ok(hit) => {
                match click_any_way(
                    hit.element.as_ref(),
                    "document type option",
                    self.click_retries,
                    self.click_pause,
                )
                .await
                {
                    Ok(()) => result.log(format!("document type set to {label}")),
                    Err(err) => result.error(format!("document type option {label:?}: {err}")),
                }
            }
            Err(err) => result.error(format!("document type option {label:?}: {err}")),
        }
    }

    /// Best-effort fill of an optional order field. Absence or failure is
    /// logged, never an error; the POS default stands.
    async fn set_optional_field(
        &self,
        browser: &dyn Browser,
        label: &str,
        strategies: &[Strategy],
        value: &str,
        result: &mut OperationResult,
    ) {
        match self.locator.locate(browser, label, strategies).await {
            Ok(hit) => {
                let field = hit.element;
                let _ = field.clear().await;
                match field.type_text(value).await {
                    Ok(()) => result.log(format!("{label} set to {value}")),
                    Err(err) => result.log(format!("{label}: could not set: {err}")),
                }
            }
            Err(_) => result.log(format!("{label} field not found, leaving default")),
        }
    }

    /// Type the value, re-read it, and force it via script when the input
    /// swallowed the keystrokes.
    async fn fill_verified_field(
        &self,
        browser: &dyn Browser,
        label: &str,
        strategies: &[Strategy],
        value: &str,
        result: &mut OperationResult,
    ) {
        let field = match self.locator.locate(browser, label, strategies).await {
            Ok(hit) => hit.element,
            Err(err) => {
                result.error(format!("{label}: {err}"));
                return;
            }
        };
        let _ = field.clear().await;
        let _ = field.type_text(value).await;

        // The value attribute never tracks typed text; read the property.
        let seen = field
            .prop("value")
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        if seen != value {
            result.log(format!("{label}: keystrokes dropped, forcing via script"));
            if let Err(err) = field.script_set_value(value).await {
                result.error(format!("{label}: {err}"));
                return;
            }
        }
        result.log(format!("{label} filled"));
    }

    /// Best-effort modal close: close button, else Escape on the overlay.
    async fn close_modal(&self, browser: &dyn Browser) {
        if let Ok(hit) = self
            .locator
            .locate(browser, "modal close", &selectors::overlay_close_button())
            .await
        {
            if click_any_way(
                hit.element.as_ref(),
                "modal close",
                self.click_retries,
                self.click_pause,
            )
            .await
            .is_ok()
            {
                return;
            }
        }
        if let Ok(hit) = self
            .locator
            .locate(browser, "active overlay", &selectors::active_overlay())
            .await
        {
            let _ = hit.element.press_escape().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
