//! Session lifecycle: one browser per logical operation, closed on every
//! exit path.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use comanda_browser::{Browser, ChromeSession};
use comanda_core::{
    merge_table_metadata, AppConfig, LineItem, OperationResult, ProductScrape, ReceiptData, Table,
};

use crate::error::PosError;
use crate::extract::Extractor;
use crate::navigator::Navigator;
use crate::writer::OrderWriter;

/// Runs `body` against `browser` and closes the browser afterwards,
/// success or failure.
pub async fn with_browser<T, F, Fut>(browser: Arc<dyn Browser>, body: F) -> Result<T, PosError>
where
    F: FnOnce(Arc<dyn Browser>) -> Fut,
    Fut: Future<Output = Result<T, PosError>>,
{
    let outcome = body(Arc::clone(&browser)).await;
    browser.close().await;
    outcome
}

/// Launches a Chrome session for `config` and runs `body` under the
/// close-always guarantee of [`with_browser`].
pub async fn with_session<T, F, Fut>(
    config: &AppConfig,
    headless: bool,
    body: F,
) -> Result<T, PosError>
where
    F: FnOnce(Arc<dyn Browser>) -> Fut,
    Fut: Future<Output = Result<T, PosError>>,
{
    let session = ChromeSession::launch(&config.webdriver_url, headless).await?;
    with_browser(Arc::new(session), body).await
}

/// Top-level POS operations. One instance is cheap and stateless between
/// calls; each operation owns a fresh browser session.
pub struct SessionController {
    config: AppConfig,
    navigator: Navigator,
    extractor: Extractor,
    writer: OrderWriter,
}

impl SessionController {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let navigator = Navigator::new(&config);
        let extractor = Extractor::new(&config);
        let writer = OrderWriter::new(&config);
        SessionController {
            config,
            navigator,
            extractor,
            writer,
        }
    }

    #[cfg(test)]
    fn with_locator(mut self, locator: comanda_browser::Locator) -> Self {
        self.navigator = self.navigator.with_locator(locator.clone());
        self.extractor = self.extractor.with_locator(locator.clone());
        self.writer = self.writer.with_locator(locator);
        self
    }

    /// Scrapes the table listing, enriched with zone/note metadata from the
    /// management overlay.
    pub async fn scrape_tables(&self, headless: bool) -> Result<Vec<Table>, PosError> {
        with_session(&self.config, headless, |browser| async move {
            self.scrape_tables_with(browser.as_ref()).await
        })
        .await
    }

    /// Scrapes every product category. Best effort: an early abort still
    /// returns everything collected, with the abort recorded in the status.
    pub async fn scrape_products(&self, headless: bool) -> Result<ProductScrape, PosError> {
        with_session(&self.config, headless, |browser| async move {
            self.scrape_products_with(browser.as_ref()).await
        })
        .await
    }

    /// Inserts an order into a named table and fills (without submitting)
    /// the e-receipt form. Never propagates: every fault becomes a failed
    /// [`OperationResult`].
    pub async fn insert_order(
        &self,
        table: &str,
        items: &[LineItem],
        receipt: Option<&ReceiptData>,
        headless: bool,
    ) -> OperationResult {
        let session = match ChromeSession::launch(&self.config.webdriver_url, headless).await {
            Ok(session) => session,
            Err(err) => return OperationResult::failed(format!("browser launch: {err}")),
        };
        let browser: Arc<dyn Browser> = Arc::new(session);
        let result = self
            .insert_order_with(browser.as_ref(), table, items, receipt)
            .await;
        browser.close().await;
        result
    }

    pub async fn scrape_tables_with(&self, browser: &dyn Browser) -> Result<Vec<Table>, PosError> {
        self.navigator.login(browser).await?;
        self.navigator.to_table_list(browser).await?;
        let cards = self.extractor.tables(browser).await?;

        // Metadata is enrichment; the card listing alone is still a result.
        let metadata = match self.extractor.table_metadata(browser).await {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(%err, "table metadata unavailable");
                HashMap::new()
            }
        };
        let tables = merge_table_metadata(cards, &metadata);

        if let Err(err) = self.writer.logout(browser).await {
            tracing::warn!(%err, "logout failed after table scrape");
        }
        Ok(tables)
    }

    pub async fn scrape_products_with(
        &self,
        browser: &dyn Browser,
    ) -> Result<ProductScrape, PosError> {
        self.navigator.login(browser).await?;
        self.navigator.to_category_view(browser).await?;
        let scrape = self.extractor.products(browser).await;
        if let Err(err) = self.writer.logout(browser).await {
            tracing::warn!(%err, "logout failed after product scrape");
        }
        Ok(scrape)
    }

    pub async fn insert_order_with(
        &self,
        browser: &dyn Browser,
        table: &str,
        items: &[LineItem],
        receipt: Option<&ReceiptData>,
    ) -> OperationResult {
        let mut result = OperationResult::default();

        if let Err(err) = self.navigator.login(browser).await {
            return fail(result, format!("login: {err}"));
        }
        result.log("logged in");

        if let Err(err) = self.navigator.to_table_list(browser).await {
            return fail(result, format!("table list: {err}"));
        }
        if let Err(err) = self.navigator.select_table(browser, table).await {
            return fail(result, format!("table {table:?}: {err}"));
        }
        result.log(format!("table {table:?} opened"));

        let mut inserted = 0u32;
        for item in items {
            if self.writer.insert_line_item(browser, item, &mut result).await {
                inserted += 1;
            }
        }
        result.inserted_count = Some(inserted);
        result.log(format!("{inserted} of {} items inserted", items.len()));

        if let Some(data) = receipt {
            match self.writer.open_receipt_modal(browser).await {
                Ok(()) => self.writer.fill_receipt(browser, data, &mut result).await,
                Err(err) => result.error(format!("receipt modal: {err}")),
            }
        }

        if let Err(err) = self.writer.logout(browser).await {
            result.log(format!("logout failed: {err}"));
        }

        result.success = result.errors.is_empty();
        result.message = if result.success {
            "order inserted".to_string()
        } else {
            "order insertion completed with errors".to_string()
        };
        result
    }
}

fn fail(mut result: OperationResult, message: String) -> OperationResult {
    tracing::error!(%message, "order insertion aborted");
    result.error(message.clone());
    result.message = message;
    result.success = false;
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
