//! Structured extraction from rendered POS pages.
//!
//! Listing pages are read as one HTML snapshot and parsed offline, so a
//! mid-read rerender cannot tear the data. Only the overlay and category
//! flows drive the browser.

use std::collections::HashMap;
use std::time::Duration;

use comanda_browser::{click_any_way, Browser, Locator};
use comanda_core::{normalize_table_key, AppConfig, Product, ProductScrape, Table, TableStatus};
use scraper::{ElementRef, Html, Selector};

use crate::error::PosError;
use crate::selectors;

/// Parses the table listing snapshot into one [`Table`] per card.
///
/// Name comes from the card heading; status from the white status label
/// when present, else from the card background color, else `Unknown`.
#[must_use]
pub fn tables_from_snapshot(html: &str) -> Vec<Table> {
    let doc = Html::parse_document(html);
    let card_sel = Selector::parse(".v-card--link").expect("valid selector");

    let mut tables = Vec::new();
    for card in doc.select(&card_sel) {
        let Some(name) = first_text(card, "h2.black--text") else {
            continue;
        };
        let mut status = match first_text(card, "p.white--text") {
            Some(label) => TableStatus::from_label(&label),
            None => TableStatus::Unknown,
        };
        if status == TableStatus::Unknown {
            if let Some(bg) = background_fragment(card.value().attr("style").unwrap_or("")) {
                status = TableStatus::from_style(&bg);
            }
        }
        tables.push(Table::bare(&name, status));
    }
    tables
}

/// Parses the "Gestionar Mesas" overlay rows into metadata keyed by
/// normalized table name. Duplicate names resolve last-write-wins.
#[must_use]
pub fn metadata_from_snapshot(html: &str) -> HashMap<String, Table> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse(".v-data-table__wrapper tbody tr").expect("valid selector");
    let cell_sel = Selector::parse("td").expect("valid selector");

    let mut metadata = HashMap::new();
    for row in doc.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| collect_text(&cell))
            .collect();
        let Some(name) = cells.first().filter(|n| !n.is_empty()) else {
            continue;
        };
        let zone = cells
            .get(1)
            .filter(|z| !z.is_empty())
            .cloned()
            .unwrap_or_else(|| "Desconocida".to_string());
        let note = cells.get(2).filter(|n| !n.is_empty()).cloned();
        metadata.insert(
            normalize_table_key(name),
            Table {
                name: name.clone(),
                zone,
                note,
                status: TableStatus::Unknown,
            },
        );
    }
    metadata
}

/// Parses a category's product table. Rows with fewer than three cells or
/// an empty name cell are skipped.
#[must_use]
pub fn products_from_snapshot(html: &str, category: &str) -> Vec<Product> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse(".v-data-table__wrapper tbody tr").expect("valid selector");
    let cell_sel = Selector::parse("td").expect("valid selector");

    let mut products = Vec::new();
    for row in doc.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| collect_text(&cell))
            .collect();
        if cells.len() < 3 || cells[0].is_empty() {
            continue;
        }
        products.push(Product {
            category: category.to_string(),
            name: cells[0].clone(),
            stock: cells[1].clone(),
            price: cells[2].clone(),
        });
    }
    products
}

fn first_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).expect("valid selector");
    scope
        .select(&sel)
        .next()
        .map(|el| collect_text(&el))
        .filter(|text| !text.is_empty())
}

fn collect_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// The `background` / `background-color` declaration of an inline style.
fn background_fragment(style: &str) -> Option<String> {
    let re = regex::Regex::new(r"background(?:-color)?\s*:\s*([^;]+)").expect("valid regex");
    re.captures(style).map(|caps| caps[1].to_string())
}

/// Browser-driven extraction flows.
pub struct Extractor {
    locator: Locator,
    /// Budget for overlay and category view loads, wider than per-element
    /// lookups.
    waiter: Locator,
    click_retries: u32,
    click_pause: Duration,
}

impl Extractor {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Extractor {
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

    /// Reads the current table listing page.
    pub async fn tables(&self, browser: &dyn Browser) -> Result<Vec<Table>, PosError> {
        let html = browser.page_source().await?;
        Ok(tables_from_snapshot(&html))
    }

    /// Opens the "Gestionar Mesas" overlay, reads zone/note metadata, and
    /// always closes the overlay again, even when reading fails.
    pub async fn table_metadata(
        &self,
        browser: &dyn Browser,
    ) -> Result<HashMap<String, Table>, PosError> {
        let options = self
            .locator
            .locate(browser, "options menu", &selectors::options_button())
            .await?
            .element;
        click_any_way(
            options.as_ref(),
            "options menu",
            self.click_retries,
            self.click_pause,
        )
        .await?;

        let entry = self
            .locator
            .locate(
                browser,
                "manage tables entry",
                &selectors::manage_tables_entry(),
            )
            .await?
            .element;
        click_any_way(
            entry.as_ref(),
            "manage tables entry",
            self.click_retries,
            self.click_pause,
        )
        .await?;

        self.waiter
            .locate(browser, "tables overlay", &selectors::active_overlay())
            .await?;

        // Overlay is open from here on; close it on every path.
        let snapshot = browser.page_source().await;
        self.close_overlay(browser).await;

        Ok(metadata_from_snapshot(&snapshot?))
    }

    /// One pass over every product category.
    ///
    /// A failure at category *k* aborts the pass but keeps everything
    /// collected from categories `0..k`; the status names the failing
    /// category and step.
    pub async fn products(&self, browser: &dyn Browser) -> ProductScrape {
        let names = match self.category_names(browser).await {
            Ok(names) => names,
            Err(err) => {
                return ProductScrape::aborted(vec![], 0, "list categories", err.to_string())
            }
        };
        if names.is_empty() {
            tracing::warn!("no category cards found");
            return ProductScrape {
                products: vec![],
                status: comanda_core::ScrapeStatus::NoCategories,
            };
        }

        let mut products = Vec::new();
        for (idx, name) in names.iter().enumerate() {
            match self.scrape_category(browser, idx, name).await {
                Ok(mut batch) => {
                    tracing::debug!(category = %name, count = batch.len(), "category scraped");
                    products.append(&mut batch);
                }
                Err((step, reason)) => {
                    tracing::warn!(category = %name, step, %reason, "product pass aborted");
                    return ProductScrape::aborted(products, idx, step, reason);
                }
            }
        }
        ProductScrape::complete(products)
    }

    async fn category_names(&self, browser: &dyn Browser) -> Result<Vec<String>, PosError> {
        let cards = self
            .locator
            .locate_all(browser, "category cards", &selectors::category_cards())
            .await?;
        let mut names = Vec::with_capacity(cards.len());
        for card in cards {
            let text = card.text().await.unwrap_or_default();
            let name = text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .to_string();
            names.push(name);
        }
        Ok(names)
    }

    async fn scrape_category(
        &self,
        browser: &dyn Browser,
        idx: usize,
        name: &str,
    ) -> Result<Vec<Product>, (&'static str, String)> {
        let cards = self
            .locator
            .locate_all(browser, "category cards", &selectors::category_cards())
            .await
            .map_err(|err| ("relocate category card", err.to_string()))?;
        let card = cards
            .get(idx)
            .ok_or_else(|| ("relocate category card", format!("card {idx} disappeared")))?;
        click_any_way(
            card.as_ref(),
            &format!("category card {name:?}"),
            self.click_retries,
            self.click_pause,
        )
        .await
        .map_err(|err| ("open category", err.to_string()))?;

        self.waiter
            .locate(browser, "product table", &selectors::product_table())
            .await
            .map_err(|err| ("product table", err.to_string()))?;

        let html = browser
            .page_source()
            .await
            .map_err(|err| ("read products", err.to_string()))?;
        let batch = products_from_snapshot(&html, name);

        let back = self
            .locator
            .locate(browser, "back arrow", &selectors::back_arrow())
            .await
            .map_err(|err| ("return to categories", err.to_string()))?
            .element;
        click_any_way(
            back.as_ref(),
            "back arrow",
            self.click_retries,
            self.click_pause,
        )
        .await
        .map_err(|err| ("return to categories", err.to_string()))?;

        Ok(batch)
    }

    /// Best-effort overlay close: close button, then Escape on the overlay.
    async fn close_overlay(&self, browser: &dyn Browser) {
        if let Ok(hit) = self
            .locator
            .locate(browser, "overlay close", &selectors::overlay_close_button())
            .await
        {
            if click_any_way(
                hit.element.as_ref(),
                "overlay close",
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
            if hit.element.press_escape().await.is_ok() {
                return;
            }
        }
        tracing::warn!("could not close overlay");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_browser::fake::{ClickEffect, FakeBrowser, FakeNode, FakePage};

    fn quick_extractor() -> Extractor {
        let mut vars = std::collections::HashMap::new();
        vars.insert(
            "COMANDA_POS_BASE_URL".to_string(),
            "https://pos.test/".to_string(),
        );
        vars.insert("COMANDA_POS_USERNAME".to_string(), "cajero".to_string());
        vars.insert("COMANDA_POS_PASSWORD".to_string(), "secreto".to_string());
        let config = comanda_core::build_app_config(|key| {
            vars.get(key).cloned().ok_or(std::env::VarError::NotPresent)
        })
        .expect("valid test config");
        Extractor::new(&config).with_locator(
            Locator::new(Duration::from_millis(200)).with_poll(Duration::from_millis(10)),
        )
    }

    // -----------------------------------------------------------------------
    // Snapshot parsing
    // -----------------------------------------------------------------------

    #[test]
    fn colored_cards_without_labels_map_to_statuses() {
        let html = r#"
            <div class="v-card--link" style="background-color: rgb(70, 255, 0);">
                <h2 class="black--text">Mesa 1</h2>
            </div>
            <div class="v-card--link" style="background-color: rgb(255, 45, 0);">
                <h2 class="black--text">Mesa 2</h2>
            </div>
            <div class="v-card--link" style="background-color: rgb(255, 241, 0);">
                <h2 class="black--text">Mesa 3</h2>
            </div>
        "#;
        let tables = tables_from_snapshot(html);
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].status, TableStatus::Available);
        assert_eq!(tables[1].status, TableStatus::Occupied);
        assert_eq!(tables[2].status, TableStatus::Reserved);
    }

    #[test]
    fn status_label_takes_precedence_over_color() {
        let html = r#"
            <div class="v-card--link" style="background-color: rgb(70, 255, 0);">
                <h2 class="black--text">Mesa 4</h2>
                <p class="white--text">Reservada</p>
            </div>
        "#;
        let tables = tables_from_snapshot(html);
        assert_eq!(tables[0].status, TableStatus::Reserved);
    }

    #[test]
    fn card_without_label_or_color_is_unknown() {
        let html = r#"<div class="v-card--link"><h2 class="black--text">Mesa 5</h2></div>"#;
        let tables = tables_from_snapshot(html);
        assert_eq!(tables[0].status, TableStatus::Unknown);
    }

    #[test]
    fn cards_without_heading_are_skipped() {
        let html = r#"
            <div class="v-card--link"><p class="white--text">Ocupada</p></div>
            <div class="v-card--link"><h2 class="black--text">Mesa 6</h2></div>
        "#;
        let tables = tables_from_snapshot(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Mesa 6");
    }

    #[test]
    fn metadata_rows_are_keyed_case_insensitively() {
        let html = r#"
            <div class="v-data-table__wrapper"><table><tbody>
                <tr><td>  Mesa 1 </td><td>Terraza</td><td>junto a la ventana</td></tr>
                <tr><td>P4</td><td></td><td></td></tr>
            </tbody></table></div>
        "#;
        let metadata = metadata_from_snapshot(html);
        assert_eq!(metadata.len(), 2);
        let mesa1 = &metadata["mesa 1"];
        assert_eq!(mesa1.name, "Mesa 1");
        assert_eq!(mesa1.zone, "Terraza");
        assert_eq!(mesa1.note.as_deref(), Some("junto a la ventana"));
        assert_eq!(metadata["p4"].zone, "Desconocida");
        assert_eq!(metadata["p4"].note, None);
    }

    #[test]
    fn duplicate_metadata_names_resolve_last_write_wins() {
        let html = r#"
            <div class="v-data-table__wrapper"><table><tbody>
                <tr><td>Mesa 1</td><td>Salon</td><td></td></tr>
                <tr><td>mesa 1</td><td>Terraza</td><td></td></tr>
            </tbody></table></div>
        "#;
        let metadata = metadata_from_snapshot(html);
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["mesa 1"].zone, "Terraza");
    }

    #[test]
    fn product_rows_inherit_their_category() {
        let html = r#"
            <div class="v-data-table__wrapper"><table><tbody>
                <tr><td>Lomo Saltado</td><td>12</td><td>35.50</td></tr>
                <tr><td>Aji de Gallina</td><td>Agotado</td><td>S/ 28,00</td></tr>
                <tr><td></td><td>1</td><td>2</td></tr>
                <tr><td>incomplete</td></tr>
            </tbody></table></div>
        "#;
        let products = products_from_snapshot(html, "Fondos");
        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p.category == "Fondos"));
        assert_eq!(products[0].stock_count(), Some(12));
        assert_eq!(products[1].price_value(), Some(28.0));
    }

    // -----------------------------------------------------------------------
    // Overlay flow
    // -----------------------------------------------------------------------

    const LIST_URL: &str = "https://pos.test/panel/mesas";

    fn overlay_page(close_effect: ClickEffect) -> FakePage {
        FakePage::new(
            LIST_URL,
            vec![
                FakeNode::new("options", &[])
                    .matching(&selectors::options_button()[0])
                    .text("OPCIONES")
                    .on_click(ClickEffect::Show("manage".to_string())),
                FakeNode::new("manage", &[])
                    .matching(&selectors::manage_tables_entry()[0])
                    .text("Gestionar Mesas")
                    .hidden()
                    .on_click(ClickEffect::Show("overlay".to_string())),
                FakeNode::new("overlay", &[])
                    .matching(&selectors::active_overlay()[0])
                    .hidden(),
                FakeNode::new("close", &[])
                    .matching(&selectors::overlay_close_button()[0])
                    .text("CERRAR")
                    .on_click(close_effect),
            ],
        )
        .source(
            r#"<div class="v-data-table__wrapper"><table><tbody>
                <tr><td>Mesa 1</td><td>Terraza</td><td>vista al mar</td></tr>
            </tbody></table></div>"#,
        )
    }

    #[tokio::test]
    async fn table_metadata_reads_rows_and_closes_overlay() {
        let browser = FakeBrowser::new(
            vec![overlay_page(ClickEffect::Hide("overlay".to_string()))],
            LIST_URL,
        );

        let metadata = quick_extractor()
            .table_metadata(&browser)
            .await
            .expect("overlay metadata read");
        assert_eq!(metadata["mesa 1"].zone, "Terraza");
        assert_eq!(browser.clicks("close"), 1, "overlay must be closed");
    }

    #[tokio::test]
    async fn overlay_close_falls_back_to_escape() {
        let browser = FakeBrowser::new(
            vec![overlay_page(ClickEffect::FailTimes(u32::MAX))],
            LIST_URL,
        );

        let metadata = quick_extractor()
            .table_metadata(&browser)
            .await
            .expect("metadata still read when close button is stuck");
        assert_eq!(metadata.len(), 1);
        assert!(
            browser.escape_presses("overlay") >= 1,
            "escape fallback must fire"
        );
    }

    // -----------------------------------------------------------------------
    // Product pass
    // -----------------------------------------------------------------------

    const CATEGORIES_URL: &str = "https://pos.test/panel/platos";

    fn categories_page() -> FakePage {
        FakePage::new(
            CATEGORIES_URL,
            vec![
                FakeNode::new("cat-entradas", &[])
                    .matching(&selectors::category_cards()[0])
                    .text("Entradas")
                    .on_click(ClickEffect::Goto(format!("{CATEGORIES_URL}/entradas"))),
                FakeNode::new("cat-fondos", &[])
                    .matching(&selectors::category_cards()[0])
                    .text("Fondos")
                    .on_click(ClickEffect::Goto(format!("{CATEGORIES_URL}/fondos"))),
            ],
        )
    }

    fn entradas_page() -> FakePage {
        FakePage::new(
            &format!("{CATEGORIES_URL}/entradas"),
            vec![
                FakeNode::new("tbl-entradas", &[]).matching(&selectors::product_table()[0]),
                FakeNode::new("back-entradas", &[])
                    .matching(&selectors::back_arrow()[0])
                    .on_click(ClickEffect::Goto(CATEGORIES_URL.to_string())),
            ],
        )
        .source(
            r#"<div class="v-data-table__wrapper"><table><tbody>
                <tr><td>Causa Limena</td><td>8</td><td>18.00</td></tr>
                <tr><td>Tequenos</td><td>15</td><td>14.00</td></tr>
            </tbody></table></div>"#,
        )
    }

    #[tokio::test]
    async fn full_product_pass_collects_every_category() {
        let fondos = FakePage::new(
            &format!("{CATEGORIES_URL}/fondos"),
            vec![
                FakeNode::new("tbl-fondos", &[]).matching(&selectors::product_table()[0]),
                FakeNode::new("back-fondos", &[])
                    .matching(&selectors::back_arrow()[0])
                    .on_click(ClickEffect::Goto(CATEGORIES_URL.to_string())),
            ],
        )
        .source(
            r#"<div class="v-data-table__wrapper"><table><tbody>
                <tr><td>Lomo Saltado</td><td>12</td><td>35.50</td></tr>
            </tbody></table></div>"#,
        );

        let browser = FakeBrowser::new(
            vec![categories_page(), entradas_page(), fondos],
            CATEGORIES_URL,
        );

        let scrape = quick_extractor().products(&browser).await;
        assert!(scrape.status.is_complete());
        assert_eq!(scrape.products.len(), 3);
        assert_eq!(scrape.products[0].category, "Entradas");
        assert_eq!(scrape.products[2].category, "Fondos");
    }

    #[tokio::test]
    async fn failing_category_keeps_earlier_results() {
        // The Fondos page has no product table, so the pass aborts there.
        let broken_fondos = FakePage::new(&format!("{CATEGORIES_URL}/fondos"), vec![]);
        let browser = FakeBrowser::new(
            vec![categories_page(), entradas_page(), broken_fondos],
            CATEGORIES_URL,
        );

        let scrape = quick_extractor().products(&browser).await;
        assert_eq!(scrape.products.len(), 2, "Entradas results survive");
        match scrape.status {
            comanda_core::ScrapeStatus::Aborted {
                category_index,
                step,
                ..
            } => {
                assert_eq!(category_index, 1);
                assert_eq!(step, "product table");
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_category_listing_is_reported() {
        let browser =
            FakeBrowser::new(vec![FakePage::new(CATEGORIES_URL, vec![])], CATEGORIES_URL);
        let scrape = quick_extractor().products(&browser).await;
        assert!(scrape.products.is_empty());
        assert!(matches!(
            scrape.status,
            comanda_core::ScrapeStatus::NoCategories
        ));
    }
}
