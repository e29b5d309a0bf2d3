use serde::{Deserialize, Serialize};

/// A menu product scraped from a category table in the POS.
///
/// Stock and price are kept exactly as the POS renders them — the stock cell
/// may read `"15"` or `"Agotado"` — and are only coerced to numbers by the
/// consumer via the tolerant helpers below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Category name inherited from the navigation context, not from the
    /// product's own markup.
    pub category: String,
    pub name: String,
    pub stock: String,
    pub price: String,
}

impl Product {
    /// Parses the stock cell as a count, if it carries one.
    ///
    /// `"15"` and `"15 unidades"` yield `Some(15)`; free-text states like
    /// `"Agotado"` yield `None`.
    #[must_use]
    pub fn stock_count(&self) -> Option<u32> {
        let digits: String = self
            .stock
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    /// Parses the price cell as a decimal value, stripping currency symbols.
    #[must_use]
    pub fn price_value(&self) -> Option<f64> {
        let cleaned: String = self
            .price
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        cleaned.replace(',', ".").parse().ok()
    }
}

/// Outcome marker for a full product pass.
///
/// Extraction is best-effort: a failure in the middle of the category loop
/// aborts the pass but everything gathered up to that point is still
/// returned alongside a status naming the failing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrapeStatus {
    Complete,
    /// No category cards were found at all.
    NoCategories,
    /// The pass aborted at `category_index` during `step`.
    Aborted {
        category_index: usize,
        step: String,
        reason: String,
    },
}

impl ScrapeStatus {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, ScrapeStatus::Complete)
    }
}

/// Result of one product pass: the collected products plus how far it got.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductScrape {
    pub products: Vec<Product>,
    pub status: ScrapeStatus,
}

impl ProductScrape {
    #[must_use]
    pub fn complete(products: Vec<Product>) -> Self {
        ProductScrape {
            products,
            status: ScrapeStatus::Complete,
        }
    }

    #[must_use]
    pub fn aborted(products: Vec<Product>, category_index: usize, step: &str, reason: String) -> Self {
        ProductScrape {
            products,
            status: ScrapeStatus::Aborted {
                category_index,
                step: step.to_string(),
                reason,
            },
        }
    }
}
