//! HTTP client pushing scraped data to the sync target.

use std::time::Duration;

use comanda_core::{Product, Table};
use serde::Serialize;

use crate::error::PosError;

const TABLES_PATH: &str = "/api/v1/sync/mesas";
const PRODUCTS_PATH: &str = "/api/v1/sync/platos";

/// Pushes table and product snapshots as JSON arrays.
pub struct SyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    /// # Errors
    ///
    /// Returns [`PosError::Http`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PosError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SyncClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Pushes the table snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PosError::Http`] on transport failure and
    /// [`PosError::Sync`] on a non-2xx response.
    pub async fn push_tables(&self, tables: &[Table]) -> Result<(), PosError> {
        self.post(TABLES_PATH, tables).await
    }

    /// Pushes the product snapshot.
    pub async fn push_products(&self, products: &[Product]) -> Result<(), PosError> {
        self.post(PRODUCTS_PATH, products).await
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<(), PosError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "sync push rejected");
            return Err(PosError::Sync {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        tracing::info!(endpoint, "sync push accepted");
        Ok(())
    }
}
