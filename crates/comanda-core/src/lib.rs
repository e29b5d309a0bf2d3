//! Domain model and configuration shared across the comanda workspace.
//!
//! Everything here is a plain value type: tables, products, order line
//! items, receipt data and operation results are constructed fresh on every
//! automation pass and never persisted by this core.

pub mod app_config;
pub mod config;
pub mod orders;
pub mod products;
pub mod tables;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env, ConfigError};
pub use orders::{DocumentType, LineItem, OperationResult, ReceiptData, ReceiptType};
pub use products::{Product, ProductScrape, ScrapeStatus};
pub use tables::{merge_table_metadata, normalize_table_key, Table, TableStatus};
