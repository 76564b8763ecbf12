//! Loading the sample dataset.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QueryError;
use crate::Result;

use super::model::{Customer, Product, Supplier};

const BUILTIN_FIXTURE: &str = include_str!("../../fixtures/northwind.json");

/// Owner of the collections every sample starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
}

impl DataSource {
    /// The dataset shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_FIXTURE)
    }

    /// Parse a dataset from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let source: DataSource = serde_json::from_str(json)?;
        debug!(
            customers = source.customers.len(),
            products = source.products.len(),
            suppliers = source.suppliers.len(),
            "loaded dataset"
        );
        Ok(source)
    }

    /// Read and parse a dataset file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Total number of orders across all customers.
    pub fn order_count(&self) -> usize {
        self.customers.iter().map(|c| c.orders.len()).sum()
    }
}
