//! Record types of the sample dataset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A customer together with every order they placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub company_name: String,
    pub address: String,
    pub city: String,
    /// Missing for most customers outside North America
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: String,
    pub fax: Option<String>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u32,
    pub order_date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u32,
    pub product_name: String,
    pub category: String,
    pub unit_price: f64,
    pub units_in_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_name: String,
    pub address: String,
    pub city: String,
    pub country: String,
}
