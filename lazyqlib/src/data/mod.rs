//! The in-memory object graph the sample queries run against.
//!
//! - **Model**: `Customer` (with its `Order`s), `Product`, `Supplier`
//! - **Source**: `DataSource`, loaded from the embedded fixture or a JSON file
//!
//! ## Example
//!
//! ```rust
//! use lazyqlib::data::DataSource;
//! use lazyqlib::query::from_collection;
//!
//! let source = DataSource::builtin().unwrap();
//! let londoners = from_collection(&source.customers).filter(|c| c.city == "London");
//! assert_eq!(londoners.count().unwrap(), 3);
//! ```

pub mod model;
pub mod source;

pub use model::{Customer, Order, Product, Supplier};
pub use source::DataSource;
