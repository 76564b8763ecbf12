//! # lazyqlib
//!
//! A lazy, composable query engine over in-memory collections.
//!
//! ## Overview
//!
//! Queries are built by chaining operators onto a source. Building a query
//! does no work; every drain re-runs the pipeline against the current
//! contents of its source, so the same query can be evaluated many times.
//!
//! - **Restriction and projection**: `filter`, `project`, `flat_map`
//! - **Combination**: `join` on equal keys, `group_by` in first-occurrence order
//! - **Ordering**: `order_by` with mixed-direction, stable multi-key sorting
//! - **Aggregation**: `count`, `sum`, `average`, `min`, `max`
//! - **Materialization**: `to_vec`, `for_each`, or serializing the query itself
//!
//! Failures raised while evaluating a user function surface as
//! [`QueryError::Evaluation`], tagged with the failing stage and the position
//! of the element within that stage's input.
//!
//! The crate also ships a small Northwind-style dataset ([`data`]) and a
//! catalog of sample queries over it ([`samples`]).
//!
//! ## Example
//!
//! ```rust
//! use lazyqlib::{from_collection, DataSource, Direction, OrderKey};
//!
//! let source = DataSource::builtin().unwrap();
//!
//! let london = from_collection(&source.customers)
//!     .filter(|c| c.city == "London")
//!     .order_by(OrderKey::by(|c: &&lazyqlib::Customer| c.orders.len(), Direction::Descending))
//!     .project(|c| c.customer_id.clone());
//!
//! assert_eq!(london.to_vec().unwrap(), vec!["AROUT", "SEVES", "EASTC"]);
//! assert_eq!(london.count().unwrap(), 3);
//! ```

pub mod data;
pub mod error;
pub mod options;
pub mod query;
pub mod samples;

pub use data::{Customer, DataSource, Order, Product, Supplier};
pub use error::{BoxError, QueryError};
pub use options::{OutputFormat, RunOptions};
pub use query::{
    from_collection, from_values, Direction, Flow, Grouping, Numeric, OrderKey, Query, Sequence,
    StageKind,
};
pub use samples::{Sample, SampleInfo, SampleReport};

/// Result type for lazyqlib operations
pub type Result<T> = std::result::Result<T, QueryError>;
