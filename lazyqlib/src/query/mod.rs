//! Lazy query pipelines: source, operators, and materialization.
//!
//! A pipeline starts at a source ([`from_collection`], [`from_values`]) and
//! grows one stage per operator call. Nothing runs until a terminal call
//! (`to_vec`, `for_each`, or an aggregate) pulls from the last stage:
//!
//! - **Streaming stages**: `filter`, `project`, `flat_map`
//! - **Buffering stages**: `join` (right side), `group_by`, `order_by`
//! - **Terminals**: `to_vec`, `for_each`, `count`, `sum`, `min`, `max`, `average`
//!
//! ## Example
//!
//! ```rust
//! use lazyqlib::query::{from_collection, Direction, OrderKey};
//!
//! let numbers = [5, 4, 1, 3, 9, 8, 6, 7, 2, 0];
//! let low = from_collection(&numbers).filter(|n| **n < 5);
//! let sorted = low.order_by(OrderKey::by(|n: &&i32| **n, Direction::Descending));
//!
//! assert_eq!(sorted.to_vec().unwrap(), vec![&4, &3, &2, &1, &0]);
//! assert_eq!(low.sum(|n| **n).unwrap(), 10);
//! ```

pub mod aggregate;
pub mod filter;
pub mod group;
pub mod join;
pub mod materialize;
pub mod order;
pub mod sequence;
pub mod stage;

pub use aggregate::Numeric;
pub use group::Grouping;
pub use materialize::Flow;
pub use order::{Direction, OrderKey};
pub use sequence::{from_collection, from_values, Pull, Query, Sequence};
pub use stage::StageKind;
