//! Named sample queries and the runner that drains them.
//!
//! Each [`Sample`] pairs catalog metadata with a function building its
//! pipeline over a [`DataSource`]. [`run`] drains one sample into a
//! [`SampleReport`], honouring the row limit in [`RunOptions`].
//!
//! ## Example
//!
//! ```rust
//! use lazyqlib::data::DataSource;
//! use lazyqlib::options::RunOptions;
//! use lazyqlib::samples;
//!
//! let source = DataSource::builtin().unwrap();
//! let sample = samples::find("linq1").unwrap();
//! let report = samples::run(sample, &source, &RunOptions::new().limit(2)).unwrap();
//!
//! assert_eq!(report.rows, vec![serde_json::json!(4), serde_json::json!(1)]);
//! assert!(report.truncated);
//! ```

pub mod catalog;

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::data::DataSource;
use crate::error::QueryError;
use crate::options::RunOptions;
use crate::query::{from_collection, Flow, Grouping, Query};
use crate::Result;

/// Builds a sample's pipeline. Nothing is evaluated until the query is drained.
pub type BuildQuery = for<'a> fn(&'a DataSource) -> Query<'a, Value>;

/// A named, categorised sample query.
#[derive(Clone, Copy)]
pub struct Sample {
    pub id: &'static str,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub build: BuildQuery,
}

impl Sample {
    /// Metadata without the query builder, for listings.
    pub fn info(&self) -> SampleInfo {
        SampleInfo {
            id: self.id,
            category: self.category,
            title: self.title,
            description: self.description,
        }
    }

    /// Build this sample's pipeline over `source`.
    pub fn query<'a>(&self, source: &'a DataSource) -> Query<'a, Value> {
        (self.build)(source)
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Serializable sample metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleInfo {
    pub id: &'static str,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Rows produced by one sample run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub id: String,
    pub title: String,
    pub rows: Vec<Value>,
    /// True when the row limit cut the sequence short
    pub truncated: bool,
}

const RESTRICTION: &str = "Restriction Operators";
const AGGREGATE: &str = "Aggregate Operators";
const JOIN: &str = "Join Operators";
const ORDERING: &str = "Ordering Operators";
const GROUPING: &str = "Grouping Operators";

static SAMPLES: [Sample; 15] = [
    Sample {
        id: "linq1",
        category: RESTRICTION,
        title: "Where - Simple 1",
        description: "Numbers less than 5, in input order.",
        build: catalog::low_numbers,
    },
    Sample {
        id: "linq2",
        category: RESTRICTION,
        title: "Where - Simple 2",
        description: "Products that are in stock.",
        build: catalog::products_in_stock,
    },
    Sample {
        id: "linq3",
        category: RESTRICTION,
        title: "Where - Simple 3",
        description: "Customers located in London.",
        build: catalog::london_customers,
    },
    Sample {
        id: "linq5",
        category: AGGREGATE,
        title: "Sum - Projection",
        description: "Customers whose orders sum to more than 5000.",
        build: catalog::big_spenders,
    },
    Sample {
        id: "linq7",
        category: JOIN,
        title: "Join - Composite Key",
        description: "Customers and suppliers sharing a city and country.",
        build: catalog::local_suppliers,
    },
    Sample {
        id: "linq6",
        category: AGGREGATE,
        title: "Max - Projection",
        description: "Customers with an order above 5000.",
        build: catalog::large_orders,
    },
    Sample {
        id: "linq8",
        category: AGGREGATE,
        title: "Min - Projection",
        description: "Date of each customer's first order.",
        build: catalog::first_orders,
    },
    Sample {
        id: "linq9",
        category: ORDERING,
        title: "OrderBy - Multiple Keys",
        description: "First orders sorted by year, month, total descending and name.",
        build: catalog::first_orders_sorted,
    },
    Sample {
        id: "linq10",
        category: RESTRICTION,
        title: "Where - Pattern Match",
        description: "Customers with a non-numeric postal code, no region or no area code.",
        build: catalog::incomplete_contacts,
    },
    Sample {
        id: "linq11",
        category: GROUPING,
        title: "GroupBy - Nested",
        description: "Products grouped by category and units in stock.",
        build: catalog::products_by_stock,
    },
    Sample {
        id: "linq12",
        category: ORDERING,
        title: "OrderBy - Computed Key",
        description: "Products labelled Cheap, Average or Expensive by unit price.",
        build: catalog::products_by_price,
    },
    Sample {
        id: "linq13",
        category: GROUPING,
        title: "GroupBy - City Averages",
        description: "Average order total and orders per customer for each city.",
        build: catalog::city_activity,
    },
    Sample {
        id: "linq14",
        category: GROUPING,
        title: "GroupBy - Monthly Activity",
        description: "Orders per calendar month for each customer.",
        build: catalog::monthly_activity,
    },
    Sample {
        id: "linq15",
        category: GROUPING,
        title: "GroupBy - Yearly Activity",
        description: "Orders per year for each customer.",
        build: catalog::yearly_activity,
    },
    Sample {
        id: "linq16",
        category: GROUPING,
        title: "GroupBy - Year and Month",
        description: "Orders per year and month for each customer.",
        build: catalog::year_month_activity,
    },
];

/// Every sample, in catalog order.
pub fn catalog() -> &'static [Sample] {
    &SAMPLES
}

/// Look up a sample by id, ignoring case.
pub fn find(id: &str) -> Result<&'static Sample> {
    SAMPLES
        .iter()
        .find(|sample| sample.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| QueryError::UnknownSample(id.to_string()))
}

/// Samples grouped by category, categories in catalog order.
pub fn by_category() -> Result<Vec<Grouping<&'static str, &'static Sample>>> {
    from_collection(catalog())
        .group_by(|sample| sample.category)
        .to_vec()
}

/// Drain `sample` over `source`.
///
/// With a limit, draining stops once one row past the limit has been seen;
/// that row is dropped and the report is marked truncated.
pub fn run(sample: &Sample, source: &DataSource, options: &RunOptions) -> Result<SampleReport> {
    let mut rows = Vec::new();
    let mut truncated = false;

    sample.query(source).for_each(|row| {
        if options.limit.is_some_and(|limit| rows.len() >= limit) {
            truncated = true;
            return Flow::Stop;
        }
        rows.push(row);
        Flow::Continue
    })?;

    debug!(sample = sample.id, rows = rows.len(), truncated, "sample drained");

    Ok(SampleReport {
        id: sample.id.to_string(),
        title: sample.title.to_string(),
        rows,
        truncated,
    })
}
