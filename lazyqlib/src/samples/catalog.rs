//! The sample queries.
//!
//! Every query builds a pipeline over the [`DataSource`] and ends in a
//! projection to `serde_json::Value`, so the runner can treat them
//! uniformly. Records are typed per query and named after what they hold.

use chrono::{Datelike, Month, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::data::{Customer, DataSource, Order, Product};
use crate::error::{BoxError, QueryError};
use crate::query::{from_collection, Direction, OrderKey, Query};

static NUMBERS: [i32; 10] = [5, 4, 1, 3, 9, 8, 6, 7, 2, 0];

/// Final stage shared by all samples.
fn rows<'a, T: Serialize + 'a>(query: Query<'a, T>) -> Query<'a, Value> {
    query.try_project(|row| serde_json::to_value(row))
}

fn month_name(month: u32) -> Result<&'static str, BoxError> {
    let number = u8::try_from(month)?;
    let month = Month::try_from(number).map_err(|_| format!("month {number} is out of range"))?;
    Ok(month.name())
}

fn price_bucket(price: f64) -> &'static str {
    if price < 40.0 {
        "Cheap"
    } else if price < 80.0 {
        "Average"
    } else {
        "Expensive"
    }
}

#[derive(Debug, Serialize)]
struct CustomerRow {
    customer_id: String,
    company_name: String,
    city: String,
    country: String,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            customer_id: c.customer_id.clone(),
            company_name: c.company_name.clone(),
            city: c.city.clone(),
            country: c.country.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CustomerTotal {
    id: String,
    sum: f64,
}

#[derive(Debug, Serialize)]
struct Neighbour {
    customer_id: String,
    supplier_name: String,
    country: String,
    city: String,
}

#[derive(Debug, Serialize)]
struct CustomerMaxOrder {
    id: String,
    order_price: f64,
}

#[derive(Debug, Serialize)]
struct CustomerFirstOrder {
    id: String,
    order_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct FirstOrderTotal {
    id: String,
    company_name: String,
    order_date: NaiveDate,
    total: f64,
    #[serde(skip)]
    first_year: i32,
    #[serde(skip)]
    first_month: u32,
}

#[derive(Debug, Serialize)]
struct ContactGap {
    company_name: String,
    postal_code: Option<String>,
    region: Option<String>,
    phone: String,
}

#[derive(Debug, Serialize)]
struct StockedProduct {
    category: String,
    units_in_stock: u32,
    product_name: String,
    unit_price: f64,
}

#[derive(Debug, Serialize)]
struct PricedProduct {
    product_id: u32,
    category: String,
    unit_price: f64,
    price: &'static str,
}

#[derive(Debug, Serialize)]
struct CityActivity {
    city: String,
    average_income: Option<f64>,
    average_intensity: f64,
}

#[derive(Debug, Serialize)]
struct CustomerActivity<'a, A: 'a> {
    company_name: String,
    activity: Query<'a, A>,
}

#[derive(Debug, Serialize)]
struct MonthCount {
    month: &'static str,
    orders: usize,
}

#[derive(Debug, Serialize)]
struct YearCount {
    year: i32,
    orders: usize,
}

#[derive(Debug, Serialize)]
struct YearMonthCount {
    year: i32,
    month: &'static str,
    orders: usize,
}

/// Numbers below five, in input order.
pub fn low_numbers(_: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&NUMBERS).filter(|n| **n < 5))
}

/// Products with at least one unit in stock.
pub fn products_in_stock(source: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&source.products).filter(|p| p.units_in_stock > 0))
}

/// Customers located in London.
pub fn london_customers(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.customers)
            .filter(|c| c.city == "London")
            .project(|c| CustomerRow::from(*c)),
    )
}

/// Customers whose orders add up to more than 5000.
pub fn big_spenders(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.customers)
            .try_project(|c| {
                Ok::<_, QueryError>(CustomerTotal {
                    id: c.customer_id.clone(),
                    sum: from_collection(&c.orders).sum(|o| o.total)?,
                })
            })
            .filter(|t| t.sum > 5000.0),
    )
}

/// Customer and supplier pairs sharing a city and country.
pub fn local_suppliers(source: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&source.suppliers).join(
        &from_collection(&source.customers),
        |s| (s.city.clone(), s.country.clone()),
        |c| (c.city.clone(), c.country.clone()),
        |s, c| Neighbour {
            customer_id: c.customer_id.clone(),
            supplier_name: s.supplier_name.clone(),
            country: s.country.clone(),
            city: s.city.clone(),
        },
    ))
}

/// Customers with at least one order above 5000.
pub fn large_orders(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.customers)
            .filter(|c| !c.orders.is_empty())
            .try_project(|c| {
                Ok::<_, QueryError>(CustomerMaxOrder {
                    id: c.customer_id.clone(),
                    order_price: from_collection(&c.orders).max(|o| o.total)?,
                })
            })
            .filter(|m| m.order_price > 5000.0),
    )
}

/// Customers with the date of their first order.
pub fn first_orders(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.customers)
            .filter(|c| !c.orders.is_empty())
            .try_project(|c| {
                Ok::<_, QueryError>(CustomerFirstOrder {
                    id: c.customer_id.clone(),
                    order_date: from_collection(&c.orders).min(|o| o.order_date)?,
                })
            }),
    )
}

/// First orders sorted by year, month, total (descending) and company name.
///
/// Year and month are the smallest year and the smallest month found among
/// the customer's orders, taken independently.
pub fn first_orders_sorted(source: &DataSource) -> Query<'_, Value> {
    let keys = OrderKey::new()
        .ascending(|r: &FirstOrderTotal| r.first_year)
        .ascending(|r: &FirstOrderTotal| r.first_month)
        .descending(|r: &FirstOrderTotal| r.total)
        .ascending(|r: &FirstOrderTotal| r.company_name.clone());

    rows(
        from_collection(&source.customers)
            .filter(|c| !c.orders.is_empty())
            .try_project(|c| {
                let orders = from_collection(&c.orders);
                Ok::<_, QueryError>(FirstOrderTotal {
                    id: c.customer_id.clone(),
                    company_name: c.company_name.clone(),
                    order_date: orders.min(|o| o.order_date)?,
                    total: orders.sum(|o| o.total)?,
                    first_year: orders.min(|o| o.order_date.year())?,
                    first_month: orders.min(|o| o.order_date.month())?,
                })
            })
            .order_by(keys),
    )
}

/// Customers with a non-numeric postal code, no region, or a phone number
/// without an area code.
pub fn incomplete_contacts(source: &DataSource) -> Query<'_, Value> {
    let letters = Regex::new("[A-Za-z]");
    rows(
        from_collection(&source.customers)
            .try_filter(move |c| {
                let letters = letters.as_ref().map_err(Clone::clone)?;
                Ok::<_, regex::Error>(
                    c.postal_code
                        .as_deref()
                        .map_or(true, |code| letters.is_match(code))
                        || c.region.is_none()
                        || !c.phone.starts_with('('),
                )
            })
            .project(|c| ContactGap {
                company_name: c.company_name.clone(),
                postal_code: c.postal_code.clone(),
                region: c.region.clone(),
                phone: c.phone.clone(),
            }),
    )
}

/// Products grouped by category, then by units in stock within the
/// category (ordered by stock and price), then regrouped by category.
pub fn products_by_stock(source: &DataSource) -> Query<'_, Value> {
    let nested = from_collection(&source.products)
        .group_by(|p| p.category.clone())
        .flat_map(|category| {
            category
                .query()
                .order_by(
                    OrderKey::new()
                        .ascending(|p: &&Product| p.units_in_stock)
                        .ascending(|p: &&Product| p.unit_price),
                )
                .group_by(|p| (p.category.clone(), p.units_in_stock))
        })
        .group_by(|stock| stock.key().0.clone());

    rows(
        nested
            .flat_map(|category| category.query().flat_map(|stock| stock.query()))
            .project(|p| StockedProduct {
                category: p.category.clone(),
                units_in_stock: p.units_in_stock,
                product_name: p.product_name.clone(),
                unit_price: p.unit_price,
            }),
    )
}

/// Products labelled Cheap, Average or Expensive, ordered by label.
pub fn products_by_price(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.products)
            .project(|p| PricedProduct {
                product_id: p.product_id,
                category: p.category.clone(),
                unit_price: p.unit_price,
                price: price_bucket(p.unit_price),
            })
            .order_by_key(|p| p.price, Direction::Ascending),
    )
}

/// Per city, the average order total and the average number of orders per
/// customer. Cities without orders have no average income.
pub fn city_activity(source: &DataSource) -> Query<'_, Value> {
    rows(
        from_collection(&source.customers)
            .group_by(|c| c.city.clone())
            .try_project(|city| {
                let orders = city.query().flat_map(|c| from_collection(&c.orders));
                let average_income = match orders.average(|o| o.total) {
                    Ok(average) => Some(average),
                    Err(QueryError::EmptySequence { .. }) => None,
                    Err(err) => return Err(err),
                };
                Ok(CityActivity {
                    city: city.key().clone(),
                    average_income,
                    average_intensity: city.query().average(|c| c.orders.len())?,
                })
            }),
    )
}

/// Per customer, the number of orders placed in each calendar month.
pub fn monthly_activity(source: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&source.customers).project(|c| CustomerActivity {
        company_name: c.company_name.clone(),
        activity: from_collection(&c.orders)
            .order_by_key(|o| o.order_date.month(), Direction::Ascending)
            .group_by(|o| o.order_date.month())
            .try_project(|month| {
                Ok::<_, BoxError>(MonthCount {
                    month: month_name(*month.key())?,
                    orders: month.len(),
                })
            }),
    }))
}

/// Per customer, the number of orders placed in each year.
pub fn yearly_activity(source: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&source.customers).project(|c| CustomerActivity {
        company_name: c.company_name.clone(),
        activity: from_collection(&c.orders)
            .order_by_key(|o| o.order_date.year(), Direction::Ascending)
            .group_by(|o| o.order_date.year())
            .project(|year| YearCount {
                year: *year.key(),
                orders: year.len(),
            }),
    }))
}

/// Per customer, the number of orders placed in each year and month.
pub fn year_month_activity(source: &DataSource) -> Query<'_, Value> {
    rows(from_collection(&source.customers).project(|c| CustomerActivity {
        company_name: c.company_name.clone(),
        activity: from_collection(&c.orders)
            .order_by(
                OrderKey::new()
                    .ascending(|o: &&Order| o.order_date.year())
                    .ascending(|o: &&Order| o.order_date.month()),
            )
            .group_by(|o| (o.order_date.year(), o.order_date.month()))
            .try_project(|period| {
                let (year, month) = *period.key();
                Ok::<_, BoxError>(YearMonthCount {
                    year,
                    month: month_name(month)?,
                    orders: period.len(),
                })
            }),
    }))
}
