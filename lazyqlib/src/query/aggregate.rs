//! Terminal numeric aggregates.
//!
//! Each aggregate drains its upstream exactly once and returns a scalar.
//! `min`, `max` and `average` refuse empty input instead of inventing a
//! value; `count` and `sum` are defined for empty input.

use std::cmp::Ordering;
use std::ops::Add;

use tracing::trace;

use crate::error::QueryError;
use crate::Result;

use super::sequence::Query;
use super::stage::StageKind;

/// Values that can be summed and averaged.
pub trait Numeric: Copy + Add<Output = Self> {
    fn zero() -> Self;
    fn to_f64(self) -> f64;

    /// Addition that reports integer overflow as `None`.
    fn checked_add(self, other: Self) -> Option<Self>;
}

macro_rules! impl_numeric_int {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    0
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn checked_add(self, other: Self) -> Option<Self> {
                    <$ty>::checked_add(self, other)
                }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    0.0
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn checked_add(self, other: Self) -> Option<Self> {
                    Some(self + other)
                }
            }
        )*
    };
}

impl_numeric_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_numeric_float!(f32, f64);

impl<'a, T: 'a> Query<'a, T> {
    /// Number of elements. Never fails on empty input.
    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.pull() {
            item?;
            count += 1;
        }
        trace!(count, "count drained");
        Ok(count)
    }

    /// Sum of `extract` over all elements; zero for empty input.
    ///
    /// Integer sums that leave the range of `V` fail with
    /// [`QueryError::Overflow`] instead of wrapping.
    pub fn sum<V, F>(&self, extract: F) -> Result<V>
    where
        V: Numeric,
        F: Fn(&T) -> V,
    {
        let mut total = V::zero();
        for item in self.pull() {
            total = total
                .checked_add(extract(&item?))
                .ok_or_else(|| QueryError::overflow("sum"))?;
        }
        Ok(total)
    }

    /// Arithmetic mean of `extract`. Values are accumulated as `f64`, so
    /// the mean of narrow integers never overflows `V`.
    pub fn average<V, F>(&self, extract: F) -> Result<f64>
    where
        V: Numeric,
        F: Fn(&T) -> V,
    {
        let mut total = 0.0;
        let mut count = 0usize;
        for item in self.pull() {
            total += extract(&item?).to_f64();
            count += 1;
        }
        if count == 0 {
            return Err(QueryError::empty("average"));
        }
        trace!(count, "average drained");
        Ok(total / count as f64)
    }

    /// Smallest value of `extract`.
    pub fn min<V, F>(&self, extract: F) -> Result<V>
    where
        V: PartialOrd,
        F: Fn(&T) -> V,
    {
        self.extreme("min", Ordering::Less, extract)
    }

    /// Largest value of `extract`.
    pub fn max<V, F>(&self, extract: F) -> Result<V>
    where
        V: PartialOrd,
        F: Fn(&T) -> V,
    {
        self.extreme("max", Ordering::Greater, extract)
    }

    /// Keep the first value that no later value beats in direction `wanted`.
    fn extreme<V, F>(&self, operation: &'static str, wanted: Ordering, extract: F) -> Result<V>
    where
        V: PartialOrd,
        F: Fn(&T) -> V,
    {
        let mut best: Option<V> = None;
        for item in self.pull() {
            let value = extract(&item?);
            best = match best {
                None => Some(value),
                Some(current) => match value.partial_cmp(&current) {
                    Some(ordering) if ordering == wanted => Some(value),
                    Some(_) => Some(current),
                    None => {
                        return Err(QueryError::key_mismatch(
                            StageKind::Aggregate,
                            format!("{operation} found values with no defined order"),
                        ))
                    }
                },
            };
        }
        best.ok_or_else(|| QueryError::empty(operation))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::NaiveDate;

    use super::*;
    use crate::query::{from_collection, from_values};

    #[derive(Debug)]
    struct Order {
        date: NaiveDate,
        total: f64,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn orders() -> Vec<Order> {
        vec![
            Order {
                date: date(1997, 8, 25),
                total: 814.5,
            },
            Order {
                date: date(1996, 10, 3),
                total: 878.0,
            },
            Order {
                date: date(1998, 1, 15),
                total: 330.0,
            },
        ]
    }

    #[test]
    fn test_sum_and_count() {
        let orders = orders();
        let query = from_collection(&orders);
        assert_eq!(query.sum(|o| o.total).unwrap(), 2022.5);
        assert_eq!(query.count().unwrap(), 3);
    }

    #[test]
    fn test_min_max_on_dates() {
        let orders = orders();
        let query = from_collection(&orders);
        assert_eq!(query.min(|o| o.date).unwrap(), date(1996, 10, 3));
        assert_eq!(query.max(|o| o.date).unwrap(), date(1998, 1, 15));
        assert_eq!(query.max(|o| o.total).unwrap(), 878.0);
    }

    #[test]
    fn test_average_uses_float_division() {
        let counts = from_values(vec![1u32, 2]);
        assert_eq!(counts.average(|c| *c).unwrap(), 1.5);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<Order> = Vec::new();
        let query = from_collection(&empty);
        assert_eq!(query.count().unwrap(), 0);
        assert_eq!(query.sum(|o| o.total).unwrap(), 0.0);
        assert!(matches!(
            query.average(|o| o.total),
            Err(QueryError::EmptySequence {
                operation: "average"
            })
        ));
        assert!(matches!(
            query.min(|o| o.date),
            Err(QueryError::EmptySequence { operation: "min" })
        ));
        assert!(matches!(
            query.max(|o| o.date),
            Err(QueryError::EmptySequence { operation: "max" })
        ));
    }

    #[test]
    fn test_aggregates_drain_once() {
        let pulls = Cell::new(0);
        let query = from_values(vec![3, 1, 2]).filter(|_| {
            pulls.set(pulls.get() + 1);
            true
        });
        assert_eq!(query.max(|v| *v).unwrap(), 3);
        assert_eq!(pulls.get(), 3);
    }

    #[test]
    fn test_min_keeps_first_of_equal_values() {
        let pairs = vec![(1, 'a'), (0, 'b'), (0, 'c')];
        let query = from_values(pairs);
        assert_eq!(query.min(|p| p.0).unwrap(), 0);
    }

    #[test]
    fn test_unordered_values_raise_key_mismatch() {
        let err = from_values(vec![1.0, f64::NAN]).max(|v| *v).unwrap_err();
        assert!(matches!(
            err,
            QueryError::KeyMismatch {
                stage: StageKind::Aggregate,
                ..
            }
        ));
    }

    #[test]
    fn test_upstream_errors_abort_aggregate() {
        let err = from_values(vec![1, 2, 3])
            .try_filter(|v| if *v == 2 { Err("two") } else { Ok(true) })
            .sum(|v| *v)
            .unwrap_err();
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_average_of_narrow_integers_does_not_overflow() {
        let stock = from_values(vec![200u8, 100]);
        assert_eq!(stock.average(|v| *v).unwrap(), 150.0);
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let err = from_values(vec![i32::MAX, 1]).sum(|v| *v).unwrap_err();
        assert!(matches!(err, QueryError::Overflow { operation: "sum" }));
        assert_eq!(err.to_string(), "sum overflowed");
        assert_eq!(from_values(vec![250u8, 5]).sum(|v| *v).unwrap(), 255);
    }
}
