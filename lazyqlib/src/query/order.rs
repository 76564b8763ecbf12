//! Stable multi-key ordering.
//!
//! An [`OrderKey`] is an ordered list of key extractors, each with a
//! [`Direction`]. Two elements are compared key by key until one differs;
//! if every key ties, the elements keep their upstream relative order.
//! A descending key reverses the comparison, never the emission order of
//! tied elements.
//!
//! Keys are extracted once per buffered element before sorting starts, so
//! an extractor runs `n` times per key rather than once per comparison.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{BoxError, QueryError};
use crate::Result;

use super::sequence::{failed, Pull, Query, Sequence};
use super::stage::StageKind;

/// Runs at or below this length are insertion sorted.
const INSERTION_RUN: usize = 12;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl Direction {
    /// Apply this direction to a natural-order comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Compares two buffered elements by position.
type Rank<'a> = Box<dyn Fn(usize, usize) -> Option<Ordering> + 'a>;

/// Extracts one key per buffered element and returns its position comparator.
type Prepare<'a, T> = Rc<dyn Fn(&[T]) -> Result<Rank<'a>> + 'a>;

struct SortKey<'a, T> {
    prepare: Prepare<'a, T>,
    direction: Direction,
}

impl<'a, T> Clone for SortKey<'a, T> {
    fn clone(&self) -> Self {
        Self {
            prepare: Rc::clone(&self.prepare),
            direction: self.direction,
        }
    }
}

/// Keys of one buffered sequence, extracted once per element.
pub(crate) struct Ranking<'a> {
    ranks: Vec<(Rank<'a>, Direction)>,
}

impl<'a> Ranking<'a> {
    /// Compare the elements at positions `a` and `b` key by key.
    pub(crate) fn compare(&self, a: usize, b: usize) -> Result<Ordering> {
        for (index, (rank, direction)) in self.ranks.iter().enumerate() {
            match rank(a, b) {
                Some(Ordering::Equal) => continue,
                Some(ordering) => return Ok(direction.apply(ordering)),
                None => {
                    return Err(QueryError::key_mismatch(
                        StageKind::OrderBy,
                        format!("sort key {index} produced values with no defined order"),
                    ))
                }
            }
        }
        Ok(Ordering::Equal)
    }
}

/// Ordered list of `(extractor, direction)` pairs.
pub struct OrderKey<'a, T> {
    keys: Vec<SortKey<'a, T>>,
}

impl<'a, T> Default for OrderKey<'a, T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<'a, T> Clone for OrderKey<'a, T> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<'a, T> fmt::Debug for OrderKey<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|key| key.direction))
            .finish()
    }
}

impl<'a, T> OrderKey<'a, T> {
    /// Create an empty key list. Ordering by it keeps upstream order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key list with a single key.
    pub fn by<K, F>(extract: F, direction: Direction) -> Self
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> K + 'a,
    {
        Self::new().then(extract, direction)
    }

    /// Builder: append a key that breaks ties left by the previous ones.
    pub fn then<K, F>(self, extract: F, direction: Direction) -> Self
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.try_then(move |item: &T| Ok::<_, Infallible>(extract(item)), direction)
    }

    /// Builder: append a key whose extractor may fail. A failure aborts the
    /// sort with an evaluation error tagged `order_by`, positioned within the
    /// sorted input.
    pub fn try_then<K, F, E>(mut self, extract: F, direction: Direction) -> Self
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> std::result::Result<K, E> + 'a,
        E: Into<BoxError>,
    {
        let prepare = move |items: &[T]| -> Result<Rank<'a>> {
            let keys = items
                .iter()
                .enumerate()
                .map(|(position, item)| {
                    extract(item).map_err(|source| {
                        QueryError::evaluation(StageKind::OrderBy, position, source)
                    })
                })
                .collect::<Result<Vec<K>>>()?;
            Ok(Box::new(move |a: usize, b: usize| {
                keys[a].partial_cmp(&keys[b])
            }))
        };
        self.keys.push(SortKey {
            prepare: Rc::new(prepare),
            direction,
        });
        self
    }

    /// Builder: append an ascending key.
    pub fn ascending<K, F>(self, extract: F) -> Self
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.then(extract, Direction::Ascending)
    }

    /// Builder: append a descending key.
    pub fn descending<K, F>(self, extract: F) -> Self
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.then(extract, Direction::Descending)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Extract every key of `items` once, in key order then element order.
    pub(crate) fn rank(&self, items: &[T]) -> Result<Ranking<'a>> {
        let ranks = self
            .keys
            .iter()
            .map(|key| (key.prepare)(items).map(|rank| (rank, key.direction)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Ranking { ranks })
    }
}

/// Stage that buffers its upstream and emits it in key order.
pub struct OrderBy<'a, T> {
    upstream: Query<'a, T>,
    keys: OrderKey<'a, T>,
}

impl<'a, T: 'a> Sequence<'a, T> for OrderBy<'a, T> {
    fn pull(&self) -> Pull<'a, T> {
        let items = match self.upstream.pull().collect::<Result<Vec<T>>>() {
            Ok(items) => items,
            Err(err) => return failed(err),
        };
        debug!(rows = items.len(), keys = self.keys.len(), "sorting sequence");

        let ranking = match self.keys.rank(&items) {
            Ok(ranking) => ranking,
            Err(err) => return failed(err),
        };
        match stable_sort(items, |a, b| ranking.compare(a, b)) {
            Ok(sorted) => Box::new(sorted.into_iter().map(Ok)),
            Err(err) => failed(err),
        }
    }
}

impl<'a, T: 'a> Query<'a, T> {
    /// Reorder all elements by `keys`. Ties on every key keep upstream order.
    pub fn order_by(&self, keys: OrderKey<'a, T>) -> Query<'a, T> {
        Query::from_stage(OrderBy {
            upstream: self.clone(),
            keys,
        })
    }

    /// Shorthand for ordering by a single key.
    pub fn order_by_key<K, F>(&self, extract: F, direction: Direction) -> Query<'a, T>
    where
        K: PartialOrd + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.order_by(OrderKey::by(extract, direction))
    }
}

/// Stable merge sort with a fallible comparator over input positions.
///
/// Sorts a permutation of positions and then moves the elements into place,
/// so elements are never compared after being moved.
pub(crate) fn stable_sort<T, F>(items: Vec<T>, mut compare: F) -> Result<Vec<T>>
where
    F: FnMut(usize, usize) -> Result<Ordering>,
{
    let mut order: Vec<usize> = (0..items.len()).collect();
    let mut scratch = Vec::with_capacity(items.len());
    merge_sort(&mut order, &mut scratch, &mut compare)?;

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|position| slots[position].take())
        .collect())
}

fn merge_sort<F>(order: &mut [usize], scratch: &mut Vec<usize>, compare: &mut F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<Ordering>,
{
    let len = order.len();
    if len <= INSERTION_RUN {
        return insertion_sort(order, compare);
    }

    let mid = len / 2;
    merge_sort(&mut order[..mid], scratch, compare)?;
    merge_sort(&mut order[mid..], scratch, compare)?;

    scratch.clear();
    let (mut i, mut j) = (0, mid);
    while i < mid && j < len {
        // Only take from the right run when strictly smaller.
        if compare(order[j], order[i])? == Ordering::Less {
            scratch.push(order[j]);
            j += 1;
        } else {
            scratch.push(order[i]);
            i += 1;
        }
    }
    scratch.extend_from_slice(&order[i..mid]);
    scratch.extend_from_slice(&order[j..]);
    order.copy_from_slice(scratch);
    Ok(())
}

fn insertion_sort<F>(order: &mut [usize], compare: &mut F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<Ordering>,
{
    for i in 1..order.len() {
        let mut j = i;
        while j > 0 && compare(order[j - 1], order[j])? == Ordering::Greater {
            order.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}
