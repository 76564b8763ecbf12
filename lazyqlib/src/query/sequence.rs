//! Lazy sequences and the `Query` handle that chains stages together.
//!
//! A [`Sequence`] is anything that can hand out a fresh pull-based iterator
//! over its elements. Every call to [`Sequence::pull`] starts a new
//! evaluation of the whole upstream pipeline; nothing is cached between
//! drains.
//!
//! [`Query`] is the shared, cheaply cloneable handle to a stage. Operators
//! are inherent methods on `Query` (spread across the sibling modules), each
//! returning a new `Query` that wraps the previous one.

use std::fmt;
use std::rc::Rc;

use crate::error::QueryError;
use crate::Result;

/// Iterator produced by draining one stage.
pub type Pull<'a, T> = Box<dyn Iterator<Item = Result<T>> + 'a>;

/// A finite, lazily evaluated producer of `T`.
pub trait Sequence<'a, T> {
    /// Start a new evaluation, yielding elements in order.
    fn pull(&self) -> Pull<'a, T>;
}

/// Handle to a pipeline stage.
///
/// Cloning a query shares the stage: several downstream stages may read the
/// same upstream without coordination, since no stage mutates its input.
pub struct Query<'a, T> {
    stage: Rc<dyn Sequence<'a, T> + 'a>,
}

impl<'a, T> Clone for Query<'a, T> {
    fn clone(&self) -> Self {
        Self {
            stage: Rc::clone(&self.stage),
        }
    }
}

impl<'a, T> fmt::Debug for Query<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").finish_non_exhaustive()
    }
}

impl<'a, T: 'a> Query<'a, T> {
    /// Wrap a stage into a query handle.
    pub fn from_stage<S>(stage: S) -> Self
    where
        S: Sequence<'a, T> + 'a,
    {
        Self {
            stage: Rc::new(stage),
        }
    }

    /// Start a new evaluation of the pipeline.
    pub fn pull(&self) -> Pull<'a, T> {
        self.stage.pull()
    }
}

impl<'a, T: 'a> Sequence<'a, T> for Query<'a, T> {
    fn pull(&self) -> Pull<'a, T> {
        self.stage.pull()
    }
}

/// A pull that fails immediately with `err`.
pub(crate) fn failed<'a, T: 'a>(err: QueryError) -> Pull<'a, T> {
    Box::new(std::iter::once(Err(err)))
}

/// Source stage over a borrowed slice.
#[derive(Debug)]
pub struct Borrowed<'a, T> {
    items: &'a [T],
}

impl<'a, T: 'a> Sequence<'a, &'a T> for Borrowed<'a, T> {
    fn pull(&self) -> Pull<'a, &'a T> {
        Box::new(self.items.iter().map(Ok))
    }
}

/// Source stage over an owned, shared buffer. Elements are cloned out.
#[derive(Debug)]
pub struct Values<T> {
    items: Rc<[T]>,
}

impl<'a, T: Clone + 'a> Sequence<'a, T> for Values<T> {
    fn pull(&self) -> Pull<'a, T> {
        let items = Rc::clone(&self.items);
        Box::new((0..items.len()).map(move |i| Ok(items[i].clone())))
    }
}

/// Wrap a borrowed collection. Elements are yielded by reference, in order.
pub fn from_collection<'a, T: 'a>(items: &'a [T]) -> Query<'a, &'a T> {
    Query::from_stage(Borrowed { items })
}

/// Take ownership of `items` and yield clones of them on every drain.
pub fn from_values<'a, T, I>(items: I) -> Query<'a, T>
where
    T: Clone + 'a,
    I: IntoIterator<Item = T>,
{
    let items: Rc<[T]> = items.into_iter().collect();
    Query::from_stage(Values { items })
}

impl<'a, T: Clone + 'a> FromIterator<T> for Query<'a, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        from_values(iter)
    }
}
