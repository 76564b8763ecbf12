//! Draining a pipeline into results.
//!
//! Every drain re-runs the whole upstream pipeline. `to_vec` is
//! all-or-nothing; `for_each` hands elements to the caller as they are
//! produced, so the caller keeps whatever it saw before a failure.

use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};
use tracing::debug;

use crate::Result;

use super::sequence::Query;

/// Signal returned by a `for_each` visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Pull the next element
    Continue,
    /// Stop draining; the remaining elements are never produced
    Stop,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

impl<'a, T: 'a> Query<'a, T> {
    /// Drain every element into a vector, or return the first error.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let items = self.pull().collect::<Result<Vec<T>>>()?;
        debug!(rows = items.len(), "materialized sequence");
        Ok(items)
    }

    /// Pull elements one at a time into `visit` until it returns
    /// [`Flow::Stop`] or the sequence ends. Returns how many elements were
    /// visited.
    pub fn for_each<R, F>(&self, mut visit: F) -> Result<usize>
    where
        R: Into<Flow>,
        F: FnMut(T) -> R,
    {
        let mut visited = 0;
        for item in self.pull() {
            let item = item?;
            visited += 1;
            if visit(item).into() == Flow::Stop {
                debug!(visited, "drain stopped by visitor");
                break;
            }
        }
        Ok(visited)
    }
}

/// Serializing a query drains it as a sequence.
impl<'a, T: Serialize + 'a> Serialize for Query<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for item in self.pull() {
            let item = item.map_err(S::Error::custom)?;
            seq.serialize_element(&item)?;
        }
        seq.end()
    }
}
