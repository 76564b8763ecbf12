//! Equi-join of two sequences.
//!
//! Output order is that of a nested loop with the left side outer and the
//! right side inner. The right side is drained into a hash index when the
//! first left element arrives, so an empty left side never reads the right
//! side. Index buckets keep right-side order, so the index never changes
//! what a nested loop would have produced.

use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::Hash;
use std::rc::Rc;

use tracing::debug;

use crate::error::{BoxError, QueryError};
use crate::Result;

use super::sequence::{Pull, Query, Sequence};
use super::stage::StageKind;

type KeyFn<'a, T, K> = Rc<dyn Fn(&T) -> std::result::Result<K, BoxError> + 'a>;

/// Right-side rows and the positions of each key among them.
struct Index<R, K> {
    rows: Vec<R>,
    buckets: HashMap<K, Vec<usize>>,
}

impl<R, K: Eq + Hash> Index<R, K> {
    fn build<'a>(right: &Query<'a, R>, key_of: &KeyFn<'a, R, K>) -> Result<Self>
    where
        R: 'a,
    {
        let rows = right.pull().collect::<Result<Vec<R>>>()?;
        let mut buckets: HashMap<K, Vec<usize>> = HashMap::new();
        for (position, row) in rows.iter().enumerate() {
            let key = key_of(row)
                .map_err(|source| QueryError::evaluation(StageKind::Join, position, source))?;
            buckets.entry(key).or_default().push(position);
        }
        debug!(rows = rows.len(), keys = buckets.len(), "built join index");
        Ok(Self { rows, buckets })
    }
}

/// Inner equi-join stage.
pub struct Join<'a, L, R, K, U> {
    left: Query<'a, L>,
    right: Query<'a, R>,
    left_key: KeyFn<'a, L, K>,
    right_key: KeyFn<'a, R, K>,
    combine: Rc<dyn Fn(&L, &R) -> U + 'a>,
}

impl<'a, L, R, K, U> Sequence<'a, U> for Join<'a, L, R, K, U>
where
    L: 'a,
    R: 'a,
    K: Eq + Hash + 'a,
    U: 'a,
{
    fn pull(&self) -> Pull<'a, U> {
        let right = self.right.clone();
        let right_key = Rc::clone(&self.right_key);
        let left_key = Rc::clone(&self.left_key);
        let combine = Rc::clone(&self.combine);
        let mut index: Option<Index<R, K>> = None;
        let mut broken = false;

        Box::new(
            self.left
                .pull()
                .enumerate()
                .flat_map(move |(position, item)| {
                    if broken {
                        return Vec::new();
                    }
                    let left = match item {
                        Ok(left) => left,
                        Err(err) => return vec![Err(err)],
                    };
                    if index.is_none() {
                        match Index::build(&right, &right_key) {
                            Ok(built) => index = Some(built),
                            Err(err) => {
                                broken = true;
                                return vec![Err(err)];
                            }
                        }
                    }
                    let Some(index) = index.as_ref() else {
                        return Vec::new();
                    };
                    let key = match left_key(&left) {
                        Ok(key) => key,
                        Err(source) => {
                            return vec![Err(QueryError::evaluation(
                                StageKind::Join,
                                position,
                                source,
                            ))]
                        }
                    };
                    match index.buckets.get(&key) {
                        Some(positions) => positions
                            .iter()
                            .map(|&row| Ok(combine(&left, &index.rows[row])))
                            .collect(),
                        None => Vec::new(),
                    }
                }),
        )
    }
}

impl<'a, L: 'a> Query<'a, L> {
    /// Pair every left element with every right element whose key is equal,
    /// left-major and right-minor. Unmatched elements produce nothing.
    pub fn join<R, K, U, LK, RK, C>(
        &self,
        right: &Query<'a, R>,
        left_key: LK,
        right_key: RK,
        combine: C,
    ) -> Query<'a, U>
    where
        R: 'a,
        K: Eq + Hash + 'a,
        U: 'a,
        LK: Fn(&L) -> K + 'a,
        RK: Fn(&R) -> K + 'a,
        C: Fn(&L, &R) -> U + 'a,
    {
        self.try_join(
            right,
            move |item: &L| Ok::<_, Infallible>(left_key(item)),
            move |item: &R| Ok::<_, Infallible>(right_key(item)),
            combine,
        )
    }

    /// Like [`Query::join`], but either key extractor may fail. A failure
    /// becomes an evaluation error tagged `join`, positioned within the side
    /// that produced it.
    pub fn try_join<R, K, U, LK, RK, C, E>(
        &self,
        right: &Query<'a, R>,
        left_key: LK,
        right_key: RK,
        combine: C,
    ) -> Query<'a, U>
    where
        R: 'a,
        K: Eq + Hash + 'a,
        U: 'a,
        LK: Fn(&L) -> std::result::Result<K, E> + 'a,
        RK: Fn(&R) -> std::result::Result<K, E> + 'a,
        C: Fn(&L, &R) -> U + 'a,
        E: Into<BoxError>,
    {
        Query::from_stage(Join {
            left: self.clone(),
            right: right.clone(),
            left_key: Rc::new(move |item: &L| left_key(item).map_err(Into::into)),
            right_key: Rc::new(move |item: &R| right_key(item).map_err(Into::into)),
            combine: Rc::new(combine),
        })
    }
}
