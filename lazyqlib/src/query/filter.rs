//! Element-wise stages: filter, project and flat_map.
//!
//! These stages are fully streaming; each upstream element is examined once
//! per drain and nothing is buffered.

use std::convert::Infallible;
use std::rc::Rc;

use crate::error::{BoxError, QueryError};

use super::sequence::{failed, Pull, Query, Sequence};
use super::stage::StageKind;

type Predicate<'a, T> = Rc<dyn Fn(&T) -> Result<bool, BoxError> + 'a>;
type Transform<'a, T, U> = Rc<dyn Fn(&T) -> Result<U, BoxError> + 'a>;
type Expand<'a, T, U> = Rc<dyn Fn(&T) -> Query<'a, U> + 'a>;

/// Keeps upstream elements accepted by a predicate.
pub struct Filter<'a, T> {
    upstream: Query<'a, T>,
    predicate: Predicate<'a, T>,
}

impl<'a, T: 'a> Sequence<'a, T> for Filter<'a, T> {
    fn pull(&self) -> Pull<'a, T> {
        let predicate = Rc::clone(&self.predicate);
        Box::new(
            self.upstream
                .pull()
                .enumerate()
                .filter_map(move |(position, item)| {
                    let item = match item {
                        Ok(item) => item,
                        Err(err) => return Some(Err(err)),
                    };
                    match predicate(&item) {
                        Ok(true) => Some(Ok(item)),
                        Ok(false) => None,
                        Err(source) => Some(Err(QueryError::evaluation(
                            StageKind::Filter,
                            position,
                            source,
                        ))),
                    }
                }),
        )
    }
}

/// One-to-one mapping of upstream elements.
pub struct Project<'a, T, U> {
    upstream: Query<'a, T>,
    transform: Transform<'a, T, U>,
}

impl<'a, T: 'a, U: 'a> Sequence<'a, U> for Project<'a, T, U> {
    fn pull(&self) -> Pull<'a, U> {
        let transform = Rc::clone(&self.transform);
        Box::new(
            self.upstream
                .pull()
                .enumerate()
                .map(move |(position, item)| {
                    let item = item?;
                    transform(&item).map_err(|source| {
                        QueryError::evaluation(StageKind::Project, position, source)
                    })
                }),
        )
    }
}

/// Expands each upstream element into a sub-query and concatenates them.
pub struct FlatMap<'a, T, U> {
    upstream: Query<'a, T>,
    expand: Expand<'a, T, U>,
}

impl<'a, T: 'a, U: 'a> Sequence<'a, U> for FlatMap<'a, T, U> {
    fn pull(&self) -> Pull<'a, U> {
        let expand = Rc::clone(&self.expand);
        Box::new(self.upstream.pull().flat_map(move |item| match item {
            Ok(item) => expand(&item).pull(),
            Err(err) => failed(err),
        }))
    }
}

impl<'a, T: 'a> Query<'a, T> {
    /// Keep elements for which `predicate` returns true, in upstream order.
    pub fn filter<F>(&self, predicate: F) -> Query<'a, T>
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.try_filter(move |item| Ok::<_, Infallible>(predicate(item)))
    }

    /// Like [`Query::filter`], but the predicate may fail. A failure aborts
    /// the drain with an evaluation error carrying the element's position.
    pub fn try_filter<F, E>(&self, predicate: F) -> Query<'a, T>
    where
        F: Fn(&T) -> Result<bool, E> + 'a,
        E: Into<BoxError>,
    {
        Query::from_stage(Filter {
            upstream: self.clone(),
            predicate: Rc::new(move |item: &T| predicate(item).map_err(Into::into)),
        })
    }

    /// Map every element through `transform`.
    pub fn project<U, F>(&self, transform: F) -> Query<'a, U>
    where
        U: 'a,
        F: Fn(&T) -> U + 'a,
    {
        self.try_project(move |item| Ok::<_, Infallible>(transform(item)))
    }

    /// Like [`Query::project`], but the transform may fail.
    pub fn try_project<U, F, E>(&self, transform: F) -> Query<'a, U>
    where
        U: 'a,
        F: Fn(&T) -> Result<U, E> + 'a,
        E: Into<BoxError>,
    {
        Query::from_stage(Project {
            upstream: self.clone(),
            transform: Rc::new(move |item: &T| transform(item).map_err(Into::into)),
        })
    }

    /// Replace every element by the elements of the sub-query built from it.
    pub fn flat_map<U, F>(&self, expand: F) -> Query<'a, U>
    where
        U: 'a,
        F: Fn(&T) -> Query<'a, U> + 'a,
    {
        Query::from_stage(FlatMap {
            upstream: self.clone(),
            expand: Rc::new(expand),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::query::{from_collection, from_values};

    const NUMBERS: [i32; 10] = [5, 4, 1, 3, 9, 8, 6, 7, 2, 0];

    #[test]
    fn test_filter_low_numbers() {
        let low: Vec<i32> = from_collection(&NUMBERS)
            .filter(|n| **n < 5)
            .to_vec()
            .unwrap()
            .into_iter()
            .copied()
            .collect();
        assert_eq!(low, vec![4, 1, 3, 2, 0]);
    }

    #[test]
    fn test_filter_partitions_input() {
        let kept = from_collection(&NUMBERS)
            .filter(|n| **n % 3 == 0)
            .to_vec()
            .unwrap();
        assert!(kept.iter().all(|n| **n % 3 == 0));
        let dropped = NUMBERS.iter().filter(|n| !kept.contains(n));
        assert!(dropped.into_iter().all(|n| n % 3 != 0));
        assert_eq!(kept, vec![&3, &9, &6, &0]);
    }

    #[test]
    fn test_filter_is_deferred_and_re_evaluated() {
        let calls = Cell::new(0);
        let query = from_collection(&NUMBERS).filter(|n| {
            calls.set(calls.get() + 1);
            **n > 5
        });
        assert_eq!(calls.get(), 0);

        query.to_vec().unwrap();
        assert_eq!(calls.get(), 10);
        query.to_vec().unwrap();
        assert_eq!(calls.get(), 20);
    }

    #[test]
    fn test_try_filter_reports_position() {
        let err = from_collection(&NUMBERS)
            .try_filter(|n| {
                if **n == 9 {
                    Err("nine is not allowed")
                } else {
                    Ok(true)
                }
            })
            .to_vec()
            .unwrap_err();

        match err {
            QueryError::Evaluation {
                stage, position, ..
            } => {
                assert_eq!(stage, StageKind::Filter);
                assert_eq!(position, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_project_is_one_to_one() {
        let doubled = from_collection(&NUMBERS).project(|n| **n * 2).to_vec().unwrap();
        assert_eq!(doubled.len(), NUMBERS.len());
        for (i, value) in doubled.iter().enumerate() {
            assert_eq!(*value, NUMBERS[i] * 2);
        }
    }

    #[test]
    fn test_project_position_is_relative_to_stage_input() {
        let err = from_collection(&NUMBERS)
            .filter(|n| **n < 5)
            .try_project(|n| {
                if **n == 2 {
                    Err(format!("cannot project {n}"))
                } else {
                    Ok(**n)
                }
            })
            .to_vec()
            .unwrap_err();
        assert_eq!(err.stage(), Some(StageKind::Project));
        // [4, 1, 3, 2, 0] -> 2 sits at index 3
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn test_upstream_error_passes_through_unchanged() {
        let err = from_collection(&NUMBERS)
            .try_filter(|n| if **n == 1 { Err("bad") } else { Ok(true) })
            .project(|n| **n + 1)
            .to_vec()
            .unwrap_err();
        assert_eq!(err.stage(), Some(StageKind::Filter));
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_project_into_nested_query() {
        let words = ["ab", "cde"];
        let letters = from_collection(&words)
            .project(|w| from_values(w.chars().collect::<Vec<_>>()))
            .to_vec()
            .unwrap();
        assert_eq!(letters[1].count().unwrap(), 3);
    }

    #[test]
    fn test_flat_map_concatenates_in_order() {
        let words = ["ab", "", "cde"];
        let letters = from_collection(&words)
            .flat_map(|w| from_values(w.chars().collect::<Vec<_>>()))
            .to_vec()
            .unwrap();
        assert_eq!(letters, vec!['a', 'b', 'c', 'd', 'e']);
    }
}
