//! Grouping by key.
//!
//! Groups come out in the order their key first appears upstream, and each
//! group keeps the upstream order of its members. A [`Grouping`] is itself a
//! [`Sequence`], so a grouped query can be grouped again by a key derived
//! from each group, giving a two-level structure whose traversal order is
//! outer first-occurrence, then inner first-occurrence, then member order.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::error::{BoxError, QueryError};

use super::sequence::{failed, Pull, Query, Sequence};
use super::stage::StageKind;

/// A key paired with the upstream elements that produced it.
pub struct Grouping<K, T> {
    key: K,
    items: Rc<[T]>,
}

impl<K, T> Grouping<K, T> {
    pub fn new(key: K, items: Vec<T>) -> Self {
        Self {
            key,
            items: items.into(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Start a new pipeline over this group's members.
    pub fn query<'a>(&self) -> Query<'a, T>
    where
        K: Clone + 'a,
        T: Clone + 'a,
    {
        Query::from_stage(self.clone())
    }
}

impl<K: Clone, T> Clone for Grouping<K, T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            items: Rc::clone(&self.items),
        }
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for Grouping<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping")
            .field("key", &self.key)
            .field("items", &&*self.items)
            .finish()
    }
}

impl<'g, K, T> IntoIterator for &'g Grouping<K, T> {
    type Item = &'g T;
    type IntoIter = std::slice::Iter<'g, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, K: 'a, T: Clone + 'a> Sequence<'a, T> for Grouping<K, T> {
    fn pull(&self) -> Pull<'a, T> {
        let items = Rc::clone(&self.items);
        Box::new((0..items.len()).map(move |i| Ok(items[i].clone())))
    }
}

impl<K: Serialize, T: Serialize> Serialize for Grouping<K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Grouping", 2)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("items", &*self.items)?;
        state.end()
    }
}

/// Stage that buffers its upstream and emits one [`Grouping`] per key.
pub struct GroupBy<'a, T, K> {
    upstream: Query<'a, T>,
    key: Rc<dyn Fn(&T) -> Result<K, BoxError> + 'a>,
}

impl<'a, T, K> Sequence<'a, Grouping<K, T>> for GroupBy<'a, T, K>
where
    T: 'a,
    K: Eq + Hash + Clone + 'a,
{
    fn pull(&self) -> Pull<'a, Grouping<K, T>> {
        let mut slots: HashMap<K, usize> = HashMap::new();
        let mut groups: Vec<(K, Vec<T>)> = Vec::new();
        let mut rows = 0usize;

        for (position, item) in self.upstream.pull().enumerate() {
            let item = match item {
                Ok(item) => item,
                Err(err) => return failed(err),
            };
            rows += 1;
            let key = match (self.key)(&item) {
                Ok(key) => key,
                Err(source) => {
                    return failed(QueryError::evaluation(StageKind::GroupBy, position, source))
                }
            };
            match slots.get(&key) {
                Some(&slot) => groups[slot].1.push(item),
                None => {
                    slots.insert(key.clone(), groups.len());
                    groups.push((key, vec![item]));
                }
            }
        }
        debug!(rows, groups = groups.len(), "grouped sequence");

        Box::new(
            groups
                .into_iter()
                .map(|(key, items)| Ok(Grouping::new(key, items))),
        )
    }
}

impl<'a, T: 'a> Query<'a, T> {
    /// Group elements by `key`, in order of each key's first occurrence.
    pub fn group_by<K, F>(&self, key: F) -> Query<'a, Grouping<K, T>>
    where
        K: Eq + Hash + Clone + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.try_group_by(move |item| Ok::<_, Infallible>(key(item)))
    }

    /// Like [`Query::group_by`], but the key extractor may fail. A failure
    /// aborts the drain with an evaluation error tagged `group_by`.
    pub fn try_group_by<K, F, E>(&self, key: F) -> Query<'a, Grouping<K, T>>
    where
        K: Eq + Hash + Clone + 'a,
        F: Fn(&T) -> Result<K, E> + 'a,
        E: Into<BoxError>,
    {
        Query::from_stage(GroupBy {
            upstream: self.clone(),
            key: Rc::new(move |item: &T| key(item).map_err(Into::into)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{from_collection, Direction, OrderKey};

    #[derive(Debug, PartialEq)]
    struct Product {
        name: &'static str,
        category: &'static str,
        stock: u32,
        price: f64,
    }

    fn product(name: &'static str, category: &'static str, stock: u32, price: f64) -> Product {
        Product {
            name,
            category,
            stock,
            price,
        }
    }

    fn products() -> Vec<Product> {
        vec![
            product("Chai", "Beverages", 39, 18.0),
            product("Aniseed Syrup", "Condiments", 13, 10.0),
            product("Chang", "Beverages", 0, 19.0),
            product("Ikura", "Seafood", 31, 31.0),
            product("Cajun Seasoning", "Condiments", 0, 22.0),
            product("Steeleye Stout", "Beverages", 39, 18.0),
            product("Konbu", "Seafood", 24, 6.0),
            product("Guarana", "Beverages", 20, 4.5),
        ]
    }

    #[test]
    fn test_groups_follow_first_occurrence() {
        let products = products();
        let groups = from_collection(&products)
            .group_by(|p| p.category)
            .to_vec()
            .unwrap();

        let keys: Vec<&str> = groups.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, vec!["Beverages", "Condiments", "Seafood"]);

        let beverages: Vec<&str> = groups[0].iter().map(|p| p.name).collect();
        assert_eq!(
            beverages,
            vec!["Chai", "Chang", "Steeleye Stout", "Guarana"]
        );
    }

    #[test]
    fn test_every_element_lands_in_exactly_one_group() {
        let products = products();
        let groups = from_collection(&products)
            .group_by(|p| p.stock)
            .to_vec()
            .unwrap();

        let total: usize = groups.iter().map(Grouping::len).sum();
        assert_eq!(total, products.len());
        for p in &products {
            let owners = groups
                .iter()
                .filter(|g| g.iter().any(|member| std::ptr::eq(*member, p)))
                .count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn test_grouping_is_repeatable() {
        let products = products();
        let query = from_collection(&products).group_by(|p| p.stock);
        let first: Vec<u32> = query.to_vec().unwrap().iter().map(|g| *g.key()).collect();
        let second: Vec<u32> = query.to_vec().unwrap().iter().map(|g| *g.key()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![39, 13, 0, 31, 24, 20]);
    }

    #[test]
    fn test_grouping_acts_as_sequence() {
        let products = products();
        let groups = from_collection(&products)
            .group_by(|p| p.category)
            .to_vec()
            .unwrap();
        let cheap_beverages = groups[0].query().filter(|p| p.price < 19.0).count().unwrap();
        assert_eq!(cheap_beverages, 3);
    }

    #[test]
    fn test_nested_grouping_traversal_order() {
        let products = products();
        let nested = from_collection(&products)
            .group_by(|p| p.category)
            .flat_map(|category| {
                category
                    .query()
                    .order_by(
                        OrderKey::new()
                            .then(|p: &&Product| p.stock, Direction::Ascending)
                            .then(|p: &&Product| p.price, Direction::Ascending),
                    )
                    .group_by(|p| (p.category, p.stock))
            })
            .group_by(|stock_group| stock_group.key().0)
            .to_vec()
            .unwrap();

        let outer: Vec<&str> = nested.iter().map(|g| *g.key()).collect();
        assert_eq!(outer, vec!["Beverages", "Condiments", "Seafood"]);

        let beverage_levels: Vec<u32> = nested[0].iter().map(|g| g.key().1).collect();
        assert_eq!(beverage_levels, vec![0, 20, 39]);

        let flattened: Vec<&str> = nested
            .iter()
            .flat_map(|outer| outer.iter())
            .flat_map(|inner| inner.iter())
            .map(|p| p.name)
            .collect();
        assert_eq!(
            flattened,
            vec![
                "Chang",
                "Guarana",
                "Chai",
                "Steeleye Stout",
                "Cajun Seasoning",
                "Aniseed Syrup",
                "Konbu",
                "Ikura",
            ]
        );
    }

    #[test]
    fn test_empty_upstream_has_no_groups() {
        let products: Vec<Product> = Vec::new();
        let groups = from_collection(&products).group_by(|p| p.category).to_vec().unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_try_group_by_reports_failing_key() {
        let products = products();
        let err = from_collection(&products)
            .try_group_by(|p| {
                if p.stock == 0 {
                    Err(format!("{} has no stock level", p.name))
                } else {
                    Ok(p.stock)
                }
            })
            .to_vec()
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Evaluation {
                stage: StageKind::GroupBy,
                position: 2,
                ..
            }
        ));
        assert!(err.to_string().contains("Chang has no stock level"));
    }
}
