// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Ordered collection with keyed upserts.
//!
//! Pod specs carry names, ports, env vars and mounts as lists, but every
//! entry is really identified by a key. `Keyed` keeps a key index next to
//! the list so lookups are O(1) while iteration order stays the order in
//! which each key was first seen.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct Keyed<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Keyed<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index existing items. A duplicated key keeps its first position and
    /// the later value.
    pub(crate) fn from_items<I, F>(items: I, key: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> String,
    {
        let mut keyed = Self::new();
        for item in items {
            keyed.upsert(key(&item), item);
        }
        keyed
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Replace the entry in place, or append it. Returns the replaced value.
    pub(crate) fn upsert(&mut self, key: String, value: T) -> Option<T> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.items[pos], value)),
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(value);
                None
            }
        }
    }

    /// Append the entry only when the key is new. Returns whether it was added.
    pub(crate) fn insert_if_absent(&mut self, key: String, value: T) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.upsert(key, value);
        true
    }

    pub(crate) fn get_or_insert_with<F>(&mut self, key: &str, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => {
                let pos = self.items.len();
                self.items.push(make());
                self.index.insert(key.to_string(), pos);
                pos
            }
        };
        &mut self.items[pos]
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Kubernetes omits empty lists, so an empty collection becomes `None`.
    pub(crate) fn into_option(self) -> Option<Vec<T>> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(keyed: &Keyed<(String, i32)>) -> Vec<(String, i32)> {
        keyed.iter().cloned().collect()
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut keyed = Keyed::new();
        keyed.upsert("a".to_string(), ("a".to_string(), 1));
        keyed.upsert("b".to_string(), ("b".to_string(), 2));
        let replaced = keyed.upsert("a".to_string(), ("a".to_string(), 3));

        assert_eq!(replaced, Some(("a".to_string(), 1)));
        assert_eq!(
            pairs(&keyed),
            vec![("a".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut keyed = Keyed::new();
        assert!(keyed.insert_if_absent("a".to_string(), ("a".to_string(), 1)));
        assert!(!keyed.insert_if_absent("a".to_string(), ("a".to_string(), 2)));
        assert_eq!(keyed.len(), 1);
        assert_eq!(pairs(&keyed), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_from_items_collapses_duplicates() {
        let items = vec![
            ("x".to_string(), 1),
            ("y".to_string(), 2),
            ("x".to_string(), 3),
        ];
        let keyed = Keyed::from_items(items, |(k, _)| k.clone());
        assert_eq!(
            pairs(&keyed),
            vec![("x".to_string(), 3), ("y".to_string(), 2)]
        );
    }

    #[test]
    fn test_get_or_insert_with_creates_once() {
        let mut keyed: Keyed<Vec<i32>> = Keyed::new();
        keyed.get_or_insert_with("k", Vec::new).push(1);
        keyed.get_or_insert_with("k", || vec![99]).push(2);

        assert!(keyed.contains_key("k"));
        assert_eq!(keyed.into_vec(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_into_option_empty() {
        let keyed: Keyed<i32> = Keyed::new();
        assert!(keyed.is_empty());
        assert_eq!(keyed.into_option(), None);
    }
}
