//! Insertion-ordered map with case-insensitive string keys.
//!
//! CIM names (classes, properties, qualifiers, key bindings, namespaces) are
//! compared case-insensitively but displayed with their original case.
//! `NocaseMap` looks entries up by a lowercased key while remembering the
//! case the key was last inserted with.

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Ordered map keyed by case-insensitive names.
#[derive(Clone)]
pub struct NocaseMap<V> {
    /// Lowercased key -> (original key, value)
    entries: IndexMap<String, (String, V)>,
}

impl<V> NocaseMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value, returning the previous value for the same
    /// (case-insensitive) key. An existing entry keeps its position but
    /// takes the case of the new key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let folded = key.to_lowercase();
        match self.entries.get_mut(&folded) {
            Some(entry) => {
                entry.0 = key;
                Some(std::mem::replace(&mut entry.1, value))
            }
            None => {
                self.entries.insert(folded, (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&key.to_lowercase()).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(&key.to_lowercase()).map(|(_, v)| v)
    }

    /// Look up an entry and return it with the key's stored case.
    pub fn get_key_value(&self, key: &str) -> Option<(&str, &V)> {
        self.entries
            .get(&key.to_lowercase())
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries
            .shift_remove(&key.to_lowercase())
            .map(|(_, v)| v)
    }

    /// Keys in insertion order, original case.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.entries.values_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut V) -> bool) {
        self.entries.retain(|_, (k, v)| keep(k, v));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_values().map(|(_, v)| v)
    }
}

impl<V> Default for NocaseMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for NocaseMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equality ignores key case and entry order.
impl<V: PartialEq> PartialEq for NocaseMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(folded, (_, v))| other.entries.get(folded).is_some_and(|(_, o)| o == v))
    }
}

/// Case-insensitive indexing, e.g. `class.properties["id"]`.
///
/// # Panics
///
/// Panics if the map has no entry for `key`. Use [`NocaseMap::get`] when
/// the key may be absent.
impl<V> Index<&str> for NocaseMap<V> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no entry found for key {key:?}"),
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for NocaseMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for NocaseMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<V> IntoIterator for NocaseMap<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoValues<String, (String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl<V: Serialize> Serialize for NocaseMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for NocaseMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, V>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
