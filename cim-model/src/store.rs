//! Keyed object containers.
//!
//! One `InMemoryObjectStore` holds the classes, instances or qualifier
//! declarations of a single namespace. Class and qualifier keys are
//! case-insensitive names; instance keys are instance paths compared by
//! [`CimInstanceName::canonical_key`].

use indexmap::IndexMap;

use crate::error::StoreError;
use crate::path::CimInstanceName;

/// Something that can address an object in a store.
pub trait StoreKey {
    /// Normalized key string.
    fn store_key(&self) -> String;
}

impl StoreKey for str {
    fn store_key(&self) -> String {
        self.to_lowercase()
    }
}

impl StoreKey for String {
    fn store_key(&self) -> String {
        self.to_lowercase()
    }
}

impl StoreKey for CimInstanceName {
    fn store_key(&self) -> String {
        self.canonical_key()
    }
}

/// Insertion-ordered in-memory object container.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStore<V> {
    objects: IndexMap<String, V>,
}

impl<V: Clone> InMemoryObjectStore<V> {
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
        }
    }

    /// Borrow an object.
    pub fn get<K: StoreKey + ?Sized>(&self, key: &K) -> Result<&V, StoreError> {
        let key = key.store_key();
        self.objects
            .get(&key)
            .ok_or(StoreError::NotFound { key })
    }

    /// Copy an object out of the store.
    pub fn get_copy<K: StoreKey + ?Sized>(&self, key: &K) -> Result<V, StoreError> {
        self.get(key).cloned()
    }

    /// Insert a new object. Fails if the key is taken.
    pub fn create<K: StoreKey + ?Sized>(&mut self, key: &K, value: V) -> Result<(), StoreError> {
        let key = key.store_key();
        if self.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists { key });
        }
        self.objects.insert(key, value);
        Ok(())
    }

    /// Replace an existing object in place.
    pub fn update<K: StoreKey + ?Sized>(&mut self, key: &K, value: V) -> Result<(), StoreError> {
        let key = key.store_key();
        match self.objects.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotFound { key }),
        }
    }

    /// Remove an object, returning it.
    pub fn delete<K: StoreKey + ?Sized>(&mut self, key: &K) -> Result<V, StoreError> {
        let key = key.store_key();
        self.objects
            .shift_remove(&key)
            .ok_or(StoreError::NotFound { key })
    }

    pub fn object_exists<K: StoreKey + ?Sized>(&self, key: &K) -> bool {
        self.objects.contains_key(&key.store_key())
    }

    /// Borrow all objects in insertion order.
    pub fn iter_values(&self) -> impl Iterator<Item = &V> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<V: Clone> Default for InMemoryObjectStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
