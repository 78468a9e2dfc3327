//! In-memory CIM repository: namespaces and their object stores.

use crate::class::CimClass;
use crate::error::StoreError;
use crate::instance::CimInstance;
use crate::nocase::NocaseMap;
use crate::qualifier::CimQualifierDeclaration;
use crate::store::InMemoryObjectStore;

/// Strip leading and trailing slashes from a namespace name.
pub fn normalize_namespace(namespace: &str) -> &str {
    namespace.trim_matches('/')
}

/// Object stores of one namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceStores {
    /// Resolved classes keyed by class name
    pub classes: InMemoryObjectStore<CimClass>,
    /// Instances keyed by instance path
    pub instances: InMemoryObjectStore<CimInstance>,
    /// Qualifier declarations keyed by qualifier name
    pub qualifiers: InMemoryObjectStore<CimQualifierDeclaration>,
}

impl NamespaceStores {
    /// Whether the namespace holds no objects of any kind.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.instances.is_empty() && self.qualifiers.is_empty()
    }
}

/// The set of namespaces and their stores.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    namespaces: NocaseMap<NamespaceStores>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace names in creation order.
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.keys().map(str::to_string).collect()
    }

    pub fn namespace_exists(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(normalize_namespace(namespace))
    }

    pub fn add_namespace(&mut self, namespace: &str) -> Result<(), StoreError> {
        let namespace = normalize_namespace(namespace);
        if self.namespaces.contains_key(namespace) {
            return Err(StoreError::NamespaceAlreadyExists(namespace.to_string()));
        }
        self.namespaces.insert(namespace, NamespaceStores::default());
        Ok(())
    }

    pub fn remove_namespace(&mut self, namespace: &str) -> Result<NamespaceStores, StoreError> {
        let namespace = normalize_namespace(namespace);
        self.namespaces
            .remove(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))
    }

    pub fn stores(&self, namespace: &str) -> Result<&NamespaceStores, StoreError> {
        let namespace = normalize_namespace(namespace);
        self.namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))
    }

    pub fn stores_mut(&mut self, namespace: &str) -> Result<&mut NamespaceStores, StoreError> {
        let namespace = normalize_namespace(namespace);
        self.namespaces
            .get_mut(namespace)
            .ok_or_else(|| StoreError::NamespaceNotFound(namespace.to_string()))
    }

    pub fn class_store(&self, namespace: &str) -> Result<&InMemoryObjectStore<CimClass>, StoreError> {
        Ok(&self.stores(namespace)?.classes)
    }

    pub fn class_store_mut(
        &mut self,
        namespace: &str,
    ) -> Result<&mut InMemoryObjectStore<CimClass>, StoreError> {
        Ok(&mut self.stores_mut(namespace)?.classes)
    }

    pub fn instance_store(
        &self,
        namespace: &str,
    ) -> Result<&InMemoryObjectStore<CimInstance>, StoreError> {
        Ok(&self.stores(namespace)?.instances)
    }

    pub fn instance_store_mut(
        &mut self,
        namespace: &str,
    ) -> Result<&mut InMemoryObjectStore<CimInstance>, StoreError> {
        Ok(&mut self.stores_mut(namespace)?.instances)
    }

    pub fn qualifier_store(
        &self,
        namespace: &str,
    ) -> Result<&InMemoryObjectStore<CimQualifierDeclaration>, StoreError> {
        Ok(&self.stores(namespace)?.qualifiers)
    }

    pub fn qualifier_store_mut(
        &mut self,
        namespace: &str,
    ) -> Result<&mut InMemoryObjectStore<CimQualifierDeclaration>, StoreError> {
        Ok(&mut self.stores_mut(namespace)?.qualifiers)
    }
}
