//! Namespace management and read-side helpers shared by every provider.
//!
//! `BaseProvider` owns the repository. Store-level signals
//! ([`StoreError`]) are translated here into [`CimError`]s that name the
//! namespace and object involved.

use std::collections::HashSet;

use cim_model::{
    normalize_namespace, CimClass, CimClassName, CimInstance, CimInstanceName, CimProperty,
    CimQualifierDeclaration, InMemoryObjectStore, InMemoryRepository, NocaseMap, StoreError,
};
use tracing::{debug, info};

use crate::config::MockConfig;
use crate::error::{CimError, Result};
use crate::types::GetClassOptions;

/// Namespace names recognized as the Interop namespace.
pub const INTEROP_NAMESPACE_NAMES: &[&str] = &["interop", "root/interop", "root/PG_Interop"];

/// Repository access shared by the default providers, user providers and
/// the main provider.
#[derive(Debug, Clone, Default)]
pub struct BaseProvider {
    repository: InMemoryRepository,
    config: MockConfig,
}

impl BaseProvider {
    pub fn new(config: MockConfig) -> Self {
        Self {
            repository: InMemoryRepository::new(),
            config,
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn repository(&self) -> &InMemoryRepository {
        &self.repository
    }

    // --- Namespaces ---

    /// Existing namespace names in creation order.
    pub fn namespaces(&self) -> Vec<String> {
        self.repository.namespaces()
    }

    /// Fail with InvalidNamespace unless the namespace exists.
    pub fn validate_namespace(&self, namespace: &str) -> Result<()> {
        if self.repository.namespace_exists(namespace) {
            Ok(())
        } else {
            Err(CimError::invalid_namespace(format!(
                "Namespace {} not found",
                normalize_namespace(namespace)
            )))
        }
    }

    /// Whether `namespace` is one of the recognized Interop namespace names.
    pub fn is_interop_namespace(namespace: &str) -> bool {
        let namespace = normalize_namespace(namespace).to_lowercase();
        INTEROP_NAMESPACE_NAMES
            .iter()
            .any(|name| name.to_lowercase() == namespace)
    }

    /// The existing Interop namespace, if any.
    pub fn find_interop_namespace(&self) -> Option<String> {
        self.namespaces()
            .into_iter()
            .find(|ns| Self::is_interop_namespace(ns))
    }

    /// Create an empty namespace. Only one Interop namespace may exist.
    pub fn add_namespace(&mut self, namespace: &str) -> Result<()> {
        let namespace = normalize_namespace(namespace);
        if namespace.is_empty() {
            return Err(CimError::invalid_parameter("Namespace name must not be empty"));
        }
        if Self::is_interop_namespace(namespace) {
            if let Some(existing) = self.find_interop_namespace() {
                return Err(CimError::already_exists(format!(
                    "Cannot add Interop namespace {namespace}: Interop namespace {existing} already exists"
                )));
            }
        }
        self.repository.add_namespace(namespace).map_err(|err| match err {
            StoreError::NamespaceAlreadyExists(ns) => {
                CimError::already_exists(format!("Namespace {ns} already exists"))
            }
            other => CimError::failed(other.to_string()),
        })?;
        info!(namespace = %namespace, "Added namespace");
        Ok(())
    }

    /// Remove an empty, non-Interop namespace.
    pub fn remove_namespace(&mut self, namespace: &str) -> Result<()> {
        let namespace = normalize_namespace(namespace);
        let stores = self.repository.stores(namespace).map_err(|_| {
            CimError::not_found(format!("Namespace {namespace} does not exist"))
        })?;
        if Self::is_interop_namespace(namespace) {
            return Err(CimError::invalid_namespace(format!(
                "Cannot remove Interop namespace {namespace}"
            )));
        }
        if !stores.is_empty() {
            return Err(CimError::namespace_not_empty(format!(
                "Namespace {namespace} still contains classes, instances or qualifier declarations"
            )));
        }
        self.repository
            .remove_namespace(namespace)
            .map_err(|err| CimError::failed(err.to_string()))?;
        info!(namespace = %namespace, "Removed namespace");
        Ok(())
    }

    // --- Stores ---

    fn namespace_error(namespace: &str) -> CimError {
        CimError::invalid_namespace(format!(
            "Namespace {} not found",
            normalize_namespace(namespace)
        ))
    }

    pub fn class_store(&self, namespace: &str) -> Result<&InMemoryObjectStore<CimClass>> {
        self.repository
            .class_store(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    pub fn class_store_mut(&mut self, namespace: &str) -> Result<&mut InMemoryObjectStore<CimClass>> {
        self.repository
            .class_store_mut(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    pub fn instance_store(&self, namespace: &str) -> Result<&InMemoryObjectStore<CimInstance>> {
        self.repository
            .instance_store(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    pub fn instance_store_mut(
        &mut self,
        namespace: &str,
    ) -> Result<&mut InMemoryObjectStore<CimInstance>> {
        self.repository
            .instance_store_mut(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    pub fn qualifier_store(
        &self,
        namespace: &str,
    ) -> Result<&InMemoryObjectStore<CimQualifierDeclaration>> {
        self.repository
            .qualifier_store(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    pub fn qualifier_store_mut(
        &mut self,
        namespace: &str,
    ) -> Result<&mut InMemoryObjectStore<CimQualifierDeclaration>> {
        self.repository
            .qualifier_store_mut(namespace)
            .map_err(|_| Self::namespace_error(namespace))
    }

    // --- Classes ---

    pub fn class_exists(&self, namespace: &str, classname: &str) -> Result<bool> {
        Ok(self.class_store(namespace)?.object_exists(classname))
    }

    /// Borrow the stored (resolved) class. Fails with NotFound.
    pub fn stored_class(&self, namespace: &str, classname: &str) -> Result<&CimClass> {
        self.class_store(namespace)?.get(classname).map_err(|_| {
            CimError::not_found(format!(
                "Class {classname} not found in namespace {}",
                normalize_namespace(namespace)
            ))
        })
    }

    /// Copy of the stored class with the GetClass filters applied:
    ///
    /// 1. unless `local_only` is false, propagated properties and methods
    ///    are dropped;
    /// 2. properties are restricted to `property_list` if one is given;
    /// 3. if `include_qualifiers` is false, every qualifier is removed;
    /// 4. unless `include_classorigin` is true, class origins are removed.
    pub fn get_class(
        &self,
        namespace: &str,
        classname: &str,
        options: &GetClassOptions,
    ) -> Result<CimClass> {
        let mut class = self.stored_class(namespace, classname)?.clone();
        debug!(namespace = %namespace, classname = %classname, "get_class");

        if options.local_only.unwrap_or(true) {
            class.properties.retain(|_, p| p.propagated != Some(true));
            class.methods.retain(|_, m| m.propagated != Some(true));
        }

        if let Some(property_list) = &options.property_list {
            filter_properties(&mut class.properties, property_list);
        }

        if options.include_qualifiers == Some(false) {
            class.qualifiers.clear();
            for prop in class.properties.values_mut() {
                prop.qualifiers.clear();
            }
            for method in class.methods.values_mut() {
                method.qualifiers.clear();
                for param in method.parameters.values_mut() {
                    param.qualifiers.clear();
                }
            }
        }

        if options.include_classorigin != Some(true) {
            for prop in class.properties.values_mut() {
                prop.class_origin = None;
            }
            for method in class.methods.values_mut() {
                method.class_origin = None;
            }
        }

        class.path = Some(
            CimClassName::new(class.classname.clone())
                .with_namespace(normalize_namespace(namespace)),
        );
        Ok(class)
    }

    /// Whether `classname` is `superclass` or derives from it.
    ///
    /// Fails with InvalidClass if `classname` does not exist and with
    /// InvalidSuperclass if `superclass` does not exist.
    pub fn is_subclass(&self, namespace: &str, classname: &str, superclass: &str) -> Result<bool> {
        let store = self.class_store(namespace)?;
        if !store.object_exists(classname) {
            return Err(CimError::invalid_class(format!(
                "Class {classname} not found in namespace {}",
                normalize_namespace(namespace)
            )));
        }
        if !store.object_exists(superclass) {
            return Err(CimError::invalid_superclass(format!(
                "Class {superclass} not found in namespace {}",
                normalize_namespace(namespace)
            )));
        }

        let target = superclass.to_lowercase();
        let mut current = Some(classname.to_string());
        let mut seen = HashSet::new();
        while let Some(name) = current {
            let folded = name.to_lowercase();
            if folded == target {
                return Ok(true);
            }
            if !seen.insert(folded) {
                break;
            }
            current = store.get(name.as_str()).ok().and_then(|c| c.superclass.clone());
        }
        Ok(false)
    }

    /// Names of the subclasses of `classname`, or of the root classes when
    /// `classname` is `None`. With `deep`, every descendant is included:
    /// direct subclasses first, then their descendants.
    pub fn get_subclass_names(
        &self,
        namespace: &str,
        classname: Option<&str>,
        deep: bool,
    ) -> Result<Vec<String>> {
        let store = self.class_store(namespace)?;
        let target = classname.map(str::to_lowercase);
        let direct: Vec<String> = store
            .iter_values()
            .filter(|c| c.superclass.as_ref().map(|s| s.to_lowercase()) == target)
            .map(|c| c.classname.clone())
            .collect();

        let mut names = direct.clone();
        if deep {
            for name in &direct {
                names.extend(self.get_subclass_names(namespace, Some(name), true)?);
            }
        }
        Ok(names)
    }

    /// `classname` followed by all of its descendants.
    pub fn class_and_subclass_names(&self, namespace: &str, classname: &str) -> Result<Vec<String>> {
        let stored = self.stored_class(namespace, classname)?.classname.clone();
        let mut names = vec![stored];
        names.extend(self.get_subclass_names(namespace, Some(classname), true)?);
        Ok(names)
    }

    /// Lowercased names of `classname` and all of its descendants.
    pub fn class_closure(&self, namespace: &str, classname: &str) -> Result<HashSet<String>> {
        Ok(self
            .class_and_subclass_names(namespace, classname)?
            .into_iter()
            .map(|n| n.to_lowercase())
            .collect())
    }

    // --- Instances ---

    /// Borrow a stored instance. Fails with NotFound.
    pub fn stored_instance(
        &self,
        namespace: &str,
        path: &CimInstanceName,
    ) -> Result<&CimInstance> {
        self.instance_store(namespace)?.get(path).map_err(|_| {
            CimError::not_found(format!(
                "Instance {path} not found in namespace {}",
                normalize_namespace(namespace)
            ))
        })
    }

    pub fn instance_exists(&self, namespace: &str, path: &CimInstanceName) -> Result<bool> {
        Ok(self.instance_store(namespace)?.object_exists(path))
    }

    /// Paths of the stored instances whose creation class is in `classnames`
    /// (lowercased).
    pub fn instance_paths_of(
        &self,
        namespace: &str,
        classnames: &HashSet<String>,
    ) -> Result<Vec<CimInstanceName>> {
        Ok(self
            .instance_store(namespace)?
            .iter_values()
            .filter(|inst| classnames.contains(&inst.classname.to_lowercase()))
            .filter_map(|inst| inst.path.clone())
            .collect())
    }
}

/// Keep only the properties named in `property_list` (case-insensitive).
pub fn filter_properties(properties: &mut NocaseMap<CimProperty>, property_list: &[String]) {
    let wanted: HashSet<String> = property_list.iter().map(|p| p.to_lowercase()).collect();
    properties.retain(|name, _| wanted.contains(&name.to_lowercase()));
}

/// Apply the instance retrieval filters to a copied instance.
pub fn filter_instance(
    instance: &mut CimInstance,
    include_qualifiers: bool,
    include_classorigin: bool,
    property_list: Option<&[String]>,
) {
    if let Some(property_list) = property_list {
        filter_properties(&mut instance.properties, property_list);
    }
    if !include_qualifiers {
        instance.qualifiers.clear();
        for prop in instance.properties.values_mut() {
            prop.qualifiers.clear();
        }
    }
    if !include_classorigin {
        for prop in instance.properties.values_mut() {
            prop.class_origin = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CimStatus;
    use cim_model::{CimProperty, CimType};

    fn base_with_classes() -> BaseProvider {
        let mut base = BaseProvider::default();
        base.add_namespace("root/cimv2").unwrap();
        let store = base.class_store_mut("root/cimv2").unwrap();

        let mut inherited = CimProperty::declare("Id", CimType::String).key();
        inherited.class_origin = Some("CIM_Base".to_string());
        inherited.propagated = Some(true);
        let mut local = CimProperty::declare("Extra", CimType::Uint32);
        local.class_origin = Some("CIM_Derived".to_string());
        local.propagated = Some(false);

        let mut base_id = CimProperty::declare("Id", CimType::String).key();
        base_id.class_origin = Some("CIM_Base".to_string());
        base_id.propagated = Some(false);

        store
            .create("CIM_Base", CimClass::new("CIM_Base").with_property(base_id))
            .unwrap();
        store
            .create(
                "CIM_Derived",
                CimClass::new("CIM_Derived")
                    .with_superclass("CIM_Base")
                    .with_property(inherited)
                    .with_property(local),
            )
            .unwrap();
        store
            .create(
                "CIM_MoreDerived",
                CimClass::new("CIM_MoreDerived").with_superclass("CIM_Derived"),
            )
            .unwrap();
        base
    }

    #[test]
    fn test_single_interop_namespace() {
        let mut base = BaseProvider::default();
        base.add_namespace("interop").unwrap();
        let err = base.add_namespace("root/PG_Interop").unwrap_err();
        assert_eq!(err.status, CimStatus::AlreadyExists);
        assert_eq!(base.find_interop_namespace().as_deref(), Some("interop"));
    }

    #[test]
    fn test_remove_namespace_rules() {
        let mut base = base_with_classes();
        base.add_namespace("interop").unwrap();

        assert_eq!(
            base.remove_namespace("root/missing").unwrap_err().status,
            CimStatus::NotFound
        );
        assert_eq!(
            base.remove_namespace("interop").unwrap_err().status,
            CimStatus::InvalidNamespace
        );
        assert_eq!(
            base.remove_namespace("root/cimv2").unwrap_err().status,
            CimStatus::NamespaceNotEmpty
        );

        base.add_namespace("/root/empty/").unwrap();
        base.remove_namespace("root/empty").unwrap();
        assert!(base.validate_namespace("root/empty").is_err());
    }

    #[test]
    fn test_get_class_local_only_default() {
        let base = base_with_classes();

        let local = base
            .get_class("root/cimv2", "CIM_Derived", &GetClassOptions::new())
            .unwrap();
        assert!(!local.properties.contains_key("Id"));
        assert!(local.properties.contains_key("Extra"));
        assert!(local.properties["Extra"].class_origin.is_none());

        let full = base
            .get_class("root/cimv2", "CIM_Derived", &GetClassOptions::full())
            .unwrap();
        assert_eq!(full.properties.len(), 2);
        assert_eq!(full.properties["Id"].class_origin.as_deref(), Some("CIM_Base"));
        assert_eq!(
            full.path.unwrap().namespace.as_deref(),
            Some("root/cimv2")
        );
    }

    #[test]
    fn test_get_class_property_list() {
        let base = base_with_classes();
        let options = GetClassOptions::new().with_local_only(false);

        let none = base
            .get_class(
                "root/cimv2",
                "CIM_Derived",
                &options.clone().with_property_list(Vec::<String>::new()),
            )
            .unwrap();
        assert!(none.properties.is_empty());

        let some = base
            .get_class("root/cimv2", "CIM_Derived", &options.with_property_list(["id"]))
            .unwrap();
        let names: Vec<_> = some.properties.keys().collect();
        assert_eq!(names, vec!["Id"]);
    }

    #[test]
    fn test_get_class_strips_qualifiers_only_when_false() {
        let base = base_with_classes();
        let kept = base
            .get_class("root/cimv2", "CIM_Base", &GetClassOptions::new())
            .unwrap();
        assert!(kept.properties["Id"].is_key());

        let stripped = base
            .get_class(
                "root/cimv2",
                "CIM_Base",
                &GetClassOptions::new().with_include_qualifiers(false),
            )
            .unwrap();
        assert!(stripped.properties["Id"].qualifiers.is_empty());
    }

    #[test]
    fn test_get_class_not_found() {
        let base = base_with_classes();
        let err = base
            .get_class("root/cimv2", "CIM_Nope", &GetClassOptions::new())
            .unwrap_err();
        assert_eq!(err.status, CimStatus::NotFound);

        let err = base
            .get_class("root/nope", "CIM_Base", &GetClassOptions::new())
            .unwrap_err();
        assert_eq!(err.status, CimStatus::InvalidNamespace);
    }

    #[test]
    fn test_is_subclass() {
        let base = base_with_classes();
        assert!(base.is_subclass("root/cimv2", "CIM_MoreDerived", "cim_base").unwrap());
        assert!(base.is_subclass("root/cimv2", "CIM_Base", "CIM_Base").unwrap());
        assert!(!base.is_subclass("root/cimv2", "CIM_Base", "CIM_Derived").unwrap());
        assert_eq!(
            base.is_subclass("root/cimv2", "CIM_Nope", "CIM_Base")
                .unwrap_err()
                .status,
            CimStatus::InvalidClass
        );
    }

    #[test]
    fn test_subclass_names() {
        let base = base_with_classes();
        assert_eq!(
            base.get_subclass_names("root/cimv2", None, false).unwrap(),
            vec!["CIM_Base".to_string()]
        );
        assert_eq!(
            base.get_subclass_names("root/cimv2", Some("CIM_Base"), false).unwrap(),
            vec!["CIM_Derived".to_string()]
        );
        assert_eq!(
            base.get_subclass_names("root/cimv2", Some("cim_base"), true).unwrap(),
            vec!["CIM_Derived".to_string(), "CIM_MoreDerived".to_string()]
        );
        assert_eq!(base.get_subclass_names("root/cimv2", None, true).unwrap().len(), 3);
    }
}
