//! Class paths, instance paths and object names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::class::CimClass;
use crate::error::ModelError;
use crate::instance::CimInstance;
use crate::nocase::NocaseMap;
use crate::types::CimValue;

fn eq_nocase(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn eq_opt_nocase(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => eq_nocase(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn write_prefix(
    f: &mut fmt::Formatter<'_>,
    host: Option<&str>,
    namespace: Option<&str>,
) -> fmt::Result {
    if let Some(host) = host {
        write!(f, "//{host}")?;
    }
    if let Some(ns) = namespace {
        write!(f, "/{}:", ns.trim_matches('/'))?;
    }
    Ok(())
}

/// Path of a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CimClassName {
    pub classname: String,
    pub namespace: Option<String>,
    pub host: Option<String>,
}

impl CimClassName {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            namespace: None,
            host: None,
        }
    }

    /// Builder: set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl PartialEq for CimClassName {
    fn eq(&self, other: &Self) -> bool {
        eq_nocase(&self.classname, &other.classname)
            && eq_opt_nocase(self.namespace.as_deref(), other.namespace.as_deref())
            && eq_opt_nocase(self.host.as_deref(), other.host.as_deref())
    }
}

impl fmt::Display for CimClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prefix(f, self.host.as_deref(), self.namespace.as_deref())?;
        f.write_str(&self.classname)
    }
}

/// Path of an instance: creation class plus key bindings.
///
/// Class name, key names, namespace and host compare case-insensitively;
/// key values compare by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CimInstanceName {
    pub classname: String,
    pub keybindings: NocaseMap<CimValue>,
    pub namespace: Option<String>,
    pub host: Option<String>,
}

impl CimInstanceName {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            keybindings: NocaseMap::new(),
            namespace: None,
            host: None,
        }
    }

    /// Builder: add a key binding.
    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        self.keybindings.insert(name, value.into());
        self
    }

    /// Builder: set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Build the path of `instance` from the key properties of `class`.
    ///
    /// Every key property of the class must have a non-NULL value in the
    /// instance. A class without key properties yields a path without key
    /// bindings.
    pub fn from_instance(
        class: &CimClass,
        instance: &CimInstance,
        namespace: Option<&str>,
    ) -> Result<Self, ModelError> {
        let mut path = Self::new(instance.classname.clone());
        for key_prop in class.key_properties() {
            match instance.value(&key_prop.name) {
                Some(value) => {
                    path.keybindings.insert(key_prop.name.clone(), value.clone());
                }
                None => {
                    return Err(ModelError::MissingKeyProperty {
                        classname: class.classname.clone(),
                        property: key_prop.name.clone(),
                    })
                }
            }
        }
        path.namespace = namespace.map(str::to_string);
        Ok(path)
    }

    /// Identity within one namespace: lowercased class name and sorted,
    /// lowercased key names with type-tagged values. Namespace and host
    /// are not part of it.
    pub fn canonical_key(&self) -> String {
        let mut keys: Vec<(String, String)> = self
            .keybindings
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.canonical_key()))
            .collect();
        keys.sort();
        let keys: Vec<String> = keys.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}.{}", self.classname.to_lowercase(), keys.join(","))
    }

    /// Whether both paths name the same object in `namespace`. A path
    /// without a namespace is taken to be in `namespace`.
    pub fn same_object_in(&self, other: &CimInstanceName, namespace: &str) -> bool {
        let ns_a = self.namespace.as_deref().unwrap_or(namespace);
        let ns_b = other.namespace.as_deref().unwrap_or(namespace);
        eq_nocase(ns_a.trim_matches('/'), ns_b.trim_matches('/'))
            && self.canonical_key() == other.canonical_key()
    }
}

impl PartialEq for CimInstanceName {
    fn eq(&self, other: &Self) -> bool {
        eq_nocase(&self.classname, &other.classname)
            && self.keybindings == other.keybindings
            && eq_opt_nocase(self.namespace.as_deref(), other.namespace.as_deref())
            && eq_opt_nocase(self.host.as_deref(), other.host.as_deref())
    }
}

/// WBEM URI form, e.g. `/root/cimv2:CIM_Foo.Id="abc"`. Key bindings are
/// sorted by name.
impl fmt::Display for CimInstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prefix(f, self.host.as_deref(), self.namespace.as_deref())?;
        f.write_str(&self.classname)?;
        let mut keys: Vec<(&str, &CimValue)> = self.keybindings.iter().collect();
        keys.sort_by_key(|(k, _)| k.to_lowercase());
        for (i, (name, value)) in keys.into_iter().enumerate() {
            f.write_str(if i == 0 { "." } else { "," })?;
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// The ObjectName parameter of association and method operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CimObjectName {
    Class(CimClassName),
    Instance(CimInstanceName),
}

impl CimObjectName {
    pub fn classname(&self) -> &str {
        match self {
            Self::Class(c) => &c.classname,
            Self::Instance(i) => &i.classname,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Class(c) => c.namespace.as_deref(),
            Self::Instance(i) => i.namespace.as_deref(),
        }
    }
}

impl From<CimClassName> for CimObjectName {
    fn from(v: CimClassName) -> Self {
        Self::Class(v)
    }
}

impl From<CimInstanceName> for CimObjectName {
    fn from(v: CimInstanceName) -> Self {
        Self::Instance(v)
    }
}

impl fmt::Display for CimObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(c) => c.fmt(f),
            Self::Instance(i) => i.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::CimProperty;
    use crate::types::CimType;

    #[test]
    fn test_display_wbem_uri() {
        let path = CimInstanceName::new("CIM_Foo")
            .with_key("Name", "x")
            .with_key("Id", 3u32)
            .with_namespace("root/cimv2");
        assert_eq!(path.to_string(), r#"/root/cimv2:CIM_Foo.Id=3,Name="x""#);

        let bare = CimInstanceName::new("CIM_Foo").with_key("Id", "abc");
        assert_eq!(bare.to_string(), r#"CIM_Foo.Id="abc""#);
    }

    #[test]
    fn test_equality_is_case_insensitive_on_names() {
        let a = CimInstanceName::new("CIM_Foo").with_key("Id", "abc");
        let b = CimInstanceName::new("cim_foo").with_key("ID", "abc");
        let c = CimInstanceName::new("CIM_Foo").with_key("Id", "ABC");

        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_instance_requires_keys() {
        let class = CimClass::new("CIM_Foo")
            .with_property(CimProperty::declare("Id", CimType::String).key())
            .with_property(CimProperty::declare("Note", CimType::String));

        let inst = CimInstance::new("CIM_Foo").with_value("Id", "abc").with_value("Note", "n");
        let path = CimInstanceName::from_instance(&class, &inst, Some("root/cimv2")).unwrap();
        assert_eq!(path.keybindings.len(), 1);
        assert_eq!(path.namespace.as_deref(), Some("root/cimv2"));

        let missing = CimInstance::new("CIM_Foo").with_value("Note", "n");
        let err = CimInstanceName::from_instance(&class, &missing, None).unwrap_err();
        assert!(matches!(err, ModelError::MissingKeyProperty { .. }));
    }

    #[test]
    fn test_same_object_in_namespace() {
        let a = CimInstanceName::new("CIM_A").with_key("Id", "a1");
        let b = CimInstanceName::new("CIM_A")
            .with_key("id", "a1")
            .with_namespace("/root/cimv2/");
        assert!(a.same_object_in(&b, "root/cimv2"));
        assert!(!a.same_object_in(&b, "interop"));
    }
}
