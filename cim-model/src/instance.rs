//! CIM instances.

use serde::{Deserialize, Serialize};

use crate::nocase::NocaseMap;
use crate::path::CimInstanceName;
use crate::property::CimProperty;
use crate::qualifier::CimQualifier;
use crate::types::CimValue;

/// A CIM instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimInstance {
    /// Creation class name
    pub classname: String,
    /// Property values
    pub properties: NocaseMap<CimProperty>,
    /// Instance qualifiers (deprecated; dropped on write)
    pub qualifiers: NocaseMap<CimQualifier>,
    /// Instance path, set by the server
    pub path: Option<CimInstanceName>,
}

impl CimInstance {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            properties: NocaseMap::new(),
            qualifiers: NocaseMap::new(),
            path: None,
        }
    }

    /// Builder: add a property value.
    pub fn with_property(mut self, property: CimProperty) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Builder: add a property with type inferred from the value.
    pub fn with_value(self, name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        self.with_property(CimProperty::new(name, value))
    }

    /// Builder: set the path.
    pub fn with_path(mut self, path: CimInstanceName) -> Self {
        self.path = Some(path);
        self
    }

    /// Value of the named property, if present and not NULL.
    pub fn value(&self, name: &str) -> Option<&CimValue> {
        self.properties.get(name).and_then(|p| p.value.as_ref())
    }

    /// Overwrite the value of an existing property. Returns false if the
    /// instance has no such property.
    pub fn set_value(&mut self, name: &str, value: Option<CimValue>) -> bool {
        match self.properties.get_mut(name) {
            Some(prop) => {
                prop.value = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_access() {
        let mut inst = CimInstance::new("CIM_Foo").with_value("Id", "abc");
        assert_eq!(inst.value("id"), Some(&CimValue::from("abc")));

        assert!(inst.set_value("ID", Some("xyz".into())));
        assert_eq!(inst.value("Id").and_then(CimValue::as_str), Some("xyz"));
        assert!(!inst.set_value("Missing", None));
    }
}
