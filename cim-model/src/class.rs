//! CIM classes.

use serde::{Deserialize, Serialize};

use crate::method::CimMethod;
use crate::nocase::NocaseMap;
use crate::path::CimClassName;
use crate::property::CimProperty;
use crate::qualifier::CimQualifier;

/// A CIM class.
///
/// A class as stored in a repository is resolved: it carries every
/// inherited property and method, each tagged with its class origin and
/// whether it was propagated from a superclass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimClass {
    /// Class name
    pub classname: String,
    /// Direct superclass, if any
    pub superclass: Option<String>,
    /// Properties in declaration order
    pub properties: NocaseMap<CimProperty>,
    /// Methods in declaration order
    pub methods: NocaseMap<CimMethod>,
    /// Class qualifiers
    pub qualifiers: NocaseMap<CimQualifier>,
    /// Class path, if known
    pub path: Option<CimClassName>,
}

impl CimClass {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            superclass: None,
            properties: NocaseMap::new(),
            methods: NocaseMap::new(),
            qualifiers: NocaseMap::new(),
            path: None,
        }
    }

    /// Builder: set the superclass.
    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Builder: add a property.
    pub fn with_property(mut self, property: CimProperty) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Builder: add a method.
    pub fn with_method(mut self, method: CimMethod) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// Builder: add a qualifier.
    pub fn with_qualifier(mut self, qualifier: CimQualifier) -> Self {
        self.qualifiers.add(qualifier);
        self
    }

    /// Builder: mark the class as an association.
    pub fn association(self) -> Self {
        self.with_qualifier(CimQualifier::new("Association", true))
    }

    pub fn is_association(&self) -> bool {
        self.qualifiers.is_true("Association")
    }

    pub fn is_indication(&self) -> bool {
        self.qualifiers.is_true("Indication")
    }

    /// Key properties in declaration order.
    pub fn key_properties(&self) -> impl Iterator<Item = &CimProperty> {
        self.properties.values().filter(|p| p.is_key())
    }

    /// Reference properties in declaration order.
    pub fn reference_properties(&self) -> impl Iterator<Item = &CimProperty> {
        self.properties
            .values()
            .filter(|p| p.cim_type == crate::types::CimType::Reference)
    }
}
