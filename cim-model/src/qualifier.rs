//! Qualifier values and qualifier declarations.

use serde::{Deserialize, Serialize};

use crate::nocase::NocaseMap;
use crate::types::{CimType, CimValue};

/// A qualifier applied to a class, property, method or parameter.
///
/// Flavors left as `None` are filled in from the qualifier declaration
/// when the owning class is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimQualifier {
    /// Qualifier name
    pub name: String,
    /// Qualifier value (`None` means NULL)
    pub value: Option<CimValue>,
    /// Type, taken from the value or the declaration
    pub cim_type: Option<CimType>,
    /// Whether the qualifier was inherited from a superclass element
    pub propagated: Option<bool>,
    /// Whether subclasses may override the value
    pub overridable: Option<bool>,
    /// Whether the qualifier propagates to subclasses
    pub tosubclass: Option<bool>,
    /// Whether the qualifier propagates to instances
    pub toinstance: Option<bool>,
    /// Whether the value is translatable
    pub translatable: Option<bool>,
}

impl CimQualifier {
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            cim_type: value.cim_type(),
            value: Some(value),
            propagated: None,
            overridable: None,
            tosubclass: None,
            toinstance: None,
            translatable: None,
        }
    }

    /// Builder: set the overridable and tosubclass flavors.
    pub fn with_flavors(mut self, overridable: bool, tosubclass: bool) -> Self {
        self.overridable = Some(overridable);
        self.tosubclass = Some(tosubclass);
        self
    }

    /// True if the value is boolean TRUE.
    pub fn is_true(&self) -> bool {
        matches!(self.value, Some(CimValue::Boolean(true)))
    }
}

impl NocaseMap<CimQualifier> {
    /// True if the named qualifier is present with value TRUE.
    pub fn is_true(&self, name: &str) -> bool {
        self.get(name).is_some_and(CimQualifier::is_true)
    }

    /// String value of the named qualifier, if present.
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|q| q.value.as_ref())
            .and_then(CimValue::as_str)
    }

    /// Add a qualifier keyed by its own name.
    pub fn add(&mut self, qualifier: CimQualifier) {
        self.insert(qualifier.name.clone(), qualifier);
    }
}

/// Scopes a qualifier declaration may name.
pub const QUALIFIER_SCOPES: &[&str] = &[
    "class",
    "association",
    "indication",
    "property",
    "reference",
    "method",
    "parameter",
    "any",
];

/// A qualifier type declaration, scoped to one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimQualifierDeclaration {
    /// Qualifier name
    pub name: String,
    /// Declared type
    pub cim_type: CimType,
    /// Default value
    pub value: Option<CimValue>,
    /// Whether the qualifier is array-valued
    pub is_array: bool,
    /// Fixed array size, if any
    pub array_size: Option<u32>,
    /// Scope name -> allowed
    pub scopes: NocaseMap<bool>,
    pub overridable: Option<bool>,
    pub tosubclass: Option<bool>,
    pub toinstance: Option<bool>,
    pub translatable: Option<bool>,
}

impl CimQualifierDeclaration {
    pub fn new(name: impl Into<String>, cim_type: CimType) -> Self {
        Self {
            name: name.into(),
            cim_type,
            value: None,
            is_array: false,
            array_size: None,
            scopes: NocaseMap::new(),
            overridable: None,
            tosubclass: None,
            toinstance: None,
            translatable: None,
        }
    }

    /// Builder: set the default value.
    pub fn with_default(mut self, value: impl Into<CimValue>) -> Self {
        let value = value.into();
        self.is_array = value.is_array();
        self.value = Some(value);
        self
    }

    /// Builder: allow the given scopes.
    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        for scope in scopes {
            self.scopes.insert(*scope, true);
        }
        self
    }

    /// Builder: set the overridable and tosubclass flavors.
    pub fn with_flavors(mut self, overridable: bool, tosubclass: bool) -> Self {
        self.overridable = Some(overridable);
        self.tosubclass = Some(tosubclass);
        self
    }

    /// Builder: mark array-valued.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Whether the declaration permits use on an element of `scope`.
    pub fn allows_scope(&self, scope: &str) -> bool {
        self.scopes.get("any").copied().unwrap_or(false)
            || self.scopes.get(scope).copied().unwrap_or(false)
    }

    // DSP0004 flavor defaults: EnableOverride, ToSubclass, not translatable.

    pub fn is_overridable(&self) -> bool {
        self.overridable.unwrap_or(true)
    }

    pub fn is_tosubclass(&self) -> bool {
        self.tosubclass.unwrap_or(true)
    }

    pub fn is_toinstance(&self) -> bool {
        self.toinstance.unwrap_or(false)
    }

    pub fn is_translatable(&self) -> bool {
        self.translatable.unwrap_or(false)
    }
}
