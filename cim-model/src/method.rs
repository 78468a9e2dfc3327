//! Methods, parameters and parameter values.

use serde::{Deserialize, Serialize};

use crate::nocase::NocaseMap;
use crate::qualifier::CimQualifier;
use crate::types::{CimType, CimValue, EmbeddedObject};

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimMethod {
    /// Method name
    pub name: String,
    /// Return type
    pub return_type: CimType,
    /// Declared parameters
    pub parameters: NocaseMap<CimParameter>,
    /// Class in which the method was first declared
    pub class_origin: Option<String>,
    /// Whether the method was inherited rather than declared locally
    pub propagated: Option<bool>,
    /// Method qualifiers
    pub qualifiers: NocaseMap<CimQualifier>,
}

impl CimMethod {
    pub fn new(name: impl Into<String>, return_type: CimType) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: NocaseMap::new(),
            class_origin: None,
            propagated: None,
            qualifiers: NocaseMap::new(),
        }
    }

    /// Builder: add a parameter.
    pub fn with_parameter(mut self, parameter: CimParameter) -> Self {
        self.parameters.insert(parameter.name.clone(), parameter);
        self
    }

    /// Builder: add a qualifier.
    pub fn with_qualifier(mut self, qualifier: CimQualifier) -> Self {
        self.qualifiers.add(qualifier);
        self
    }

    /// Builder: mark the method static.
    pub fn static_method(self) -> Self {
        self.with_qualifier(CimQualifier::new("Static", true))
    }

    pub fn is_static(&self) -> bool {
        self.qualifiers.is_true("Static")
    }
}

/// A parameter declaration of a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimParameter {
    pub name: String,
    pub cim_type: CimType,
    pub reference_class: Option<String>,
    pub embedded_object: Option<EmbeddedObject>,
    pub is_array: bool,
    pub array_size: Option<u32>,
    pub qualifiers: NocaseMap<CimQualifier>,
}

impl CimParameter {
    pub fn new(name: impl Into<String>, cim_type: CimType) -> Self {
        Self {
            name: name.into(),
            cim_type,
            reference_class: None,
            embedded_object: None,
            is_array: false,
            array_size: None,
            qualifiers: NocaseMap::new(),
        }
    }

    /// Declare a reference parameter.
    pub fn reference(name: impl Into<String>, reference_class: impl Into<String>) -> Self {
        let mut param = Self::new(name, CimType::Reference);
        param.reference_class = Some(reference_class.into());
        param
    }

    /// Builder: add a qualifier.
    pub fn with_qualifier(mut self, qualifier: CimQualifier) -> Self {
        self.qualifiers.add(qualifier);
        self
    }

    /// Builder: mark array-valued.
    pub fn as_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Builder: mark as output-only (`IN(false)`, `OUT`).
    pub fn output(self) -> Self {
        self.with_qualifier(CimQualifier::new("In", false))
            .with_qualifier(CimQualifier::new("Out", true))
    }

    /// Whether the parameter accepts input. `In` defaults to TRUE.
    pub fn is_input(&self) -> bool {
        self.qualifiers
            .get("In")
            .and_then(|q| q.value.as_ref())
            .and_then(CimValue::as_bool)
            .unwrap_or(true)
    }

    pub fn is_output(&self) -> bool {
        self.qualifiers.is_true("Out")
    }
}

/// A parameter value passed to or returned from InvokeMethod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimParamValue {
    pub name: String,
    pub value: Option<CimValue>,
    pub cim_type: CimType,
    pub is_array: bool,
    pub embedded_object: Option<EmbeddedObject>,
}

impl CimParamValue {
    /// Parameter value with type and shape taken from the value.
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            cim_type: value.cim_type().unwrap_or(CimType::String),
            is_array: value.is_array(),
            embedded_object: value.embedded_object(),
            value: Some(value),
        }
    }

    /// NULL parameter value of the given type.
    pub fn null(name: impl Into<String>, cim_type: CimType) -> Self {
        Self {
            name: name.into(),
            value: None,
            cim_type,
            is_array: false,
            embedded_object: None,
        }
    }

    /// Whether type, array-ness and embedded-object attribute match the
    /// declared parameter.
    pub fn matches(&self, param: &CimParameter) -> bool {
        self.cim_type == param.cim_type
            && self.is_array == param.is_array
            && self.embedded_object == param.embedded_object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_defaults_true() {
        let p = CimParameter::new("Count", CimType::Uint32);
        assert!(p.is_input());
        assert!(!p.is_output());

        let out = CimParameter::new("Result", CimType::String).output();
        assert!(!out.is_input());
        assert!(out.is_output());
    }

    #[test]
    fn test_param_value_matches_declaration() {
        let decl = CimParameter::new("Names", CimType::String).as_array();
        assert!(CimParamValue::new("Names", vec!["a"]).matches(&decl));
        assert!(!CimParamValue::new("Names", "a").matches(&decl));
    }
}
