//! Properties of classes and instances.

use serde::{Deserialize, Serialize};

use crate::nocase::NocaseMap;
use crate::qualifier::CimQualifier;
use crate::types::{CimType, CimValue, EmbeddedObject};

/// A property declaration (in a class) or property value (in an instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CimProperty {
    /// Property name
    pub name: String,
    /// Value, or default value in a class (`None` means NULL)
    pub value: Option<CimValue>,
    /// Declared type
    pub cim_type: CimType,
    /// Referenced class for reference properties
    pub reference_class: Option<String>,
    /// Embedded-object attribute for string properties
    pub embedded_object: Option<EmbeddedObject>,
    /// Whether the property is array-valued
    pub is_array: bool,
    /// Fixed array size, if any
    pub array_size: Option<u32>,
    /// Class in which the property was first declared
    pub class_origin: Option<String>,
    /// Whether the property was inherited rather than declared locally
    pub propagated: Option<bool>,
    /// Property qualifiers
    pub qualifiers: NocaseMap<CimQualifier>,
}

impl CimProperty {
    /// Declare a property of the given type without a value.
    pub fn declare(name: impl Into<String>, cim_type: CimType) -> Self {
        Self {
            name: name.into(),
            value: None,
            cim_type,
            reference_class: None,
            embedded_object: None,
            is_array: false,
            array_size: None,
            class_origin: None,
            propagated: None,
            qualifiers: NocaseMap::new(),
        }
    }

    /// Property carrying a value; type, array-ness, embedded-object
    /// attribute and reference class are taken from the value.
    ///
    /// An empty array has no element type and is recorded as `string`;
    /// use [`CimProperty::array`] when the element type matters.
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        let value = value.into();
        let mut prop = Self::declare(name, value.cim_type().unwrap_or(CimType::String));
        prop.is_array = value.is_array();
        prop.embedded_object = value.embedded_object();
        if let CimValue::Reference(path) = &value {
            prop.reference_class = Some(path.classname.clone());
        }
        prop.value = Some(value);
        prop
    }

    /// Array property with an explicit element type.
    pub fn array(name: impl Into<String>, cim_type: CimType, items: Vec<CimValue>) -> Self {
        let mut prop = Self::declare(name, cim_type);
        prop.is_array = true;
        prop.embedded_object = items.first().and_then(CimValue::embedded_object);
        prop.value = Some(CimValue::Array(items));
        prop
    }

    /// Declare a reference property to `reference_class`.
    pub fn reference(name: impl Into<String>, reference_class: impl Into<String>) -> Self {
        let mut prop = Self::declare(name, CimType::Reference);
        prop.reference_class = Some(reference_class.into());
        prop
    }

    /// Builder: add a qualifier.
    pub fn with_qualifier(mut self, qualifier: CimQualifier) -> Self {
        self.qualifiers.add(qualifier);
        self
    }

    /// Builder: mark as a key property.
    pub fn key(self) -> Self {
        self.with_qualifier(CimQualifier::new("Key", true))
    }

    /// Builder: set the value.
    pub fn with_value(mut self, value: impl Into<CimValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder: set the embedded-object attribute.
    pub fn with_embedded_object(mut self, embedded: EmbeddedObject) -> Self {
        self.embedded_object = Some(embedded);
        self
    }

    /// Builder: mark array-valued.
    pub fn as_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Whether the property carries a TRUE `Key` qualifier.
    pub fn is_key(&self) -> bool {
        self.qualifiers.is_true("Key")
    }

    /// Whether type, array-ness and embedded-object attribute match.
    pub fn same_shape(&self, other: &CimProperty) -> bool {
        self.cim_type == other.cim_type
            && self.is_array == other.is_array
            && self.embedded_object == other.embedded_object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CimInstanceName;

    #[test]
    fn test_new_infers_shape() {
        let p = CimProperty::new("Count", 3u32);
        assert_eq!(p.cim_type, CimType::Uint32);
        assert!(!p.is_array);

        let arr = CimProperty::new("Tags", vec!["a", "b"]);
        assert_eq!(arr.cim_type, CimType::String);
        assert!(arr.is_array);

        let r = CimProperty::new("Antecedent", CimInstanceName::new("CIM_A").with_key("Id", "a1"));
        assert_eq!(r.cim_type, CimType::Reference);
        assert_eq!(r.reference_class.as_deref(), Some("CIM_A"));
    }

    #[test]
    fn test_key_and_shape() {
        let decl = CimProperty::declare("Id", CimType::String).key();
        assert!(decl.is_key());
        assert!(decl.same_shape(&CimProperty::new("Id", "x")));
        assert!(!decl.same_shape(&CimProperty::new("Id", vec!["x"])));
    }
}
