//! Request options and result shapes of the CIM operations.
//!
//! Optional DSP0200 parameters are `Option`s: `None` means the client did
//! not send the parameter and the operation applies its own default.

use cim_model::{CimClass, CimClassName, CimInstance, CimObjectName, CimParamValue, CimValue};
use serde::{Deserialize, Serialize};

/// Options of GetClass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClassOptions {
    pub local_only: Option<bool>,
    pub include_qualifiers: Option<bool>,
    pub include_classorigin: Option<bool>,
    /// `None` keeps every property, an empty list keeps none
    pub property_list: Option<Vec<String>>,
}

impl GetClassOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_only(mut self, local_only: bool) -> Self {
        self.local_only = Some(local_only);
        self
    }

    pub fn with_include_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = Some(include);
        self
    }

    pub fn with_include_classorigin(mut self, include: bool) -> Self {
        self.include_classorigin = Some(include);
        self
    }

    pub fn with_property_list<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.property_list = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Options that return the stored class unchanged.
    pub fn full() -> Self {
        Self::new()
            .with_local_only(false)
            .with_include_qualifiers(true)
            .with_include_classorigin(true)
    }
}

/// Options of EnumerateClasses and EnumerateClassNames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumerateClassesOptions {
    pub deep_inheritance: Option<bool>,
    pub local_only: Option<bool>,
    pub include_qualifiers: Option<bool>,
    pub include_classorigin: Option<bool>,
}

impl EnumerateClassesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deep_inheritance(mut self, deep: bool) -> Self {
        self.deep_inheritance = Some(deep);
        self
    }

    pub fn with_local_only(mut self, local_only: bool) -> Self {
        self.local_only = Some(local_only);
        self
    }

    pub fn with_include_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = Some(include);
        self
    }

    pub fn with_include_classorigin(mut self, include: bool) -> Self {
        self.include_classorigin = Some(include);
        self
    }
}

/// Options of GetInstance, EnumerateInstances and OpenEnumerateInstances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceOptions {
    /// Accepted but ignored; see `INSTANCE_RETRIEVAL_LOCAL_ONLY`
    pub local_only: Option<bool>,
    /// Defaults to true for EnumerateInstances
    pub deep_inheritance: Option<bool>,
    pub include_qualifiers: Option<bool>,
    pub include_classorigin: Option<bool>,
    pub property_list: Option<Vec<String>>,
}

impl InstanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_only(mut self, local_only: bool) -> Self {
        self.local_only = Some(local_only);
        self
    }

    pub fn with_deep_inheritance(mut self, deep: bool) -> Self {
        self.deep_inheritance = Some(deep);
        self
    }

    pub fn with_include_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = Some(include);
        self
    }

    pub fn with_include_classorigin(mut self, include: bool) -> Self {
        self.include_classorigin = Some(include);
        self
    }

    pub fn with_property_list<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.property_list = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Options of the Associators family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociatorOptions {
    pub assoc_class: Option<String>,
    pub result_class: Option<String>,
    pub role: Option<String>,
    pub result_role: Option<String>,
    pub include_qualifiers: Option<bool>,
    pub include_classorigin: Option<bool>,
    pub property_list: Option<Vec<String>>,
}

impl AssociatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assoc_class(mut self, classname: impl Into<String>) -> Self {
        self.assoc_class = Some(classname.into());
        self
    }

    pub fn with_result_class(mut self, classname: impl Into<String>) -> Self {
        self.result_class = Some(classname.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_result_role(mut self, role: impl Into<String>) -> Self {
        self.result_role = Some(role.into());
        self
    }

    pub fn with_include_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = Some(include);
        self
    }

    pub fn with_include_classorigin(mut self, include: bool) -> Self {
        self.include_classorigin = Some(include);
        self
    }

    pub fn with_property_list<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.property_list = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Options of the References family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOptions {
    pub result_class: Option<String>,
    pub role: Option<String>,
    pub include_qualifiers: Option<bool>,
    pub include_classorigin: Option<bool>,
    pub property_list: Option<Vec<String>>,
}

impl ReferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_class(mut self, classname: impl Into<String>) -> Self {
        self.result_class = Some(classname.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_include_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = Some(include);
        self
    }

    pub fn with_include_classorigin(mut self, include: bool) -> Self {
        self.include_classorigin = Some(include);
        self
    }

    pub fn with_property_list<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.property_list = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Parameters shared by every Open... operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenOptions {
    pub filter_query_language: Option<String>,
    pub filter_query: Option<String>,
    /// Requested inactivity timeout in seconds; recorded, not enforced
    pub operation_timeout: Option<u32>,
    pub continue_on_error: Option<bool>,
    /// `None` uses the configured default page size
    pub max_object_count: Option<u32>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_object_count(mut self, count: u32) -> Self {
        self.max_object_count = Some(count);
        self
    }

    pub fn with_operation_timeout(mut self, seconds: u32) -> Self {
        self.operation_timeout = Some(seconds);
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = Some(continue_on_error);
        self
    }

    pub fn with_filter(mut self, language: Option<&str>, query: impl Into<String>) -> Self {
        self.filter_query_language = language.map(str::to_string);
        self.filter_query = Some(query.into());
        self
    }
}

/// One page of a pull enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct PullResult<T> {
    pub items: Vec<T>,
    pub end_of_sequence: bool,
    /// Context token for the next Pull...; `None` once the sequence ended
    pub context: Option<String>,
}

/// Result object of Associators and References.
///
/// Class-level calls return classes paired with their paths; instance-level
/// calls return instances carrying their paths.
#[derive(Debug, Clone, PartialEq)]
pub enum CimObject {
    Class(CimClassName, CimClass),
    Instance(CimInstance),
}

impl CimObject {
    pub fn path(&self) -> Option<CimObjectName> {
        match self {
            Self::Class(path, _) => Some(CimObjectName::Class(path.clone())),
            Self::Instance(inst) => inst.path.clone().map(CimObjectName::Instance),
        }
    }

    pub fn as_instance(&self) -> Option<&CimInstance> {
        match self {
            Self::Instance(inst) => Some(inst),
            Self::Class(..) => None,
        }
    }

    pub fn as_class(&self) -> Option<&CimClass> {
        match self {
            Self::Class(_, class) => Some(class),
            Self::Instance(_) => None,
        }
    }
}

/// Return value and output parameters of InvokeMethod.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeMethodResult {
    pub return_value: Option<CimValue>,
    pub output_params: Vec<CimParamValue>,
}

impl InvokeMethodResult {
    pub fn new(return_value: impl Into<CimValue>) -> Self {
        Self {
            return_value: Some(return_value.into()),
            output_params: Vec::new(),
        }
    }

    /// Builder: add an output parameter.
    pub fn with_output(mut self, param: CimParamValue) -> Self {
        self.output_params.push(param);
        self
    }
}
