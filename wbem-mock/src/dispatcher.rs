//! Validation and routing of the overridable operations.
//!
//! CreateInstance, ModifyInstance, DeleteInstance and InvokeMethod pass
//! through a fixed pipeline before any provider runs:
//!
//! 1. structural checks on the request
//! 2. namespace, class and instance existence
//! 3. property and parameter shape against the class declaration
//! 4. key immutability (ModifyInstance)
//! 5. method checks (InvokeMethod)
//! 6. routing to the registered provider, or the default one
//! 7. a check of the provider's result
//!
//! Any failing step ends the call with its error; no provider code runs
//! for a request that fails steps 1-5.

use std::sync::{Arc, OnceLock};

use cim_model::{
    normalize_namespace, CimClass, CimInstance, CimInstanceName, CimObjectName, CimParamValue,
    CimParameter, CimProperty, CimType, EmbeddedObject, NocaseMap,
};
use tracing::debug;

use crate::base::{filter_properties, BaseProvider};
use crate::error::{CimError, RegistrationError, Result};
use crate::providers::{
    DefaultInstanceWriteProvider, DefaultMethodProvider, InstanceWriteProvider, MethodProvider,
    Provider, ProviderType,
};
use crate::registry::ProviderRegistry;
use crate::types::InvokeMethodResult;

/// Routes overridable operations to registered or default providers.
#[derive(Debug, Default)]
pub struct ProviderDispatcher {
    registry: ProviderRegistry,
    default_instance_writer: OnceLock<Arc<dyn InstanceWriteProvider>>,
    default_method_provider: OnceLock<Arc<dyn MethodProvider>>,
}

impl ProviderDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Record a provider; see [`ProviderRegistry::register_provider`].
    pub fn register_provider(
        &mut self,
        base: &BaseProvider,
        provider: Provider,
        namespaces: &[String],
    ) -> std::result::Result<(), RegistrationError> {
        self.registry.register_provider(base, provider, namespaces)
    }

    fn instance_writer(&self, namespace: &str, classname: &str) -> Arc<dyn InstanceWriteProvider> {
        match self
            .registry
            .get_registered_provider(namespace, ProviderType::InstanceWrite, classname)
            .and_then(Provider::as_instance_write)
        {
            Some(provider) => Arc::clone(provider),
            None => Arc::clone(
                self.default_instance_writer
                    .get_or_init(|| Arc::new(DefaultInstanceWriteProvider)),
            ),
        }
    }

    fn method_provider(&self, namespace: &str, classname: &str) -> Arc<dyn MethodProvider> {
        match self
            .registry
            .get_registered_provider(namespace, ProviderType::Method, classname)
            .and_then(Provider::as_method)
        {
            Some(provider) => Arc::clone(provider),
            None => Arc::clone(
                self.default_method_provider
                    .get_or_init(|| Arc::new(DefaultMethodProvider)),
            ),
        }
    }

    /// The creation class of a request; InvalidClass if it does not exist.
    fn target_class(base: &BaseProvider, namespace: &str, classname: &str) -> Result<CimClass> {
        base.validate_namespace(namespace)?;
        base.stored_class(namespace, classname)
            .map(Clone::clone)
            .map_err(|_| {
                CimError::invalid_class(format!(
                    "Class {classname} not found in namespace {}",
                    normalize_namespace(namespace)
                ))
            })
    }

    /// Every property of `instance` must be exposed by `class` with the
    /// same type, array-ness and embedded-object attribute.
    fn check_property_shapes(class: &CimClass, instance: &CimInstance) -> Result<()> {
        for prop in instance.properties.values() {
            let Some(declared) = class.properties.get(&prop.name) else {
                return Err(CimError::invalid_parameter(format!(
                    "Property {} is not exposed by class {}",
                    prop.name, class.classname
                )));
            };
            if !property_matches(declared, prop) {
                return Err(CimError::invalid_parameter(format!(
                    "Property {} of class {} is declared as {}{}; the request carries {}{}",
                    prop.name,
                    class.classname,
                    declared.cim_type,
                    if declared.is_array { "[]" } else { "" },
                    prop.cim_type,
                    if prop.is_array { "[]" } else { "" },
                )));
            }
        }
        Ok(())
    }

    pub fn create_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        new_instance: CimInstance,
    ) -> Result<CimInstanceName> {
        if new_instance.path.is_some() {
            return Err(CimError::invalid_parameter(format!(
                "New instance of class {} must not carry a path",
                new_instance.classname
            )));
        }
        let class = Self::target_class(base, namespace, &new_instance.classname)?;
        Self::check_property_shapes(&class, &new_instance)?;

        let classname = new_instance.classname.clone();
        let provider = self.instance_writer(namespace, &classname);
        debug!(namespace = %namespace, classname = %classname, "Dispatching CreateInstance");
        let path = provider.create_instance(base, namespace, new_instance)?;

        if !path.classname.eq_ignore_ascii_case(&classname) {
            return Err(CimError::failed(format!(
                "Provider for {classname} returned path {path} of a different class"
            )));
        }
        Ok(path)
    }

    /// ModifyInstance. `property_list` restricts the properties taken from
    /// `modified_instance`; `include_qualifiers` is deprecated and ignored.
    pub fn modify_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        mut modified_instance: CimInstance,
        include_qualifiers: Option<bool>,
        property_list: Option<&[String]>,
    ) -> Result<()> {
        let Some(path) = modified_instance.path.clone() else {
            return Err(CimError::invalid_parameter(format!(
                "Modified instance of class {} has no path",
                modified_instance.classname
            )));
        };
        if !path.classname.eq_ignore_ascii_case(&modified_instance.classname) {
            return Err(CimError::invalid_parameter(format!(
                "Modified instance class {} does not match its path class {}",
                modified_instance.classname, path.classname
            )));
        }
        if include_qualifiers.is_some() {
            debug!(namespace = %namespace, "Ignoring IncludeQualifiers on ModifyInstance");
        }

        let class = Self::target_class(base, namespace, &modified_instance.classname)?;
        let original = base.stored_instance(namespace, &path)?.clone();

        if let Some(property_list) = property_list {
            filter_properties(&mut modified_instance.properties, property_list);
        }
        Self::check_property_shapes(&class, &modified_instance)?;

        for key in class.key_properties() {
            let Some(modified) = modified_instance.properties.get(&key.name) else {
                continue;
            };
            let stored = original.properties.get(&key.name).and_then(|p| p.value.as_ref());
            if modified.value.as_ref() != stored {
                return Err(CimError::invalid_parameter(format!(
                    "ModifyInstance may not change key property {} of {path}",
                    key.name
                )));
            }
        }

        let provider = self.instance_writer(namespace, &class.classname);
        debug!(namespace = %namespace, path = %path, "Dispatching ModifyInstance");
        provider.modify_instance(base, namespace, modified_instance)
    }

    pub fn delete_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        instance_name: &CimInstanceName,
    ) -> Result<()> {
        let class = Self::target_class(base, namespace, &instance_name.classname)?;
        if !base.instance_exists(namespace, instance_name)? {
            return Err(CimError::not_found(format!(
                "Instance {instance_name} not found in namespace {}",
                normalize_namespace(namespace)
            )));
        }

        let provider = self.instance_writer(namespace, &class.classname);
        debug!(namespace = %namespace, path = %instance_name, "Dispatching DeleteInstance");
        provider.delete_instance(base, namespace, instance_name)
    }

    pub fn invoke_method(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        method_name: &str,
        object_name: &CimObjectName,
        params: Vec<CimParamValue>,
    ) -> Result<InvokeMethodResult> {
        let class = Self::target_class(base, namespace, object_name.classname())?;
        if let CimObjectName::Instance(path) = object_name {
            if !base.instance_exists(namespace, path)? {
                return Err(CimError::not_found(format!(
                    "Instance {path} not found in namespace {}",
                    normalize_namespace(namespace)
                )));
            }
        }

        let Some(method) = class.methods.get(method_name) else {
            return Err(CimError::method_not_found(format!(
                "Method {method_name} not found in class {}",
                class.classname
            )));
        };
        if matches!(object_name, CimObjectName::Class(_)) && !method.is_static() {
            return Err(CimError::invalid_parameter(format!(
                "Method {method_name} of class {} is not static and cannot be invoked on the class",
                class.classname
            )));
        }

        let mut in_params = NocaseMap::new();
        for param in params {
            let Some(declared) = method.parameters.get(&param.name) else {
                return Err(CimError::invalid_parameter(format!(
                    "Parameter {} is not declared by method {method_name}",
                    param.name
                )));
            };
            if !declared.is_input() {
                return Err(CimError::invalid_parameter(format!(
                    "Parameter {} of method {method_name} is not an input parameter",
                    param.name
                )));
            }
            if !param_matches(declared, &param) {
                return Err(CimError::invalid_parameter(format!(
                    "Parameter {} of method {method_name} is declared as {}{}",
                    param.name,
                    declared.cim_type,
                    if declared.is_array { "[]" } else { "" }
                )));
            }
            in_params.insert(param.name.clone(), param);
        }

        let provider = self.method_provider(namespace, &class.classname);
        debug!(
            namespace = %namespace,
            object = %object_name,
            method = %method_name,
            "Dispatching InvokeMethod"
        );
        let result = provider.invoke_method(base, namespace, method_name, object_name, &in_params)?;

        if let Some(value) = &result.return_value {
            if value.cim_type().is_some_and(|t| t != method.return_type) {
                return Err(CimError::failed(format!(
                    "Provider returned a {} value for method {method_name} declared to return {}",
                    value.cim_type().map(|t| t.as_str()).unwrap_or("untyped"),
                    method.return_type
                )));
            }
        }
        for out in &result.output_params {
            if !method.parameters.contains_key(&out.name) {
                return Err(CimError::failed(format!(
                    "Provider returned output parameter {} not declared by method {method_name}",
                    out.name
                )));
            }
        }
        Ok(result)
    }
}

/// An EmbeddedObject property or parameter may carry an embedded instance.
fn embedded_matches(declared: Option<EmbeddedObject>, actual: Option<EmbeddedObject>) -> bool {
    declared == actual
        || (declared == Some(EmbeddedObject::Object) && actual == Some(EmbeddedObject::Instance))
}

fn property_matches(declared: &CimProperty, actual: &CimProperty) -> bool {
    if declared.is_array != actual.is_array {
        return false;
    }
    match &actual.value {
        None => {
            declared.cim_type == actual.cim_type
                && embedded_matches(declared.embedded_object, actual.embedded_object)
        }
        Some(value) => {
            let type_ok = match value.cim_type() {
                Some(t) => t == declared.cim_type,
                None => actual.cim_type == declared.cim_type || declared.is_array,
            };
            type_ok
                && (declared.cim_type != CimType::String
                    || embedded_matches(declared.embedded_object, actual.embedded_object))
        }
    }
}

fn param_matches(declared: &CimParameter, actual: &CimParamValue) -> bool {
    match &actual.value {
        None => declared.cim_type == actual.cim_type,
        Some(value) => {
            value.is_array() == declared.is_array
                && value.cim_type().map_or(declared.is_array, |t| t == declared.cim_type)
                && embedded_matches(declared.embedded_object, actual.embedded_object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CimStatus;
    use cim_model::{CimMethod, CimValue};

    fn base() -> BaseProvider {
        let mut base = BaseProvider::default();
        base.add_namespace("root/cimv2").unwrap();
        let class = CimClass::new("CIM_Foo")
            .with_property(CimProperty::declare("Id", CimType::String).key())
            .with_property(CimProperty::declare("Count", CimType::Uint32))
            .with_property(CimProperty::declare("Tags", CimType::String).as_array())
            .with_property(
                CimProperty::declare("Obj", CimType::String)
                    .with_embedded_object(EmbeddedObject::Instance),
            )
            .with_method(
                CimMethod::new("Reset", CimType::Uint32)
                    .with_parameter(CimParameter::new("Level", CimType::Uint8))
                    .with_parameter(CimParameter::new("Log", CimType::String).output()),
            )
            .with_method(CimMethod::new("Create", CimType::Uint32).static_method());
        base.class_store_mut("root/cimv2")
            .unwrap()
            .create("CIM_Foo", class)
            .unwrap();
        base
    }

    fn foo(id: &str) -> CimInstance {
        CimInstance::new("CIM_Foo").with_value("Id", id)
    }

    #[test]
    fn test_create_routes_to_default() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();
        let path = dispatcher
            .create_instance(&mut base, "root/cimv2", foo("a").with_value("Count", 3u32))
            .unwrap();
        assert!(base.instance_exists("root/cimv2", &path).unwrap());
    }

    #[test]
    fn test_create_rejects_bad_requests() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();

        let with_path = foo("a").with_path(CimInstanceName::new("CIM_Foo").with_key("Id", "a"));
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", with_path)
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/nope", foo("a"))
                .unwrap_err()
                .status,
            CimStatus::InvalidNamespace
        );
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", CimInstance::new("CIM_Nope"))
                .unwrap_err()
                .status,
            CimStatus::InvalidClass
        );
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", foo("a").with_value("Bogus", 1u8))
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", foo("a").with_value("Count", "three"))
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", foo("a").with_value("Tags", "single"))
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
    }

    #[test]
    fn test_null_value_keeps_embedded_kind() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();

        let plain_null = foo("a").with_property(CimProperty::declare("Obj", CimType::String));
        assert_eq!(
            dispatcher
                .create_instance(&mut base, "root/cimv2", plain_null)
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        assert!(base.instance_store("root/cimv2").unwrap().is_empty());

        let embedded_null = foo("a").with_property(
            CimProperty::declare("Obj", CimType::String)
                .with_embedded_object(EmbeddedObject::Instance),
        );
        dispatcher
            .create_instance(&mut base, "root/cimv2", embedded_null)
            .unwrap();
    }

    #[test]
    fn test_modify_key_is_immutable() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();
        let path = dispatcher
            .create_instance(&mut base, "root/cimv2", foo("a"))
            .unwrap();

        let changed_key = foo("b").with_path(path.clone());
        let err = dispatcher
            .modify_instance(&mut base, "root/cimv2", changed_key, None, None)
            .unwrap_err();
        assert_eq!(err.status, CimStatus::InvalidParameter);
        assert_eq!(
            base.stored_instance("root/cimv2", &path).unwrap().value("Id"),
            Some(&CimValue::from("a"))
        );
    }

    #[test]
    fn test_modify_property_list() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();
        let path = dispatcher
            .create_instance(&mut base, "root/cimv2", foo("a").with_value("Count", 1u32))
            .unwrap();

        let modified = foo("a")
            .with_value("Count", 2u32)
            .with_value("Tags", vec!["x"])
            .with_path(path.clone());
        let only_tags = ["Tags".to_string()];
        dispatcher
            .modify_instance(&mut base, "root/cimv2", modified, Some(true), Some(&only_tags))
            .unwrap();

        let stored = base.stored_instance("root/cimv2", &path).unwrap();
        assert_eq!(stored.value("Count"), Some(&CimValue::from(1u32)));
        assert_eq!(stored.value("Tags"), Some(&CimValue::from(vec!["x"])));
    }

    #[test]
    fn test_modify_and_delete_missing_instance() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();
        let path = CimInstanceName::new("CIM_Foo")
            .with_key("Id", "ghost")
            .with_namespace("root/cimv2");

        let err = dispatcher
            .modify_instance(&mut base, "root/cimv2", foo("ghost").with_path(path.clone()), None, None)
            .unwrap_err();
        assert_eq!(err.status, CimStatus::NotFound);
        let err = dispatcher
            .delete_instance(&mut base, "root/cimv2", &path)
            .unwrap_err();
        assert_eq!(err.status, CimStatus::NotFound);

        let mismatched = CimInstance::new("CIM_Other").with_path(path);
        let err = dispatcher
            .modify_instance(&mut base, "root/cimv2", mismatched, None, None)
            .unwrap_err();
        assert_eq!(err.status, CimStatus::InvalidParameter);
    }

    #[test]
    fn test_invoke_method_checks() {
        let mut base = base();
        let dispatcher = ProviderDispatcher::new();
        let path = dispatcher
            .create_instance(&mut base, "root/cimv2", foo("a"))
            .unwrap();
        let on_instance = CimObjectName::Instance(path);
        let on_class = CimObjectName::Class(cim_model::CimClassName::new("CIM_Foo"));

        let status = |result: Result<InvokeMethodResult>| result.unwrap_err().status;

        assert_eq!(
            status(dispatcher.invoke_method(&mut base, "root/cimv2", "Nope", &on_instance, vec![])),
            CimStatus::MethodNotFound
        );
        assert_eq!(
            status(dispatcher.invoke_method(&mut base, "root/cimv2", "Reset", &on_class, vec![])),
            CimStatus::InvalidParameter
        );
        assert_eq!(
            status(dispatcher.invoke_method(
                &mut base,
                "root/cimv2",
                "Reset",
                &on_instance,
                vec![CimParamValue::new("Log", "x")]
            )),
            CimStatus::InvalidParameter
        );
        assert_eq!(
            status(dispatcher.invoke_method(
                &mut base,
                "root/cimv2",
                "Reset",
                &on_instance,
                vec![CimParamValue::new("Level", "high")]
            )),
            CimStatus::InvalidParameter
        );
        // Valid request reaches the default provider.
        assert_eq!(
            status(dispatcher.invoke_method(
                &mut base,
                "root/cimv2",
                "Reset",
                &on_instance,
                vec![CimParamValue::new("Level", 2u8)]
            )),
            CimStatus::MethodNotFound
        );
        assert_eq!(
            status(dispatcher.invoke_method(&mut base, "root/cimv2", "Create", &on_class, vec![])),
            CimStatus::MethodNotFound
        );
    }
}
