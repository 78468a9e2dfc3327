//! Provider for `CIM_Namespace` in the Interop namespace.
//!
//! Creating a `CIM_Namespace` instance creates the namespace named by its
//! `Name` property; deleting the instance removes the namespace again.

use std::collections::HashSet;

use cim_model::{normalize_namespace, CimInstance, CimInstanceName, CimValue};
use tracing::{debug, info};

use crate::base::BaseProvider;
use crate::config::MockConfig;
use crate::error::{CimError, Result};
use crate::main_provider::MainProvider;
use crate::providers::instance_write::DefaultInstanceWriteProvider;
use crate::providers::traits::InstanceWriteProvider;

pub const NAMESPACE_CLASSNAME: &str = "CIM_Namespace";

/// Instance-write provider backing `CIM_Namespace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceProvider;

impl NamespaceProvider {
    pub fn new() -> Self {
        Self
    }

    /// `CIM_Namespace` instance for `name` with the server identity keys
    /// filled in from the config.
    pub fn namespace_instance(config: &MockConfig, classname: &str, name: &str) -> CimInstance {
        CimInstance::new(classname)
            .with_value("Name", normalize_namespace(name))
            .with_value("CreationClassName", classname)
            .with_value("ObjectManagerName", config.object_manager_name.as_str())
            .with_value(
                "ObjectManagerCreationClassName",
                config.object_manager_creation_classname.as_str(),
            )
            .with_value("SystemName", config.system_name.as_str())
            .with_value(
                "SystemCreationClassName",
                config.system_creation_classname.as_str(),
            )
    }

    fn name_of(instance: &CimInstance) -> Result<String> {
        match instance.value("Name") {
            Some(CimValue::String(name)) if !normalize_namespace(name).is_empty() => {
                Ok(normalize_namespace(name).to_string())
            }
            _ => Err(CimError::invalid_parameter(format!(
                "{} instance requires a non-empty string Name property",
                instance.classname
            ))),
        }
    }

    fn require_interop(namespace: &str) -> Result<()> {
        if BaseProvider::is_interop_namespace(namespace) {
            Ok(())
        } else {
            Err(CimError::invalid_namespace(format!(
                "{NAMESPACE_CLASSNAME} instances live only in the Interop namespace, not in {namespace}"
            )))
        }
    }
}

impl InstanceWriteProvider for NamespaceProvider {
    fn provider_classnames(&self) -> Vec<String> {
        vec![NAMESPACE_CLASSNAME.to_string()]
    }

    fn create_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        new_instance: CimInstance,
    ) -> Result<CimInstanceName> {
        Self::require_interop(namespace)?;
        let name = Self::name_of(&new_instance)?;
        let mut instance = Self::namespace_instance(base.config(), &new_instance.classname, &name);
        for prop in new_instance.properties.into_values() {
            if !instance.properties.contains_key(&prop.name) {
                instance.properties.insert(prop.name.clone(), prop);
            }
        }

        base.add_namespace(&name)?;
        match DefaultInstanceWriteProvider.create_instance(base, namespace, instance) {
            Ok(path) => Ok(path),
            Err(err) => {
                base.remove_namespace(&name)?;
                Err(err)
            }
        }
    }

    fn modify_instance(
        &self,
        _base: &mut BaseProvider,
        namespace: &str,
        modified_instance: CimInstance,
    ) -> Result<()> {
        Err(CimError::not_supported(format!(
            "ModifyInstance of {} is not supported in namespace {namespace}",
            modified_instance.classname
        )))
    }

    fn delete_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        instance_name: &CimInstanceName,
    ) -> Result<()> {
        Self::require_interop(namespace)?;
        let name = Self::name_of(base.stored_instance(namespace, instance_name)?)?;
        base.remove_namespace(&name)?;
        DefaultInstanceWriteProvider.delete_instance(base, namespace, instance_name)
    }

    /// Seed one `CIM_Namespace` instance per existing namespace.
    fn post_register_setup(&self, conn: &mut MainProvider) -> Result<()> {
        let interop = conn.base().find_interop_namespace().ok_or_else(|| {
            CimError::failed(format!(
                "{NAMESPACE_CLASSNAME} provider requires an Interop namespace"
            ))
        })?;

        let existing: HashSet<String> = conn
            .base()
            .instance_store(&interop)?
            .iter_values()
            .filter(|inst| inst.classname.eq_ignore_ascii_case(NAMESPACE_CLASSNAME))
            .filter_map(|inst| Self::name_of(inst).ok())
            .map(|name| name.to_lowercase())
            .collect();

        for namespace in conn.base().namespaces() {
            if existing.contains(&namespace.to_lowercase()) {
                continue;
            }
            let instance =
                Self::namespace_instance(conn.base().config(), NAMESPACE_CLASSNAME, &namespace);
            let path = DefaultInstanceWriteProvider.create_instance(
                conn.base_mut(),
                &interop,
                instance,
            )?;
            debug!(path = %path, "Seeded namespace instance");
        }
        info!(interop = %interop, "Namespace provider ready");
        Ok(())
    }
}
