//! Default CreateInstance, ModifyInstance and DeleteInstance.

use cim_model::{normalize_namespace, CimInstance, CimInstanceName};
use tracing::debug;

use crate::base::BaseProvider;
use crate::error::{CimError, Result};
use crate::providers::traits::InstanceWriteProvider;

/// Writes instances straight to the repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInstanceWriteProvider;

impl DefaultInstanceWriteProvider {
    /// Complete the instance with the class's remaining properties and
    /// their default values, compute its path from the key properties and
    /// store it. Instance qualifiers are dropped.
    pub fn create_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        mut new_instance: CimInstance,
    ) -> Result<CimInstanceName> {
        let namespace = normalize_namespace(namespace);
        let class = base
            .stored_class(namespace, &new_instance.classname)
            .map_err(|_| {
                CimError::invalid_class(format!(
                    "Creation class {} of new instance not found in namespace {namespace}",
                    new_instance.classname
                ))
            })?
            .clone();

        for class_prop in class.properties.values() {
            if new_instance.properties.contains_key(&class_prop.name) {
                continue;
            }
            let mut prop = class_prop.clone();
            prop.qualifiers.clear();
            prop.class_origin = None;
            prop.propagated = None;
            new_instance.properties.insert(prop.name.clone(), prop);
        }
        new_instance.qualifiers.clear();

        let path = CimInstanceName::from_instance(&class, &new_instance, Some(namespace))
            .map_err(|err| CimError::invalid_parameter(err.to_string()))?;

        let store = base.instance_store_mut(namespace)?;
        if store.object_exists(&path) {
            return Err(CimError::already_exists(format!(
                "Instance {path} already exists in namespace {namespace}"
            )));
        }
        new_instance.path = Some(path.clone());
        store
            .create(&path, new_instance)
            .map_err(|err| CimError::already_exists(err.to_string()))?;

        debug!(namespace = %namespace, path = %path, "Created instance");
        Ok(path)
    }

    /// Copy the property values of `modified_instance` onto the stored
    /// instance named by its path.
    pub fn modify_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        modified_instance: CimInstance,
    ) -> Result<()> {
        let namespace = normalize_namespace(namespace);
        let path = modified_instance.path.clone().ok_or_else(|| {
            CimError::invalid_parameter("Modified instance has no path")
        })?;
        let store = base.instance_store_mut(namespace)?;
        let mut stored = store.get_copy(&path).map_err(|_| {
            CimError::not_found(format!("Instance {path} not found in namespace {namespace}"))
        })?;

        for prop in modified_instance.properties.into_values() {
            match stored.properties.get_mut(&prop.name) {
                Some(existing) => existing.value = prop.value,
                None => {
                    stored.properties.insert(prop.name.clone(), prop);
                }
            }
        }

        store
            .update(&path, stored)
            .map_err(|err| CimError::not_found(err.to_string()))?;
        debug!(namespace = %namespace, path = %path, "Modified instance");
        Ok(())
    }

    pub fn delete_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        instance_name: &CimInstanceName,
    ) -> Result<()> {
        let namespace = normalize_namespace(namespace);
        base.instance_store_mut(namespace)?
            .delete(instance_name)
            .map_err(|_| {
                CimError::not_found(format!(
                    "Instance {instance_name} not found in namespace {namespace}"
                ))
            })?;
        debug!(namespace = %namespace, path = %instance_name, "Deleted instance");
        Ok(())
    }
}

impl InstanceWriteProvider for DefaultInstanceWriteProvider {
    fn provider_classnames(&self) -> Vec<String> {
        Vec::new()
    }
}
