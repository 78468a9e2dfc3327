//! Qualifier declaration operations.

use cim_model::{normalize_namespace, CimClass, CimQualifierDeclaration};
use tracing::info;

use super::MainProvider;
use crate::error::{CimError, Result};

impl MainProvider {
    pub fn enumerate_qualifiers(&self, namespace: &str) -> Result<Vec<CimQualifierDeclaration>> {
        self.base.validate_namespace(namespace)?;
        Ok(self
            .base
            .qualifier_store(namespace)?
            .iter_values()
            .cloned()
            .collect())
    }

    /// GetQualifier. NotFound if no declaration of that name exists.
    pub fn get_qualifier(&self, namespace: &str, name: &str) -> Result<CimQualifierDeclaration> {
        self.base.validate_namespace(namespace)?;
        self.base
            .qualifier_store(namespace)?
            .get_copy(name)
            .map_err(|_| {
                CimError::not_found(format!(
                    "Qualifier declaration {name} not found in namespace {}",
                    normalize_namespace(namespace)
                ))
            })
    }

    /// SetQualifier: create the declaration, or replace an existing one of
    /// the same name.
    pub fn set_qualifier(
        &mut self,
        namespace: &str,
        declaration: CimQualifierDeclaration,
    ) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        let name = declaration.name.clone();
        let store = self.base.qualifier_store_mut(namespace)?;
        let replaced = store.object_exists(name.as_str());
        let result = if replaced {
            store.update(name.as_str(), declaration)
        } else {
            store.create(name.as_str(), declaration)
        };
        result.map_err(|e| CimError::failed(format!("SetQualifier {name}: {e}")))?;
        info!(namespace = %namespace, qualifier = %name, replaced, "Set qualifier declaration");
        Ok(())
    }

    /// DeleteQualifier. Fails while any class of the namespace still uses
    /// the qualifier on itself, a property, a method or a parameter.
    pub fn delete_qualifier(&mut self, namespace: &str, name: &str) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        if !self.base.qualifier_store(namespace)?.object_exists(name) {
            return Err(CimError::not_found(format!(
                "Qualifier declaration {name} not found in namespace {}",
                normalize_namespace(namespace)
            )));
        }

        if let Some(user) = self
            .base
            .class_store(namespace)?
            .iter_values()
            .find(|class| uses_qualifier(class, name))
        {
            return Err(CimError::failed(format!(
                "Qualifier {name} is still used by class {} in namespace {}",
                user.classname,
                normalize_namespace(namespace)
            )));
        }

        self.base
            .qualifier_store_mut(namespace)?
            .delete(name)
            .map_err(|_| {
                CimError::not_found(format!(
                    "Qualifier declaration {name} not found in namespace {}",
                    normalize_namespace(namespace)
                ))
            })?;
        info!(namespace = %namespace, qualifier = %name, "Deleted qualifier declaration");
        Ok(())
    }
}

fn uses_qualifier(class: &CimClass, name: &str) -> bool {
    class.qualifiers.contains_key(name)
        || class
            .properties
            .values()
            .any(|prop| prop.qualifiers.contains_key(name))
        || class.methods.values().any(|method| {
            method.qualifiers.contains_key(name)
                || method
                    .parameters
                    .values()
                    .any(|param| param.qualifiers.contains_key(name))
        })
}
