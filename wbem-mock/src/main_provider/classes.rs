//! Class operations.

use std::collections::HashSet;

use cim_model::{normalize_namespace, CimClass};
use tracing::{debug, info};

use super::MainProvider;
use crate::error::{CimError, Result};
use crate::resolver::ClassResolver;
use crate::types::{EnumerateClassesOptions, GetClassOptions};

impl MainProvider {
    /// EnumerateClasses: the subclasses of `classname` (or the root
    /// classes), each filtered like GetClass. DeepInheritance defaults to
    /// false.
    pub fn enumerate_classes(
        &self,
        namespace: &str,
        classname: Option<&str>,
        options: &EnumerateClassesOptions,
    ) -> Result<Vec<CimClass>> {
        let names = self.enumerate_class_names(namespace, classname, options.deep_inheritance)?;
        let get_options = GetClassOptions {
            local_only: options.local_only,
            include_qualifiers: options.include_qualifiers,
            include_classorigin: options.include_classorigin,
            property_list: None,
        };
        names
            .iter()
            .map(|name| self.base.get_class(namespace, name, &get_options))
            .collect()
    }

    /// EnumerateClassNames. DeepInheritance defaults to false.
    pub fn enumerate_class_names(
        &self,
        namespace: &str,
        classname: Option<&str>,
        deep_inheritance: Option<bool>,
    ) -> Result<Vec<String>> {
        self.base.validate_namespace(namespace)?;
        if let Some(classname) = classname {
            self.require_class(namespace, classname)?;
        }
        self.base
            .get_subclass_names(namespace, classname, deep_inheritance.unwrap_or(false))
    }

    /// GetClass. NotFound if the class does not exist.
    pub fn get_class(
        &self,
        namespace: &str,
        classname: &str,
        options: &GetClassOptions,
    ) -> Result<CimClass> {
        self.base.validate_namespace(namespace)?;
        self.base.get_class(namespace, classname, options)
    }

    /// CreateClass: resolve `new_class` against its superclass and store it.
    pub fn create_class(&mut self, namespace: &str, new_class: CimClass) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        if self.base.class_exists(namespace, &new_class.classname)? {
            return Err(CimError::already_exists(format!(
                "Class {} already exists in namespace {}",
                new_class.classname,
                normalize_namespace(namespace)
            )));
        }

        let classname = new_class.classname.clone();
        let resolved = ClassResolver::new(
            normalize_namespace(namespace),
            self.base.class_store(namespace)?,
            self.base.qualifier_store(namespace)?,
        )
        .resolve_class(new_class)?;

        self.base
            .class_store_mut(namespace)?
            .create(classname.as_str(), resolved)
            .map_err(|_| {
                CimError::already_exists(format!(
                    "Class {classname} already exists in namespace {}",
                    normalize_namespace(namespace)
                ))
            })?;
        info!(namespace = %namespace, classname = %classname, "Created class");
        Ok(())
    }

    /// ModifyClass. The superclass may not change, and a class with
    /// subclasses or instances may not be modified.
    pub fn modify_class(&mut self, namespace: &str, modified_class: CimClass) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        let classname = modified_class.classname.clone();
        let stored = self.base.stored_class(namespace, &classname)?;

        let same_superclass = match (&stored.superclass, &modified_class.superclass) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };
        if !same_superclass {
            return Err(CimError::invalid_superclass(format!(
                "ModifyClass may not change the superclass of {classname} (stored: {}, requested: {})",
                stored.superclass.as_deref().unwrap_or("none"),
                modified_class.superclass.as_deref().unwrap_or("none")
            )));
        }

        if !self
            .base
            .get_subclass_names(namespace, Some(&classname), false)?
            .is_empty()
        {
            return Err(CimError::class_has_children(format!(
                "Class {classname} has subclasses in namespace {}",
                normalize_namespace(namespace)
            )));
        }

        let own_class: HashSet<String> = std::iter::once(classname.to_lowercase()).collect();
        if !self.base.instance_paths_of(namespace, &own_class)?.is_empty() {
            return Err(CimError::class_has_instances(format!(
                "Class {classname} has instances in namespace {}",
                normalize_namespace(namespace)
            )));
        }

        let resolved = ClassResolver::new(
            normalize_namespace(namespace),
            self.base.class_store(namespace)?,
            self.base.qualifier_store(namespace)?,
        )
        .resolve_class(modified_class)?;

        self.base
            .class_store_mut(namespace)?
            .update(classname.as_str(), resolved)
            .map_err(|_| {
                CimError::not_found(format!(
                    "Class {classname} not found in namespace {}",
                    normalize_namespace(namespace)
                ))
            })?;
        info!(namespace = %namespace, classname = %classname, "Modified class");
        Ok(())
    }

    /// DeleteClass: delete the class, its subclasses and all of their
    /// instances. Instances are deleted through the dispatcher, so
    /// registered providers see the deletions.
    ///
    /// The cascade is not atomic: if deleting an instance fails, the
    /// classes and instances deleted before it stay deleted.
    pub fn delete_class(&mut self, namespace: &str, classname: &str) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        let mut doomed = self.base.class_and_subclass_names(namespace, classname)?;
        doomed.reverse();

        for name in doomed {
            let own_class: HashSet<String> = std::iter::once(name.to_lowercase()).collect();
            for path in self.base.instance_paths_of(namespace, &own_class)? {
                self.dispatcher
                    .delete_instance(&mut self.base, namespace, &path)?;
            }
            self.base
                .class_store_mut(namespace)?
                .delete(name.as_str())
                .map_err(|_| {
                    CimError::not_found(format!(
                        "Class {name} not found in namespace {}",
                        normalize_namespace(namespace)
                    ))
                })?;
            debug!(namespace = %namespace, classname = %name, "Deleted class");
        }
        info!(namespace = %namespace, classname = %classname, "Deleted class and subclasses");
        Ok(())
    }
}
