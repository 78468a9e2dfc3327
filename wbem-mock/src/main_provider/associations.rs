//! Associators, AssociatorNames, References and ReferenceNames.
//!
//! With an instance path as ObjectName the operations scan the association
//! instances of the namespace; with a class path they scan the association
//! classes. Role, ResultRole, AssocClass and ResultClass filters compare
//! names case-insensitively; the class filters include subclasses.
//!
//! A reference property is never paired with itself: the associated side
//! of an association is always reached through a different property than
//! the one that matched the source. A class associated with itself through
//! a single role therefore does not show up as its own associator.

use std::collections::HashSet;

use cim_model::{
    normalize_namespace, CimClassName, CimInstance, CimInstanceName, CimObjectName, CimProperty,
    CimValue,
};
use tracing::debug;

use super::MainProvider;
use crate::error::Result;
use crate::types::{AssociatorOptions, CimObject, GetClassOptions, ReferenceOptions};

/// Resolved filters of one association request. Class filters hold the
/// lowercased names of the filter class and its subclasses.
struct Traversal<'a> {
    assoc_class: Option<HashSet<String>>,
    result_class: Option<HashSet<String>>,
    role: Option<&'a str>,
    result_role: Option<&'a str>,
}

fn in_filter(filter: &Option<HashSet<String>>, classname: &str) -> bool {
    filter
        .as_ref()
        .map_or(true, |names| names.contains(&classname.to_lowercase()))
}

fn role_matches(role: Option<&str>, property: &str) -> bool {
    role.map_or(true, |role| role.eq_ignore_ascii_case(property))
}

fn in_namespace(path: &CimInstanceName, namespace: &str) -> bool {
    path.namespace.as_deref().map_or(true, |ns| {
        normalize_namespace(ns).eq_ignore_ascii_case(normalize_namespace(namespace))
    })
}

/// (property name, referenced path) of every non-NULL reference value.
fn reference_values(instance: &CimInstance) -> Vec<(&str, &CimInstanceName)> {
    instance
        .properties
        .values()
        .filter_map(|p| {
            p.value
                .as_ref()
                .and_then(CimValue::as_reference)
                .map(|path| (p.name.as_str(), path))
        })
        .collect()
}

impl MainProvider {
    pub fn associators(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &AssociatorOptions,
    ) -> Result<Vec<CimObject>> {
        let traversal = self.associator_traversal(namespace, object_name, options)?;
        match object_name {
            CimObjectName::Instance(source) => {
                let flags = self.retrieval_flags(
                    options.include_qualifiers,
                    options.include_classorigin,
                    None,
                );
                let mut objects = Vec::new();
                for path in self.associated_instance_paths(namespace, source, &traversal)? {
                    let stored = self.base.stored_instance(namespace, &path)?;
                    objects.push(CimObject::Instance(self.returned_instance(
                        namespace,
                        stored,
                        &flags,
                        options.property_list.as_deref(),
                    )));
                }
                Ok(objects)
            }
            CimObjectName::Class(source) => self.class_objects(
                namespace,
                self.associated_classnames(namespace, &source.classname, &traversal)?,
                options.include_qualifiers,
                options.include_classorigin,
                options.property_list.clone(),
            ),
        }
    }

    pub fn associator_names(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &AssociatorOptions,
    ) -> Result<Vec<CimObjectName>> {
        let traversal = self.associator_traversal(namespace, object_name, options)?;
        match object_name {
            CimObjectName::Instance(source) => Ok(self
                .associated_instance_paths(namespace, source, &traversal)?
                .into_iter()
                .map(CimObjectName::Instance)
                .collect()),
            CimObjectName::Class(source) => Ok(self
                .associated_classnames(namespace, &source.classname, &traversal)?
                .into_iter()
                .map(|name| class_path(namespace, name))
                .collect()),
        }
    }

    pub fn references(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &ReferenceOptions,
    ) -> Result<Vec<CimObject>> {
        let traversal = self.reference_traversal(namespace, object_name, options)?;
        match object_name {
            CimObjectName::Instance(source) => {
                let flags = self.retrieval_flags(
                    options.include_qualifiers,
                    options.include_classorigin,
                    None,
                );
                Ok(self
                    .referencing_instances(namespace, source, &traversal)?
                    .into_iter()
                    .map(|inst| {
                        CimObject::Instance(self.returned_instance(
                            namespace,
                            inst,
                            &flags,
                            options.property_list.as_deref(),
                        ))
                    })
                    .collect())
            }
            CimObjectName::Class(source) => self.class_objects(
                namespace,
                self.referencing_classnames(namespace, &source.classname, &traversal)?,
                options.include_qualifiers,
                options.include_classorigin,
                options.property_list.clone(),
            ),
        }
    }

    pub fn reference_names(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &ReferenceOptions,
    ) -> Result<Vec<CimObjectName>> {
        let traversal = self.reference_traversal(namespace, object_name, options)?;
        match object_name {
            CimObjectName::Instance(source) => Ok(self
                .referencing_instances(namespace, source, &traversal)?
                .into_iter()
                .filter_map(|inst| inst.path.clone())
                .map(|path| CimObjectName::Instance(path.with_namespace(normalize_namespace(namespace))))
                .collect()),
            CimObjectName::Class(source) => Ok(self
                .referencing_classnames(namespace, &source.classname, &traversal)?
                .into_iter()
                .map(|name| class_path(namespace, name))
                .collect()),
        }
    }

    // --- request validation ---

    /// The ObjectName class must exist (InvalidParameter); an instance
    /// ObjectName must name a stored instance (NotFound).
    fn validate_object_name(&self, namespace: &str, object_name: &CimObjectName) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        self.require_class_parameter(namespace, object_name.classname(), "ObjectName")?;
        if let CimObjectName::Instance(path) = object_name {
            self.base.stored_instance(namespace, path)?;
        }
        Ok(())
    }

    fn class_filter(
        &self,
        namespace: &str,
        classname: Option<&str>,
        what: &str,
    ) -> Result<Option<HashSet<String>>> {
        match classname {
            Some(classname) => {
                self.require_class_parameter(namespace, classname, what)?;
                Ok(Some(self.base.class_closure(namespace, classname)?))
            }
            None => Ok(None),
        }
    }

    fn associator_traversal<'a>(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &'a AssociatorOptions,
    ) -> Result<Traversal<'a>> {
        self.validate_object_name(namespace, object_name)?;
        Ok(Traversal {
            assoc_class: self.class_filter(namespace, options.assoc_class.as_deref(), "AssocClass")?,
            result_class: self.class_filter(
                namespace,
                options.result_class.as_deref(),
                "ResultClass",
            )?,
            role: options.role.as_deref(),
            result_role: options.result_role.as_deref(),
        })
    }

    /// For References, ResultClass filters the association side.
    fn reference_traversal<'a>(
        &self,
        namespace: &str,
        object_name: &CimObjectName,
        options: &'a ReferenceOptions,
    ) -> Result<Traversal<'a>> {
        self.validate_object_name(namespace, object_name)?;
        Ok(Traversal {
            assoc_class: self.class_filter(
                namespace,
                options.result_class.as_deref(),
                "ResultClass",
            )?,
            result_class: None,
            role: options.role.as_deref(),
            result_role: None,
        })
    }

    // --- instance level ---

    fn association_classnames(&self, namespace: &str) -> Result<HashSet<String>> {
        Ok(self
            .base
            .class_store(namespace)?
            .iter_values()
            .filter(|class| class.is_association())
            .map(|class| class.classname.to_lowercase())
            .collect())
    }

    /// Association instances that reference `source` through a property
    /// matching the role filter.
    fn referencing_instances(
        &self,
        namespace: &str,
        source: &CimInstanceName,
        traversal: &Traversal<'_>,
    ) -> Result<Vec<&CimInstance>> {
        let associations = self.association_classnames(namespace)?;
        let found: Vec<&CimInstance> = self
            .base
            .instance_store(namespace)?
            .iter_values()
            .filter(|inst| associations.contains(&inst.classname.to_lowercase()))
            .filter(|inst| in_filter(&traversal.assoc_class, &inst.classname))
            .filter(|inst| {
                reference_values(inst).into_iter().any(|(name, path)| {
                    role_matches(traversal.role, name) && path.same_object_in(source, namespace)
                })
            })
            .collect();
        debug!(namespace = %namespace, source = %source, count = found.len(), "Found referencing instances");
        Ok(found)
    }

    /// Paths of the instances associated with `source`. References to
    /// instances that do not exist in the namespace are skipped.
    fn associated_instance_paths(
        &self,
        namespace: &str,
        source: &CimInstanceName,
        traversal: &Traversal<'_>,
    ) -> Result<Vec<CimInstanceName>> {
        let store = self.base.instance_store(namespace)?;
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for assoc in self.referencing_instances(namespace, source, traversal)? {
            let refs = reference_values(assoc);
            for (source_role, source_ref) in &refs {
                if !role_matches(traversal.role, source_role)
                    || !source_ref.same_object_in(source, namespace)
                {
                    continue;
                }
                for (result_role, target) in &refs {
                    if result_role.eq_ignore_ascii_case(source_role)
                        || !role_matches(traversal.result_role, result_role)
                        || !in_filter(&traversal.result_class, &target.classname)
                    {
                        continue;
                    }
                    if !in_namespace(target, namespace) || !store.object_exists(*target) {
                        debug!(target = %target, "Skipping dangling association reference");
                        continue;
                    }
                    if seen.insert(target.canonical_key()) {
                        let path = (*target).clone();
                        paths.push(path.with_namespace(normalize_namespace(namespace)));
                    }
                }
            }
        }
        Ok(paths)
    }

    // --- class level ---

    fn class_matches(&self, namespace: &str, classname: &str, property: &CimProperty) -> bool {
        property.reference_class.as_deref().is_some_and(|target| {
            matches!(self.base.is_subclass(namespace, classname, target), Ok(true))
        })
    }

    /// Association classes with a reference property, matching the role
    /// filter, to `source` or one of its superclasses.
    fn referencing_classnames(
        &self,
        namespace: &str,
        source: &str,
        traversal: &Traversal<'_>,
    ) -> Result<Vec<String>> {
        Ok(self
            .base
            .class_store(namespace)?
            .iter_values()
            .filter(|class| class.is_association())
            .filter(|class| in_filter(&traversal.assoc_class, &class.classname))
            .filter(|class| {
                class.reference_properties().any(|prop| {
                    role_matches(traversal.role, &prop.name)
                        && self.class_matches(namespace, source, prop)
                })
            })
            .map(|class| class.classname.clone())
            .collect())
    }

    fn associated_classnames(
        &self,
        namespace: &str,
        source: &str,
        traversal: &Traversal<'_>,
    ) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for assoc in self.referencing_classnames(namespace, source, traversal)? {
            let class = self.base.stored_class(namespace, &assoc)?;
            let refs: Vec<&CimProperty> = class.reference_properties().collect();
            for source_prop in &refs {
                if !role_matches(traversal.role, &source_prop.name)
                    || !self.class_matches(namespace, source, source_prop)
                {
                    continue;
                }
                for result_prop in &refs {
                    if result_prop.name.eq_ignore_ascii_case(&source_prop.name)
                        || !role_matches(traversal.result_role, &result_prop.name)
                    {
                        continue;
                    }
                    let Some(target) = result_prop.reference_class.as_deref() else {
                        continue;
                    };
                    if !in_filter(&traversal.result_class, target) {
                        continue;
                    }
                    let Ok(target_class) = self.base.stored_class(namespace, target) else {
                        continue;
                    };
                    if seen.insert(target_class.classname.to_lowercase()) {
                        names.push(target_class.classname.clone());
                    }
                }
            }
        }
        Ok(names)
    }

    fn class_objects(
        &self,
        namespace: &str,
        classnames: Vec<String>,
        include_qualifiers: Option<bool>,
        include_classorigin: Option<bool>,
        property_list: Option<Vec<String>>,
    ) -> Result<Vec<CimObject>> {
        let options = GetClassOptions {
            local_only: Some(false),
            include_qualifiers: Some(include_qualifiers.unwrap_or(false)),
            include_classorigin,
            property_list,
        };
        classnames
            .into_iter()
            .map(|name| {
                let class = self.base.get_class(namespace, &name, &options)?;
                let path = CimClassName::new(class.classname.clone())
                    .with_namespace(normalize_namespace(namespace));
                Ok(CimObject::Class(path, class))
            })
            .collect()
    }
}

fn class_path(namespace: &str, classname: String) -> CimObjectName {
    CimObjectName::Class(CimClassName::new(classname).with_namespace(normalize_namespace(namespace)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CimStatus;
    use cim_model::{CimClass, CimQualifierDeclaration, CimType};

    const NS: &str = "root/cimv2";

    fn provider() -> MainProvider {
        let mut main = MainProvider::default();
        main.add_namespace(NS).unwrap();
        for decl in [
            CimQualifierDeclaration::new("Key", CimType::Boolean)
                .with_default(false)
                .with_scopes(&["property", "reference"])
                .with_flavors(false, true),
            CimQualifierDeclaration::new("Association", CimType::Boolean)
                .with_default(false)
                .with_scopes(&["association"])
                .with_flavors(false, true),
        ] {
            main.set_qualifier(NS, decl).unwrap();
        }
        main.create_class(
            NS,
            CimClass::new("CIM_Person")
                .with_property(CimProperty::declare("Name", CimType::String).key()),
        )
        .unwrap();
        main.create_class(
            NS,
            CimClass::new("CIM_Employee").with_superclass("CIM_Person"),
        )
        .unwrap();
        main.create_class(
            NS,
            CimClass::new("CIM_Manages")
                .association()
                .with_property(CimProperty::reference("Manager", "CIM_Person").key())
                .with_property(CimProperty::reference("Report", "CIM_Person").key()),
        )
        .unwrap();

        for name in ["boss", "dev"] {
            main.create_instance(NS, CimInstance::new("CIM_Employee").with_value("Name", name))
                .unwrap();
        }
        main.create_instance(
            NS,
            CimInstance::new("CIM_Manages")
                .with_value("Manager", person("boss"))
                .with_value("Report", person("dev")),
        )
        .unwrap();
        main
    }

    fn person(name: &str) -> CimInstanceName {
        CimInstanceName::new("CIM_Employee")
            .with_key("Name", name)
            .with_namespace(NS)
    }

    #[test]
    fn test_instance_level_roles() {
        let main = provider();
        let boss = CimObjectName::Instance(person("boss"));

        let names = main
            .associator_names(NS, &boss, &AssociatorOptions::new())
            .unwrap();
        assert_eq!(names, vec![CimObjectName::Instance(person("dev"))]);

        let as_report = main
            .associator_names(NS, &boss, &AssociatorOptions::new().with_role("Report"))
            .unwrap();
        assert!(as_report.is_empty());

        let refs = main
            .reference_names(NS, &boss, &ReferenceOptions::new().with_role("manager"))
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].classname(), "CIM_Manages");

        let objects = main
            .associators(NS, &boss, &AssociatorOptions::new().with_result_class("CIM_Person"))
            .unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].as_instance().and_then(|i| i.value("Name")),
            Some(&CimValue::from("dev"))
        );
    }

    #[test]
    fn test_class_level_self_association() {
        let main = provider();
        let person_class = CimObjectName::Class(CimClassName::new("CIM_Person"));

        let names = main
            .associator_names(NS, &person_class, &AssociatorOptions::new())
            .unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].classname(), "CIM_Person");

        let refs = main
            .references(NS, &person_class, &ReferenceOptions::new())
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_class().map(|c| c.classname.as_str()), Some("CIM_Manages"));

        let employee = CimObjectName::Class(CimClassName::new("CIM_Employee"));
        let refs = main
            .reference_names(NS, &employee, &ReferenceOptions::new().with_role("Report"))
            .unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_dangling_reference_skipped() {
        let mut main = provider();
        main.create_instance(
            NS,
            CimInstance::new("CIM_Manages")
                .with_value("Manager", person("boss"))
                .with_value("Report", person("ghost")),
        )
        .unwrap();

        let boss = CimObjectName::Instance(person("boss"));
        let names = main
            .associator_names(NS, &boss, &AssociatorOptions::new())
            .unwrap();
        assert_eq!(names.len(), 1);
        let refs = main
            .reference_names(NS, &boss, &ReferenceOptions::new())
            .unwrap();
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_invalid_filters() {
        let main = provider();
        let boss = CimObjectName::Instance(person("boss"));

        assert_eq!(
            main.associators(NS, &boss, &AssociatorOptions::new().with_assoc_class("CIM_Nope"))
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        assert_eq!(
            main.references(NS, &boss, &ReferenceOptions::new().with_result_class("CIM_Nope"))
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        let unknown = CimObjectName::Class(CimClassName::new("CIM_Nope"));
        assert_eq!(
            main.reference_names(NS, &unknown, &ReferenceOptions::new())
                .unwrap_err()
                .status,
            CimStatus::InvalidParameter
        );
        let missing = CimObjectName::Instance(person("nobody"));
        assert_eq!(
            main.associator_names(NS, &missing, &AssociatorOptions::new())
                .unwrap_err()
                .status,
            CimStatus::NotFound
        );
    }
}
