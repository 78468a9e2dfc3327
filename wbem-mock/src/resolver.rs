//! Class resolution against the superclass chain.
//!
//! A class submitted by CreateClass or ModifyClass carries only what the
//! caller declared. Resolution validates every qualifier against its
//! declaration, checks overrides, and merges in the superclass's
//! properties, methods and inheritable qualifiers so that the stored class
//! is complete. Elements inherited from the superclass are marked
//! `propagated = true` and keep their class origin; locally declared ones
//! get the new class as origin and `propagated = false`.
//!
//! Resolving an already resolved class yields the same class: elements
//! marked as propagated are dropped and inherited afresh.

use cim_model::{
    CimClass, CimMethod, CimParameter, CimProperty, CimQualifier, CimQualifierDeclaration,
    CimType, CimValue, EmbeddedObject, InMemoryObjectStore, NocaseMap,
};
use tracing::debug;

use crate::error::{CimError, Result};

/// Resolves classes of one namespace.
pub struct ClassResolver<'a> {
    namespace: &'a str,
    classes: &'a InMemoryObjectStore<CimClass>,
    qualifiers: &'a InMemoryObjectStore<CimQualifierDeclaration>,
}

impl<'a> ClassResolver<'a> {
    pub fn new(
        namespace: &'a str,
        classes: &'a InMemoryObjectStore<CimClass>,
        qualifiers: &'a InMemoryObjectStore<CimQualifierDeclaration>,
    ) -> Self {
        Self {
            namespace,
            classes,
            qualifiers,
        }
    }

    /// Produce the resolved form of `new_class`.
    pub fn resolve_class(&self, mut new_class: CimClass) -> Result<CimClass> {
        let classname = new_class.classname.clone();
        debug!(namespace = %self.namespace, classname = %classname, "Resolving class");

        let superclass = match &new_class.superclass {
            Some(name) => Some(self.classes.get(name.as_str()).map_err(|_| {
                CimError::invalid_superclass(format!(
                    "Superclass {name} of class {classname} not found in namespace {}",
                    self.namespace
                ))
            })?),
            None => None,
        };

        let class_scopes: &[&str] = if new_class.is_association() {
            &["class", "association"]
        } else if new_class.is_indication() {
            &["class", "indication"]
        } else {
            &["class"]
        };
        self.resolve_qualifiers(
            &mut new_class.qualifiers,
            superclass.map(|sc| &sc.qualifiers),
            class_scopes,
            &format!("class {classname}"),
        )?;

        new_class.properties = self.resolve_properties(
            &classname,
            std::mem::take(&mut new_class.properties),
            superclass,
        )?;
        new_class.methods =
            self.resolve_methods(&classname, std::mem::take(&mut new_class.methods), superclass)?;
        new_class.path = None;
        Ok(new_class)
    }

    fn resolve_properties(
        &self,
        classname: &str,
        mut local: NocaseMap<CimProperty>,
        superclass: Option<&CimClass>,
    ) -> Result<NocaseMap<CimProperty>> {
        local.retain(|_, p| p.propagated != Some(true));

        for prop in local.values_mut() {
            let element = format!("property {}.{}", classname, prop.name);
            let overridden = self.overridden_element(
                &prop.qualifiers,
                &prop.name,
                superclass.map(|sc| &sc.properties),
                &element,
            )?;

            if let Some(super_prop) = overridden {
                if !prop.same_shape(super_prop)
                    || !same_reference_target(&prop.reference_class, &super_prop.reference_class)
                {
                    return Err(CimError::invalid_parameter(format!(
                        "{element} overrides {}.{} with a different type",
                        super_prop.class_origin.as_deref().unwrap_or("superclass"),
                        super_prop.name
                    )));
                }
            }

            if prop.cim_type == CimType::Reference {
                self.check_reference_class(classname, prop.reference_class.as_deref(), &element)?;
            }
            if prop.embedded_object.is_none() {
                prop.embedded_object = embedded_from_qualifiers(&prop.qualifiers);
            }
            if let Some(value) = &prop.value {
                check_value_shape(value, prop.cim_type, prop.is_array, &element)?;
            }

            let scopes: &[&str] = if prop.cim_type == CimType::Reference {
                &["reference", "property"]
            } else {
                &["property"]
            };
            self.resolve_qualifiers(
                &mut prop.qualifiers,
                overridden.map(|p| &p.qualifiers),
                scopes,
                &element,
            )?;

            prop.class_origin = Some(classname.to_string());
            prop.propagated = Some(false);
        }

        Ok(merge_elements(
            local,
            superclass.map(|sc| &sc.properties),
            |p| &p.name,
            inherit_property,
        ))
    }

    fn resolve_methods(
        &self,
        classname: &str,
        mut local: NocaseMap<CimMethod>,
        superclass: Option<&CimClass>,
    ) -> Result<NocaseMap<CimMethod>> {
        local.retain(|_, m| m.propagated != Some(true));

        for method in local.values_mut() {
            let element = format!("method {}.{}", classname, method.name);
            let overridden = self.overridden_element(
                &method.qualifiers,
                &method.name,
                superclass.map(|sc| &sc.methods),
                &element,
            )?;

            if let Some(super_method) = overridden {
                if method.return_type != super_method.return_type {
                    return Err(CimError::invalid_parameter(format!(
                        "{element} overrides {} with return type {} instead of {}",
                        super_method.name, method.return_type, super_method.return_type
                    )));
                }
            }

            self.resolve_qualifiers(
                &mut method.qualifiers,
                overridden.map(|m| &m.qualifiers),
                &["method"],
                &element,
            )?;

            for param in method.parameters.values_mut() {
                self.resolve_parameter(classname, &element, param, overridden)?;
            }

            method.class_origin = Some(classname.to_string());
            method.propagated = Some(false);
        }

        Ok(merge_elements(
            local,
            superclass.map(|sc| &sc.methods),
            |m| &m.name,
            inherit_method,
        ))
    }

    fn resolve_parameter(
        &self,
        classname: &str,
        method_element: &str,
        param: &mut CimParameter,
        overridden: Option<&CimMethod>,
    ) -> Result<()> {
        let element = format!("parameter {} of {method_element}", param.name);
        if param.cim_type == CimType::Reference {
            self.check_reference_class(classname, param.reference_class.as_deref(), &element)?;
        }
        if param.embedded_object.is_none() {
            param.embedded_object = embedded_from_qualifiers(&param.qualifiers);
        }
        let inherited = overridden
            .and_then(|m| m.parameters.get(&param.name))
            .map(|p| &p.qualifiers);
        self.resolve_qualifiers(&mut param.qualifiers, inherited, &["parameter"], &element)
    }

    /// The superclass element a local element overrides, if any.
    ///
    /// An `Override` qualifier must name an element of the superclass. A
    /// local element with the same name as a superclass element overrides
    /// it implicitly.
    fn overridden_element<'s, T>(
        &self,
        qualifiers: &NocaseMap<CimQualifier>,
        name: &str,
        inherited: Option<&'s NocaseMap<T>>,
        element: &str,
    ) -> Result<Option<&'s T>> {
        if let Some(target) = qualifiers.str_value("Override") {
            return match inherited.and_then(|elements| elements.get(target)) {
                Some(found) => Ok(Some(found)),
                None => Err(CimError::invalid_parameter(format!(
                    "{element} has Override({target}) but the superclass has no such element"
                ))),
            };
        }
        Ok(inherited.and_then(|elements| elements.get(name)))
    }

    fn check_reference_class(
        &self,
        classname: &str,
        reference_class: Option<&str>,
        element: &str,
    ) -> Result<()> {
        match reference_class {
            None => Err(CimError::invalid_parameter(format!(
                "{element} is a reference without a reference class"
            ))),
            Some(target)
                if target.eq_ignore_ascii_case(classname) || self.classes.object_exists(target) =>
            {
                Ok(())
            }
            Some(target) => Err(CimError::invalid_parameter(format!(
                "{element} references class {target}, which does not exist in namespace {}",
                self.namespace
            ))),
        }
    }

    /// Validate qualifiers against their declarations, fill in flavors and
    /// add the inheritable qualifiers of the overridden element.
    fn resolve_qualifiers(
        &self,
        qualifiers: &mut NocaseMap<CimQualifier>,
        inherited: Option<&NocaseMap<CimQualifier>>,
        scopes: &[&str],
        element: &str,
    ) -> Result<()> {
        qualifiers.retain(|_, q| q.propagated != Some(true));

        for qualifier in qualifiers.values_mut() {
            let decl = self.qualifiers.get(qualifier.name.as_str()).map_err(|_| {
                CimError::invalid_parameter(format!(
                    "Qualifier {} used on {element} is not declared in namespace {}",
                    qualifier.name, self.namespace
                ))
            })?;

            if !scopes.iter().any(|scope| decl.allows_scope(scope)) {
                return Err(CimError::invalid_parameter(format!(
                    "Qualifier {} is not allowed on {element} by its declared scopes",
                    qualifier.name
                )));
            }

            if let Some(value) = &qualifier.value {
                let element = format!("qualifier {} on {element}", qualifier.name);
                check_value_shape(value, decl.cim_type, decl.is_array, &element)?;
            }

            if let Some(parent) = inherited.and_then(|quals| quals.get(&qualifier.name)) {
                if parent.overridable == Some(false) && parent.value != qualifier.value {
                    return Err(CimError::invalid_parameter(format!(
                        "Qualifier {} on {element} changes the value of a non-overridable qualifier",
                        qualifier.name
                    )));
                }
            }

            qualifier.cim_type = Some(decl.cim_type);
            qualifier.overridable.get_or_insert(decl.is_overridable());
            qualifier.tosubclass.get_or_insert(decl.is_tosubclass());
            qualifier.toinstance.get_or_insert(decl.is_toinstance());
            qualifier.translatable.get_or_insert(decl.is_translatable());
            qualifier.propagated = Some(false);
        }

        if let Some(inherited) = inherited {
            for parent in inherited.values() {
                if parent.tosubclass == Some(false) || qualifiers.contains_key(&parent.name) {
                    continue;
                }
                let mut copy = parent.clone();
                copy.propagated = Some(true);
                qualifiers.add(copy);
            }
        }
        Ok(())
    }
}

fn same_reference_target(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Embedded-object attribute implied by the `EmbeddedObject` and
/// `EmbeddedInstance` qualifiers.
fn embedded_from_qualifiers(qualifiers: &NocaseMap<CimQualifier>) -> Option<EmbeddedObject> {
    if qualifiers.contains_key("EmbeddedInstance") {
        Some(EmbeddedObject::Instance)
    } else if qualifiers.is_true("EmbeddedObject") {
        Some(EmbeddedObject::Object)
    } else {
        None
    }
}

fn check_value_shape(value: &CimValue, cim_type: CimType, is_array: bool, element: &str) -> Result<()> {
    let type_ok = match value.cim_type() {
        Some(actual) => actual == cim_type,
        None => true,
    };
    if !type_ok || value.is_array() != is_array {
        return Err(CimError::invalid_parameter(format!(
            "Value of {element} does not match declared type {cim_type}{}",
            if is_array { "[]" } else { "" }
        )));
    }
    Ok(())
}

fn inherit_property(prop: &CimProperty) -> CimProperty {
    let mut copy = prop.clone();
    copy.propagated = Some(true);
    inherit_qualifiers(&mut copy.qualifiers);
    copy
}

fn inherit_method(method: &CimMethod) -> CimMethod {
    let mut copy = method.clone();
    copy.propagated = Some(true);
    inherit_qualifiers(&mut copy.qualifiers);
    copy
}

fn inherit_qualifiers(qualifiers: &mut NocaseMap<CimQualifier>) {
    qualifiers.retain(|_, q| q.tosubclass != Some(false));
    for q in qualifiers.values_mut() {
        q.propagated = Some(true);
    }
}

/// Superclass elements in superclass order, each replaced in place by its
/// local override, followed by the remaining local elements.
fn merge_elements<T: Clone>(
    mut local: NocaseMap<T>,
    inherited: Option<&NocaseMap<T>>,
    name_of: impl Fn(&T) -> &String,
    inherit: impl Fn(&T) -> T,
) -> NocaseMap<T> {
    let mut merged = NocaseMap::new();
    if let Some(inherited) = inherited {
        for parent in inherited.values() {
            let name = name_of(parent).clone();
            match local.remove(&name) {
                Some(own) => {
                    let own_name = name_of(&own).clone();
                    merged.insert(own_name, own);
                }
                None => {
                    merged.insert(name, inherit(parent));
                }
            }
        }
    }
    for (name, own) in local {
        merged.insert(name, own);
    }
    merged
}
