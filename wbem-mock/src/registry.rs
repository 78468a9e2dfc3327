//! Registry of user providers.
//!
//! Providers are recorded per namespace, class and provider type, all
//! case-insensitive on names. At most one provider is registered for each
//! (namespace, classname, provider type); a later registration replaces an
//! earlier one.

use std::collections::HashMap;
use std::fmt;

use cim_model::{normalize_namespace, NocaseMap};
use tracing::{info, warn};

use crate::base::BaseProvider;
use crate::error::RegistrationError;
use crate::providers::{Provider, ProviderType};

/// Namespace -> classname -> provider type -> provider.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    registry: NocaseMap<NocaseMap<HashMap<ProviderType, Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `provider` for each of its classes in each of `namespaces`.
    ///
    /// The namespaces and classes must already exist in `base`.
    pub fn register_provider(
        &mut self,
        base: &BaseProvider,
        provider: Provider,
        namespaces: &[String],
    ) -> Result<(), RegistrationError> {
        let classnames = provider.provider_classnames();
        if provider.declared_type() != provider.kind() {
            return Err(RegistrationError::TypeMismatch {
                classnames,
                declared: provider.declared_type().to_string(),
                actual: provider.kind().to_string(),
            });
        }
        if classnames.is_empty() {
            return Err(RegistrationError::NoClassnames);
        }

        for namespace in namespaces {
            if base.validate_namespace(namespace).is_err() {
                return Err(RegistrationError::NamespaceNotFound(
                    normalize_namespace(namespace).to_string(),
                ));
            }
            for classname in &classnames {
                if !base.class_exists(namespace, classname).unwrap_or(false) {
                    return Err(RegistrationError::ClassNotFound {
                        namespace: normalize_namespace(namespace).to_string(),
                        classname: classname.clone(),
                    });
                }
            }
        }

        let provider_type = provider.kind();
        for namespace in namespaces {
            let namespace = normalize_namespace(namespace);
            if !self.registry.contains_key(namespace) {
                self.registry.insert(namespace, NocaseMap::new());
            }
            let Some(classes) = self.registry.get_mut(namespace) else {
                continue;
            };
            for classname in &classnames {
                if !classes.contains_key(classname) {
                    classes.insert(classname.clone(), HashMap::new());
                }
                let Some(by_type) = classes.get_mut(classname) else {
                    continue;
                };
                if by_type.insert(provider_type, provider.clone()).is_some() {
                    warn!(
                        namespace = %namespace,
                        classname = %classname,
                        provider_type = %provider_type,
                        "Replaced previously registered provider"
                    );
                }
                info!(
                    namespace = %namespace,
                    classname = %classname,
                    provider_type = %provider_type,
                    "Registered provider"
                );
            }
        }
        Ok(())
    }

    /// Provider registered for (namespace, provider type, classname), if any.
    pub fn get_registered_provider(
        &self,
        namespace: &str,
        provider_type: ProviderType,
        classname: &str,
    ) -> Option<&Provider> {
        self.registry
            .get(normalize_namespace(namespace))?
            .get(classname)?
            .get(&provider_type)
    }

    /// Namespaces with at least one registered provider.
    pub fn provider_namespaces(&self) -> Vec<String> {
        self.registry.keys().map(str::to_string).collect()
    }

    /// Classes with registered providers in `namespace`.
    pub fn provider_classnames(&self, namespace: &str) -> Vec<String> {
        self.registry
            .get(normalize_namespace(namespace))
            .map(|classes| classes.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Provider types registered for `classname` in `namespace`.
    pub fn provider_types(&self, namespace: &str, classname: &str) -> Vec<ProviderType> {
        let mut types: Vec<ProviderType> = self
            .registry
            .get(normalize_namespace(namespace))
            .and_then(|classes| classes.get(classname))
            .map(|by_type| by_type.keys().copied().collect())
            .unwrap_or_default();
        types.sort_by_key(|t| t.as_str());
        types
    }

    /// Flattened (namespace, classname, provider type, provider) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, ProviderType, &Provider)> {
        self.registry.iter().flat_map(|(namespace, classes)| {
            classes.iter().flat_map(move |(classname, by_type)| {
                by_type
                    .iter()
                    .map(move |(provider_type, provider)| (namespace, classname, *provider_type, provider))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl fmt::Display for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Registered providers:")?;
        writeln!(f, "{:<20} {:<32} {:<16}", "namespace", "classname", "provider type")?;
        for (namespace, classname, provider_type, _) in self.iter() {
            writeln!(f, "{namespace:<20} {classname:<32} {:<16}", provider_type.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{InstanceWriteProvider, MethodProvider};
    use cim_model::{CimClass, CimProperty, CimType};

    struct FooWriter;

    impl InstanceWriteProvider for FooWriter {
        fn provider_classnames(&self) -> Vec<String> {
            vec!["CIM_Foo".to_string()]
        }
    }

    struct Confused;

    impl MethodProvider for Confused {
        fn provider_classnames(&self) -> Vec<String> {
            vec!["CIM_Foo".to_string()]
        }

        fn provider_type(&self) -> ProviderType {
            ProviderType::InstanceWrite
        }
    }

    struct Nothing;

    impl MethodProvider for Nothing {
        fn provider_classnames(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn base() -> BaseProvider {
        let mut base = BaseProvider::default();
        base.add_namespace("root/cimv2").unwrap();
        base.class_store_mut("root/cimv2")
            .unwrap()
            .create(
                "CIM_Foo",
                CimClass::new("CIM_Foo")
                    .with_property(CimProperty::declare("Id", CimType::String).key()),
            )
            .unwrap();
        base
    }

    #[test]
    fn test_register_and_lookup() {
        let base = base();
        let mut registry = ProviderRegistry::new();
        registry
            .register_provider(
                &base,
                Provider::instance_write(FooWriter),
                &["root/cimv2".to_string()],
            )
            .unwrap();

        assert!(registry
            .get_registered_provider("ROOT/CIMV2", ProviderType::InstanceWrite, "cim_foo")
            .is_some());
        assert!(registry
            .get_registered_provider("root/cimv2", ProviderType::Method, "CIM_Foo")
            .is_none());
        assert!(registry
            .get_registered_provider("root/other", ProviderType::InstanceWrite, "CIM_Foo")
            .is_none());

        assert_eq!(registry.provider_namespaces(), vec!["root/cimv2".to_string()]);
        assert_eq!(registry.provider_classnames("root/cimv2"), vec!["CIM_Foo".to_string()]);
        assert_eq!(
            registry.provider_types("root/cimv2", "CIM_Foo"),
            vec![ProviderType::InstanceWrite]
        );
        assert_eq!(registry.iter().count(), 1);
        assert!(registry.to_string().contains("instance-write"));
    }

    #[test]
    fn test_registration_errors() {
        let base = base();
        let mut registry = ProviderRegistry::new();
        let ns = ["root/cimv2".to_string()];

        assert!(matches!(
            registry.register_provider(&base, Provider::method(Confused), &ns),
            Err(RegistrationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.register_provider(&base, Provider::method(Nothing), &ns),
            Err(RegistrationError::NoClassnames)
        ));
        assert!(matches!(
            registry.register_provider(
                &base,
                Provider::instance_write(FooWriter),
                &["root/missing".to_string()]
            ),
            Err(RegistrationError::NamespaceNotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_class() {
        let mut base = base();
        base.add_namespace("root/empty").unwrap();
        let mut registry = ProviderRegistry::new();
        let err = registry
            .register_provider(
                &base,
                Provider::instance_write(FooWriter),
                &["root/empty".to_string()],
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ClassNotFound { .. }));
    }
}
