//! MainProvider - the operation façade of the mock server.
//!
//! Every CIM operation enters here with an explicit namespace. Read
//! operations run directly against the repository; the overridable
//! instance-write and method operations go through the
//! [`ProviderDispatcher`]. The façade also owns the enumeration contexts of
//! the pull operations.

mod associations;
mod classes;
mod instances;
mod pull;
mod qualifiers;

use cim_model::{normalize_namespace, CimClass};
use tracing::{debug, info};

use crate::base::BaseProvider;
use crate::config::MockConfig;
use crate::dispatcher::ProviderDispatcher;
use crate::enumeration::EnumerationContexts;
use crate::error::{CimError, RegistrationError, Result};
use crate::providers::{
    DefaultInstanceWriteProvider, NamespaceProvider, Provider, ProviderType, NAMESPACE_CLASSNAME,
};
use crate::registry::ProviderRegistry;

/// Server-side state of one mock repository.
#[derive(Debug, Default)]
pub struct MainProvider {
    /// Repository and config
    base: BaseProvider,
    /// Provider registry and routing
    dispatcher: ProviderDispatcher,
    /// Open pull enumerations
    contexts: EnumerationContexts,
}

impl MainProvider {
    /// Create an empty repository (no namespaces) with the given config.
    pub fn new(config: MockConfig) -> Self {
        Self {
            base: BaseProvider::new(config),
            dispatcher: ProviderDispatcher::new(),
            contexts: EnumerationContexts::new(),
        }
    }

    pub fn base(&self) -> &BaseProvider {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseProvider {
        &mut self.base
    }

    pub fn config(&self) -> &MockConfig {
        self.base.config()
    }

    pub fn dispatcher(&self) -> &ProviderDispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.dispatcher.registry()
    }

    pub fn contexts(&self) -> &EnumerationContexts {
        &self.contexts
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.base.namespaces()
    }

    /// Create a namespace. If a `CIM_Namespace` provider is registered in
    /// the Interop namespace, the matching `CIM_Namespace` instance is
    /// created as well.
    pub fn add_namespace(&mut self, namespace: &str) -> Result<()> {
        self.base.add_namespace(namespace)?;
        if let Some(interop) = self.namespace_provider_home() {
            let instance = NamespaceProvider::namespace_instance(
                self.base.config(),
                NAMESPACE_CLASSNAME,
                namespace,
            );
            DefaultInstanceWriteProvider.create_instance(&mut self.base, &interop, instance)?;
        }
        Ok(())
    }

    /// Remove an empty, non-Interop namespace together with its
    /// `CIM_Namespace` instance, if one exists.
    pub fn remove_namespace(&mut self, namespace: &str) -> Result<()> {
        self.base.remove_namespace(namespace)?;
        if let Some(interop) = self.base.find_interop_namespace() {
            let stale: Vec<_> = self
                .base
                .instance_store(&interop)?
                .iter_values()
                .filter(|inst| inst.classname.eq_ignore_ascii_case(NAMESPACE_CLASSNAME))
                .filter(|inst| {
                    inst.value("Name")
                        .and_then(|v| v.as_str())
                        .is_some_and(|name| {
                            normalize_namespace(name)
                                .eq_ignore_ascii_case(normalize_namespace(namespace))
                        })
                })
                .filter_map(|inst| inst.path.clone())
                .collect();
            for path in stale {
                DefaultInstanceWriteProvider.delete_instance(&mut self.base, &interop, &path)?;
            }
        }
        Ok(())
    }

    /// Interop namespace, if a `CIM_Namespace` provider is registered there.
    fn namespace_provider_home(&self) -> Option<String> {
        let interop = self.base.find_interop_namespace()?;
        self.registry()
            .get_registered_provider(&interop, ProviderType::InstanceWrite, NAMESPACE_CLASSNAME)
            .map(|_| interop)
    }

    /// Register a user provider for its classes in each of `namespaces`.
    ///
    /// Classes missing from a namespace are created from `class_source`
    /// (together with any missing superclasses) when one is given. Once
    /// registered, the provider's post-registration hook runs against this
    /// repository.
    pub fn register_provider(
        &mut self,
        provider: Provider,
        namespaces: &[&str],
        class_source: Option<&[CimClass]>,
    ) -> std::result::Result<(), RegistrationError> {
        let namespaces: Vec<String> = namespaces
            .iter()
            .map(|ns| normalize_namespace(ns).to_string())
            .collect();

        if let Some(source) = class_source {
            for namespace in &namespaces {
                if self.base.validate_namespace(namespace).is_err() {
                    return Err(RegistrationError::NamespaceNotFound(namespace.clone()));
                }
                for classname in provider.provider_classnames() {
                    if !self.base.class_exists(namespace, &classname)? {
                        self.create_class_from_source(namespace, &classname, source)?;
                    }
                }
            }
        }

        self.dispatcher
            .register_provider(&self.base, provider.clone(), &namespaces)?;
        provider.post_register_setup(self)?;
        Ok(())
    }

    fn create_class_from_source(
        &mut self,
        namespace: &str,
        classname: &str,
        source: &[CimClass],
    ) -> std::result::Result<(), RegistrationError> {
        let Some(class) = source
            .iter()
            .find(|c| c.classname.eq_ignore_ascii_case(classname))
        else {
            return Err(RegistrationError::ClassNotFound {
                namespace: namespace.to_string(),
                classname: classname.to_string(),
            });
        };

        if let Some(superclass) = &class.superclass {
            if !self.base.class_exists(namespace, superclass)? {
                self.create_class_from_source(namespace, superclass, source)?;
            }
        }
        debug!(namespace = %namespace, classname = %class.classname, "Creating class from class source");
        self.create_class(namespace, class.clone())?;
        Ok(())
    }

    /// Fail with InvalidClass unless `classname` exists in `namespace`.
    fn require_class(&self, namespace: &str, classname: &str) -> Result<()> {
        self.base.validate_namespace(namespace)?;
        if self.base.class_exists(namespace, classname)? {
            Ok(())
        } else {
            Err(CimError::invalid_class(format!(
                "Class {classname} not found in namespace {}",
                normalize_namespace(namespace)
            )))
        }
    }

    /// Fail with InvalidParameter unless `classname` exists in `namespace`.
    fn require_class_parameter(&self, namespace: &str, classname: &str, what: &str) -> Result<()> {
        if self.base.class_exists(namespace, classname)? {
            Ok(())
        } else {
            Err(CimError::invalid_parameter(format!(
                "{what} class {classname} not found in namespace {}",
                normalize_namespace(namespace)
            )))
        }
    }
}

impl From<BaseProvider> for MainProvider {
    fn from(base: BaseProvider) -> Self {
        info!(namespaces = ?base.namespaces(), "MainProvider created from existing repository");
        Self {
            base,
            dispatcher: ProviderDispatcher::new(),
            contexts: EnumerationContexts::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CimStatus;
    use crate::providers::InstanceWriteProvider;
    use cim_model::{CimInstance, CimProperty, CimQualifierDeclaration, CimType};

    struct FooWriter;

    impl InstanceWriteProvider for FooWriter {
        fn provider_classnames(&self) -> Vec<String> {
            vec!["CIM_Foo".to_string()]
        }
    }

    fn key_qualifier() -> CimQualifierDeclaration {
        CimQualifierDeclaration::new("Key", CimType::Boolean)
            .with_default(false)
            .with_scopes(&["property", "reference"])
            .with_flavors(false, true)
    }

    fn namespace_class() -> CimClass {
        CimClass::new(NAMESPACE_CLASSNAME)
            .with_property(CimProperty::declare("Name", CimType::String).key())
            .with_property(CimProperty::declare("CreationClassName", CimType::String).key())
            .with_property(CimProperty::declare("ObjectManagerName", CimType::String).key())
            .with_property(
                CimProperty::declare("ObjectManagerCreationClassName", CimType::String).key(),
            )
            .with_property(CimProperty::declare("SystemName", CimType::String).key())
            .with_property(CimProperty::declare("SystemCreationClassName", CimType::String).key())
    }

    #[test]
    fn test_register_with_class_source() {
        let mut main = MainProvider::default();
        main.add_namespace("root/cimv2").unwrap();
        main.set_qualifier("root/cimv2", key_qualifier()).unwrap();

        let source = vec![
            CimClass::new("CIM_Base")
                .with_property(CimProperty::declare("Id", CimType::String).key()),
            CimClass::new("CIM_Foo").with_superclass("CIM_Base"),
        ];
        main.register_provider(
            Provider::instance_write(FooWriter),
            &["root/cimv2"],
            Some(source.as_slice()),
        )
        .unwrap();

        assert!(main.base().class_exists("root/cimv2", "CIM_Base").unwrap());
        assert!(main.base().class_exists("root/cimv2", "CIM_Foo").unwrap());
        assert!(main
            .registry()
            .get_registered_provider("root/cimv2", ProviderType::InstanceWrite, "CIM_Foo")
            .is_some());
    }

    #[test]
    fn test_register_without_class() {
        let mut main = MainProvider::default();
        main.add_namespace("root/cimv2").unwrap();

        let err = main
            .register_provider(Provider::instance_write(FooWriter), &["root/cimv2"], None)
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ClassNotFound { .. }));

        let err = main
            .register_provider(Provider::instance_write(FooWriter), &["root/cimv2"], Some(&[][..]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::ClassNotFound { .. }));
    }

    #[test]
    fn test_namespace_provider_tracks_namespaces() {
        let mut main = MainProvider::default();
        main.add_namespace("interop").unwrap();
        main.add_namespace("root/cimv2").unwrap();
        main.set_qualifier("interop", key_qualifier()).unwrap();

        main.register_provider(
            Provider::instance_write(NamespaceProvider::new()),
            &["interop"],
            Some(&[namespace_class()][..]),
        )
        .unwrap();

        let names = |main: &MainProvider| -> Vec<String> {
            let mut names: Vec<String> = main
                .base()
                .instance_store("interop")
                .unwrap()
                .iter_values()
                .filter_map(|inst| inst.value("Name").and_then(|v| v.as_str()).map(str::to_string))
                .collect();
            names.sort();
            names
        };
        assert_eq!(names(&main), vec!["interop", "root/cimv2"]);

        main.add_namespace("root/extra").unwrap();
        assert_eq!(names(&main), vec!["interop", "root/cimv2", "root/extra"]);

        main.remove_namespace("root/extra").unwrap();
        assert_eq!(names(&main), vec!["interop", "root/cimv2"]);

        // Creating a CIM_Namespace instance creates the namespace.
        let path = main
            .create_instance(
                "interop",
                CimInstance::new(NAMESPACE_CLASSNAME).with_value("Name", "root/made"),
            )
            .unwrap();
        assert!(main.namespaces().contains(&"root/made".to_string()));

        main.delete_instance("interop", &path).unwrap();
        assert!(!main.namespaces().contains(&"root/made".to_string()));

        let err = main
            .create_instance(
                "interop",
                CimInstance::new(NAMESPACE_CLASSNAME).with_value("Name", "root/cimv2"),
            )
            .unwrap_err();
        assert_eq!(err.status, CimStatus::AlreadyExists);
    }
}
