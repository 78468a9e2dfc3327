//! Shared handle on a mock repository.
//!
//! The whole repository (stores, registry and enumeration contexts) is one
//! mutable resource, so concurrent callers share it behind a single lock.
//! Operations stay synchronous; only acquiring the lock awaits.

use std::sync::Arc;

use cim_model::{CimClass, CimInstance, CimInstanceName};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::config::MockConfig;
use crate::error::{RegistrationError, Result};
use crate::main_provider::MainProvider;
use crate::providers::Provider;
use crate::types::InstanceOptions;

/// Cloneable connection to a shared [`MainProvider`].
#[derive(Debug, Clone)]
pub struct MockConnection {
    inner: Arc<Mutex<MainProvider>>,
    default_namespace: String,
}

impl MockConnection {
    /// Connect to a new, empty repository. The config's default namespace
    /// is created.
    pub fn new(config: MockConfig) -> Result<Self> {
        let default_namespace = config.default_namespace.clone();
        let mut provider = MainProvider::new(config);
        provider.add_namespace(&default_namespace)?;
        Ok(Self::from_provider(provider))
    }

    /// Connect to an existing repository.
    pub fn from_provider(provider: MainProvider) -> Self {
        let default_namespace = provider.config().default_namespace.clone();
        Self {
            inner: Arc::new(Mutex::new(provider)),
            default_namespace,
        }
    }

    /// Builder: use `namespace` when a call names none. The namespace is
    /// not created.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Exclusive access to the repository for any number of operations.
    pub async fn lock(&self) -> MutexGuard<'_, MainProvider> {
        self.inner.lock().await
    }

    fn namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.unwrap_or(&self.default_namespace)
    }

    pub async fn add_namespace(&self, namespace: &str) -> Result<()> {
        self.lock().await.add_namespace(namespace)
    }

    pub async fn create_class(&self, namespace: Option<&str>, class: CimClass) -> Result<()> {
        let namespace = self.namespace(namespace);
        self.lock().await.create_class(namespace, class)
    }

    pub async fn create_instance(
        &self,
        namespace: Option<&str>,
        instance: CimInstance,
    ) -> Result<CimInstanceName> {
        let namespace = self.namespace(namespace);
        debug!(namespace = %namespace, classname = %instance.classname, "CreateInstance via connection");
        self.lock().await.create_instance(namespace, instance)
    }

    /// GetInstance in the namespace of `instance_name`, or the default one.
    pub async fn get_instance(
        &self,
        instance_name: &CimInstanceName,
        options: &InstanceOptions,
    ) -> Result<CimInstance> {
        let namespace = self.namespace(instance_name.namespace.as_deref());
        self.lock().await.get_instance(namespace, instance_name, options)
    }

    pub async fn enumerate_instances(
        &self,
        namespace: Option<&str>,
        classname: &str,
        options: &InstanceOptions,
    ) -> Result<Vec<CimInstance>> {
        let namespace = self.namespace(namespace);
        self.lock()
            .await
            .enumerate_instances(namespace, classname, options)
    }

    /// Register a provider in `namespaces`, or in the default namespace if
    /// the list is empty.
    pub async fn register_provider(
        &self,
        provider: Provider,
        namespaces: &[&str],
        class_source: Option<&[CimClass]>,
    ) -> std::result::Result<(), RegistrationError> {
        let default = [self.default_namespace.as_str()];
        let namespaces = if namespaces.is_empty() {
            &default[..]
        } else {
            namespaces
        };
        self.lock()
            .await
            .register_provider(provider, namespaces, class_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cim_model::{CimProperty, CimQualifierDeclaration, CimType, CimValue};

    async fn connection() -> MockConnection {
        let conn = MockConnection::new(MockConfig::default()).unwrap();
        {
            let mut main = conn.lock().await;
            main.set_qualifier(
                "root/cimv2",
                CimQualifierDeclaration::new("Key", CimType::Boolean)
                    .with_default(false)
                    .with_scopes(&["property"]),
            )
            .unwrap();
        }
        conn.create_class(
            None,
            CimClass::new("CIM_Foo")
                .with_property(CimProperty::declare("Id", CimType::String).key()),
        )
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn test_default_namespace_round_trip() {
        let conn = connection().await;
        assert_eq!(conn.default_namespace(), "root/cimv2");

        let path = conn
            .create_instance(None, CimInstance::new("CIM_Foo").with_value("Id", "abc"))
            .await
            .unwrap();
        let inst = conn
            .get_instance(&path, &InstanceOptions::new())
            .await
            .unwrap();
        assert_eq!(inst.value("Id"), Some(&CimValue::from("abc")));
    }

    #[tokio::test]
    async fn test_clones_share_repository() {
        let conn = connection().await;
        let other = conn.clone();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let conn = conn.clone();
                tokio::spawn(async move {
                    conn.create_instance(
                        None,
                        CimInstance::new("CIM_Foo").with_value("Id", format!("id-{i}")),
                    )
                    .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let all = other
            .enumerate_instances(None, "CIM_Foo", &InstanceOptions::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_explicit_namespace() {
        let conn = connection().await;
        conn.add_namespace("root/other").await.unwrap();
        let err = conn
            .create_instance(
                Some("root/other"),
                CimInstance::new("CIM_Foo").with_value("Id", "x"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status, crate::error::CimStatus::InvalidClass);
    }
}
