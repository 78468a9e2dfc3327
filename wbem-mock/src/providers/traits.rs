//! Provider traits.
//!
//! A user provider overrides some of the operations of one capability
//! (`InstanceWriteProvider` or `MethodProvider`) for a set of classes. Every
//! operation it does not override falls back to the default provider, and
//! an override may call the default explicitly, e.g.
//! `DefaultInstanceWriteProvider.create_instance(base, namespace, inst)`.
//!
//! The dispatcher has validated the request before a provider is called;
//! providers only implement the operation's effect.

use std::fmt;
use std::sync::Arc;

use cim_model::{CimInstance, CimInstanceName, CimObjectName, CimParamValue, NocaseMap};

use crate::base::BaseProvider;
use crate::error::Result;
use crate::main_provider::MainProvider;
use crate::providers::instance_write::DefaultInstanceWriteProvider;
use crate::providers::method::DefaultMethodProvider;
use crate::types::InvokeMethodResult;

/// Capability a provider implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    InstanceWrite,
    Method,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceWrite => "instance-write",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CreateInstance, ModifyInstance and DeleteInstance.
pub trait InstanceWriteProvider: Send + Sync {
    /// Classes this provider serves.
    fn provider_classnames(&self) -> Vec<String>;

    /// Declared capability; checked against the trait at registration.
    fn provider_type(&self) -> ProviderType {
        ProviderType::InstanceWrite
    }

    /// Store `new_instance` and return its path.
    fn create_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        new_instance: CimInstance,
    ) -> Result<CimInstanceName> {
        DefaultInstanceWriteProvider.create_instance(base, namespace, new_instance)
    }

    /// Overwrite the values of the properties present in
    /// `modified_instance`. Its path names the stored instance.
    fn modify_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        modified_instance: CimInstance,
    ) -> Result<()> {
        DefaultInstanceWriteProvider.modify_instance(base, namespace, modified_instance)
    }

    fn delete_instance(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        instance_name: &CimInstanceName,
    ) -> Result<()> {
        DefaultInstanceWriteProvider.delete_instance(base, namespace, instance_name)
    }

    /// Runs once after registration with the live connection, e.g. to seed
    /// instances.
    fn post_register_setup(&self, _conn: &mut MainProvider) -> Result<()> {
        Ok(())
    }
}

/// InvokeMethod.
pub trait MethodProvider: Send + Sync {
    /// Classes this provider serves.
    fn provider_classnames(&self) -> Vec<String>;

    /// Declared capability; checked against the trait at registration.
    fn provider_type(&self) -> ProviderType {
        ProviderType::Method
    }

    /// Execute `method_name` on a class (static methods) or an instance.
    fn invoke_method(
        &self,
        base: &mut BaseProvider,
        namespace: &str,
        method_name: &str,
        object_name: &CimObjectName,
        params: &NocaseMap<CimParamValue>,
    ) -> Result<InvokeMethodResult> {
        DefaultMethodProvider.invoke_method(base, namespace, method_name, object_name, params)
    }

    fn post_register_setup(&self, _conn: &mut MainProvider) -> Result<()> {
        Ok(())
    }
}

/// A registered provider of either capability.
#[derive(Clone)]
pub enum Provider {
    InstanceWrite(Arc<dyn InstanceWriteProvider>),
    Method(Arc<dyn MethodProvider>),
}

impl Provider {
    pub fn instance_write(provider: impl InstanceWriteProvider + 'static) -> Self {
        Self::InstanceWrite(Arc::new(provider))
    }

    pub fn method(provider: impl MethodProvider + 'static) -> Self {
        Self::Method(Arc::new(provider))
    }

    /// Capability the provider actually implements.
    pub fn kind(&self) -> ProviderType {
        match self {
            Self::InstanceWrite(_) => ProviderType::InstanceWrite,
            Self::Method(_) => ProviderType::Method,
        }
    }

    /// Capability the provider declares.
    pub fn declared_type(&self) -> ProviderType {
        match self {
            Self::InstanceWrite(p) => p.provider_type(),
            Self::Method(p) => p.provider_type(),
        }
    }

    pub fn provider_classnames(&self) -> Vec<String> {
        match self {
            Self::InstanceWrite(p) => p.provider_classnames(),
            Self::Method(p) => p.provider_classnames(),
        }
    }

    pub fn post_register_setup(&self, conn: &mut MainProvider) -> Result<()> {
        match self {
            Self::InstanceWrite(p) => p.post_register_setup(conn),
            Self::Method(p) => p.post_register_setup(conn),
        }
    }

    pub fn as_instance_write(&self) -> Option<&Arc<dyn InstanceWriteProvider>> {
        match self {
            Self::InstanceWrite(p) => Some(p),
            Self::Method(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<dyn MethodProvider>> {
        match self {
            Self::Method(p) => Some(p),
            Self::InstanceWrite(_) => None,
        }
    }
}

impl fmt::Debug for dyn InstanceWriteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceWriteProvider({:?})", self.provider_classnames())
    }
}

impl fmt::Debug for dyn MethodProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodProvider({:?})", self.provider_classnames())
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("type", &self.kind())
            .field("classnames", &self.provider_classnames())
            .finish()
    }
}
