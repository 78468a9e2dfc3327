//! WBEM Mock - in-process CIM server engine
//!
//! Processes the DSP0200 CIM operations against an in-memory repository,
//! so that WBEM client code can be tested without a real server:
//! - Class, qualifier and instance operations with DSP0004 class
//!   resolution (inheritance, overrides, qualifier propagation)
//! - Associators and References at class and instance level
//! - Pull operations with server-side enumeration contexts
//! - User providers that override instance writes and extrinsic methods
//!   for chosen classes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              MainProvider               │
//! │  (operation façade, pull contexts)      │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────────┐
//! │ BaseProvider│       │ProviderDispatcher│
//! │ + Class     │◄──────│ (validate, route)│
//! │   Resolver  │       └────────┬─────────┘
//! └─────────────┘                ▼
//!                        ┌──────────────────┐
//!                        │ ProviderRegistry │
//!                        │ user / default   │
//!                        │ providers        │
//!                        └──────────────────┘
//! ```
//!
//! Every operation takes an explicit namespace and runs synchronously;
//! [`MockConnection`] puts one repository behind a single async lock for
//! concurrent callers.

pub mod base;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod enumeration;
pub mod error;
pub mod main_provider;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use base::{BaseProvider, INTEROP_NAMESPACE_NAMES};
pub use config::{MockConfig, FILTER_QUERY_LANGUAGE_FQL, INSTANCE_RETRIEVAL_LOCAL_ONLY};
pub use connection::MockConnection;
pub use dispatcher::ProviderDispatcher;
pub use enumeration::{EnumerationContext, EnumerationContexts, PullType};
pub use error::{CimError, CimStatus, RegistrationError, Result};
pub use main_provider::MainProvider;
pub use providers::{
    DefaultInstanceWriteProvider, DefaultMethodProvider, InstanceWriteProvider, MethodProvider,
    NamespaceProvider, Provider, ProviderType, NAMESPACE_CLASSNAME,
};
pub use registry::ProviderRegistry;
pub use resolver::ClassResolver;
pub use types::*;
