//! Overridable instance-write and method providers.

pub mod instance_write;
pub mod method;
pub mod namespace;
pub mod traits;

pub use instance_write::DefaultInstanceWriteProvider;
pub use method::DefaultMethodProvider;
pub use namespace::{NamespaceProvider, NAMESPACE_CLASSNAME};
pub use traits::{InstanceWriteProvider, MethodProvider, Provider, ProviderType};
