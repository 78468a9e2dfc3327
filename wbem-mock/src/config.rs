//! Configuration for the mock WBEM server.

use serde::{Deserialize, Serialize};

/// Instance retrieval always behaves as `LocalOnly = false`, whatever the
/// client asks for. DSP0200 1.2 left the instance-level meaning of
/// LocalOnly ambiguous and later versions deprecated it; servers settled
/// on ignoring it.
pub const INSTANCE_RETRIEVAL_LOCAL_ONLY: bool = false;

/// The only filter query language the pull operations accept.
pub const FILTER_QUERY_LANGUAGE_FQL: &str = "DMTF:FQL";

/// Server-side knobs of the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Page size of Open... operations when the client sends no MaxObjectCount
    pub default_max_object_count: u32,
    /// Largest OperationTimeout (seconds) a client may request
    pub open_max_timeout: u32,
    /// Treat IncludeQualifiers as false on instance retrieval
    pub ignore_instance_include_qualifiers: bool,
    /// Treat IncludeClassOrigin as false on instance retrieval
    pub ignore_instance_include_classorigin: bool,
    /// Reject every pull operation with NotSupported
    pub disable_pull_operations: bool,
    /// ObjectManagerName key of synthesized CIM_Namespace instances
    pub object_manager_name: String,
    /// ObjectManagerCreationClassName key of synthesized instances
    pub object_manager_creation_classname: String,
    /// SystemName key of synthesized instances
    pub system_name: String,
    /// SystemCreationClassName key of synthesized instances
    pub system_creation_classname: String,
    /// Namespace used by a connection when the caller names none
    pub default_namespace: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_max_object_count: 100,
            open_max_timeout: 40,
            ignore_instance_include_qualifiers: true,
            ignore_instance_include_classorigin: true,
            disable_pull_operations: false,
            object_manager_name: "FakeObjectManager".to_string(),
            object_manager_creation_classname: "CIM_ObjectManager".to_string(),
            system_name: "MockSystem_WBEMServerTest".to_string(),
            system_creation_classname: "CIM_ComputerSystem".to_string(),
            default_namespace: "root/cimv2".to_string(),
        }
    }
}

impl MockConfig {
    /// Load config from YAML. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Builder: disable pull operations.
    pub fn with_pull_disabled(mut self) -> Self {
        self.disable_pull_operations = true;
        self
    }

    /// Builder: set the default page size of Open... operations.
    pub fn with_default_max_object_count(mut self, count: u32) -> Self {
        self.default_max_object_count = count;
        self
    }

    /// Builder: set the default namespace.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MockConfig::default();
        assert_eq!(config.default_max_object_count, 100);
        assert_eq!(config.open_max_timeout, 40);
        assert!(config.ignore_instance_include_qualifiers);
        assert!(!config.disable_pull_operations);
        assert_eq!(config.default_namespace, "root/cimv2");
    }

    #[test]
    fn test_yaml_partial_overrides() {
        let yaml = "default_max_object_count: 5\ndisable_pull_operations: true\n";
        let config = MockConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.default_max_object_count, 5);
        assert!(config.disable_pull_operations);
        assert_eq!(config.system_name, "MockSystem_WBEMServerTest");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = MockConfig::default().with_default_namespace("root/test");
        let yaml = config.to_yaml().unwrap();
        assert_eq!(MockConfig::from_yaml(&yaml).unwrap(), config);
    }
}
