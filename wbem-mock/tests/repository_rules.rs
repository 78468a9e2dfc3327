//! Repository-wide rules: namespaces, class resolution, qualifier
//! declarations, retrieval filters and configuration.

mod common;

use cim_model::{CimClass, CimProperty, CimQualifier, CimType};
use common::{default_repository, foo, INTEROP, NS};
use wbem_mock::{
    CimStatus, ClassResolver, EnumerateClassesOptions, GetClassOptions, InstanceOptions,
    MockConfig,
};

/// Only one namespace may carry an Interop name, and it can not be removed.
#[test]
fn test_single_interop_namespace() {
    let mut main = default_repository();
    assert_eq!(main.base().find_interop_namespace().as_deref(), Some(INTEROP));

    for name in ["root/interop", "root/PG_Interop", "INTEROP"] {
        let err = main.add_namespace(name).unwrap_err();
        assert_eq!(err.status, CimStatus::AlreadyExists, "{name}");
    }

    let err = main.remove_namespace(INTEROP).unwrap_err();
    assert_eq!(err.status, CimStatus::InvalidNamespace);
}

/// Only empty namespaces can be removed.
#[test]
fn test_remove_namespace() {
    let mut main = default_repository();
    main.add_namespace("root/scratch").unwrap();
    main.remove_namespace("/root/scratch/").unwrap();
    assert!(!main.namespaces().iter().any(|ns| ns == "root/scratch"));

    let err = main.remove_namespace("root/scratch").unwrap_err();
    assert_eq!(err.status, CimStatus::NotFound);

    let err = main.remove_namespace(NS).unwrap_err();
    assert_eq!(err.status, CimStatus::NamespaceNotEmpty);
}

/// Resolving a stored class again reproduces it unchanged.
#[test]
fn test_resolution_is_idempotent() {
    let main = default_repository();
    let classes = main.base().class_store(NS).unwrap();
    let qualifiers = main.base().qualifier_store(NS).unwrap();
    let resolver = ClassResolver::new(NS, classes, qualifiers);

    assert!(classes.len() >= 6);
    for stored in classes.iter_values() {
        let again = resolver.resolve_class(stored.clone()).unwrap();
        assert_eq!(&again, stored, "{}", stored.classname);
    }
}

/// Subclasses inherit properties and key qualifiers with their origin.
#[test]
fn test_inherited_elements() {
    let main = default_repository();
    let derived = main
        .get_class(NS, "CIM_Derived", &GetClassOptions::full())
        .unwrap();

    let id = &derived.properties["Id"];
    assert_eq!(id.class_origin.as_deref(), Some("CIM_Base"));
    assert_eq!(id.propagated, Some(true));
    assert!(id.is_key());

    let extra = &derived.properties["Extra"];
    assert_eq!(extra.class_origin.as_deref(), Some("CIM_Derived"));
    assert_eq!(extra.propagated, Some(false));

    let local = main
        .get_class(NS, "CIM_Derived", &GetClassOptions::new().with_local_only(true))
        .unwrap();
    assert_eq!(local.properties.len(), 1);
}

/// Class enumeration honors DeepInheritance and rejects unknown classes.
#[test]
fn test_enumerate_class_names() {
    let main = default_repository();

    let top = main.enumerate_class_names(NS, None, None).unwrap();
    assert!(top.iter().any(|name| name == "CIM_Base"));
    assert!(!top.iter().any(|name| name == "CIM_Derived"));

    let all = main.enumerate_class_names(NS, None, Some(true)).unwrap();
    assert!(all.iter().any(|name| name == "CIM_Derived"));

    let subs = main
        .enumerate_classes(NS, Some("CIM_Base"), &EnumerateClassesOptions::new())
        .unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].classname, "CIM_Derived");

    let err = main.enumerate_class_names(NS, Some("CIM_Nope"), None).unwrap_err();
    assert_eq!(err.status, CimStatus::InvalidClass);
}

/// Classes with instances or subclasses can not be modified.
#[test]
fn test_modify_class_guards() {
    let mut main = default_repository();

    let widened = CimClass::new("CIM_Base")
        .with_property(CimProperty::declare("Id", CimType::String).key())
        .with_property(CimProperty::declare("Label", CimType::String));
    let err = main.modify_class(NS, widened).unwrap_err();
    assert_eq!(err.status, CimStatus::ClassHasChildren);

    main.create_instance(NS, foo("one")).unwrap();
    let err = main
        .modify_class(NS, common::foo_class().with_property(CimProperty::declare("Label", CimType::String)))
        .unwrap_err();
    assert_eq!(err.status, CimStatus::ClassHasInstances);

    let err = main
        .modify_class(NS, CimClass::new("CIM_Ghost"))
        .unwrap_err();
    assert_eq!(err.status, CimStatus::NotFound);
}

/// Undeclared qualifiers are rejected, and declarations in use can not be
/// deleted.
#[test]
fn test_qualifier_declarations() {
    let mut main = default_repository();

    let undeclared = CimClass::new("CIM_Tagged")
        .with_qualifier(CimQualifier::new("Experimental", true));
    let err = main.create_class(NS, undeclared).unwrap_err();
    assert_eq!(err.status, CimStatus::InvalidParameter);

    let err = main.delete_qualifier(NS, "Key").unwrap_err();
    assert_eq!(err.status, CimStatus::Failed);

    main.delete_qualifier(NS, "Description").unwrap();
    let err = main.get_qualifier(NS, "Description").unwrap_err();
    assert_eq!(err.status, CimStatus::NotFound);

    // The other namespace keeps its own declaration
    assert!(main.get_qualifier(INTEROP, "Description").is_ok());
}

/// PropertyList trims returned instances without touching the store.
#[test]
fn test_property_list_filter() {
    let mut main = default_repository();
    let path = main.create_instance(NS, foo("one")).unwrap();

    let all = main
        .get_instance(NS, &path, &InstanceOptions::new())
        .unwrap();
    assert_eq!(all.properties.len(), 3);

    let empty: [&str; 0] = [];
    let none = main
        .get_instance(NS, &path, &InstanceOptions::new().with_property_list(empty))
        .unwrap();
    assert!(none.properties.is_empty());
    assert_eq!(none.path.as_ref(), Some(&path));

    let count = main
        .get_instance(NS, &path, &InstanceOptions::new().with_property_list(["COUNT"]))
        .unwrap();
    assert_eq!(count.properties.len(), 1);
    assert!(count.properties.contains_key("Count"));

    let again = main
        .get_instance(NS, &path, &InstanceOptions::new())
        .unwrap();
    assert_eq!(again.properties.len(), 3);
}

/// Instance qualifiers and class origins are withheld by default config.
#[test]
fn test_instance_retrieval_policy() {
    let mut main = default_repository();
    let path = main.create_instance(NS, foo("one")).unwrap();

    let options = InstanceOptions::new()
        .with_include_qualifiers(true)
        .with_include_classorigin(true)
        .with_local_only(true);
    let inst = main.get_instance(NS, &path, &options).unwrap();
    assert!(inst.qualifiers.is_empty());
    assert!(inst.properties.values().all(|p| p.class_origin.is_none()));
    assert_eq!(inst.properties.len(), 3);
}

/// Partial YAML fills the remaining fields with defaults.
#[test]
fn test_config_from_yaml() {
    let config = MockConfig::from_yaml(
        "default_max_object_count: 25\ndisable_pull_operations: true\n",
    )
    .unwrap();
    assert_eq!(config.default_max_object_count, 25);
    assert!(config.disable_pull_operations);
    assert_eq!(config.open_max_timeout, 40);
    assert_eq!(config.default_namespace, "root/cimv2");

    let yaml = config.to_yaml().unwrap();
    assert_eq!(MockConfig::from_yaml(&yaml).unwrap(), config);
}
