//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use cim_model::{
    CimClass, CimInstance, CimInstanceName, CimMethod, CimParameter, CimProperty,
    CimQualifierDeclaration, CimType,
};
use wbem_mock::{MainProvider, MockConfig};

pub const NS: &str = "root/cimv2";
pub const INTEROP: &str = "interop";

/// The qualifier declarations the fixture classes use.
pub fn qualifier_declarations() -> Vec<CimQualifierDeclaration> {
    vec![
        CimQualifierDeclaration::new("Key", CimType::Boolean)
            .with_default(false)
            .with_scopes(&["property", "reference"])
            .with_flavors(false, true),
        CimQualifierDeclaration::new("Association", CimType::Boolean)
            .with_default(false)
            .with_scopes(&["association"])
            .with_flavors(false, true),
        CimQualifierDeclaration::new("Description", CimType::String)
            .with_scopes(&["any"])
            .with_flavors(true, true),
        CimQualifierDeclaration::new("In", CimType::Boolean)
            .with_default(true)
            .with_scopes(&["parameter"])
            .with_flavors(false, true),
        CimQualifierDeclaration::new("Out", CimType::Boolean)
            .with_default(false)
            .with_scopes(&["parameter"])
            .with_flavors(false, true),
        CimQualifierDeclaration::new("Static", CimType::Boolean)
            .with_default(false)
            .with_scopes(&["method", "property"])
            .with_flavors(false, true),
        CimQualifierDeclaration::new("Override", CimType::String)
            .with_scopes(&["property", "reference", "method"])
            .with_flavors(true, false),
    ]
}

/// `CIM_Foo` with a string key, a counter, an array and two methods.
pub fn foo_class() -> CimClass {
    CimClass::new("CIM_Foo")
        .with_property(CimProperty::declare("Id", CimType::String).key())
        .with_property(CimProperty::declare("Count", CimType::Uint32).with_value(0u32))
        .with_property(CimProperty::declare("Tags", CimType::String).as_array())
        .with_method(
            CimMethod::new("Reset", CimType::Uint32)
                .with_parameter(CimParameter::new("Level", CimType::Uint8)),
        )
        .with_method(CimMethod::new("Version", CimType::String).static_method())
}

/// `CIM_Base` <- `CIM_Derived`.
pub fn hierarchy_classes() -> Vec<CimClass> {
    vec![
        CimClass::new("CIM_Base")
            .with_property(CimProperty::declare("Id", CimType::String).key()),
        CimClass::new("CIM_Derived")
            .with_superclass("CIM_Base")
            .with_property(CimProperty::declare("Extra", CimType::Uint32)),
    ]
}

/// `CIM_A` and `CIM_B` joined by the association `CIM_Assoc`.
pub fn association_classes() -> Vec<CimClass> {
    vec![
        CimClass::new("CIM_A")
            .with_property(CimProperty::declare("Name", CimType::String).key()),
        CimClass::new("CIM_B")
            .with_property(CimProperty::declare("Name", CimType::String).key()),
        CimClass::new("CIM_Assoc")
            .association()
            .with_property(CimProperty::reference("Antecedent", "CIM_A").key())
            .with_property(CimProperty::reference("Dependent", "CIM_B").key()),
    ]
}

/// Repository with `root/cimv2` and `interop`, the fixture qualifiers in
/// both, and every fixture class in `root/cimv2`.
pub fn repository(config: MockConfig) -> MainProvider {
    let mut main = MainProvider::new(config);
    for namespace in [NS, INTEROP] {
        main.add_namespace(namespace).unwrap();
        for decl in qualifier_declarations() {
            main.set_qualifier(namespace, decl).unwrap();
        }
    }
    let classes = std::iter::once(foo_class())
        .chain(hierarchy_classes())
        .chain(association_classes());
    for class in classes {
        main.create_class(NS, class).unwrap();
    }
    main
}

pub fn default_repository() -> MainProvider {
    repository(MockConfig::default())
}

pub fn foo(id: &str) -> CimInstance {
    CimInstance::new("CIM_Foo").with_value("Id", id)
}

pub fn named(classname: &str, name: &str) -> CimInstanceName {
    CimInstanceName::new(classname)
        .with_key("Name", name)
        .with_namespace(NS)
}

/// Create `CIM_A.a1`, `CIM_B.b1` and the `CIM_Assoc` instance linking them.
/// Returns the association instance's path.
pub fn link_a1_b1(main: &mut MainProvider) -> CimInstanceName {
    main.create_instance(NS, CimInstance::new("CIM_A").with_value("Name", "a1"))
        .unwrap();
    main.create_instance(NS, CimInstance::new("CIM_B").with_value("Name", "b1"))
        .unwrap();
    main.create_instance(
        NS,
        CimInstance::new("CIM_Assoc")
            .with_value("Antecedent", named("CIM_A", "a1"))
            .with_value("Dependent", named("CIM_B", "b1")),
    )
    .unwrap()
}
