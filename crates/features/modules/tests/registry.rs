use factgate_domain::constants::{HARDWARE, HARDWARE_MEMORY, HARDWARE_SENSORS, OS, OS_SERVICES};
use factgate_domain::module::ModuleFlags;
use factgate_modules::{ModuleError, ModuleRegistry};

#[test]
fn standard_catalog_has_two_roots() {
    let registry = ModuleRegistry::standard();
    let roots: Vec<&str> = registry
        .iter()
        .filter(|(id, _)| registry.parent_of(*id).is_none())
        .map(|(_, path)| path)
        .collect();
    assert_eq!(roots, vec![HARDWARE, OS]);
}

#[test]
fn standard_catalog_flags() {
    let registry = ModuleRegistry::standard();
    let flags = |path| registry.flags(registry.id(path).unwrap());

    assert!(flags(HARDWARE_MEMORY).contains(ModuleFlags::COMMON | ModuleFlags::SNAPSHOT));
    assert!(flags(HARDWARE_SENSORS).contains(ModuleFlags::NATIVE_ACCESS));
    assert!(!flags(OS_SERVICES).contains(ModuleFlags::SNAPSHOT));
    assert!(registry.exclusive_pairs().is_empty());
}

#[test]
fn every_child_points_back_to_its_parent() {
    let registry = ModuleRegistry::standard();
    for id in registry.all_modules() {
        for &child in registry.children_of(id) {
            assert_eq!(registry.parent_of(child), Some(id));
            assert!(registry.path(child).starts_with(registry.path(id)));
        }
    }
}

#[test]
fn duplicate_paths_are_rejected() {
    let err = ModuleRegistry::builder()
        .module("cpu", ModuleFlags::empty())
        .module("CPU ", ModuleFlags::COMMON)
        .build()
        .unwrap_err();
    assert!(matches!(err, ModuleError::InvalidRegistry { .. }));
    assert!(err.to_string().contains("registered twice"));
}

#[test]
fn empty_segments_are_rejected() {
    for path in ["", "a..b", ".a", "a."] {
        let result = ModuleRegistry::builder().module(path, ModuleFlags::empty()).build();
        assert!(matches!(result, Err(ModuleError::InvalidRegistry { .. })), "accepted `{path}`");
    }
}

#[test]
fn missing_parents_are_rejected() {
    let err = ModuleRegistry::builder()
        .module("net.wifi", ModuleFlags::empty())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("no registered parent `net`"));
}

#[test]
fn exclusive_pairs_must_name_known_modules() {
    let unknown = ModuleRegistry::builder()
        .module("a", ModuleFlags::empty())
        .exclusive("a", "b")
        .build();
    assert!(matches!(unknown, Err(ModuleError::InvalidRegistry { .. })));

    let itself = ModuleRegistry::builder()
        .module("a", ModuleFlags::empty())
        .exclusive("a", "A")
        .build();
    assert!(matches!(itself, Err(ModuleError::InvalidRegistry { .. })));
}
