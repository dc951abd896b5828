use crate::registry::ModuleRegistry;
use factgate_domain::constants::{
    HARDWARE, HARDWARE_DISKS, HARDWARE_DISPLAYS, HARDWARE_GRAPHICS, HARDWARE_MEMORY,
    HARDWARE_NETWORK, HARDWARE_POWER, HARDWARE_PROCESSOR, HARDWARE_SENSORS, HARDWARE_SOUND,
    HARDWARE_USB, OS, OS_FILESYSTEM, OS_NETWORK, OS_PROCESSES, OS_SERVICES, OS_SESSIONS,
};
use factgate_domain::module::ModuleFlags;
use std::sync::{Arc, OnceLock};

const BASELINE: ModuleFlags = ModuleFlags::COMMON.union(ModuleFlags::SNAPSHOT);
const NATIVE_SNAPSHOT: ModuleFlags = ModuleFlags::NATIVE_ACCESS.union(ModuleFlags::SNAPSHOT);

/// Built-in sections, parents first.
pub(crate) const STANDARD: &[(&str, ModuleFlags)] = &[
    (HARDWARE, BASELINE),
    (HARDWARE_PROCESSOR, BASELINE),
    (HARDWARE_MEMORY, BASELINE),
    (HARDWARE_DISKS, BASELINE),
    (HARDWARE_NETWORK, ModuleFlags::SNAPSHOT),
    (HARDWARE_POWER, ModuleFlags::SNAPSHOT),
    (HARDWARE_SENSORS, NATIVE_SNAPSHOT),
    (HARDWARE_GRAPHICS, ModuleFlags::NATIVE_ACCESS),
    (HARDWARE_DISPLAYS, ModuleFlags::NATIVE_ACCESS),
    (HARDWARE_USB, ModuleFlags::NATIVE_ACCESS),
    (HARDWARE_SOUND, ModuleFlags::NATIVE_ACCESS),
    (OS, BASELINE),
    (OS_FILESYSTEM, BASELINE),
    (OS_NETWORK, ModuleFlags::SNAPSHOT),
    (OS_PROCESSES, ModuleFlags::empty()),
    (OS_SERVICES, ModuleFlags::NATIVE_ACCESS),
    (OS_SESSIONS, ModuleFlags::empty()),
];

static STANDARD_REGISTRY: OnceLock<Arc<ModuleRegistry>> = OnceLock::new();

pub(crate) fn standard() -> Arc<ModuleRegistry> {
    Arc::clone(STANDARD_REGISTRY.get_or_init(|| {
        let registry = STANDARD
            .iter()
            .fold(ModuleRegistry::builder(), |builder, (path, flags)| builder.module(*path, *flags))
            .build()
            .expect("CRITICAL: built-in module catalog is not a valid tree");
        Arc::new(registry)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_builds_in_parent_order() {
        let registry = standard();
        assert_eq!(registry.len(), STANDARD.len());

        let paths: Vec<&str> = registry.iter().map(|(_, path)| path).collect();
        let expected: Vec<&str> = STANDARD.iter().map(|(path, _)| *path).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn standard_catalog_is_shared() {
        assert!(Arc::ptr_eq(&standard(), &standard()));
    }
}
