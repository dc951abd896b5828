use factgate_domain::conflict::ConflictKind;
use factgate_domain::constants::{
    HARDWARE, HARDWARE_GRAPHICS, HARDWARE_MEMORY, HARDWARE_SENSORS, OS, OS_FILESYSTEM,
};
use factgate_domain::module::{ModuleFlags, Origin, Preset, ValidationMode};
use factgate_modules::{
    ModuleError, ModuleRegistry, ResolutionInput, resolve, resolve_and_validate, validate,
};
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn common_preset_passes_fail_mode() {
    let registry = ModuleRegistry::standard();
    let validation = resolve_and_validate(
        &registry,
        &ResolutionInput::new(Preset::Common),
        ValidationMode::Fail,
        false,
    )
    .unwrap();

    assert!(validation.conflicts.is_empty());
    assert_eq!(validation.modules.enabled_count(), 6);
}

#[test]
fn enabled_child_of_disabled_parent_is_one_conflict() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::None)
        .set(HARDWARE, false)
        .set(HARDWARE_MEMORY, true);

    let err = resolve_and_validate(&registry, &input, ValidationMode::Fail, false).unwrap_err();
    assert_eq!(err.conflicts().len(), 1);
    assert_eq!(err.conflicts()[0].path, HARDWARE_MEMORY);
    assert_eq!(err.conflicts()[0].kind, ConflictKind::ParentDisabledChildEnabled);
    assert!(err.to_string().contains("(fix: enable `hardware` or disable `hardware.memory`)"));
}

#[test]
fn orphaned_child_fails_fast() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::Common).disable(HARDWARE);

    let err = resolve_and_validate(&registry, &input, ValidationMode::Fail, false).unwrap_err();
    let conflicts = err.conflicts();
    assert!(matches!(err, ModuleError::Configuration { .. }));
    assert_eq!(conflicts.len(), 3);
    assert!(conflicts.iter().all(|c| c.kind == ConflictKind::ParentDisabledChildEnabled));
    assert!(err.to_string().contains("3 conflict(s)"));
}

#[test]
fn warn_mode_repairs_and_reports() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::Common).disable(OS);

    let validation = resolve_and_validate(&registry, &input, ValidationMode::Warn, false).unwrap();
    assert_eq!(validation.conflicts.len(), 1);
    assert_eq!(validation.conflicts[0].path, OS_FILESYSTEM);
    assert!(validation.conflicts[0].hint.contains("enable `os`"));

    let fs = validation.modules.state(registry.id(OS_FILESYSTEM).unwrap()).unwrap();
    assert!(!fs.enabled);
    assert_eq!(fs.origin, Origin::Repaired);
}

#[test]
fn native_strict_rejects_native_modules() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::Common).enable(HARDWARE_SENSORS);

    let relaxed = resolve_and_validate(&registry, &input, ValidationMode::Fail, false).unwrap();
    assert_eq!(relaxed.modules.is_enabled_path(HARDWARE_SENSORS), Some(true));

    let err = resolve_and_validate(&registry, &input, ValidationMode::Fail, true).unwrap_err();
    assert_eq!(err.conflicts().len(), 1);
    assert_eq!(err.conflicts()[0].kind, ConflictKind::NativeStrictViolation);
}

#[test]
fn native_strict_takes_precedence_over_parent_check() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::None).enable(HARDWARE_GRAPHICS);

    let validation = resolve_and_validate(&registry, &input, ValidationMode::Warn, true).unwrap();
    assert_eq!(validation.conflicts.len(), 1);
    assert_eq!(validation.conflicts[0].kind, ConflictKind::NativeStrictViolation);
}

#[test]
fn repairs_cascade_to_descendants() {
    let registry = Arc::new(
        ModuleRegistry::builder()
            .module("gpu", ModuleFlags::NATIVE_ACCESS)
            .module("gpu.vram", ModuleFlags::empty())
            .module("gpu.vram.bank", ModuleFlags::empty())
            .build()
            .unwrap(),
    );
    let input = ResolutionInput::new(Preset::All);

    let validation = resolve_and_validate(&registry, &input, ValidationMode::Warn, true).unwrap();
    let kinds: Vec<ConflictKind> = validation.conflicts.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConflictKind::NativeStrictViolation,
            ConflictKind::ParentDisabledChildEnabled,
            ConflictKind::ParentDisabledChildEnabled,
        ]
    );
    assert!(validation.conflicts[1].detail.contains("earlier conflict"));
    assert_eq!(validation.modules.enabled_count(), 0);
}

#[test]
fn exclusive_modes_keep_the_earlier_module() {
    let registry = Arc::new(
        ModuleRegistry::builder()
            .module("power", ModuleFlags::empty())
            .module("power.battery", ModuleFlags::empty())
            .module("power.mains", ModuleFlags::empty())
            .exclusive("power.mains", "power.battery")
            .build()
            .unwrap(),
    );
    let input = ResolutionInput::new(Preset::All);

    let err = resolve_and_validate(&registry, &input, ValidationMode::Fail, false).unwrap_err();
    assert_eq!(err.conflicts().len(), 1);
    assert_eq!(err.conflicts()[0].kind, ConflictKind::MutuallyExclusiveModes);
    assert_eq!(err.conflicts()[0].path, "power.mains");

    let repaired = resolve_and_validate(&registry, &input, ValidationMode::Warn, false).unwrap();
    assert_eq!(repaired.modules.is_enabled_path("power.battery"), Some(true));
    assert_eq!(repaired.modules.is_enabled_path("power.mains"), Some(false));
}

#[test]
fn consistent_sets_are_returned_unchanged() {
    let registry = ModuleRegistry::standard();
    let resolved =
        resolve(&registry, &ResolutionInput::new(Preset::Common).disable(HARDWARE_MEMORY)).unwrap();
    let validation = validate(resolved.clone(), ValidationMode::Warn, false).unwrap();
    assert_eq!(validation.modules, resolved);
}

fn arbitrary_input() -> impl Strategy<Value = (ResolutionInput, bool)> {
    let paths: Vec<String> =
        ModuleRegistry::standard().iter().map(|(_, path)| path.to_owned()).collect();
    let preset = prop_oneof![Just(Preset::None), Just(Preset::Common), Just(Preset::All)];
    let path = proptest::sample::select(paths);

    (
        preset,
        proptest::collection::vec(path.clone(), 0..6),
        proptest::collection::vec(path.clone(), 0..6),
        proptest::collection::vec((path, any::<bool>()), 0..8),
        any::<bool>(),
    )
        .prop_map(|(preset, enabled, disabled, overrides, strict)| {
            let input = ResolutionInput {
                preset,
                enabled: enabled.into_iter().collect(),
                disabled: disabled.into_iter().collect(),
                overrides,
            };
            (input, strict)
        })
}

proptest! {
    #[test]
    fn warn_mode_reaches_a_fixed_point((input, strict) in arbitrary_input()) {
        let registry = ModuleRegistry::standard();
        let first = resolve_and_validate(&registry, &input, ValidationMode::Warn, strict).unwrap();
        let second = validate(first.modules.clone(), ValidationMode::Warn, strict).unwrap();

        prop_assert!(second.conflicts.is_empty());
        prop_assert_eq!(second.modules, first.modules);
    }

    #[test]
    fn fail_mode_accepts_exactly_what_warn_leaves_untouched((input, strict) in arbitrary_input()) {
        let registry = ModuleRegistry::standard();
        let warn = resolve_and_validate(&registry, &input, ValidationMode::Warn, strict).unwrap();
        let fail = resolve_and_validate(&registry, &input, ValidationMode::Fail, strict);

        prop_assert_eq!(fail.is_ok(), warn.conflicts.is_empty());
        if let Err(err) = fail {
            prop_assert_eq!(err.conflicts(), warn.conflicts.as_slice());
        }
    }

    #[test]
    fn repaired_sets_never_enable_an_orphan((input, strict) in arbitrary_input()) {
        let registry = ModuleRegistry::standard();
        let validation = resolve_and_validate(&registry, &input, ValidationMode::Warn, strict).unwrap();
        for id in validation.modules.enabled() {
            if let Some(parent) = registry.parent_of(id) {
                prop_assert!(validation.modules.is_enabled(parent));
            }
        }
    }
}
