use factgate_domain::config::ModulesConfig;
use factgate_domain::constants::{
    HARDWARE, HARDWARE_DISKS, HARDWARE_MEMORY, HARDWARE_PROCESSOR, OS, OS_FILESYSTEM,
    OS_PROCESSES,
};
use factgate_domain::module::{Origin, Preset};
use factgate_modules::{ModuleError, ModuleRegistry, ResolutionInput, resolve};

#[test]
fn common_preset_enables_the_baseline() {
    let registry = ModuleRegistry::standard();
    let resolved = resolve(&registry, &ResolutionInput::new(Preset::Common)).unwrap();

    let enabled: Vec<&str> = resolved.enabled().map(|id| registry.path(id)).collect();
    assert_eq!(
        enabled,
        vec![HARDWARE, HARDWARE_PROCESSOR, HARDWARE_MEMORY, HARDWARE_DISKS, OS, OS_FILESYSTEM]
    );
    assert!(resolved.iter().all(|(_, _, state)| state.origin == Origin::Preset));
}

#[test]
fn disabled_beats_enabled() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::None).enable(OS_PROCESSES).disable(OS_PROCESSES);
    let resolved = resolve(&registry, &input).unwrap();

    let state = resolved.state(registry.id(OS_PROCESSES).unwrap()).unwrap();
    assert!(!state.enabled);
    assert_eq!(state.origin, Origin::DisabledList);
}

#[test]
fn last_override_wins() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::Common)
        .disable(HARDWARE_MEMORY)
        .set(HARDWARE_MEMORY, false)
        .set(HARDWARE_MEMORY, true);
    let resolved = resolve(&registry, &input).unwrap();

    let state = resolved.state(registry.id(HARDWARE_MEMORY).unwrap()).unwrap();
    assert!(state.enabled);
    assert_eq!(state.origin, Origin::Override);
}

#[test]
fn ids_are_normalised() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::None).enable("  OS.Processes ");
    let resolved = resolve(&registry, &input).unwrap();
    assert_eq!(resolved.is_enabled_path(OS_PROCESSES), Some(true));
}

#[test]
fn unknown_ids_are_reported_from_every_list() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::Common)
        .enable("hardware.gpu")
        .disable(OS)
        .set("os.kernel", true);

    let err = resolve(&registry, &input).unwrap_err();
    let ModuleError::UnknownModule { message, context } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(message, "`hardware.gpu`, `os.kernel`");
    assert_eq!(context.as_deref(), Some("modules.enabled, modules.overrides"));
}

#[test]
fn resolution_is_deterministic() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::All).disable(OS).set(HARDWARE, false);
    assert_eq!(resolve(&registry, &input).unwrap(), resolve(&registry, &input).unwrap());
}

#[test]
fn input_converts_from_config() {
    let mut config = ModulesConfig { preset: Preset::None, ..ModulesConfig::default() };
    config.enabled.push(OS.to_owned());
    config.overrides.insert(OS_FILESYSTEM.to_owned(), true);

    let input = ResolutionInput::from(&config);
    let resolved = resolve(&ModuleRegistry::standard(), &input).unwrap();
    assert_eq!(resolved.enabled_count(), 2);
}

#[test]
fn override_beats_disabled_list() {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::new(Preset::All).disable(HARDWARE_MEMORY).set(HARDWARE_MEMORY, true);
    let resolved = resolve(&registry, &input).unwrap();
    assert_eq!(resolved.is_enabled_path(HARDWARE_MEMORY), Some(true));
}
