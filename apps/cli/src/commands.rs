use anyhow::{Context, Result};
use factgate::domain::config::FactsConfig;
use factgate::domain::conflict::Conflict;
use factgate::domain::module::ValidationMode;
use factgate::modules::{ModuleRegistry, ResolutionInput, Validation, resolve_and_validate};
use tracing::info;

/// Resolves in warn mode so the full picture is shown even for a rejected configuration.
pub fn plan(config: &FactsConfig) -> Result<()> {
    let validation = run(config, ValidationMode::Warn)?;

    println!("{:<20} {:<9} ORIGIN", "MODULE", "STATE");
    for (_, path, state) in validation.modules.iter() {
        let label = if state.enabled { "enabled" } else { "disabled" };
        println!("{path:<20} {label:<9} {}", state.origin);
    }
    print_conflicts(&validation.conflicts);
    Ok(())
}

pub fn check(config: &FactsConfig) -> Result<()> {
    let mode = config.validation.mode;
    let validation = run(config, mode)?;

    print_conflicts(&validation.conflicts);
    println!(
        "configuration ok ({mode} mode): {} of {} modules enabled",
        validation.modules.enabled_count(),
        validation.modules.registry().len()
    );
    Ok(())
}

fn run(config: &FactsConfig, mode: ValidationMode) -> Result<Validation> {
    let registry = ModuleRegistry::standard();
    let input = ResolutionInput::from(&config.modules);
    let validation = resolve_and_validate(&registry, &input, mode, config.validation.native_strict)
        .context("module configuration is invalid")?;

    info!(
        mode = %mode,
        enabled = validation.modules.enabled_count(),
        repaired = validation.conflicts.len(),
        "Module plan computed"
    );
    Ok(validation)
}

fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        return;
    }
    println!();
    println!("{} conflict(s) repaired:", conflicts.len());
    for conflict in conflicts {
        println!("  - {conflict}");
    }
}
