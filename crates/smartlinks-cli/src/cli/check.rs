use crate::config::SmartlinksConfig;
use anyhow::{bail, Result};

/// Validate the config file, then load every type's records and register
/// them, which checks field-sets and embeds against the records.
pub fn run(config: &SmartlinksConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        println!("❌ Validation errors:");
        for e in &errors {
            println!("  - {}", e);
        }
        bail!("{} configuration error(s)", errors.len());
    }

    let registry = config.build_registry()?;
    for configuration in registry.configurations() {
        let shortcuts: Vec<&str> = registry
            .shortcuts()
            .iter()
            .filter(|(_, bound)| std::sync::Arc::ptr_eq(bound, configuration))
            .map(|(shortcut, _)| shortcut.as_str())
            .collect();
        println!(
            "  {:16} {} object(s), shortcuts: {}",
            configuration.content_type(),
            configuration.source().all()?.len(),
            shortcuts.join(", ")
        );
    }
    println!("✅ Configuration is valid.");

    Ok(())
}
