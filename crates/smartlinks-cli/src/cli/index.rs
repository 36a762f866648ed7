use crate::cli::open;
use crate::config::SmartlinksConfig;
use anyhow::Result;

/// Rebuild the index from scratch. Prints nothing on success.
pub fn reset(config: &SmartlinksConfig) -> Result<()> {
    let smartlinks = open(config)?;
    let report = smartlinks.rebuild_index()?;
    tracing::debug!("{}", report.summary());
    Ok(())
}

pub fn stats(config: &SmartlinksConfig) -> Result<()> {
    let smartlinks = open(config)?;
    let stats = smartlinks.stats()?;

    let db_kb = stats.db_size_bytes as f64 / 1024.0;

    println!();
    println!("Smartlink Index");
    println!("{}", "─".repeat(50));
    println!("Entries: {:>8}", stats.entry_count);
    for (content_type, count) in &stats.entries_by_content_type {
        println!("  {:16} {:>8}", content_type, count);
    }
    println!("Objects: {:>8}", stats.object_count);
    println!("DB Size: {:>7.1} KB", db_kb);
    println!("{}", "─".repeat(50));

    let registry = smartlinks.registry();
    println!("Shortcuts:");
    for (shortcut, configuration) in registry.shortcuts() {
        println!("  {:16} {}", shortcut, configuration.content_type());
    }
    println!();

    Ok(())
}
