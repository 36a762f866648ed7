use crate::cli::open;
use crate::config::SmartlinksConfig;
use anyhow::{bail, Context, Result};
use smartlinks_core::{Grammar, ParsedLink, Resolution};
use std::io::Read;
use std::path::Path;

pub fn run(config: &SmartlinksConfig, file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let smartlinks = open(config)?;
    print!("{}", smartlinks.render(&text)?);
    Ok(())
}

pub fn resolve(config: &SmartlinksConfig, link: &str) -> Result<()> {
    let parsed = parse(link)?;
    let smartlinks = open(config)?;
    let resolution = smartlinks.resolve(parsed.type_hint.as_deref(), &parsed.query)?;
    println!("{}", describe(&parsed, &resolution));
    Ok(())
}

fn parse(link: &str) -> Result<ParsedLink> {
    let link = link.trim();
    match Grammar::link().parse(link).or_else(|| Grammar::embed().parse(link)) {
        Some(parsed) => Ok(parsed),
        None => bail!("'{}' is not a smartlink", link),
    }
}

/// One line describing what `parsed` resolved to.
fn describe(parsed: &ParsedLink, resolution: &Resolution) -> String {
    match resolution {
        Resolution::Found {
            configuration,
            object,
        } => format!(
            "{} {}: {} → {}",
            configuration.content_type(),
            object.id(),
            object,
            configuration
                .url_for(object.as_ref())
                .unwrap_or_else(|| "(no url)".to_string())
        ),
        Resolution::Unresolved { configuration } => format!(
            "unresolved: no {} matches '{}'",
            configuration.content_type(),
            parsed.query.trim()
        ),
        Resolution::Ambiguous { configuration } => format!(
            "ambiguous: several {} objects match '{}'",
            configuration.content_type(),
            parsed.query.trim()
        ),
        Resolution::TypeUnresolved => format!(
            "unknown type '{}'",
            parsed.type_hint.as_deref().unwrap_or_default()
        ),
    }
}
