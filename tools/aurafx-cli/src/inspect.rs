//! Inspect command - list the definitions in an authored store

use std::path::PathBuf;

use anyhow::{Context, Result};
use aurafx_core::config;
use aurafx_core::store::{AuthoredStore, StoreContents};
use clap::Args;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Authored store file (defaults to the configured store)
    pub store: Option<PathBuf>,

    /// Print definitions as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let path = match args.store {
        Some(path) => path,
        None => config::load()
            .storage
            .authored_path()
            .context("No store given and no data directory available")?,
    };

    let contents = AuthoredStore::new(&path)
        .load()
        .with_context(|| format!("Failed to read store {}", path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&contents.definitions)
            .context("Failed to serialize definitions")?;
        println!("{}", json);
    } else {
        print!("{}", summary(&path, &contents));
    }
    Ok(())
}

fn summary(path: &std::path::Path, contents: &StoreContents) -> String {
    let mut out = format!(
        "{}: {} definition(s), {} skipped\n",
        path.display(),
        contents.definitions.len(),
        contents.skipped
    );
    for def in &contents.definitions {
        let paired = if def.is_paired() { "" } else { " (unpaired)" };
        out.push_str(&format!(
            "  {:<32} {:>2} layer(s){}  {}\n",
            def.id().to_string(),
            def.layer_count(),
            paired,
            def.display_name().unwrap_or("-")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurafx_shared::{BehaviorLayer, DefinitionMetadata, EffectDefinition, EffectId, PlacementLayer};

    #[test]
    fn test_summary_lists_definitions() {
        let def = EffectDefinition::new(EffectId::parse("halo").unwrap())
            .with_layer(BehaviorLayer::default(), PlacementLayer::default())
            .with_metadata(DefinitionMetadata {
                display_name: Some("Halo".to_string()),
                ..Default::default()
            });
        let contents = StoreContents {
            definitions: vec![def],
            skipped: 2,
        };

        let text = summary(std::path::Path::new("a.afxa"), &contents);
        assert!(text.starts_with("a.afxa: 1 definition(s), 2 skipped"));
        assert!(text.contains("aurafx:halo"));
        assert!(text.contains("Halo"));
        assert!(!text.contains("unpaired"));
    }

    #[test]
    fn test_execute_on_saved_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authored.afxa");
        AuthoredStore::new(&path)
            .save(&[EffectDefinition::new(EffectId::parse("x").unwrap())])
            .unwrap();

        execute(InspectArgs {
            store: Some(path),
            json: true,
        })
        .unwrap();
    }
}
