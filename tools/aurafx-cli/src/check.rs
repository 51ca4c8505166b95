//! Check command - validate a built-in pack

use std::path::PathBuf;

use anyhow::{Context, Result};
use aurafx_core::{BuiltinPack, config};
use clap::Args;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Built-in pack file (.toml, defaults to the configured pack)
    pub pack: Option<PathBuf>,

    /// Fail when any problem is found
    #[arg(long)]
    pub strict: bool,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let path = crate::pack_path(args.pack, &config::load().storage)?;
    let pack = BuiltinPack::load(&path)
        .with_context(|| format!("Failed to load pack {}", path.display()))?;

    let problems = problems(&pack);
    println!(
        "{}: {} definition(s), {} catalog entr(ies), {} legacy pattern(s), {} primitive(s)",
        path.display(),
        pack.definitions.len(),
        pack.catalog.len(),
        pack.legacy.len(),
        pack.primitives.len()
    );
    for problem in &problems {
        println!("  {}", problem);
    }

    if problems.is_empty() {
        println!("  OK");
    } else if args.strict {
        anyhow::bail!("{} problem(s) found", problems.len());
    }
    Ok(())
}

fn problems(pack: &BuiltinPack) -> Vec<String> {
    let mut out = Vec::new();
    for def in pack.degraded() {
        out.push(format!(
            "degraded: {} has {} behavior and {} placement layer(s)",
            def.id(),
            def.behavior_layers().len(),
            def.placement_layers().len()
        ));
    }
    for entry in pack.dangling_catalog() {
        out.push(format!(
            "dangling: {} points at unknown {}",
            entry.catalog_ref, entry.definition_ref
        ));
    }
    out
}
