//! Resolve command - show what a reference resolves to
//!
//! The pack is applied as the built-in partition. With `--store`, the
//! authored store is layered on top, exactly as a coordinator would load it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use aurafx_core::store::AuthoredStore;
use aurafx_core::{BuiltinPack, Catalog, EffectRef, Registry, Resolution, Resolver, config};
use aurafx_shared::EffectId;
use aurafx_shared::model::DEFAULT_FALLBACK_PRIMITIVE;
use clap::Args;

/// Arguments for the resolve command
#[derive(Args)]
pub struct ResolveArgs {
    /// Catalog reference or definition id (e.g. "aurafx:shop/halo")
    pub reference: String,

    /// Built-in pack file (.toml, defaults to the configured pack)
    #[arg(long)]
    pub pack: Option<PathBuf>,

    /// Authored store to apply over the pack
    #[arg(long)]
    pub store: Option<PathBuf>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let pack_path = crate::pack_path(args.pack, &config::load().storage)?;
    let pack = BuiltinPack::load(&pack_path)
        .with_context(|| format!("Failed to load pack {}", pack_path.display()))?;
    let id = EffectId::parse(&args.reference)
        .with_context(|| format!("Invalid reference '{}'", args.reference))?;

    let mut registry = Registry::new();
    let mut catalog = Catalog::new();
    let legacy = pack.apply(&mut registry, &mut catalog);

    if let Some(path) = &args.store {
        let contents = AuthoredStore::new(path)
            .load()
            .with_context(|| format!("Failed to read store {}", path.display()))?;
        tracing::debug!(
            definitions = contents.definitions.len(),
            skipped = contents.skipped,
            "Applied authored store"
        );
        registry.apply_authored_snapshot(contents.definitions);
    }

    // Catalog refs take precedence over definition ids
    let reference = if catalog.get(&id).is_some() {
        EffectRef::Published(id)
    } else {
        EffectRef::Definition(id)
    };

    let resolver = Resolver::new(&registry, &catalog, &legacy);
    let target = resolver.target_id(&reference);
    let resolution = resolver.resolve(&reference);
    print!("{}", describe(&reference, target, &resolution));
    Ok(())
}

fn describe(reference: &EffectRef, target: &EffectId, resolution: &Resolution<'_>) -> String {
    let mut out = match reference {
        EffectRef::Published(catalog_ref) => format!("{} -> {}\n", catalog_ref, target),
        EffectRef::Definition(id) => format!("{}\n", id),
    };

    match resolution {
        Resolution::Resolved { definition, origin } => {
            out.push_str(&format!("  resolved ({:?})\n", origin));
            for (index, (behavior, placement)) in definition
                .behavior_layers()
                .iter()
                .zip(definition.placement_layers())
                .enumerate()
            {
                out.push_str(&format!(
                    "  layer {}: {} around {} x{}\n",
                    index,
                    behavior.movement().as_str(),
                    placement.effect_ref(),
                    placement.count()
                ));
            }
            if !definition.is_paired() {
                out.push_str(&format!(
                    "  unpaired: {} behavior, {} placement layer(s)\n",
                    definition.behavior_layers().len(),
                    definition.placement_layers().len()
                ));
            }
        }
        Resolution::Simple { primitive } => {
            out.push_str(&format!("  simple primitive {}\n", primitive));
        }
        Resolution::Default => {
            out.push_str(&format!("  default ({})\n", DEFAULT_FALLBACK_PRIMITIVE));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurafx_core::LegacyCatalog;

    const PACK: &str = r#"
primitives = ["spark"]

[[definition]]
id = "halo"

[[definition.behavior]]
movement = "orbit"

[[definition.placement]]
effect_ref = "spark"
count = 6

[[catalog]]
catalog_ref = "shop/halo"
definition_ref = "halo"
display_name = "Halo"
icon_ref = ""
"#;

    fn id(s: &str) -> EffectId {
        EffectId::parse(s).unwrap()
    }

    #[test]
    fn test_describe_outcomes() {
        let mut registry = Registry::new();
        let mut catalog = Catalog::new();
        let legacy: LegacyCatalog = BuiltinPack::from_toml(PACK)
            .unwrap()
            .apply(&mut registry, &mut catalog);
        let resolver = Resolver::new(&registry, &catalog, &legacy);

        let published = EffectRef::Published(id("shop/halo"));
        let text = describe(
            &published,
            resolver.target_id(&published),
            &resolver.resolve(&published),
        );
        assert!(text.starts_with("aurafx:shop/halo -> aurafx:halo"));
        assert!(text.contains("layer 0: orbit around aurafx:spark x6"));

        let primitive = EffectRef::Definition(id("spark"));
        let text = describe(&primitive, primitive.id(), &resolver.resolve(&primitive));
        assert!(text.contains("simple primitive aurafx:spark"));

        let unknown = EffectRef::Definition(id("nope"));
        let text = describe(&unknown, unknown.id(), &resolver.resolve(&unknown));
        assert!(text.contains("default (aurafx:glint)"));
    }

    #[test]
    fn test_store_overrides_pack() {
        let dir = tempfile::tempdir().unwrap();
        let pack_path = dir.path().join("pack.toml");
        let store_path = dir.path().join("authored.afxa");
        std::fs::write(&pack_path, PACK).unwrap();
        AuthoredStore::new(&store_path).save(std::iter::empty()).unwrap();

        execute(ResolveArgs {
            reference: "shop/halo".to_string(),
            pack: Some(pack_path),
            store: Some(store_path),
        })
        .unwrap();
    }
}
