use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use drydock_core::catalog::StaticCatalog;
use drydock_core::config::EngineConfig;

use crate::args::CatalogArgs;

pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Raw document bytes. Decoding is left to the loader so an undecodable file
/// is reported as a failed load rather than an I/O error.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Engine configuration from `--config`, or the built-in defaults.
pub fn read_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => {
            let raw = read_text(p)?;
            EngineConfig::from_json_str(&raw).with_context(|| format!("invalid config {}", p.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Base catalog with every overlay merged on top, in command-line order.
pub fn read_catalog(args: &CatalogArgs) -> Result<StaticCatalog> {
    let mut catalog = parse_catalog(&args.catalog)?;
    for overlay in &args.overlays {
        catalog.merge_overlay(parse_catalog(overlay)?);
        tracing::debug!(overlay = %overlay.display(), "catalog overlay merged");
    }
    catalog.validate()?;
    Ok(catalog)
}

fn parse_catalog(path: &Path) -> Result<StaticCatalog> {
    let raw = read_text(path)?;
    StaticCatalog::from_json_str(&raw).with_context(|| format!("invalid catalog {}", path.display()))
}
