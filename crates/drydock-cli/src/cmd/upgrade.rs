use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use drydock_core::{save, DesignLoader};

use crate::args::CatalogArgs;
use crate::io::input;
use crate::output;

/// Load, then save in the current schema. Elements dropped during the load
/// are reported and are not written back.
pub fn run(
    loader: &DesignLoader,
    doc: &Path,
    catalog_args: &CatalogArgs,
    out: Option<&Path>,
) -> Result<ExitCode> {
    let catalog = input::read_catalog(catalog_args)?;
    let raw = input::read_document(doc)?;

    let loaded = match loader.load_bytes(&raw, &catalog) {
        Ok(l) => l,
        Err(e) => {
            output::failure_line(e.kind.as_str(), e.kind.user_message(), &e.message);
            return Ok(ExitCode::FAILURE);
        }
    };
    for w in loaded.warnings() {
        output::warning_line(&w);
    }

    let text = save(&loaded.state)?;
    match out {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                from = %loaded.source_version,
                to = %drydock_core::CURRENT_SCHEMA_VERSION,
                out = %path.display(),
                "design upgraded"
            );
        }
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}
