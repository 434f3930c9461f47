use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use drydock_core::{DesignLoader, LoadOutcome};

use crate::args::CatalogArgs;
use crate::io::input;
use crate::output;

/// Print the `LoadOutcome` JSON on stdout; warnings and failures go to stderr.
pub fn run(loader: &DesignLoader, doc: &Path, catalog_args: &CatalogArgs) -> Result<ExitCode> {
    let catalog = input::read_catalog(catalog_args)?;
    let raw = input::read_document(doc)?;

    let result = loader.load_bytes(&raw, &catalog);
    let code = match &result {
        Ok(loaded) => {
            for w in loaded.warnings() {
                output::warning_line(&w);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::failure_line(e.kind.as_str(), e.kind.user_message(), &e.message);
            ExitCode::FAILURE
        }
    };

    output::print(&LoadOutcome::from(result))?;
    Ok(code)
}
