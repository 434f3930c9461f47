use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use drydock_core::DesignLoader;

use crate::io::input;
use crate::output;

pub fn run(loader: &DesignLoader, doc: &Path) -> Result<ExitCode> {
    let raw = input::read_document(doc)?;
    match loader.migrate_bytes(&raw) {
        Ok(migrated) => {
            output::print(migrated.document.as_value())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::failure_line(e.kind.as_str(), e.kind.user_message(), &e.message);
            Ok(ExitCode::FAILURE)
        }
    }
}
