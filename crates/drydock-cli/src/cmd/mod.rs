use std::process::ExitCode;

use anyhow::Result;
use drydock_core::DesignLoader;

use crate::args::{Cli, Command};
use crate::io::input;

mod load;
mod migrate;
mod steps;
mod upgrade;

pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = input::read_config(cli.config.as_deref())?;
    let loader = DesignLoader::new(config)?;

    match cli.command {
        Command::Load { doc, catalog } => load::run(&loader, &doc, &catalog),
        Command::Upgrade { doc, catalog, out } => upgrade::run(&loader, &doc, &catalog, out.as_deref()),
        Command::Migrate { doc } => migrate::run(&loader, &doc),
        Command::Steps => steps::run(&loader),
    }
}
