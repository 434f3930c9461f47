use std::process::ExitCode;

use anyhow::Result;
use drydock_core::DesignLoader;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct StepOut<'a> {
    pub order: usize,
    pub id: &'a str,
    pub description: &'a str,
}

pub fn run(loader: &DesignLoader) -> Result<ExitCode> {
    let steps: Vec<StepOut<'_>> = loader
        .chain()
        .describe()
        .into_iter()
        .enumerate()
        .map(|(i, (id, description))| StepOut {
            order: i + 1,
            id,
            description,
        })
        .collect();
    output::print(&steps)?;
    Ok(ExitCode::SUCCESS)
}
