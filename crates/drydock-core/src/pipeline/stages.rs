//! Built-in load stages.
//!
//! The standard load runs, in order:
//! - [`ParseStage`]: text to loosely typed document
//! - [`VersionGateStage`]: reject documents from a newer major version
//! - [`MigrateStage`]: run the migration chain
//! - [`ResolveStage`]: resolve catalog references
//! - [`RecomputeStage`]: compute derived values

use tracing::debug;

use crate::catalog::Catalog;
use crate::errors::DrydockResult;
use crate::migrate::MigrationChain;
use crate::pipeline::parse::parse_document;
use crate::pipeline::{unexpected_input, LoadContext, PipelineData, Stage};
use crate::recompute::{recompute, CostModel};
use crate::resolve::CatalogResolver;
use crate::version::check_version;

/// Stage: parse raw text.
pub struct ParseStage {
    max_bytes: usize,
}

impl ParseStage {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Stage for ParseStage {
    fn id(&self) -> &str {
        "document.parse"
    }

    fn run(&self, _ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData> {
        match input {
            PipelineData::Text(raw) => {
                let doc = parse_document(&raw, self.max_bytes)?;
                debug!(bytes = raw.len(), "document parsed");
                Ok(PipelineData::Document(doc))
            }
            other => Err(unexpected_input(self.id(), "text", &other)),
        }
    }
}

/// Stage: compare the declared schema version with the supported major.
///
/// Runs before any migration so a newer document is never rewritten.
pub struct VersionGateStage {
    supported_major: u64,
}

impl VersionGateStage {
    pub fn new(supported_major: u64) -> Self {
        Self { supported_major }
    }
}

impl Stage for VersionGateStage {
    fn id(&self) -> &str {
        "version.gate"
    }

    fn run(&self, ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData> {
        match input {
            PipelineData::Document(doc) => {
                let version = check_version(doc.as_value(), self.supported_major)?;
                debug!(version = %version, "version accepted");
                ctx.source_version = Some(version);
                Ok(PipelineData::Document(doc))
            }
            other => Err(unexpected_input(self.id(), "document", &other)),
        }
    }
}

/// Stage: run the migration chain.
pub struct MigrateStage<'a> {
    chain: &'a MigrationChain,
}

impl<'a> MigrateStage<'a> {
    pub fn new(chain: &'a MigrationChain) -> Self {
        Self { chain }
    }
}

impl Stage for MigrateStage<'_> {
    fn id(&self) -> &str {
        "migrate.chain"
    }

    fn run(&self, _ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData> {
        match input {
            PipelineData::Document(doc) => Ok(PipelineData::Document(self.chain.apply(&doc))),
            other => Err(unexpected_input(self.id(), "document", &other)),
        }
    }
}

/// Stage: resolve catalog references.
pub struct ResolveStage<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> ResolveStage<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self { catalog }
    }
}

impl Stage for ResolveStage<'_> {
    fn id(&self) -> &str {
        "catalog.resolve"
    }

    fn run(&self, ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData> {
        match input {
            PipelineData::Document(doc) => {
                let partial = CatalogResolver::new(self.catalog).resolve(&doc, &mut ctx.report)?;
                debug!(
                    systems = partial.state().system_count(),
                    warnings = ctx.report.len(),
                    "catalog references resolved"
                );
                Ok(PipelineData::Partial(partial))
            }
            other => Err(unexpected_input(self.id(), "document", &other)),
        }
    }
}

/// Stage: compute derived values.
pub struct RecomputeStage<'a> {
    cost_model: &'a dyn CostModel,
}

impl<'a> RecomputeStage<'a> {
    pub fn new(cost_model: &'a dyn CostModel) -> Self {
        Self { cost_model }
    }
}

impl Stage for RecomputeStage<'_> {
    fn id(&self) -> &str {
        "derived.recompute"
    }

    fn run(&self, ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData> {
        match input {
            PipelineData::Partial(partial) => {
                let state = recompute(partial, self.cost_model, &mut ctx.report);
                Ok(PipelineData::Design(Box::new(state)))
            }
            other => Err(unexpected_input(self.id(), "partial design", &other)),
        }
    }
}
