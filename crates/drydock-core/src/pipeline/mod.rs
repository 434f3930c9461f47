//! Load pipeline primitives.
//!
//! A load is an ordered list of [`Stage`]s, each consuming the previous stage's
//! [`PipelineData`]:
//!
//! ```text
//! Text -> Document -> (version gate) -> Document (migrated) -> Partial -> Design
//! ```
//!
//! Stages share a [`LoadContext`] that carries the warning report and the
//! version read from the document. A stage returning `Err` ends the run; later
//! stages never see a half-processed document.
//!
//! The core crate does no filesystem or network I/O. Callers pass text in.

use std::fmt;

use tracing::debug;

use crate::design::DesignState;
use crate::errors::{DrydockError, DrydockResult};
use crate::report::MigrationReport;
use crate::resolve::PartialDesign;
use crate::version::SchemaVersion;

pub mod parse;
pub mod stages;

/// Stable dot-delimited stage identifier, e.g. `document.parse`.
pub type StageId = String;

/// State shared by all stages of one run.
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    pub report: MigrationReport,
    /// Version declared by the document, once the gate has read it.
    pub source_version: Option<SchemaVersion>,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stage input/output carrier.
pub enum PipelineData {
    None,
    Text(String),
    Document(parse::SaveDocument),
    Partial(PartialDesign),
    Design(Box<DesignState>),
}

impl PipelineData {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Text(_) => "text",
            Self::Document(_) => "document",
            Self::Partial(_) => "partial design",
            Self::Design(_) => "design",
        }
    }
}

impl fmt::Debug for PipelineData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineData::{}", self.kind())
    }
}

/// Error for a stage handed the wrong data shape.
pub(crate) fn unexpected_input(stage: &str, expected: &str, got: &PipelineData) -> DrydockError {
    DrydockError::invariant(format!(
        "stage {stage} expected {expected} input, got {}",
        got.kind()
    ))
}

/// A pipeline stage. Stages must be pure functions of their input and context.
pub trait Stage {
    fn id(&self) -> &str;
    fn run(&self, ctx: &mut LoadContext, input: PipelineData) -> DrydockResult<PipelineData>;
}

/// An ordered list of stages.
#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push_stage<S: Stage + 'a>(&mut self, s: S) -> &mut Self {
        self.stages.push(Box::new(s));
        self
    }

    pub fn stages(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    /// Run every stage in order. On failure the context is returned alongside
    /// the error so the caller can still inspect the report.
    pub fn run(
        &self,
        mut ctx: LoadContext,
        input: PipelineData,
    ) -> Result<PipelineReport, (DrydockError, LoadContext)> {
        let mut data = input;

        for st in &self.stages {
            debug!(stage = st.id(), "starting stage");
            data = match st.run(&mut ctx, data) {
                Ok(d) => d,
                Err(e) => {
                    debug!(stage = st.id(), error = %e, "stage failed");
                    ctx.report.fail(e.to_string());
                    return Err((e, ctx));
                }
            };
            debug!(stage = st.id(), "completed stage");
        }

        Ok(PipelineReport { output: data, ctx })
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct PipelineReport {
    pub output: PipelineData,
    pub ctx: LoadContext,
}

impl PipelineReport {
    pub fn require_document(self) -> DrydockResult<(parse::SaveDocument, LoadContext)> {
        match self.output {
            PipelineData::Document(d) => Ok((d, self.ctx)),
            other => Err(unexpected_input("pipeline output", "document", &other)),
        }
    }

    pub fn require_design(self) -> DrydockResult<(DesignState, LoadContext)> {
        match self.output {
            PipelineData::Design(d) => Ok((*d, self.ctx)),
            other => Err(unexpected_input("pipeline output", "design", &other)),
        }
    }
}
