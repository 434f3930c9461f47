//! Load entry points.
//!
//! [`DesignLoader`] assembles the standard pipeline (parse, version gate,
//! migrate, resolve, recompute) from an [`EngineConfig`] and exposes it as a
//! single call returning a [`LoadResult`]. Callers must handle both arms: a
//! failed load carries a typed [`ErrorKind`] and never a partial design.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::{validate_config, EngineConfig};
use crate::design::DesignState;
use crate::errors::{DrydockError, DrydockResult};
use crate::migrate::MigrationChain;
use crate::pipeline::parse::SaveDocument;
use crate::pipeline::stages::{MigrateStage, ParseStage, RecomputeStage, ResolveStage, VersionGateStage};
use crate::pipeline::{LoadContext, Pipeline, PipelineData};
use crate::recompute::{CostModel, StandardCostModel};
use crate::report::MigrationReport;
use crate::version::SchemaVersion;

/// Class of a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Parse,
    Version,
    MissingHull,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Version => "version",
            Self::MissingHull => "missing-hull",
        }
    }

    /// Short explanation suitable for an end-user dialog.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Parse => "The file could not be read as a design.",
            Self::Version => "This design was saved by a newer version of the application.",
            Self::MissingHull => "The design has no usable hull.",
        }
    }
}

/// A fatal load failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} error: {}", .kind.as_str(), .message)]
pub struct LoadError {
    pub kind: ErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<DrydockError> for LoadError {
    fn from(e: DrydockError) -> Self {
        let (kind, message) = match e {
            DrydockError::Parse(m) => (ErrorKind::Parse, m),
            DrydockError::Version(m) => (ErrorKind::Version, m),
            DrydockError::MissingHull(m) => (ErrorKind::MissingHull, m),
            // Anything else means the input could not be processed as a design.
            other => (ErrorKind::Parse, other.to_string()),
        };
        Self { kind, message }
    }
}

/// A successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDesign {
    pub state: DesignState,
    /// Version the document declared (0.0.0 when it declared none).
    pub source_version: SchemaVersion,
    pub report: MigrationReport,
}

impl LoadedDesign {
    /// Warning display strings, in emission order.
    pub fn warnings(&self) -> Vec<String> {
        self.report.messages()
    }
}

pub type LoadResult = Result<LoadedDesign, LoadError>;

/// Serializable summary of a [`LoadResult`], for hosts that forward results
/// across a process or language boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DesignState>,
    /// Present on every success, empty when the load was clean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<LoadResult> for LoadOutcome {
    fn from(r: LoadResult) -> Self {
        match r {
            Ok(loaded) => Self {
                success: true,
                warnings: Some(loaded.warnings()),
                source_version: Some(loaded.source_version.to_string()),
                state: Some(loaded.state),
                error_kind: None,
                message: None,
            },
            Err(e) => Self {
                success: false,
                state: None,
                warnings: None,
                source_version: None,
                error_kind: Some(e.kind),
                message: Some(e.message),
            },
        }
    }
}

/// A migrated document that has not been resolved against a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedDocument {
    pub source_version: SchemaVersion,
    pub document: SaveDocument,
}

/// Configured loader. Build once, load many documents.
pub struct DesignLoader {
    config: EngineConfig,
    chain: MigrationChain,
    cost_model: Box<dyn CostModel + Send + Sync>,
}

impl std::fmt::Debug for DesignLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignLoader")
            .field("config", &self.config)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl DesignLoader {
    pub fn new(config: EngineConfig) -> DrydockResult<Self> {
        validate_config(&config)?;
        let chain = MigrationChain::standard(&config.migration)?;
        Ok(Self {
            config,
            chain,
            cost_model: Box::new(StandardCostModel),
        })
    }

    pub fn with_cost_model(mut self, model: impl CostModel + Send + Sync + 'static) -> Self {
        self.cost_model = Box::new(model);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    fn front_pipeline(&self) -> Pipeline<'_> {
        let mut p = Pipeline::new();
        p.push_stage(ParseStage::new(self.config.limits.max_document_bytes))
            .push_stage(VersionGateStage::new(self.config.supported_major))
            .push_stage(MigrateStage::new(&self.chain));
        p
    }

    /// Parse, gate, and migrate without touching a catalog.
    pub fn migrate(&self, raw: &str) -> LoadResultOf<MigratedDocument> {
        let report = self
            .front_pipeline()
            .run(LoadContext::new(), PipelineData::Text(raw.to_string()))
            .map_err(|(e, _)| LoadError::from(e))?;
        let (document, ctx) = report.require_document()?;
        Ok(MigratedDocument {
            source_version: ctx.source_version.unwrap_or_else(SchemaVersion::unversioned),
            document,
        })
    }

    /// [`DesignLoader::migrate`] over raw file bytes.
    pub fn migrate_bytes(&self, raw: &[u8]) -> LoadResultOf<MigratedDocument> {
        self.migrate(decode_text(raw)?)
    }

    /// [`DesignLoader::load`] over raw file bytes. Bytes that are not UTF-8
    /// fail as a parse error like any other unreadable document.
    pub fn load_bytes(&self, raw: &[u8], catalog: &dyn Catalog) -> LoadResult {
        match decode_text(raw) {
            Ok(text) => self.load(text, catalog),
            Err(e) => {
                warn!(kind = e.kind.as_str(), error = %e.message, "design load failed");
                Err(e)
            }
        }
    }

    /// Run the full load against `catalog`.
    pub fn load(&self, raw: &str, catalog: &dyn Catalog) -> LoadResult {
        let mut pipeline = self.front_pipeline();
        pipeline
            .push_stage(ResolveStage::new(catalog))
            .push_stage(RecomputeStage::new(self.cost_model.as_ref()));

        let run = pipeline.run(LoadContext::new(), PipelineData::Text(raw.to_string()));
        let result = run
            .map_err(|(e, _)| LoadError::from(e))
            .and_then(|report| {
                let (state, ctx) = report.require_design()?;
                Ok(LoadedDesign {
                    state,
                    source_version: ctx.source_version.unwrap_or_else(SchemaVersion::unversioned),
                    report: ctx.report,
                })
            });

        match &result {
            Ok(loaded) => info!(
                hull = %loaded.state.hull.id,
                from = %loaded.source_version,
                warnings = loaded.report.len(),
                "design loaded"
            ),
            Err(e) => warn!(kind = e.kind.as_str(), error = %e.message, "design load failed"),
        }
        result
    }
}

/// Result alias for loader calls that fail with a [`LoadError`].
pub type LoadResultOf<T> = Result<T, LoadError>;

/// Decode document bytes as UTF-8 text.
pub fn decode_text(raw: &[u8]) -> LoadResultOf<&str> {
    std::str::from_utf8(raw).map_err(|e| LoadError {
        kind: ErrorKind::Parse,
        message: format!("file could not be read: not valid UTF-8 ({e})"),
    })
}

/// Load with the default configuration.
pub fn load(raw: &str, catalog: &dyn Catalog) -> LoadResult {
    DesignLoader::new(EngineConfig::default())
        .map_err(LoadError::from)?
        .load(raw, catalog)
}
