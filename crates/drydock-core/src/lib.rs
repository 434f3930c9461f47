//! drydock-core
//!
//! Load engine for versioned ship-design documents:
//! - syntax-only parsing into a loosely typed document
//! - a major-version gate that refuses documents from newer releases
//! - an ordered, idempotent migration chain that normalizes any historical
//!   document shape into the current one
//! - catalog resolution into an owned, strongly typed design state
//! - recomputation of derived values (linked control costs)
//! - serialization back to the current document shape
//!
//! Fatal failures (`parse`, `version`, `missing-hull`) end a load; everything
//! else is recorded as a warning in a [`report::MigrationReport`].
//!
//! The crate does no filesystem or network I/O.

pub mod catalog;
pub mod config;
pub mod design;
pub mod errors;
pub mod loader;
pub mod migrate;
pub mod pipeline;
pub mod recompute;
pub mod report;
pub mod resolve;
pub mod save;
pub mod version;
pub mod wire;

pub use crate::errors::{DrydockError, DrydockResult};
pub use crate::loader::{load, DesignLoader, ErrorKind, LoadError, LoadOutcome, LoadResult, LoadedDesign};
pub use crate::save::save;
pub use crate::version::{CURRENT_SCHEMA_VERSION, SUPPORTED_MAJOR};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogEntry, Category, HullDefinition, HullSizeClass, StaticCatalog};
    pub use crate::config::{EngineConfig, LimitsConfig, MigrationConfig};
    pub use crate::design::{
        ArmorLayer, ControlLink, DamageZone, DesignState, DesignType, InstalledControl,
        InstalledDefense, InstalledLauncher, InstalledSystem, LinkKind, LoadoutSlot,
    };
    pub use crate::loader::{load, DesignLoader, ErrorKind, LoadError, LoadOutcome, LoadResult, LoadedDesign};
    pub use crate::migrate::{MigrationChain, MigrationStep};
    pub use crate::recompute::{CostModel, StandardCostModel};
    pub use crate::report::{MigrationReport, ReportScope, Warning};
    pub use crate::save::{save, to_document};
    pub use crate::version::{SchemaVersion, CURRENT_SCHEMA_VERSION};
    pub use crate::{DrydockError, DrydockResult};
}
