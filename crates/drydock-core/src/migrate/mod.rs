//! Document migration chain.
//!
//! Documents of any historical vintage are normalized into the current shape by
//! running a fixed, ordered list of [`MigrationStep`]s. Every step runs on every
//! document regardless of its declared version, so each step must:
//! - be idempotent (`apply(apply(d)) == apply(d)`)
//! - be a no-op when its target field is absent or already current
//! - never mutate its input (it returns a new value)
//!
//! Ordering rule: a step that introduces a field consumed by a later step runs
//! first. The standard order is pinned by tests.

use serde_json::Value;
use tracing::debug;

use crate::config::MigrationConfig;
use crate::errors::DrydockResult;
use crate::pipeline::parse::SaveDocument;

pub mod renames;
pub mod steps;

use renames::RenameTables;

/// One structural concern of document normalization.
pub trait MigrationStep {
    /// Stable dot-delimited identifier, e.g. `armor.layers_from_single`.
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn apply(&self, doc: &Value) -> Value;
}

/// An ordered list of migration steps.
#[derive(Default)]
pub struct MigrationChain {
    steps: Vec<Box<dyn MigrationStep + Send + Sync>>,
}

impl std::fmt::Debug for MigrationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationChain")
            .field("steps", &self.step_ids())
            .finish()
    }
}

impl MigrationChain {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// The engine's standard chain.
    pub fn standard(cfg: &MigrationConfig) -> DrydockResult<Self> {
        let renames = RenameTables::new(&cfg.renames)?;

        let mut chain = Self::new();
        chain
            .push_step(steps::RenameLegacyFields)
            .push_step(steps::FlattenHullReference)
            .push_step(steps::ArmorLayersFromSingle)
            .push_step(steps::CountermeasureSets::new(cfg.countermeasure_units_per_set))
            .push_step(steps::LoadoutListToMap)
            .push_step(steps::AssignInstanceIds)
            .push_step(steps::IndexLinksToInstanceLinks)
            .push_step(steps::RenameIds::new(renames));
        Ok(chain)
    }

    pub fn push_step<S: MigrationStep + Send + Sync + 'static>(&mut self, s: S) -> &mut Self {
        self.steps.push(Box::new(s));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    /// (id, description) pairs in execution order.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.steps.iter().map(|s| (s.id(), s.description())).collect()
    }

    /// Run every step, in order, on a copy of `doc`.
    pub fn apply(&self, doc: &SaveDocument) -> SaveDocument {
        let mut current = doc.as_value().clone();
        for step in &self.steps {
            let next = step.apply(&current);
            if next != current {
                debug!(step = step.id(), "migration step rewrote document");
            }
            current = next;
        }
        SaveDocument::from_migrated(current)
    }
}
