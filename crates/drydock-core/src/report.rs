//! Migration report: the warning accumulator threaded through a load.
//!
//! Recoverable gaps (unknown catalog ids, orphaned links, missing armor) never
//! unwind the pipeline. Each one becomes a [`Warning`] here, and the caller is
//! responsible for showing them to the user.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Category;

/// What a warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportScope {
    Document,
    Category(Category),
    DamageZones,
}

impl ReportScope {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Category(c) => c.label(),
            Self::DamageZones => "damage zones",
        }
    }
}

impl From<Category> for ReportScope {
    fn from(c: Category) -> Self {
        Self::Category(c)
    }
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recoverable problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub scope: ReportScope,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

/// Warnings in emission order plus the terminal outcome of the load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    warnings: Vec<Warning>,
    failure: Option<String>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, scope: impl Into<ReportScope>, message: impl Into<String>) {
        let w = Warning {
            scope: scope.into(),
            message: message.into(),
        };
        warn!(scope = w.scope.label(), "{}", w.message);
        self.warnings.push(w);
    }

    /// Record the fatal error that ended the load.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Display strings (`"<scope>: <message>"`) in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }

    /// Warning messages grouped by scope, scopes in stable order.
    pub fn by_scope(&self) -> BTreeMap<ReportScope, Vec<String>> {
        self.warnings
            .iter()
            .map(|w| (w.scope, w.message.clone()))
            .into_group_map()
            .into_iter()
            .collect()
    }

    pub fn scope(&self, scope: impl Into<ReportScope>) -> Vec<&Warning> {
        let scope = scope.into();
        self.warnings.iter().filter(|w| w.scope == scope).collect()
    }
}
