//! Version helpers.
//!
//! Documents carry a semantic `schemaVersion` string (`major.minor.patch`).
//! The version is used only to gate compatibility: migrations never branch on it.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::errors::{DrydockError, DrydockResult};

/// Schema version written by this engine on every save.
pub const CURRENT_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 4, 0);

/// Highest document major version this engine can load.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Document key holding the declared version.
pub const VERSION_KEY: &str = "schemaVersion";

/// A parsed `major.minor.patch` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version assumed for documents written before versioning existed.
    pub const fn unversioned() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parse a version string. Missing minor/patch components default to zero
    /// (`"1"` and `"1.2"` are accepted); a leading `v` is tolerated. Pre-release
    /// and build suffixes (`-beta.1`, `+build5`) are ignored.
    pub fn parse(s: &str) -> DrydockResult<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let body = body
            .split_once(['-', '+'])
            .map_or(body, |(core, _)| core);
        if body.is_empty() {
            return Err(DrydockError::version("empty schema version"));
        }

        let mut parts = [0u64; 3];
        let mut count = 0;
        for piece in body.split('.') {
            if count == 3 {
                return Err(DrydockError::version(format!(
                    "unrecognized schema version: {s}"
                )));
            }
            parts[count] = piece.parse::<u64>().map_err(|_| {
                DrydockError::version(format!("unrecognized schema version: {s}"))
            })?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Read the declared version from a document value.
    ///
    /// Absent or `null` → [`SchemaVersion::unversioned`]. Bare numbers are
    /// read as `major.minor` (`1` and `1.0` both mean `1.0.0`).
    pub fn from_document(doc: &Value) -> DrydockResult<Self> {
        match doc.get(VERSION_KEY) {
            None | Some(Value::Null) => Ok(Self::unversioned()),
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(major) => Ok(Self::new(major, 0, 0)),
                None if n.as_f64().is_some_and(|f| f.is_finite() && f >= 0.0) => {
                    Self::parse(&n.to_string())
                }
                None => Err(DrydockError::version(format!(
                    "unrecognized schema version: {n}"
                ))),
            },
            Some(other) => Err(DrydockError::version(format!(
                "schema version must be a string, got {other}"
            ))),
        }
    }

    pub fn is_loadable_by(&self, supported_major: u64) -> bool {
        self.major <= supported_major
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Gate a document on its declared major version.
///
/// Only a major version newer than `supported_major` fails; minor and patch
/// differences never block a load.
pub fn check_version(doc: &Value, supported_major: u64) -> DrydockResult<SchemaVersion> {
    let declared = SchemaVersion::from_document(doc)?;
    if !declared.is_loadable_by(supported_major) {
        return Err(DrydockError::version(format!(
            "document schema {declared} was saved by a newer version of the application \
             (supported major version: {supported_major})"
        )));
    }
    Ok(declared)
}
