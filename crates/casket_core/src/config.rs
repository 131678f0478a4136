//! Cascade configuration declaration and resolution.
//!
//! # Responsibility
//! - Validate caller-supplied flag/association/protection settings.
//! - Classify the deletion flag once through schema introspection.
//!
//! # Invariants
//! - A resolved `CascadeConfig` is immutable for the lifetime of a save
//!   operation.
//! - Protection is evaluated per association edge by property name; it is
//!   not path-qualified and not inherited by descendant edges.

use crate::schema::{FieldKind, SchemaError, SchemaIntrospector};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Flag field name used when the caller does not name one.
pub const DEFAULT_FLAG_FIELD: &str = "deleted";

static ASSOCIATION_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$").expect("valid association path regex")
});
static ASSOCIATION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid association name regex"));

/// Value domain of the deletion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Flag stores a formatted date-time text; stamping writes the current
    /// clock time.
    Timestamp,
    /// Flag stores a boolean; stamping writes `true`.
    Boolean,
}

/// Caller-facing configuration before validation.
///
/// Deserializable so applications can keep cascade settings in their own
/// config files. Association names are expected already normalized to the
/// snake_case edge names used by the aggregate model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCascadeConfig {
    /// Deletion flag field name; defaults to `deleted`.
    #[serde(default)]
    pub flag: Option<String>,
    /// Dotted association paths the cascade may descend into.
    #[serde(default)]
    pub associations: Vec<String>,
    /// Association edges exempt from flag stamping.
    #[serde(default)]
    pub protections: Vec<String>,
}

/// Errors raised while resolving a cascade configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The flag field does not exist on the aggregate's root schema.
    UnknownFlagField(String),
    /// The flag field exists but is neither boolean-like nor timestamp-like.
    UnsupportedFlagKind { field: String, kind: FieldKind },
    /// An association path fails the `parent.child` syntax.
    InvalidAssociationPath(String),
    /// A protection entry is not a single association edge name.
    InvalidProtection(String),
    /// Introspection failure.
    Schema(SchemaError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFlagField(field) => {
                write!(f, "deletion flag field not found in schema: {field}")
            }
            Self::UnsupportedFlagKind { field, kind } => write!(
                f,
                "deletion flag field `{field}` has unsupported kind `{kind}`; expected boolean or datetime"
            ),
            Self::InvalidAssociationPath(path) => {
                write!(f, "invalid association path: {path}")
            }
            Self::InvalidProtection(name) => {
                write!(f, "invalid protection entry (single edge name expected): {name}")
            }
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for ConfigError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Resolved, immutable cascade configuration.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    flag: String,
    flag_kind: FlagKind,
    contain: Vec<String>,
    protections: HashSet<String>,
}

impl CascadeConfig {
    /// Validates raw settings and classifies the flag field through `schema`.
    ///
    /// # Errors
    /// - `UnknownFlagField` when introspection finds no such field; the
    ///   operation must never proceed with an unverified flag.
    /// - `UnsupportedFlagKind` when the field cannot hold a tombstone value.
    /// - Path/protection syntax violations.
    pub fn resolve(
        raw: &RawCascadeConfig,
        schema: &dyn SchemaIntrospector,
    ) -> Result<Self, ConfigError> {
        let flag = raw
            .flag
            .as_deref()
            .unwrap_or(DEFAULT_FLAG_FIELD)
            .trim()
            .to_string();

        let kind = schema
            .field_kind(&flag)?
            .ok_or_else(|| ConfigError::UnknownFlagField(flag.clone()))?;
        let flag_kind = match kind {
            FieldKind::Boolean => FlagKind::Boolean,
            FieldKind::DateTime => FlagKind::Timestamp,
            other => {
                return Err(ConfigError::UnsupportedFlagKind {
                    field: flag,
                    kind: other,
                })
            }
        };

        let mut contain = Vec::with_capacity(raw.associations.len());
        for path in &raw.associations {
            let trimmed = path.trim();
            if !ASSOCIATION_PATH_RE.is_match(trimmed) {
                return Err(ConfigError::InvalidAssociationPath(path.clone()));
            }
            contain.push(trimmed.to_string());
        }

        let mut protections = HashSet::with_capacity(raw.protections.len());
        for name in &raw.protections {
            let trimmed = name.trim();
            if !ASSOCIATION_NAME_RE.is_match(trimmed) {
                return Err(ConfigError::InvalidProtection(name.clone()));
            }
            protections.insert(trimmed.to_string());
        }

        Ok(Self {
            flag,
            flag_kind,
            contain,
            protections,
        })
    }

    /// Name of the deletion flag field.
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// Value domain stamped during tombstoning.
    pub fn flag_kind(&self) -> FlagKind {
        self.flag_kind
    }

    /// Dotted association paths the snapshot loader must materialize.
    pub fn contain(&self) -> &[String] {
        &self.contain
    }

    /// Returns whether `edge` is exempt from flag stamping.
    ///
    /// Pure per-edge lookup: descendants of a protected edge are protected
    /// only when their own edge name is also listed.
    pub fn is_protected(&self, edge: &str) -> bool {
        self.protections.contains(edge)
    }
}
