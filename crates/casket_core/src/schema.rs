//! Schema introspection seam.
//!
//! # Responsibility
//! - Classify the deletion-flag field at configuration time so the cascade
//!   knows which value shape to stamp.
//! - Classify arbitrary columns for the SQLite snapshot loader.
//!
//! # Invariants
//! - Classification happens once, at configuration time; the cascade itself
//!   never inspects schemas.
//! - Declared-type classification follows SQLite affinity conventions.

use crate::db::DbError;
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors from schema introspection.
#[derive(Debug)]
pub enum SchemaError {
    /// Underlying storage failure while reading table metadata.
    Db(DbError),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Value domain of one stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    Text,
    DateTime,
    Blob,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::DateTime => "datetime",
            Self::Blob => "blob",
        };
        write!(f, "{label}")
    }
}

/// External collaborator answering "what kind of field is this" questions.
///
/// Invoked once while resolving a cascade configuration; the answer decides
/// whether the deletion flag is stamped as a boolean or as formatted text.
pub trait SchemaIntrospector {
    /// Returns the kind of `field`, or `None` when the field does not exist.
    fn field_kind(&self, field: &str) -> SchemaResult<Option<FieldKind>>;
}

/// Classifies a declared SQLite column type into a [`FieldKind`].
///
/// Boolean wins over integer so `BOOLEAN` (integer affinity in SQLite) maps
/// to the boolean flag domain.
pub fn classify_declared_type(declared: &str) -> FieldKind {
    let upper = declared.to_ascii_uppercase();
    if upper.contains("BOOL") {
        FieldKind::Boolean
    } else if upper.contains("DATE") || upper.contains("TIME") {
        FieldKind::DateTime
    } else if upper.contains("INT") {
        FieldKind::Integer
    } else if upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB") {
        FieldKind::Text
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        FieldKind::Float
    } else {
        FieldKind::Blob
    }
}

/// Reads the declared column types of `table` into a name -> kind map.
pub fn table_field_kinds(
    conn: &Connection,
    table: &str,
) -> SchemaResult<HashMap<String, FieldKind>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut kinds = HashMap::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let declared: String = row.get(2)?;
        kinds.insert(name, classify_declared_type(&declared));
    }
    Ok(kinds)
}

/// Introspector backed by a live SQLite connection and one root table.
pub struct SqliteSchemaIntrospector<'conn> {
    conn: &'conn Connection,
    table: String,
}

impl<'conn> SqliteSchemaIntrospector<'conn> {
    /// Creates an introspector over the aggregate's root table.
    pub fn new(conn: &'conn Connection, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
        }
    }
}

impl SchemaIntrospector for SqliteSchemaIntrospector<'_> {
    fn field_kind(&self, field: &str) -> SchemaResult<Option<FieldKind>> {
        let kinds = table_field_kinds(self.conn, &self.table)?;
        Ok(kinds.get(field).copied())
    }
}

/// Introspector over a fixed field map.
///
/// Used by callers without a live connection and by unit tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    fields: HashMap<String, FieldKind>,
}

impl StaticSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field registration.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }
}

impl SchemaIntrospector for StaticSchema {
    fn field_kind(&self, field: &str) -> SchemaResult<Option<FieldKind>> {
        Ok(self.fields.get(field).copied())
    }
}
