//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load the persistent aggregate snapshot by identifier, pre-populated to
//!   the depth described by the configured traversal paths.
//! - Map stored column values onto the tagged scalar model (boolean columns
//!   to `Bool`, date/time columns to opaque `DateTime`).
//!
//! # Invariants
//! - The persistent snapshot is read-only input, loaded fresh per operation.
//! - A contain path naming an unbound association is an error, not a silent
//!   skip.

use crate::db::DbError;
use crate::model::record::{Record, Scalar, Value, ID_FIELD};
use crate::schema::{table_field_kinds, FieldKind, SchemaError};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotResult<T> = Result<T, SnapshotRepoError>;

/// Errors from snapshot loading.
#[derive(Debug)]
pub enum SnapshotRepoError {
    /// Underlying SQLite failure.
    Db(DbError),
    /// A contain path names an association with no binding.
    UnknownAssociation(String),
    /// Persisted data cannot be converted to the aggregate model.
    InvalidData(String),
}

impl Display for SnapshotRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownAssociation(name) => {
                write!(f, "association is not bound to a table: {name}")
            }
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for SnapshotRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UnknownAssociation(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SnapshotRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for SnapshotRepoError {
    fn from(value: SchemaError) -> Self {
        match value {
            SchemaError::Db(err) => Self::Db(err),
        }
    }
}

/// Repository interface for loading the persistent snapshot.
pub trait SnapshotRepository {
    /// Loads the aggregate rooted at `id`, materialized to the depth of the
    /// dotted `contain` paths. `None` when no root row exists.
    fn load_snapshot(&self, id: &Scalar, contain: &[String]) -> SnapshotResult<Option<Record>>;
}

/// Cardinality of one association edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Single associated record.
    HasOne,
    /// Ordered collection of associated records.
    HasMany,
}

/// Mapping from one association edge to its child table.
#[derive(Debug, Clone)]
pub struct AssociationBinding {
    /// Edge name as it appears in the aggregate model and contain paths.
    pub name: String,
    /// Edge cardinality.
    pub kind: AssociationKind,
    /// Child table name.
    pub table: String,
    /// Column on the child table referencing the parent identifier.
    pub foreign_key: String,
    /// Bindings for the next association level.
    pub nested: Vec<AssociationBinding>,
}

impl AssociationBinding {
    /// Declares a to-many edge.
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasMany,
            table: table.into(),
            foreign_key: foreign_key.into(),
            nested: Vec::new(),
        }
    }

    /// Declares a to-one edge.
    pub fn has_one(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasOne,
            table: table.into(),
            foreign_key: foreign_key.into(),
            nested: Vec::new(),
        }
    }

    /// Builder-style nested binding registration.
    pub fn with_nested(mut self, nested: AssociationBinding) -> Self {
        self.nested.push(nested);
        self
    }
}

/// Root-table binding of one aggregate.
#[derive(Debug, Clone)]
pub struct AggregateBinding {
    /// Root table name.
    pub table: String,
    /// Bindings for the first association level.
    pub associations: Vec<AssociationBinding>,
}

impl AggregateBinding {
    /// Creates a binding for the aggregate's root table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            associations: Vec::new(),
        }
    }

    /// Builder-style association registration.
    pub fn with_association(mut self, binding: AssociationBinding) -> Self {
        self.associations.push(binding);
        self
    }
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
    binding: AggregateBinding,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Creates a repository over `conn` for one aggregate binding.
    pub fn new(conn: &'conn Connection, binding: AggregateBinding) -> Self {
        Self { conn, binding }
    }

    fn load_rows(
        &self,
        table: &str,
        key_column: &str,
        key: &Scalar,
    ) -> SnapshotResult<Vec<Record>> {
        let kinds = table_field_kinds(self.conn, table)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {table} WHERE {key_column} = ?1 ORDER BY {ID_FIELD} ASC;"
        ))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query([scalar_to_sql(key)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (index, name) in column_names.iter().enumerate() {
                let scalar =
                    value_ref_to_scalar(table, name, kinds.get(name).copied(), row.get_ref(index)?)?;
                record.set(name.clone(), Value::Scalar(scalar));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn attach_associations(
        &self,
        table: &str,
        record: &mut Record,
        bindings: &[AssociationBinding],
        contain: &[ContainNode],
    ) -> SnapshotResult<()> {
        for node in contain {
            let binding = bindings
                .iter()
                .find(|binding| binding.name == node.name)
                .ok_or_else(|| SnapshotRepoError::UnknownAssociation(node.name.clone()))?;
            let parent_id = record.identifier().cloned().ok_or_else(|| {
                SnapshotRepoError::InvalidData(format!(
                    "row in `{table}` has no usable `{ID_FIELD}` column"
                ))
            })?;

            let mut children = self.load_rows(&binding.table, &binding.foreign_key, &parent_id)?;
            for child in &mut children {
                self.attach_associations(&binding.table, child, &binding.nested, &node.children)?;
            }

            match binding.kind {
                AssociationKind::HasMany => {
                    record.set(binding.name.clone(), Value::Records(children));
                }
                AssociationKind::HasOne => match children.into_iter().next() {
                    Some(child) => record.set(binding.name.clone(), Value::Record(child)),
                    None => record.set(binding.name.clone(), Value::Scalar(Scalar::Null)),
                },
            }
        }
        Ok(())
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load_snapshot(&self, id: &Scalar, contain: &[String]) -> SnapshotResult<Option<Record>> {
        let contain_tree = build_contain_tree(contain);
        let mut roots = self.load_rows(&self.binding.table, ID_FIELD, id)?;
        let Some(mut root) = roots.pop() else {
            return Ok(None);
        };
        self.attach_associations(
            &self.binding.table,
            &mut root,
            &self.binding.associations,
            &contain_tree,
        )?;
        Ok(Some(root))
    }
}

struct ContainNode {
    name: String,
    children: Vec<ContainNode>,
}

fn build_contain_tree(paths: &[String]) -> Vec<ContainNode> {
    let mut roots: Vec<ContainNode> = Vec::new();
    for path in paths {
        let mut level = &mut roots;
        for segment in path.split('.') {
            let index = match level.iter().position(|node| node.name == segment) {
                Some(index) => index,
                None => {
                    level.push(ContainNode {
                        name: segment.to_string(),
                        children: Vec::new(),
                    });
                    level.len() - 1
                }
            };
            level = &mut level[index].children;
        }
    }
    roots
}

fn scalar_to_sql(scalar: &Scalar) -> SqlValue {
    match scalar {
        Scalar::Null => SqlValue::Null,
        Scalar::Bool(value) => SqlValue::Integer(i64::from(*value)),
        Scalar::Int(value) => SqlValue::Integer(*value),
        Scalar::Float(value) => SqlValue::Real(*value),
        Scalar::Text(value) => SqlValue::Text(value.clone()),
        Scalar::DateTime(value) => SqlValue::Text(value.clone()),
    }
}

fn value_ref_to_scalar(
    table: &str,
    column: &str,
    kind: Option<FieldKind>,
    value: ValueRef<'_>,
) -> SnapshotResult<Scalar> {
    let scalar = match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(raw) => match kind {
            Some(FieldKind::Boolean) => Scalar::Bool(raw != 0),
            _ => Scalar::Int(raw),
        },
        ValueRef::Real(raw) => Scalar::Float(raw),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|_| {
                SnapshotRepoError::InvalidData(format!(
                    "non-utf8 text in {table}.{column}"
                ))
            })?;
            match kind {
                Some(FieldKind::DateTime) => Scalar::DateTime(text.to_string()),
                _ => Scalar::Text(text.to_string()),
            }
        }
        ValueRef::Blob(_) => {
            return Err(SnapshotRepoError::InvalidData(format!(
                "blob column is not supported in aggregates: {table}.{column}"
            )));
        }
    };
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use super::{
        build_contain_tree, AggregateBinding, AssociationBinding, SnapshotRepoError,
        SnapshotRepository, SqliteSnapshotRepository,
    };
    use crate::db::open_db_in_memory;
    use crate::model::record::{Scalar, Value};
    use rusqlite::Connection;

    fn seed_orders(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                note TEXT,
                placed_at DATETIME,
                deleted BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE items (
                id INTEGER PRIMARY KEY,
                order_id INTEGER NOT NULL REFERENCES orders(id),
                name TEXT,
                deleted BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE adjustments (
                id INTEGER PRIMARY KEY,
                item_id INTEGER NOT NULL REFERENCES items(id),
                amount REAL,
                deleted BOOLEAN NOT NULL DEFAULT 0
            );
            INSERT INTO orders (id, note, placed_at, deleted)
            VALUES (1, 'first', '2024-01-02 03:04:05', 0);
            INSERT INTO items (id, order_id, name, deleted) VALUES
                (11, 1, 'beta', 0),
                (10, 1, 'alpha', 0);
            INSERT INTO adjustments (id, item_id, amount, deleted)
            VALUES (100, 10, 1.5, 0);",
        )
        .expect("fixture schema should apply");
    }

    fn order_binding() -> AggregateBinding {
        AggregateBinding::new("orders").with_association(
            AssociationBinding::has_many("items", "items", "order_id")
                .with_nested(AssociationBinding::has_many(
                    "adjustments",
                    "adjustments",
                    "item_id",
                )),
        )
    }

    #[test]
    fn loads_root_with_typed_scalars() {
        let conn = open_db_in_memory().expect("open should succeed");
        seed_orders(&conn);
        let repo = SqliteSnapshotRepository::new(&conn, order_binding());

        let snapshot = repo
            .load_snapshot(&Scalar::Int(1), &[])
            .expect("load should succeed")
            .expect("root row should exist");

        assert_eq!(snapshot.identifier(), Some(&Scalar::Int(1)));
        assert_eq!(snapshot.get("deleted"), Some(&Value::from(false)));
        assert_eq!(
            snapshot.get("placed_at"),
            Some(&Value::Scalar(Scalar::DateTime(
                "2024-01-02 03:04:05".to_string()
            )))
        );
        // Associations outside the contain list stay absent.
        assert!(snapshot.get("items").is_none());
    }

    #[test]
    fn materializes_nested_contain_paths_in_id_order() {
        let conn = open_db_in_memory().expect("open should succeed");
        seed_orders(&conn);
        let repo = SqliteSnapshotRepository::new(&conn, order_binding());

        let snapshot = repo
            .load_snapshot(&Scalar::Int(1), &["items.adjustments".to_string()])
            .expect("load should succeed")
            .expect("root row should exist");

        let Some(Value::Records(items)) = snapshot.get("items") else {
            panic!("items collection expected");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].identifier(), Some(&Scalar::Int(10)));
        assert_eq!(items[1].identifier(), Some(&Scalar::Int(11)));

        let Some(Value::Records(adjustments)) = items[0].get("adjustments") else {
            panic!("adjustments collection expected under item 10");
        };
        assert_eq!(adjustments[0].get("amount"), Some(&Value::Scalar(Scalar::Float(1.5))));
    }

    #[test]
    fn missing_root_returns_none() {
        let conn = open_db_in_memory().expect("open should succeed");
        seed_orders(&conn);
        let repo = SqliteSnapshotRepository::new(&conn, order_binding());

        let snapshot = repo
            .load_snapshot(&Scalar::Int(999), &[])
            .expect("load should succeed");
        assert!(snapshot.is_none());
    }

    #[test]
    fn unbound_contain_path_is_an_error() {
        let conn = open_db_in_memory().expect("open should succeed");
        seed_orders(&conn);
        let repo = SqliteSnapshotRepository::new(&conn, order_binding());

        let err = repo
            .load_snapshot(&Scalar::Int(1), &["shipments".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotRepoError::UnknownAssociation(name) if name == "shipments"
        ));
    }

    #[test]
    fn has_one_edge_loads_single_record_or_null() {
        let conn = open_db_in_memory().expect("open should succeed");
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, deleted BOOLEAN NOT NULL DEFAULT 0);
            CREATE TABLE invoices (
                id INTEGER PRIMARY KEY,
                order_id INTEGER NOT NULL REFERENCES orders(id),
                deleted BOOLEAN NOT NULL DEFAULT 0
            );
            INSERT INTO orders (id) VALUES (1), (2);
            INSERT INTO invoices (id, order_id) VALUES (900, 1);",
        )
        .expect("fixture schema should apply");

        let binding = AggregateBinding::new("orders")
            .with_association(AssociationBinding::has_one("invoice", "invoices", "order_id"));
        let repo = SqliteSnapshotRepository::new(&conn, binding);

        let with_invoice = repo
            .load_snapshot(&Scalar::Int(1), &["invoice".to_string()])
            .expect("load should succeed")
            .expect("root row should exist");
        assert!(matches!(with_invoice.get("invoice"), Some(Value::Record(_))));

        let without_invoice = repo
            .load_snapshot(&Scalar::Int(2), &["invoice".to_string()])
            .expect("load should succeed")
            .expect("root row should exist");
        assert_eq!(
            without_invoice.get("invoice"),
            Some(&Value::Scalar(Scalar::Null))
        );
    }

    #[test]
    fn contain_tree_merges_shared_prefixes() {
        let tree = build_contain_tree(&[
            "items.adjustments".to_string(),
            "items.notes".to_string(),
            "shipments".to_string(),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "items");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[1].name, "shipments");
    }
}
