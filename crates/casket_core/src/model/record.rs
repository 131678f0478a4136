//! Aggregate tree model.
//!
//! # Responsibility
//! - Define the canonical record/value/scalar shapes shared by the comparator,
//!   tombstone stamper, and patch merger.
//! - Provide field access with deterministic ordering.
//!
//! # Invariants
//! - `Record` preserves field insertion order; `set` replaces in place.
//! - A record without a non-null scalar `id` field is "new" and never matches
//!   during identity lookup.
//! - `Scalar::DateTime` is an opaque leaf: it is never descended into and
//!   never receives a deletion stamp.

use serde::{Deserialize, Serialize};

/// Name of the identifier field used for matching records across trees.
pub const ID_FIELD: &str = "id";

/// Leaf value stored in a record field.
///
/// `DateTime` keeps the stored textual representation. It exists as its own
/// kind so structurally object-like time values from the storage layer stay
/// scalar-equivalent for the cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    /// SQL NULL / absent value.
    Null,
    /// Boolean column value.
    Bool(bool),
    /// Integer column value.
    Int(i64),
    /// Floating-point column value.
    Float(f64),
    /// Text column value.
    Text(String),
    /// Date/time column value in its stored textual form. Opaque leaf.
    DateTime(String),
}

impl Scalar {
    /// Returns whether this scalar is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// One field value inside a record: scalar, to-one association, or to-many
/// association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Plain column value.
    Scalar(Scalar),
    /// Nested single associated record.
    Record(Record),
    /// Ordered collection of associated records.
    Records(Vec<Record>),
}

impl Value {
    /// Returns whether this value counts as present for traversal purposes.
    ///
    /// `Scalar::Null` counts as absent, mirroring the storage layer's notion
    /// of an unset association slot.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Scalar(Scalar::Null))
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<Vec<Record>> for Value {
    fn from(value: Vec<Record>) -> Self {
        Self::Records(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }
}

/// One record of the aggregate: an ordered mapping from field name to value.
///
/// Field order is preserved so patches keep the shape of the persistent tree
/// they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record whose `id` field is already set.
    pub fn with_id(id: Scalar) -> Self {
        Self::new().with(ID_FIELD, Value::Scalar(id))
    }

    /// Builder-style field assignment for fixture construction.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name.into(), value.into());
        self
    }

    /// Returns the value at `name`, if the field exists.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value at `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns whether `name` is present with a non-null value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_present)
    }

    /// Assigns `value` at `name`, replacing an existing field in place so
    /// field order stays stable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Returns the identifier scalar, when this record has been persisted.
    ///
    /// A missing, null, or non-scalar `id` field yields `None`; such records
    /// never match during identity lookup.
    pub fn identifier(&self) -> Option<&Scalar> {
        match self.get(ID_FIELD) {
            Some(Value::Scalar(scalar)) if !scalar.is_null() => Some(scalar),
            _ => None,
        }
    }

    /// Returns whether this record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.identifier().is_none()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
