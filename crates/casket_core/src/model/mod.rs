//! In-memory representation of a persisted aggregate.
//!
//! # Responsibility
//! - Define the tagged tree shapes the cascade algorithms dispatch on.
//! - Keep identity and field-presence semantics in one place.
//!
//! # Invariants
//! - Deletion is represented by a flag field, never by removing records.
//! - Date/time values are opaque leaves, never traversable composites.

pub mod record;
