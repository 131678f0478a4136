//! Identity matching across record collections.
//!
//! # Responsibility
//! - Decide whether a child record existed before and still exists now.
//!
//! # Invariants
//! - Matching is exact scalar equality; no coercion across scalar kinds
//!   (`Int(1)` never matches `Text("1")`).
//! - Records without an identifier (not yet persisted) never match.
//! - On identifier collision inside one collection, the first occurrence
//!   wins.

use crate::model::record::{Record, Scalar};

/// Returns the index of the record in `records` whose identifier equals `id`.
///
/// `None` when `id` is absent, the collection is empty, or no record matches.
pub fn position_by_id(id: Option<&Scalar>, records: &[Record]) -> Option<usize> {
    let id = id?;
    records
        .iter()
        .position(|record| record.identifier() == Some(id))
}
