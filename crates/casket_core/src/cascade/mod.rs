//! Cascading soft-delete core.
//!
//! # Responsibility
//! - Diff a persistent aggregate snapshot against the contextual (about to be
//!   saved) snapshot, tombstoning removed subtrees into a patch.
//! - Merge the patch back into the contextual snapshot in place.
//!
//! # Invariants
//! - Pure in-memory tree transformation: no I/O, no ambient time, bounded by
//!   the materialized shape of the input trees.
//! - The patch only ever *adds* tombstoned subtrees to the contextual tree;
//!   caller data present in contextual is never overwritten.
//! - Protection is re-evaluated per association edge during every descent.

use crate::clock::Clock;
use crate::config::CascadeConfig;

pub mod diff;
pub mod ident;
pub mod merge;
pub mod tombstone;

/// Textual format of a timestamp-kind tombstone stamp (`YYYY/MM/dd HH:mm:ss`).
///
/// This is the only bit-exact external contract the cascade owns.
pub const STAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One cascade operation bound to an immutable configuration and a clock.
///
/// Borrowed, not owned: the configuration outlives the operation and the
/// clock capability is threaded in explicitly so stamping stays
/// deterministic under test.
pub struct Cascade<'a, C: Clock> {
    config: &'a CascadeConfig,
    clock: &'a C,
}

impl<'a, C: Clock> Cascade<'a, C> {
    /// Binds a cascade operation to `config` and `clock`.
    pub fn new(config: &'a CascadeConfig, clock: &'a C) -> Self {
        Self { config, clock }
    }

    pub(crate) fn config(&self) -> &CascadeConfig {
        self.config
    }

    pub(crate) fn clock(&self) -> &C {
        self.clock
    }
}
