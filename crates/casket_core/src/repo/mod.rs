//! Persistence seam for loading aggregate snapshots.
//!
//! # Responsibility
//! - Define the snapshot-loading contract the cascade service depends on.
//! - Keep SQL and association-materialization details behind the boundary.
//!
//! # Invariants
//! - Loaded snapshots are materialized exactly to the configured traversal
//!   depth; unlisted associations are absent from the tree.
//! - To-many children are returned in deterministic `id ASC` order.

pub mod snapshot_repo;
