//! Use-case orchestration above the cascade core.
//!
//! # Responsibility
//! - Wire snapshot loading, diffing, and merging into the single
//!   save-lifecycle entry point.
//!
//! # Invariants
//! - A new (never persisted) aggregate is a no-op; no load is attempted.
//! - A failed load aborts the operation before any diffing happens.

pub mod cascade_service;
