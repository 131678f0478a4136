//! Cascading soft-delete for tree-shaped persisted aggregates.
//!
//! When a modified aggregate is about to be saved, descendants present in
//! the stored version but missing from the in-memory version are stamped
//! with a deletion flag and folded back into the save graph instead of being
//! physically removed.

pub mod cascade;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use cascade::{ident::position_by_id, Cascade, STAMP_FORMAT};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CascadeConfig, ConfigError, FlagKind, RawCascadeConfig, DEFAULT_FLAG_FIELD};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, Scalar, Value, ID_FIELD};
pub use repo::snapshot_repo::{
    AggregateBinding, AssociationBinding, AssociationKind, SnapshotRepoError, SnapshotRepository,
    SnapshotResult, SqliteSnapshotRepository,
};
pub use schema::{
    FieldKind, SchemaError, SchemaIntrospector, SqliteSchemaIntrospector, StaticSchema,
};
pub use service::cascade_service::{CascadeService, CascadeServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
