//! Cascade service facade.
//!
//! # Responsibility
//! - Expose the one externally-triggered operation: augment a contextual
//!   aggregate with tombstones right before the caller writes it.
//!
//! # Invariants
//! - The contextual tree is mutated in place; the caller owns it exclusively
//!   for the duration of the save.
//! - No signal distinguishes "nothing tombstoned" from "something
//!   tombstoned"; callers needing that must diff before/after themselves.

use crate::cascade::Cascade;
use crate::clock::{Clock, SystemClock};
use crate::config::CascadeConfig;
use crate::model::record::{Record, Scalar};
use crate::repo::snapshot_repo::{SnapshotRepoError, SnapshotRepository};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from the before-save cascade operation.
#[derive(Debug)]
pub enum CascadeServiceError {
    /// The contextual aggregate claims an identifier that has no persisted
    /// snapshot.
    SnapshotMissing(Scalar),
    /// Snapshot loading failed; the save must abort untouched.
    Repo(SnapshotRepoError),
}

impl Display for CascadeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SnapshotMissing(id) => {
                write!(f, "persistent snapshot not found for identifier {id:?}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CascadeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SnapshotMissing(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SnapshotRepoError> for CascadeServiceError {
    fn from(value: SnapshotRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Service facade binding a snapshot repository, a resolved configuration,
/// and a clock.
pub struct CascadeService<R: SnapshotRepository, C: Clock = SystemClock> {
    repo: R,
    config: CascadeConfig,
    clock: C,
}

impl<R: SnapshotRepository> CascadeService<R, SystemClock> {
    /// Creates a service using the wall clock.
    pub fn new(repo: R, config: CascadeConfig) -> Self {
        Self::with_clock(repo, config, SystemClock)
    }
}

impl<R: SnapshotRepository, C: Clock> CascadeService<R, C> {
    /// Creates a service with an explicit clock capability.
    pub fn with_clock(repo: R, config: CascadeConfig, clock: C) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    /// Returns the resolved configuration driving this service.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Augments `contextual` with tombstones for every persisted descendant
    /// the caller removed, right before the caller writes it.
    ///
    /// No-op when `contextual` has never been persisted (nothing to diff
    /// against).
    ///
    /// # Errors
    /// - `SnapshotMissing` when the identifier has no stored row.
    /// - `Repo` when the snapshot load fails; propagated unmodified so the
    ///   caller aborts the save.
    pub fn before_save(&self, contextual: &mut Record) -> Result<(), CascadeServiceError> {
        let Some(id) = contextual.identifier().cloned() else {
            debug!("event=cascade_before_save module=service status=skip reason=new_aggregate");
            return Ok(());
        };

        let persistent = self
            .repo
            .load_snapshot(&id, self.config.contain())?
            .ok_or_else(|| CascadeServiceError::SnapshotMissing(id.clone()))?;

        let cascade = Cascade::new(&self.config, &self.clock);
        let patch = cascade.generate_patch(&persistent, contextual);
        cascade.apply_patch(contextual, &patch);

        info!("event=cascade_before_save module=service status=ok id={id:?}");
        Ok(())
    }
}
