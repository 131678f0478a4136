//! Recursive tombstone stamping.
//!
//! # Responsibility
//! - Produce a fully stamped copy of a subtree that is about to re-enter the
//!   save graph as logically deleted.
//!
//! # Invariants
//! - The flag field is stamped only when the edge reaching the record was
//!   not protected; descendants still recurse with their own per-edge
//!   protection status.
//! - A record without the flag field is copied without inventing one.
//! - Opaque date/time leaves pass through untouched.

use super::{Cascade, STAMP_FORMAT};
use crate::clock::Clock;
use crate::config::FlagKind;
use crate::model::record::{Record, Scalar, Value};

impl<C: Clock> Cascade<'_, C> {
    /// Returns a copy of `node` with the deletion flag stamped across every
    /// unprotected record of the subtree.
    pub fn tombstone(&self, node: &Record, protected_edge: bool) -> Record {
        let mut stamped = Record::new();
        for (name, value) in node.iter() {
            match value {
                Value::Record(child) => {
                    let protected = self.config().is_protected(name);
                    stamped.set(name, Value::Record(self.tombstone(child, protected)));
                }
                Value::Records(children) => {
                    let protected = self.config().is_protected(name);
                    let stamped_children = children
                        .iter()
                        .map(|child| self.tombstone(child, protected))
                        .collect::<Vec<_>>();
                    stamped.set(name, Value::Records(stamped_children));
                }
                Value::Scalar(scalar) => {
                    if name == self.config().flag() && !protected_edge {
                        stamped.set(name, Value::Scalar(self.stamp_value()));
                    } else {
                        stamped.set(name, Value::Scalar(scalar.clone()));
                    }
                }
            }
        }
        stamped
    }

    fn stamp_value(&self) -> Scalar {
        match self.config().flag_kind() {
            FlagKind::Boolean => Scalar::Bool(true),
            FlagKind::Timestamp => {
                Scalar::Text(self.clock().now().format(STAMP_FORMAT).to_string())
            }
        }
    }
}
