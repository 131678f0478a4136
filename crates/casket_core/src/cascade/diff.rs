//! Comparator: persistent-vs-contextual diff and patch generation.
//!
//! # Responsibility
//! - Walk the persistent and contextual trees in lockstep and build the
//!   patch tree on the persistent tree's shape.
//!
//! # Invariants
//! - Sub-patches carry the identifier scalar plus association subtrees only;
//!   scalar payload is never copied into a sub-patch.
//! - Tombstoned subtrees (children missing from contextual) carry their full
//!   field set, stamped by the tombstone stamper.
//! - Fields present only in contextual are ignored: new, unsaved content is
//!   not subject to tombstoning.

use super::{ident, Cascade};
use crate::clock::Clock;
use crate::model::record::{Record, Value, ID_FIELD};

impl<C: Clock> Cascade<'_, C> {
    /// Builds the patch for one persistent/contextual record pair.
    ///
    /// A contextual association slot that is missing, null, or of a
    /// mismatched shape behaves as absent: the persistent subtree is
    /// tombstoned into the patch. A fully scalar record degenerates to an
    /// identifier-only patch.
    pub fn generate_patch(&self, persistent: &Record, contextual: &Record) -> Record {
        let mut patch = Record::new();
        if let Some(id) = persistent.identifier() {
            patch.set(ID_FIELD, Value::Scalar(id.clone()));
        }

        for (name, value) in persistent.iter() {
            match value {
                Value::Record(p_child) => {
                    let sub = match contextual.get(name) {
                        Some(Value::Record(c_child)) => self.generate_patch(p_child, c_child),
                        _ => self.tombstone(p_child, self.config().is_protected(name)),
                    };
                    patch.set(name, Value::Record(sub));
                }
                Value::Records(p_children) => {
                    let c_children: &[Record] = match contextual.get(name) {
                        Some(Value::Records(children)) => children,
                        // Absent or mismatched shape: every persistent child
                        // falls through to tombstone-as-missing.
                        _ => &[],
                    };
                    let protected = self.config().is_protected(name);
                    let mut sub_patches = Vec::with_capacity(p_children.len());
                    for p_child in p_children {
                        match ident::position_by_id(p_child.identifier(), c_children) {
                            Some(index) => {
                                sub_patches.push(self.generate_patch(p_child, &c_children[index]));
                            }
                            None => sub_patches.push(self.tombstone(p_child, protected)),
                        }
                    }
                    patch.set(name, Value::Records(sub_patches));
                }
                Value::Scalar(_) => {}
            }
        }

        patch
    }
}
