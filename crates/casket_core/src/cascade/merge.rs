//! Patch merger: folds tombstoned subtrees back into the contextual tree.
//!
//! # Responsibility
//! - Mutate the caller-owned contextual snapshot in place so the subsequent
//!   write persists the tombstones.
//!
//! # Invariants
//! - The merge only adds: fields present in contextual and untouched by the
//!   patch keep their values, and a mismatched non-null contextual slot is
//!   never overwritten.
//! - Merging the same patch twice is a no-op the second time for every child
//!   that carries an identifier.

use super::{ident, Cascade};
use crate::clock::Clock;
use crate::model::record::{Record, Value};

enum ToOneSlot {
    Insert,
    Recurse,
    Skip,
}

impl<C: Clock> Cascade<'_, C> {
    /// Merges `patch` into `contextual` in place.
    ///
    /// Children present in the patch but missing from contextual (tombstoned
    /// subtrees the contextual graph omitted) are inserted; children present
    /// in both are recursed into.
    pub fn apply_patch(&self, contextual: &mut Record, patch: &Record) {
        for (name, value) in patch.iter() {
            match value {
                Value::Record(patch_sub) => {
                    let slot = match contextual.get(name) {
                        Some(Value::Record(_)) => ToOneSlot::Recurse,
                        Some(existing) if existing.is_present() => ToOneSlot::Skip,
                        _ => ToOneSlot::Insert,
                    };
                    match slot {
                        ToOneSlot::Insert => {
                            contextual.set(name, Value::Record(patch_sub.clone()));
                        }
                        ToOneSlot::Recurse => {
                            if let Some(Value::Record(contextual_sub)) = contextual.get_mut(name) {
                                self.apply_patch(contextual_sub, patch_sub);
                            }
                        }
                        ToOneSlot::Skip => {}
                    }
                }
                Value::Records(patch_children) if !patch_children.is_empty() => {
                    let missing_slot = match contextual.get(name) {
                        Some(Value::Records(_)) => false,
                        // Mismatched non-null slot: refuse to destroy caller
                        // data.
                        Some(existing) if existing.is_present() => continue,
                        _ => true,
                    };
                    if missing_slot {
                        contextual.set(name, Value::Records(Vec::new()));
                    }
                    if let Some(Value::Records(contextual_children)) = contextual.get_mut(name) {
                        for patch_child in patch_children {
                            match ident::position_by_id(
                                patch_child.identifier(),
                                contextual_children,
                            ) {
                                Some(index) => {
                                    self.apply_patch(&mut contextual_children[index], patch_child);
                                }
                                None => contextual_children.push(patch_child.clone()),
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
