//! # Patch application
//!
//! Walks a new and an old tree in lock-step against the live host tree and issues
//! the host mutations needed to make the host match the new tree.
//!
//! For one position the cases are evaluated in this order:
//!
//! 1. nothing old, something new: build the new subtree and insert it
//! 2. something old, nothing new: remove the host child
//! 3. the nodes differ locally (type, text, tag, attributes): replace the subtree
//! 4. otherwise recurse into the children through the keyed matcher
//!
//! Every node is visited once, so a pass is linear in the size of the trees.
//! A matched subtree that comes out of step 4 without a single mutation is
//! counted once in [`ReconcileStats::unchanged`]; deeply equal subtrees
//! therefore never touch the host.
//!
//! Children are aligned with [`match_children`]. Unmatched old children are
//! removed first (by handle, so indices cannot drift), then each new child is
//! either moved into place and recursed into, or created at its new index. The
//! host's child order therefore always ends up equal to the new tree's.

use crate::diff::node_changed;
use crate::error::{HostError, ReconcileError, VdomResult};
use crate::host::HostAdapter;
use crate::keyed::match_children;
use crate::node::Node;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::{debug, instrument};

/// What a reconcile pass did, counted per subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub created: usize,
    pub replaced: usize,
    pub removed: usize,
    pub moved: usize,
    /// Largest matched subtrees that needed no mutation
    pub unchanged: usize,
}

impl ReconcileStats {
    /// True if the pass touched the host at all
    pub fn has_mutations(&self) -> bool {
        self.created + self.replaced + self.removed + self.moved > 0
    }
}

impl AddAssign for ReconcileStats {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.replaced += other.replaced;
        self.removed += other.removed;
        self.moved += other.moved;
        self.unchanged += other.unchanged;
    }
}

/// Make `parent`'s child at `index` match `new`, given that it currently
/// reflects `old`.
#[instrument(level = "debug", skip_all, fields(index = index))]
pub fn reconcile<H: HostAdapter>(
    host: &mut H,
    parent: &H::Handle,
    new: Option<&Node>,
    old: Option<&Node>,
    index: usize,
) -> VdomResult<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    patch(host, parent, new, old, index, &mut stats)?;
    debug!(?stats, "Reconcile pass complete");
    Ok(stats)
}

fn patch<H: HostAdapter>(
    host: &mut H,
    parent: &H::Handle,
    new: Option<&Node>,
    old: Option<&Node>,
    index: usize,
    stats: &mut ReconcileStats,
) -> VdomResult<()> {
    match (new, old) {
        (None, None) => Ok(()),

        (Some(new_node), None) => {
            let handle = host.create_node(new_node).map_err(|e| structural(e, index))?;
            host.insert_child(parent, handle, index)
                .map_err(|e| structural(e, index))?;
            debug!(index, size = new_node.size(), "Created subtree");
            stats.created += 1;
            Ok(())
        }

        (None, Some(_)) => {
            let existing = existing_child(host, parent, index)?;
            host.remove_child(parent, &existing)
                .map_err(|e| structural(e, index))?;
            debug!(index, "Removed subtree");
            stats.removed += 1;
            Ok(())
        }

        (Some(new_node), Some(old_node)) => {
            if node_changed(new_node, old_node) {
                let existing = existing_child(host, parent, index)?;
                let handle = host.create_node(new_node).map_err(|e| structural(e, index))?;
                host.replace_child(parent, &existing, handle)
                    .map_err(|e| structural(e, index))?;
                debug!(index, tag = ?new_node.tag(), "Replaced subtree");
                stats.replaced += 1;
                return Ok(());
            }

            let existing = existing_child(host, parent, index)?;
            let mut inner = ReconcileStats::default();
            patch_children(
                host,
                &existing,
                new_node.children(),
                old_node.children(),
                &mut inner,
            )?;

            if inner.has_mutations() {
                *stats += inner;
            } else {
                stats.unchanged += 1;
            }
            Ok(())
        }
    }
}

fn patch_children<H: HostAdapter>(
    host: &mut H,
    parent: &H::Handle,
    new: &[Node],
    old: &[Node],
    stats: &mut ReconcileStats,
) -> VdomResult<()> {
    let plan = match_children(new, old);

    let old_handles = (0..old.len())
        .map(|i| existing_child(host, parent, i))
        .collect::<VdomResult<Vec<_>>>()?;

    for &old_index in plan.removals.iter().rev() {
        host.remove_child(parent, &old_handles[old_index])
            .map_err(|e| structural(e, old_index))?;
        debug!(old_index, "Removed unmatched child");
        stats.removed += 1;
    }

    for pair in &plan.pairs {
        let new_child = &new[pair.new_index];
        match pair.old_index {
            Some(old_index) => {
                let handle = &old_handles[old_index];
                if host.child_at(parent, pair.new_index).as_ref() != Some(handle) {
                    host.move_child(parent, handle, pair.new_index)
                        .map_err(|e| structural(e, pair.new_index))?;
                    debug!(from = old_index, to = pair.new_index, "Moved keyed child");
                    stats.moved += 1;
                }
                patch(
                    host,
                    parent,
                    Some(new_child),
                    Some(&old[old_index]),
                    pair.new_index,
                    stats,
                )?;
            }
            None => patch(host, parent, Some(new_child), None, pair.new_index, stats)?,
        }
    }

    Ok(())
}

fn existing_child<H: HostAdapter>(
    host: &H,
    parent: &H::Handle,
    index: usize,
) -> VdomResult<H::Handle> {
    host.child_at(parent, index)
        .ok_or_else(|| ReconcileError::StructuralMismatch {
            index,
            reason: "expected a host child but found none".to_string(),
        })
}

fn structural(err: HostError, index: usize) -> ReconcileError {
    match err {
        HostError::IndexOutOfBounds { .. } | HostError::NotAChild { .. } => {
            ReconcileError::StructuralMismatch {
                index,
                reason: err.to_string(),
            }
        }
        other => ReconcileError::Host(other),
    }
}
