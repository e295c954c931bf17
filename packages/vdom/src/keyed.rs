//! Keyed child matching.
//!
//! Children are identified by their explicit `key` attribute when present and by
//! their position otherwise. Explicit and positional keys live in separate
//! namespaces, so `key=0` never matches "the first unkeyed child".

use crate::node::{Key, Node};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Identity of a child within its sibling list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Explicit(Key),
    Index(usize),
}

impl ChildKey {
    pub fn derive(node: &Node, index: usize) -> Self {
        match node.key() {
            Some(key) => ChildKey::Explicit(key),
            None => ChildKey::Index(index),
        }
    }
}

/// Pairing of one new child with its old counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildPair {
    /// Position in the new list (and target host index)
    pub new_index: usize,
    /// Matched position in the old list
    pub old_index: Option<usize>,
}

/// Result of aligning two child lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildPlan {
    /// One entry per new child, in new order
    pub pairs: Vec<ChildPair>,
    /// Old indices with no counterpart in the new list, ascending
    pub removals: Vec<usize>,
}

/// Align `new` against `old` by derived key
pub fn match_children(new: &[Node], old: &[Node]) -> ChildPlan {
    let mut lookup: HashMap<ChildKey, usize> = HashMap::with_capacity(old.len());
    for (index, child) in old.iter().enumerate() {
        let key = ChildKey::derive(child, index);
        if lookup.contains_key(&key) {
            warn!(key = ?key, index, "Duplicate child key in previous children - later occurrence left unmatched");
            continue;
        }
        lookup.insert(key, index);
    }

    let mut claimed: HashSet<usize> = HashSet::with_capacity(new.len());
    let mut pairs = Vec::with_capacity(new.len());
    for (new_index, child) in new.iter().enumerate() {
        let key = ChildKey::derive(child, new_index);
        let old_index = lookup.get(&key).copied().filter(|old| claimed.insert(*old));
        if old_index.is_none() && matches!(key, ChildKey::Explicit(_)) && lookup.contains_key(&key) {
            warn!(key = ?key, new_index, "Duplicate child key in new children - creating a fresh node");
        }
        pairs.push(ChildPair {
            new_index,
            old_index,
        });
    }

    let removals = (0..old.len())
        .filter(|index| !claimed.contains(index))
        .collect();

    ChildPlan { pairs, removals }
}
