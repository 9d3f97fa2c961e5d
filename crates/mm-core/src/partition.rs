//! Label → members partition produced by either classifier path.

use crate::id::NodeId;
use crate::model::Node;
use crate::store::NodeStore;
use std::collections::{HashMap, HashSet};

/// Ordered mapping from label to member ids.
///
/// Labels keep first-seen order. A node belongs to at most one label:
/// the first label that claims it keeps it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    groups: Vec<(String, Vec<NodeId>)>,
    index: HashMap<String, usize>,
    claimed: HashSet<NodeId>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` under `label`. Returns `false` if the node was already claimed.
    pub fn push(&mut self, label: &str, id: NodeId) -> bool {
        if !self.claimed.insert(id) {
            return false;
        }
        let slot = match self.index.get(label) {
            Some(&slot) => slot,
            None => {
                self.groups.push((label.to_string(), Vec::new()));
                self.index.insert(label.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.push(id);
        true
    }

    /// Build from `(id, label)` pairs, in order.
    pub fn from_labels<'a>(pairs: impl IntoIterator<Item = (NodeId, &'a str)>) -> Self {
        let mut partition = Self::new();
        for (id, label) in pairs {
            partition.push(label, id);
        }
        partition
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.groups.iter().map(|(l, ids)| (l.as_str(), ids.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(l, _)| l.as_str())
    }

    pub fn members(&self, label: &str) -> Option<&[NodeId]> {
        self.index.get(label).map(|&i| self.groups[i].1.as_slice())
    }

    pub fn label_of(&self, id: NodeId) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(l, _)| l.as_str())
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.claimed.len()
    }

    /// Drop members that are gone from the store or no longer placed,
    /// then drop labels left without members.
    pub fn retain_placed(&self, store: &NodeStore) -> Self {
        let live = |id: NodeId| store.get(id).is_some_and(Node::is_placed);
        let mut pruned = Self::new();
        for (label, ids) in &self.groups {
            for id in ids.iter().filter(|id| live(**id)) {
                pruned.push(label, *id);
            }
        }
        let dropped = self.member_count() - pruned.member_count();
        if dropped > 0 {
            log::debug!("partition: dropped {dropped} stale member(s)");
        }
        pruned
    }
}
