// disclosure.rs
//
// Expanded/collapsed state per node.
//
// - Only nodes with children carry a flag; leaves are never expandable.
// - A node's children are visible iff the node is visible and expanded.
// - The root is always visible.
// - Collapsing keeps descendant flags, so expanding again restores the
//   exact subtree that was showing before.

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::tree::{NodeId, TreeIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureState {
    expanded: HashMap<NodeId, bool>,
}

impl DisclosureState {
    /// First-load state: root expanded, everything below it collapsed.
    pub fn initial(index: &TreeIndex) -> Self {
        let expanded = index
            .iter()
            .filter(|n| n.has_children())
            .map(|n| (n.id.clone(), n.parent.is_none()))
            .collect();
        Self { expanded }
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    /// Flip a node's flag. Returns `Ok(false)` for leaves, which have nothing
    /// to disclose.
    pub fn toggle(&mut self, index: &TreeIndex, id: &NodeId) -> Result<bool> {
        let node = index
            .get(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        if !node.has_children() {
            return Ok(false);
        }
        let flag = self.expanded.entry(id.clone()).or_insert(false);
        *flag = !*flag;
        Ok(true)
    }

    /// Arena slots of the visible nodes, in pre-order.
    pub fn visible_set(&self, index: &TreeIndex) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(slot) = stack.pop() {
            out.push(slot);
            let node = index.node(slot);
            if self.is_expanded(&node.id) {
                // reversed so the first child pops first
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Visible ids, pre-order.
    pub fn visible_ids(&self, index: &TreeIndex) -> Vec<NodeId> {
        self.visible_set(index)
            .into_iter()
            .map(|slot| index.node(slot).id.clone())
            .collect()
    }
}
