// tree.rs
//
// Input tree model and its flattened index.
//
// - TreeNode is what the model hands us (name, details, children).
// - NodeId is derived from the node's position: root "0", its second child
//   "0.1", that child's first child "0.1.0". Same position => same id, so
//   identity survives re-parsing the same tree.
// - TreeIndex flattens a validated TreeNode into an arena with parent
//   pointers, in pre-order, for O(1) lookup by id.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One node of the model's tree. Validation and indexing walk it with an
/// explicit stack; the derived impls (clone, compare, drop, serde) still
/// recurse, and JSON input is capped by serde_json's nesting limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Short display label.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self { name: name.into(), details: None, children: None }
    }

    pub fn branch(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self { name: name.into(), details: None, children: Some(children) }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Children as a slice; absent and `null` both read as empty.
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Check the data contract: every node carries a non-blank name. Reports
    /// the first offender in pre-order.
    pub fn validate(&self) -> Result<()> {
        let mut stack = vec![(self, NodeId::root())];
        while let Some((node, id)) = stack.pop() {
            if node.name.trim().is_empty() {
                return Err(EngineError::EmptyName { path: id.to_string() });
            }
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((child, id.child(i)));
            }
        }
        Ok(())
    }
}

/// Path-based node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn root() -> Self {
        NodeId("0".to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        NodeId(format!("{}.{}", self.0, index))
    }

    /// The parent's id, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.0.rfind('.').map(|dot| NodeId(self.0[..dot].to_string()))
    }

    pub fn is_root(&self) -> bool {
        !self.0.contains('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct IndexedNode {
    pub id: NodeId,
    pub name: String,
    pub details: Option<String>,
    pub depth: usize,
    /// Arena slot of the parent.
    pub parent: Option<usize>,
    /// Arena slots of the children, in input order.
    pub children: Vec<usize>,
}

impl IndexedNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Read-only flattened view of one rendered tree.
#[derive(Debug, Clone)]
pub struct TreeIndex {
    nodes: Vec<IndexedNode>,
    by_id: HashMap<NodeId, usize>,
}

impl TreeIndex {
    /// Validate and flatten. Slot 0 is always the root.
    pub fn build(tree: &TreeNode) -> Result<Self> {
        tree.validate()?;

        let mut index = TreeIndex { nodes: Vec::new(), by_id: HashMap::new() };
        let mut stack: Vec<(&TreeNode, NodeId, usize, Option<usize>)> = vec![(tree, NodeId::root(), 0, None)];
        while let Some((node, id, depth, parent)) = stack.pop() {
            let slot = index.nodes.len();
            if index.by_id.insert(id.clone(), slot).is_some() {
                return Err(EngineError::DuplicateIdentity(id.to_string()));
            }
            if let Some(p) = parent {
                index.nodes[p].children.push(slot);
            }
            // reversed so children pop, and get their slots, in input order
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((child, id.child(i), depth + 1, Some(slot)));
            }
            index.nodes.push(IndexedNode {
                id,
                name: node.name.clone(),
                details: node.details.clone(),
                depth,
                parent,
                children: Vec::new(),
            });
        }
        Ok(index)
    }

    pub fn root(&self) -> &IndexedNode {
        &self.nodes[0]
    }

    pub fn node(&self, slot: usize) -> &IndexedNode {
        &self.nodes[slot]
    }

    pub fn slot_of(&self, id: &NodeId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&IndexedNode> {
        self.slot_of(id).map(|slot| &self.nodes[slot])
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::branch(
            "Root",
            vec![
                TreeNode::leaf("A"),
                TreeNode::branch("B", vec![TreeNode::leaf("B1")]).with_details("second"),
            ],
        )
    }

    #[test]
    fn test_node_id_paths() {
        let root = NodeId::root();
        let b1 = root.child(1).child(0);
        assert_eq!(b1.as_str(), "0.1.0");
        assert_eq!(b1.parent(), Some(root.child(1)));
        assert_eq!(root.parent(), None);
        assert!(root.is_root());
        assert!(!b1.is_root());
    }

    #[test]
    fn test_index_is_preorder_with_parents() {
        let index = TreeIndex::build(&sample()).unwrap();
        let names: Vec<&str> = index.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "A", "B", "B1"]);

        let b1 = index.get(&NodeId::from("0.1.0")).unwrap();
        assert_eq!(b1.depth, 2);
        assert_eq!(index.node(b1.parent.unwrap()).name, "B");
        assert_eq!(index.max_depth(), 2);
    }

    #[test]
    fn test_same_tree_same_ids() {
        let a = TreeIndex::build(&sample()).unwrap();
        let b = TreeIndex::build(&sample()).unwrap();
        let ids_a: Vec<&NodeId> = a.iter().map(|n| &n.id).collect();
        let ids_b: Vec<&NodeId> = b.iter().map(|n| &n.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_empty_name_rejected() {
        let tree = TreeNode::branch("Root", vec![TreeNode::leaf("ok"), TreeNode::leaf("  ")]);
        match TreeIndex::build(&tree) {
            Err(EngineError::EmptyName { path }) => assert_eq!(path, "0.1"),
            other => panic!("Expected EmptyName, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_chain_indexes_without_recursion() {
        let mut tree = TreeNode::leaf("bottom");
        for depth in (0..2000).rev() {
            tree = TreeNode::branch(format!("n{}", depth), vec![tree]);
        }
        let index = TreeIndex::build(&tree).unwrap();
        assert_eq!(index.len(), 2001);
        assert_eq!(index.max_depth(), 2000);
        let last = index.node(2000);
        assert_eq!(last.name, "bottom");
        assert_eq!(last.parent, Some(1999));
        assert_eq!(index.node(1999).children, vec![2000]);
    }

    #[test]
    fn test_children_keep_input_order() {
        let tree = TreeNode::branch(
            "Root",
            vec![TreeNode::branch("A", vec![TreeNode::leaf("A1")]), TreeNode::leaf("B"), TreeNode::leaf("C")],
        );
        let index = TreeIndex::build(&tree).unwrap();
        let names: Vec<&str> = index.root().children.iter().map(|&s| index.node(s).name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(index.get(&NodeId::from("0.2")).unwrap().name, "C");
    }

    #[test]
    fn test_null_children_is_leaf() {
        let node: TreeNode = serde_json::from_str(r#"{"name": "x", "children": null}"#).unwrap();
        assert!(node.is_leaf());
        let node: TreeNode = serde_json::from_str(r#"{"name": "x", "children": []}"#).unwrap();
        assert!(node.is_leaf());
    }
}
