// layout/mod.rs
//
// Tidy left-to-right layouter for the visible part of a decision tree.
//
// Goals:
// - Deterministic: output depends only on (visible set, config)
// - Strict columns: x = depth * (card_width + h_gap)
// - Leaves pack top-to-bottom with a fixed step (card_height + v_gap)
// - Internal nodes sit at the average y of their visible children
// - No two cards overlap, whatever the subtree asymmetry
// - Root ends up at y = 0 so the viewport can centre on it
//
// Submodules:
// - link: cubic link geometry and anchors
//
// Output:
// - Layout with node positions (pre-order), parent->child links, and an
//   id index for the animation coordinator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::disclosure::DisclosureState;
use crate::error::{EngineError, Result};
use crate::tree::{NodeId, TreeIndex};

mod link;

pub use link::{CubicLink, link_between, parent_anchor};

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn lerp(self, to: PointF, t: f64) -> PointF {
        PointF {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SizeF {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectF {
    pub fn right(&self) -> f64 { self.x + self.w }
    pub fn bottom(&self) -> f64 { self.y + self.h }

    pub fn overlaps(&self, other: &RectF) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Where links attach to the parent: the right edge of its card, or the node
/// point itself for the card-less rendering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAnchor {
    #[default]
    Card,
    Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub card_width: f64,
    pub card_height: f64,
    /// Gap between depth columns.
    pub h_gap: f64,
    /// Gap between neighbouring cards in a column.
    pub v_gap: f64,
    /// Left margin used by the initial viewport transform.
    pub margin_left: f64,
    #[serde(default)]
    pub link_anchor: LinkAnchor,
}

impl LayoutConfig {
    pub fn wide() -> Self {
        Self {
            card_width: 260.0,
            card_height: 140.0,
            h_gap: 80.0,
            v_gap: 40.0,
            margin_left: 120.0,
            link_anchor: LinkAnchor::Card,
        }
    }

    /// Preset for narrow containers.
    pub fn compact() -> Self {
        Self {
            card_width: 180.0,
            card_height: 100.0,
            h_gap: 40.0,
            v_gap: 20.0,
            margin_left: 60.0,
            link_anchor: LinkAnchor::Card,
        }
    }

    pub fn level_step(&self) -> f64 {
        self.card_width + self.h_gap
    }

    pub fn sibling_step(&self) -> f64 {
        self.card_height + self.v_gap
    }

    pub fn card_size(&self) -> SizeF {
        SizeF { w: self.card_width, h: self.card_height }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::wide()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub depth: usize,
    /// Left-centre of the card.
    pub position: PointF,
    pub parent: Option<NodeId>,
}

impl LayoutNode {
    /// Card box in layout coordinates.
    pub fn bounds(&self, cfg: &LayoutConfig) -> RectF {
        RectF {
            x: self.position.x,
            y: self.position.y - cfg.card_height / 2.0,
            w: cfg.card_width,
            h: cfg.card_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutLink {
    pub parent: NodeId,
    pub child: NodeId,
    pub curve: CubicLink,
}

/// One immutable layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    nodes: Vec<LayoutNode>,
    links: Vec<LayoutLink>,
    by_id: HashMap<NodeId, usize>,
    config: LayoutConfig,
}

impl Layout {
    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[LayoutLink] {
        &self.links
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn get(&self, id: &NodeId) -> Option<&LayoutNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn position(&self, id: &NodeId) -> Option<PointF> {
        self.get(id).map(|n| n.position)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub fn layout_tree(index: &TreeIndex, disclosure: &DisclosureState, cfg: &LayoutConfig) -> Result<Layout> {
    let visible = disclosure.visible_set(index);

    let ys = place_sibling_axis(index, disclosure, &visible, cfg.sibling_step());

    let root_y = ys.get(&0).copied().unwrap_or(0.0);

    let mut nodes = Vec::with_capacity(visible.len());
    let mut by_id = HashMap::with_capacity(visible.len());
    for slot in visible {
        let n = index.node(slot);
        let y = ys.get(&slot).copied().unwrap_or(0.0) - root_y;
        let position = PointF { x: n.depth as f64 * cfg.level_step(), y };
        if by_id.insert(n.id.clone(), nodes.len()).is_some() {
            return Err(EngineError::DuplicateIdentity(n.id.to_string()));
        }
        nodes.push(LayoutNode {
            id: n.id.clone(),
            depth: n.depth,
            position,
            parent: n.parent.map(|p| index.node(p).id.clone()),
        });
    }

    let links = nodes
        .iter()
        .filter_map(|child| {
            let parent_id = child.parent.as_ref()?;
            let parent = &nodes[*by_id.get(parent_id)?];
            Some(LayoutLink {
                parent: parent_id.clone(),
                child: child.id.clone(),
                curve: link_between(cfg, parent.position, child.position),
            })
        })
        .collect();

    Ok(Layout { nodes, links, by_id, config: cfg.clone() })
}

/// Raw (un-normalized) sibling-axis coordinate of every visible slot.
///
/// Leaves, and collapsed branches, take the next free slot in pre-order.
/// Expanded branches sit at the mean of their children; walking `visible`
/// backwards reaches every child before its parent.
fn place_sibling_axis(
    index: &TreeIndex,
    disclosure: &DisclosureState,
    visible: &[usize],
    step: f64,
) -> HashMap<usize, f64> {
    let opens = |slot: usize| {
        let node = index.node(slot);
        node.has_children() && disclosure.is_expanded(&node.id)
    };

    let mut ys: HashMap<usize, f64> = HashMap::with_capacity(visible.len());
    let mut next_leaf = 0.0;
    for &slot in visible {
        if !opens(slot) {
            ys.insert(slot, next_leaf);
            next_leaf += step;
        }
    }
    for &slot in visible.iter().rev() {
        if opens(slot) {
            let children = &index.node(slot).children;
            let sum: f64 = children.iter().map(|c| ys.get(c).copied().unwrap_or(0.0)).sum();
            ys.insert(slot, sum / children.len() as f64);
        }
    }
    ys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;
    use proptest::prelude::*;

    fn scenario_tree() -> TreeNode {
        TreeNode::branch(
            "Root",
            vec![TreeNode::leaf("A"), TreeNode::branch("B", vec![TreeNode::leaf("B1")])],
        )
    }

    fn expand_all(index: &TreeIndex, state: &mut DisclosureState) {
        let ids: Vec<NodeId> = index
            .iter()
            .filter(|n| n.has_children() && !state.is_expanded(&n.id))
            .map(|n| n.id.clone())
            .collect();
        for id in ids {
            state.toggle(index, &id).unwrap();
        }
    }

    #[test]
    fn test_initial_layout_positions() {
        let index = TreeIndex::build(&scenario_tree()).unwrap();
        let state = DisclosureState::initial(&index);
        let cfg = LayoutConfig::wide();
        let layout = layout_tree(&index, &state, &cfg).unwrap();

        assert_eq!(layout.len(), 3);
        // A at 0, B at 180 -> root at 90, normalized to 0
        assert_eq!(layout.position(&NodeId::root()), Some(PointF { x: 0.0, y: 0.0 }));
        assert_eq!(layout.position(&NodeId::from("0.0")), Some(PointF { x: 340.0, y: -90.0 }));
        assert_eq!(layout.position(&NodeId::from("0.1")), Some(PointF { x: 340.0, y: 90.0 }));
        assert_eq!(layout.links().len(), 2);
    }

    #[test]
    fn test_deep_chain_lays_out_flat() {
        let mut tree = TreeNode::leaf("bottom");
        for depth in (0..2000).rev() {
            tree = TreeNode::branch(format!("n{}", depth), vec![tree]);
        }
        let index = TreeIndex::build(&tree).unwrap();
        let mut state = DisclosureState::initial(&index);
        expand_all(&index, &mut state);
        let cfg = LayoutConfig::compact();
        let layout = layout_tree(&index, &state, &cfg).unwrap();
        assert_eq!(layout.len(), 2001);
        assert!(layout.nodes().iter().all(|n| n.position.y == 0.0));
        assert_eq!(layout.nodes()[2000].position.x, 2000.0 * cfg.level_step());
    }

    #[test]
    fn test_link_leaves_parent_right_edge() {
        let index = TreeIndex::build(&scenario_tree()).unwrap();
        let state = DisclosureState::initial(&index);
        let cfg = LayoutConfig::wide();
        let layout = layout_tree(&index, &state, &cfg).unwrap();
        let link = layout.links().iter().find(|l| l.child == NodeId::from("0.1")).unwrap();
        assert_eq!(link.curve.start, PointF { x: 260.0, y: 0.0 });
        assert_eq!(link.curve.end, PointF { x: 340.0, y: 90.0 });
        assert_eq!(link.curve.c1.x, 300.0);
    }

    #[test]
    fn test_expanded_parent_centres_over_children() {
        let tree = TreeNode::branch(
            "Root",
            vec![TreeNode::branch("A", vec![TreeNode::leaf("A1"), TreeNode::leaf("A2"), TreeNode::leaf("A3")])],
        );
        let index = TreeIndex::build(&tree).unwrap();
        let mut state = DisclosureState::initial(&index);
        state.toggle(&index, &NodeId::from("0.0")).unwrap();
        let layout = layout_tree(&index, &state, &LayoutConfig::compact()).unwrap();
        let a = layout.position(&NodeId::from("0.0")).unwrap();
        let a2 = layout.position(&NodeId::from("0.0.1")).unwrap();
        assert_eq!(a.y, a2.y);
        assert_eq!(a.y, 0.0);
        assert_eq!(layout.position(&NodeId::from("0.0.0")).unwrap().y, -120.0);
    }

    #[test]
    fn test_collapsed_node_packs_like_leaf() {
        let index = TreeIndex::build(&scenario_tree()).unwrap();
        let state = DisclosureState::initial(&index);
        let layout = layout_tree(&index, &state, &LayoutConfig::wide()).unwrap();
        assert!(!layout.contains(&NodeId::from("0.1.0")));
    }

    #[test]
    fn test_compact_config_changes_positions() {
        let index = TreeIndex::build(&scenario_tree()).unwrap();
        let state = DisclosureState::initial(&index);
        let wide = layout_tree(&index, &state, &LayoutConfig::wide()).unwrap();
        let compact = layout_tree(&index, &state, &LayoutConfig::compact()).unwrap();
        let id = NodeId::from("0.1");
        assert_eq!(compact.position(&id), Some(PointF { x: 220.0, y: 60.0 }));
        assert_ne!(wide.position(&id), compact.position(&id));
    }

    fn arb_tree() -> impl Strategy<Value = TreeNode> {
        let leaf = "[a-z]{1,6}".prop_map(|name| TreeNode::leaf(name));
        leaf.prop_recursive(5, 64, 4, |inner| {
            ("[a-z]{1,6}", prop::collection::vec(inner, 0..4))
                .prop_map(|(name, children)| TreeNode::branch(name, children))
        })
    }

    proptest! {
        #[test]
        fn no_two_cards_overlap(tree in arb_tree(), compact in any::<bool>()) {
            let index = TreeIndex::build(&tree).unwrap();
            let mut state = DisclosureState::initial(&index);
            expand_all(&index, &mut state);
            let cfg = if compact { LayoutConfig::compact() } else { LayoutConfig::wide() };
            let layout = layout_tree(&index, &state, &cfg).unwrap();
            let nodes = layout.nodes();
            for (i, a) in nodes.iter().enumerate() {
                for b in &nodes[i + 1..] {
                    prop_assert!(!a.bounds(&cfg).overlaps(&b.bounds(&cfg)),
                        "{} overlaps {}", a.id, b.id);
                    if a.depth == b.depth {
                        prop_assert!((a.position.y - b.position.y).abs() >= cfg.sibling_step() - 1e-6);
                    }
                }
            }
        }

        #[test]
        fn depth_axis_is_column_of_depth(tree in arb_tree()) {
            let index = TreeIndex::build(&tree).unwrap();
            let mut state = DisclosureState::initial(&index);
            expand_all(&index, &mut state);
            let cfg = LayoutConfig::wide();
            let layout = layout_tree(&index, &state, &cfg).unwrap();
            for n in layout.nodes() {
                prop_assert_eq!(n.position.x, n.depth as f64 * (cfg.card_width + cfg.h_gap));
            }
        }

        #[test]
        fn toggle_twice_restores_layout(tree in arb_tree(), pick in any::<prop::sample::Index>()) {
            let index = TreeIndex::build(&tree).unwrap();
            let mut state = DisclosureState::initial(&index);
            let cfg = LayoutConfig::wide();
            let before = layout_tree(&index, &state, &cfg).unwrap();
            let id = index.node(pick.index(index.len())).id.clone();
            state.toggle(&index, &id).unwrap();
            state.toggle(&index, &id).unwrap();
            let after = layout_tree(&index, &state, &cfg).unwrap();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn layout_is_deterministic(tree in arb_tree()) {
            let index = TreeIndex::build(&tree).unwrap();
            let state = DisclosureState::initial(&index);
            let cfg = LayoutConfig::compact();
            prop_assert_eq!(
                layout_tree(&index, &state, &cfg).unwrap(),
                layout_tree(&index, &state, &cfg).unwrap()
            );
        }
    }
}
