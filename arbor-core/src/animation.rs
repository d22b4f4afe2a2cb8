// animation.rs
//
// Enter/update/exit reconciliation between two layout passes.
//
// Every node and link on screen owns one Track keyed by its identity (links
// are keyed by their child node). A new layout pass classifies each track:
// - entering: grows out of the nearest ancestor's previous position, fades in
// - persisting: moves from wherever it is right now to its new position
// - exiting: moves into the interacting node's new position and fades out;
//   it stays in the scene until `tick` sees its transition finished
//
// Transitions always start from the sampled state at `now`, so a pass issued
// mid-animation supersedes the previous one without any queueing.
//
// The coordinator keeps the previous and current layout snapshots side by
// side instead of writing old positions back into the nodes.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::disclosure::DisclosureState;
use crate::error::{EngineError, Result};
use crate::layout::{CubicLink, Layout, PointF, parent_anchor};
use crate::tree::{NodeId, TreeIndex};

pub const DEFAULT_TRANSITION_MS: f64 = 400.0;

/// Cubic in-out easing over `t` in `[0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Entering,
    Persisting,
    Exiting,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct NodeVisual {
    pub position: PointF,
    pub opacity: f64,
}

trait Interpolate: Copy {
    fn interpolate(self, to: Self, t: f64) -> Self;
}

impl Interpolate for NodeVisual {
    fn interpolate(self, to: Self, t: f64) -> Self {
        NodeVisual {
            position: self.position.lerp(to.position, t),
            opacity: self.opacity + (to.opacity - self.opacity) * t,
        }
    }
}

impl Interpolate for CubicLink {
    fn interpolate(self, to: Self, t: f64) -> Self {
        CubicLink {
            start: self.start.lerp(to.start, t),
            c1: self.c1.lerp(to.c1, t),
            c2: self.c2.lerp(to.c2, t),
            end: self.end.lerp(to.end, t),
        }
    }
}

#[derive(Debug, Clone)]
struct Transition<V> {
    from: V,
    to: V,
    start: f64,
}

impl<V: Interpolate> Transition<V> {
    fn progress(&self, now: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / duration).clamp(0.0, 1.0)
    }

    fn sample(&self, now: f64, duration: f64) -> V {
        let t = self.progress(now, duration);
        if t >= 1.0 {
            return self.to;
        }
        self.from.interpolate(self.to, ease_cubic_in_out(t))
    }

    fn finished(&self, now: f64, duration: f64) -> bool {
        self.progress(now, duration) >= 1.0
    }
}

/// What a node card shows, independent of where it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeContent {
    pub name: String,
    pub details: Option<String>,
    pub depth: usize,
    /// Any children at all, visible or not. Drives the expander marker.
    pub has_children: bool,
    pub expanded: bool,
}

impl NodeContent {
    /// Has children that are currently hidden.
    pub fn collapsed(&self) -> bool {
        self.has_children && !self.expanded
    }
}

#[derive(Debug, Clone)]
struct NodeTrack {
    phase: Phase,
    content: NodeContent,
    motion: Transition<NodeVisual>,
}

#[derive(Debug, Clone)]
struct LinkTrack {
    parent: NodeId,
    phase: Phase,
    motion: Transition<CubicLink>,
}

/// Node ids of one reconcile pass, split by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseSets {
    pub entering: Vec<NodeId>,
    pub persisting: Vec<NodeId>,
    pub exiting: Vec<NodeId>,
}

impl PhaseSets {
    fn push(&mut self, phase: Phase, id: NodeId) {
        match phase {
            Phase::Entering => self.entering.push(id),
            Phase::Persisting => self.persisting.push(id),
            Phase::Exiting => self.exiting.push(id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub nodes: PhaseSets,
    /// Links, identified by their child node.
    pub links: PhaseSets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampledNode {
    pub id: NodeId,
    pub phase: Phase,
    pub content: NodeContent,
    pub visual: NodeVisual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampledLink {
    pub parent: NodeId,
    pub child: NodeId,
    pub phase: Phase,
    pub curve: CubicLink,
}

/// Everything on screen at one instant, in paint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledScene {
    pub nodes: Vec<SampledNode>,
    pub links: Vec<SampledLink>,
}

#[derive(Debug, Clone)]
pub struct Coordinator {
    duration: f64,
    previous: Option<Layout>,
    current: Option<Layout>,
    nodes: HashMap<NodeId, NodeTrack>,
    links: HashMap<NodeId, LinkTrack>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION_MS)
    }
}

impl Coordinator {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration: duration_ms.max(0.0),
            previous: None,
            current: None,
            nodes: HashMap::new(),
            links: HashMap::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn current(&self) -> Option<&Layout> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Layout> {
        self.previous.as_ref()
    }

    /// Position of `id` in the pass before the current one.
    pub fn previous_position(&self, id: &NodeId) -> Option<PointF> {
        self.previous.as_ref().and_then(|l| l.position(id))
    }

    pub fn phase_of(&self, id: &NodeId) -> Option<Phase> {
        self.nodes.get(id).map(|t| t.phase)
    }

    /// Diff `layout` against what is on screen and start the transitions.
    /// `source` is the node whose activation caused this pass.
    pub fn reconcile(
        &mut self,
        layout: Layout,
        index: &TreeIndex,
        disclosure: &DisclosureState,
        source: &NodeId,
        now: f64,
    ) -> Result<ReconcileReport> {
        let mut seen = HashSet::with_capacity(layout.len());
        for n in layout.nodes() {
            if !seen.insert(&n.id) {
                return Err(EngineError::DuplicateIdentity(n.id.to_string()));
            }
        }

        let cfg = layout.config().clone();
        let prior = self.current.take();
        let source_new = layout.position(source).unwrap_or_default();
        let source_prior = prior.as_ref().and_then(|l| l.position(source)).unwrap_or(source_new);
        let exit_target = nearest_position(&layout, source).unwrap_or(source_new);

        let mut report = ReconcileReport::default();
        let duration = self.duration;

        for n in layout.nodes() {
            let node = index
                .get(&n.id)
                .ok_or_else(|| EngineError::UnknownNode(n.id.to_string()))?;
            let content = NodeContent {
                name: node.name.clone(),
                details: node.details.clone(),
                depth: node.depth,
                has_children: node.has_children(),
                expanded: disclosure.is_expanded(&n.id),
            };
            let target = NodeVisual { position: n.position, opacity: 1.0 };

            let track = match self.nodes.remove(&n.id) {
                Some(prev) => NodeTrack {
                    phase: Phase::Persisting,
                    content,
                    motion: Transition { from: prev.motion.sample(now, duration), to: target, start: now },
                },
                None => {
                    let origin = entering_origin(prior.as_ref(), &n.id).unwrap_or(source_prior);
                    NodeTrack {
                        phase: Phase::Entering,
                        content,
                        motion: Transition {
                            from: NodeVisual { position: origin, opacity: 0.0 },
                            to: target,
                            start: now,
                        },
                    }
                }
            };
            report.nodes.push(track.phase, n.id.clone());
            self.nodes.insert(n.id.clone(), track);
        }

        for (id, track) in self.nodes.iter_mut() {
            if layout.contains(id) || track.phase == Phase::Exiting {
                continue;
            }
            track.motion = Transition {
                from: track.motion.sample(now, duration),
                to: NodeVisual { position: exit_target, opacity: 0.0 },
                start: now,
            };
            track.phase = Phase::Exiting;
            report.nodes.exiting.push(id.clone());
        }

        let mut live_links = HashSet::with_capacity(layout.links().len());
        for l in layout.links() {
            live_links.insert(l.child.clone());
            let track = match self.links.remove(&l.child) {
                Some(prev) => LinkTrack {
                    parent: l.parent.clone(),
                    phase: Phase::Persisting,
                    motion: Transition { from: prev.motion.sample(now, duration), to: l.curve, start: now },
                },
                None => {
                    let origin = entering_origin(prior.as_ref(), &l.child).unwrap_or(source_prior);
                    LinkTrack {
                        parent: l.parent.clone(),
                        phase: Phase::Entering,
                        motion: Transition {
                            from: CubicLink::collapsed(parent_anchor(&cfg, origin)),
                            to: l.curve,
                            start: now,
                        },
                    }
                }
            };
            report.links.push(track.phase, l.child.clone());
            self.links.insert(l.child.clone(), track);
        }

        let collapse_to = CubicLink::collapsed(parent_anchor(&cfg, exit_target));
        for (child, track) in self.links.iter_mut() {
            if live_links.contains(child) || track.phase == Phase::Exiting {
                continue;
            }
            track.motion = Transition { from: track.motion.sample(now, duration), to: collapse_to, start: now };
            track.phase = Phase::Exiting;
            report.links.exiting.push(child.clone());
        }

        report.nodes.exiting.sort();
        report.links.exiting.sort();
        debug!(
            "reconcile from {}: {} entering, {} persisting, {} exiting",
            source,
            report.nodes.entering.len(),
            report.nodes.persisting.len(),
            report.nodes.exiting.len()
        );

        self.previous = prior;
        self.current = Some(layout);
        Ok(report)
    }

    /// Drop exited elements whose transition has finished. Returns the node
    /// ids removed.
    pub fn tick(&mut self, now: f64) -> Vec<NodeId> {
        let duration = self.duration;
        let mut removed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, t)| t.phase == Phase::Exiting && t.motion.finished(now, duration))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &removed {
            self.nodes.remove(id);
        }
        self.links
            .retain(|_, t| !(t.phase == Phase::Exiting && t.motion.finished(now, duration)));
        removed.sort();
        removed
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.nodes.values().any(|t| !t.motion.finished(now, self.duration))
            || self.links.values().any(|t| !t.motion.finished(now, self.duration))
    }

    /// Sample every element at `now`. Live elements come in layout order,
    /// exiting ones after them.
    pub fn sample(&self, now: f64) -> SampledScene {
        let mut scene = SampledScene::default();
        let Some(layout) = self.current.as_ref() else {
            return scene;
        };

        for n in layout.nodes() {
            if let Some(track) = self.nodes.get(&n.id) {
                scene.nodes.push(self.sample_node(&n.id, track, now));
            }
        }
        let mut exiting: Vec<(&NodeId, &NodeTrack)> =
            self.nodes.iter().filter(|(_, t)| t.phase == Phase::Exiting).collect();
        exiting.sort_by(|a, b| a.0.cmp(b.0));
        for (id, track) in exiting {
            scene.nodes.push(self.sample_node(id, track, now));
        }

        for l in layout.links() {
            if let Some(track) = self.links.get(&l.child) {
                scene.links.push(self.sample_link(&l.child, track, now));
            }
        }
        let mut exiting: Vec<(&NodeId, &LinkTrack)> =
            self.links.iter().filter(|(_, t)| t.phase == Phase::Exiting).collect();
        exiting.sort_by(|a, b| a.0.cmp(b.0));
        for (child, track) in exiting {
            scene.links.push(self.sample_link(child, track, now));
        }

        scene
    }

    fn sample_node(&self, id: &NodeId, track: &NodeTrack, now: f64) -> SampledNode {
        SampledNode {
            id: id.clone(),
            phase: track.phase,
            content: track.content.clone(),
            visual: track.motion.sample(now, self.duration),
        }
    }

    fn sample_link(&self, child: &NodeId, track: &LinkTrack, now: f64) -> SampledLink {
        SampledLink {
            parent: track.parent.clone(),
            child: child.clone(),
            phase: track.phase,
            curve: track.motion.sample(now, self.duration),
        }
    }
}

/// Previous position of the closest strict ancestor of `id` that was laid
/// out in `prior`.
fn entering_origin(prior: Option<&Layout>, id: &NodeId) -> Option<PointF> {
    let prior = prior?;
    let mut cur = id.parent();
    while let Some(ancestor) = cur {
        if let Some(p) = prior.position(&ancestor) {
            return Some(p);
        }
        cur = ancestor.parent();
    }
    None
}

/// Position of `id` in `layout`, or of its closest laid-out ancestor.
fn nearest_position(layout: &Layout, id: &NodeId) -> Option<PointF> {
    let mut cur = Some(id.clone());
    while let Some(candidate) = cur {
        if let Some(p) = layout.position(&candidate) {
            return Some(p);
        }
        cur = candidate.parent();
    }
    None
}
