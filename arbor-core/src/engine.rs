// engine.rs
//
// One mounted tree view: ties disclosure, layout, animation, viewport and
// sizing together.
//
// Pipeline on every invalidation (render, effective toggle, resize):
//   disclosure -> layout_tree -> Coordinator::reconcile
// Viewport gestures bypass the pipeline entirely.
//
// `render` is replace-all: a new tree discards every piece of derived state.

use log::{debug, info};

use crate::animation::{Coordinator, ReconcileReport, SampledScene};
use crate::config::EngineConfig;
use crate::disclosure::DisclosureState;
use crate::error::{EngineError, Result};
use crate::layout::{Layout, LayoutConfig, PointF, layout_tree};
use crate::sizing::{Dimensions, ResponsiveSizing};
use crate::tree::{NodeId, TreeIndex, TreeNode};
use crate::viewport::{ViewportController, ViewportTransform, WheelDeltaMode};

/// Per-tree state, dropped wholesale on the next `render`.
#[derive(Debug)]
struct Scene {
    index: TreeIndex,
    disclosure: DisclosureState,
    coordinator: Coordinator,
}

#[derive(Debug)]
pub struct TreeEngine {
    config: EngineConfig,
    sizing: ResponsiveSizing,
    layout_config: LayoutConfig,
    viewport: ViewportController,
    scene: Option<Scene>,
    /// Bumped on every layout pass.
    layout_generation: u64,
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TreeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sizing = ResponsiveSizing::new(&config);
        let layout_config = sizing.current_layout();
        let viewport = ViewportController::new(config.min_scale, config.max_scale);
        Self { config, sizing, layout_config, viewport, scene: None, layout_generation: 0 }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    pub fn has_tree(&self) -> bool {
        self.scene.is_some()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.scene.as_ref().and_then(|s| s.coordinator.current())
    }

    pub fn disclosure(&self) -> Option<&DisclosureState> {
        self.scene.as_ref().map(|s| &s.disclosure)
    }

    /// Visible node ids in pre-order.
    pub fn visible_ids(&self) -> Vec<NodeId> {
        self.scene
            .as_ref()
            .map(|s| s.disclosure.visible_ids(&s.index))
            .unwrap_or_default()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn transform(&self) -> ViewportTransform {
        self.viewport.transform()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.sizing.dimensions()
    }

    /// Show a new tree, discarding all state from the previous one. On error
    /// the engine is left untouched.
    pub fn render(&mut self, tree: &TreeNode, now: f64) -> Result<ReconcileReport> {
        let index = TreeIndex::build(tree)?;
        let disclosure = DisclosureState::initial(&index);
        let mut scene = Scene { index, disclosure, coordinator: Coordinator::new(self.config.transition_ms) };

        let report = self.run_pass(&mut scene, &NodeId::root(), now)?;
        info!("rendered tree with {} nodes", scene.index.len());
        self.scene = Some(scene);
        self.reset_viewport();
        Ok(report)
    }

    /// Node activation (click). Returns `None` when nothing changed: the node
    /// is a leaf, or it is not currently laid out (hidden under a collapsed
    /// ancestor).
    pub fn activate(&mut self, id: &NodeId, now: f64) -> Result<Option<ReconcileReport>> {
        let scene = self.scene.as_ref().ok_or(EngineError::NoTree)?;
        if scene.index.get(id).is_none() {
            return Err(EngineError::UnknownNode(id.to_string()));
        }
        if !scene.coordinator.current().is_some_and(|l| l.contains(id)) {
            debug!("ignoring activation of hidden node {}", id);
            return Ok(None);
        }

        let mut scene = self.scene.take().ok_or(EngineError::NoTree)?;
        let result = match scene.disclosure.toggle(&scene.index, id) {
            Ok(true) => {
                debug!("toggled {} (expanded: {})", id, scene.disclosure.is_expanded(id));
                self.run_pass(&mut scene, id, now).map(Some)
            }
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        };
        self.scene = Some(scene);
        result
    }

    /// Container resize. Returns the reconcile report when the new size was
    /// accepted and a tree is showing.
    pub fn resize(&mut self, width: f64, height: f64, now: f64) -> Result<Option<ReconcileReport>> {
        let Some(change) = self.sizing.observe(width, height) else {
            return Ok(None);
        };
        if change.crossed_breakpoint {
            debug!("breakpoint crossed at width {}", width);
        }
        self.layout_config = change.layout;
        let Some(mut scene) = self.scene.take() else {
            return Ok(None);
        };
        let result = self.run_pass(&mut scene, &NodeId::root(), now);
        self.scene = Some(scene);
        result.map(Some)
    }

    /// Drop finished exits and sample the scene.
    pub fn frame(&mut self, now: f64) -> SampledScene {
        match self.scene.as_mut() {
            Some(scene) => {
                scene.coordinator.tick(now);
                scene.coordinator.sample(now)
            }
            None => SampledScene::default(),
        }
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.scene.as_ref().is_some_and(|s| s.coordinator.is_animating(now))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.viewport.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.viewport.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.viewport.pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f64, mode: WheelDeltaMode, ctrl_key: bool, x: f64, y: f64) {
        self.viewport.wheel(delta_y, mode, ctrl_key, PointF { x, y });
    }

    pub fn pinch(&mut self, previous_distance: f64, distance: f64, x: f64, y: f64) {
        self.viewport.pinch(previous_distance, distance, PointF { x, y });
    }

    fn run_pass(&mut self, scene: &mut Scene, source: &NodeId, now: f64) -> Result<ReconcileReport> {
        let layout = layout_tree(&scene.index, &scene.disclosure, &self.layout_config)?;
        self.layout_generation += 1;
        scene.coordinator.reconcile(layout, &scene.index, &scene.disclosure, source, now)
    }

    fn reset_viewport(&mut self) {
        let root = self
            .layout()
            .and_then(|l| l.position(&NodeId::root()))
            .unwrap_or_default();
        let height = self.sizing.dimensions().map_or(self.config.min_height, |d| d.height);
        self.viewport.center_on(root, self.layout_config.margin_left, height);
    }
}
