//! Output types for frontend consumption.
//!
//! These structs are serialized to JSON and handed to the page, which paints
//! them as SVG: one card per node, one path per link, and a single group
//! transform for the viewport.

use serde::Serialize;

use crate::animation::{Phase, SampledScene};
use crate::decision::{BinarySolver, DecisionStep, Exchange};
use crate::error::EngineError;
use crate::layout::SizeF;
use crate::plan::{Priority, StrategicPlan};
use crate::viewport::ViewportTransform;

/// A node card at its current animated state.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Left-centre of the card in layout coordinates.
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub depth: usize,
    /// Show the expander marker.
    pub has_children: bool,
    /// Fill the expander marker: children exist but are hidden.
    pub collapsed: bool,
    pub phase: Phase,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkOutput {
    /// Child node id; links are keyed by their child.
    pub id: String,
    pub parent: String,
    /// SVG path data.
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformOutput {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    /// Ready-made value for the SVG `transform` attribute.
    pub svg: String,
}

impl From<ViewportTransform> for TransformOutput {
    fn from(t: ViewportTransform) -> Self {
        Self { translate_x: t.translate_x, translate_y: t.translate_y, scale: t.scale, svg: t.to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl From<&EngineError> for ErrorInfo {
    fn from(e: &EngineError) -> Self {
        Self { message: e.to_string() }
    }
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkOutput>,
    pub card: SizeF,
    pub transform: TransformOutput,
    pub animating: bool,
}

impl FrameOutput {
    pub fn new(scene: SampledScene, card: SizeF, transform: ViewportTransform, animating: bool) -> Self {
        let nodes = scene
            .nodes
            .into_iter()
            .map(|n| NodeOutput {
                id: n.id.to_string(),
                collapsed: n.content.collapsed(),
                name: n.content.name,
                details: n.content.details,
                x: n.visual.position.x,
                y: n.visual.position.y,
                opacity: n.visual.opacity,
                depth: n.content.depth,
                has_children: n.content.has_children,
                phase: n.phase,
            })
            .collect();
        let links = scene
            .links
            .into_iter()
            .map(|l| LinkOutput { id: l.child.to_string(), parent: l.parent.to_string(), path: l.curve.to_svg_path() })
            .collect();
        Self { nodes, links, card, transform: transform.into(), animating }
    }
}

/// Where a yes/no session stands, for the solver panel.
#[derive(Debug, Clone, Serialize)]
pub struct SolverOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<DecisionStep>,
    pub history: Vec<Exchange>,
    pub awaiting_reply: bool,
    pub finished: bool,
}

impl From<&BinarySolver> for SolverOutput {
    fn from(solver: &BinarySolver) -> Self {
        Self {
            current: solver.current().cloned(),
            history: solver.history().to_vec(),
            awaiting_reply: solver.is_awaiting_reply(),
            finished: solver.is_finished(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// A parsed plan plus the counts the roadmap header shows.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    #[serde(flatten)]
    pub plan: StrategicPlan,
    pub task_count: usize,
    pub priorities: PriorityCounts,
}

impl From<StrategicPlan> for PlanOutput {
    fn from(plan: StrategicPlan) -> Self {
        let priorities = PriorityCounts {
            high: plan.tasks_with_priority(Priority::High).count(),
            medium: plan.tasks_with_priority(Priority::Medium).count(),
            low: plan.tasks_with_priority(Priority::Low).count(),
        };
        Self { task_count: plan.task_count(), priorities, plan }
    }
}

/// Wrapper for fallible JSON results: exactly one of `value`/`error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T: Serialize> From<crate::error::Result<T>> for ParseOutput<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(value) => Self { value: Some(value), error: None },
            Err(e) => Self { value: None, error: Some(ErrorInfo::from(&e)) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TreeEngine;
    use crate::tree::{NodeId, TreeNode};

    #[test]
    fn test_frame_json_shape() {
        let mut engine = TreeEngine::default();
        let tree = TreeNode::branch("Root", vec![TreeNode::leaf("A").with_details("more")]);
        engine.render(&tree, 0.0).unwrap();
        let card = engine.layout_config().card_size();
        let frame = FrameOutput::new(engine.frame(400.0), card, engine.transform(), false);
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["nodes"][0]["id"], "0");
        assert_eq!(json["nodes"][0]["collapsed"], false);
        assert_eq!(json["nodes"][1]["details"], "more");
        assert_eq!(json["nodes"][1]["phase"], "entering");
        assert!(json["nodes"][0].get("details").is_none());
        assert_eq!(json["links"][0]["id"], NodeId::from("0.0").as_str());
        assert_eq!(json["links"][0]["path"], "M260,0C300,0 300,0 340,0");
        assert_eq!(json["card"]["w"], 260.0);
        assert_eq!(json["transform"]["svg"], "translate(120,300) scale(1)");
    }

    #[test]
    fn test_plan_output_counts() {
        let text = r#"{"goal": "Move abroad", "phases": [
            {"title": "Prepare", "tasks": [
                {"name": "Visa", "description": "Apply", "priority": "High"},
                {"name": "Boxes", "description": "Pack", "priority": "Low"}
            ]},
            {"title": "Arrive", "tasks": [
                {"name": "Bank", "description": "Open account", "priority": "High"}
            ]}
        ]}"#;
        let out = PlanOutput::from(crate::plan::parse_plan(text).unwrap());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["goal"], "Move abroad");
        assert_eq!(json["task_count"], 3);
        assert_eq!(json["priorities"]["high"], 2);
        assert_eq!(json["priorities"]["medium"], 0);
        assert_eq!(json["phases"][0]["tasks"][1]["priority"], "Low");
    }

    #[test]
    fn test_solver_output_tracks_session() {
        use crate::decision::{Answer, StepKind};

        let mut solver = BinarySolver::new();
        let json = serde_json::to_value(SolverOutput::from(&solver)).unwrap();
        assert!(json.get("current").is_none());

        solver.begin(DecisionStep { kind: StepKind::Question, content: "Is it urgent?".to_string() });
        solver.answer(Answer::Yes).unwrap();
        let json = serde_json::to_value(SolverOutput::from(&solver)).unwrap();
        assert_eq!(json["current"]["type"], "question");
        assert_eq!(json["history"][0]["answer"], "Yes");
        assert_eq!(json["awaiting_reply"], true);
        assert_eq!(json["finished"], false);
    }

    #[test]
    fn test_parse_output_error() {
        let out: ParseOutput<u32> = Err(EngineError::EmptyResponse).into();
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"error":{"message":"no response from model"}}"#);
    }
}
