//! Phased task roadmap returned by the planner model.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::response::parse_model_json;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerPhase {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub tasks: Vec<PlannerTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicPlan {
    pub goal: String,
    pub phases: Vec<PlannerPhase>,
}

impl StrategicPlan {
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    /// Tasks of one priority, in phase order.
    pub fn tasks_with_priority(&self, priority: Priority) -> impl Iterator<Item = &PlannerTask> {
        self.phases
            .iter()
            .flat_map(|p| p.tasks.iter())
            .filter(move |t| t.priority == priority)
    }
}

pub fn parse_plan(text: &str) -> Result<StrategicPlan> {
    let plan: StrategicPlan = parse_model_json(text)?;
    if plan.goal.trim().is_empty() || plan.phases.is_empty() {
        return Err(EngineError::EmptyPlan);
    }
    Ok(plan)
}
