//! Turn-by-turn yes/no solver state.
//!
//! The model drives the conversation; this only keeps the transcript
//! straight: which question is open, what was answered, and when a result
//! ends the session.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::response::parse_model_json;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Question,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub content: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Message sent back to the model.
    pub fn as_message(self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub question: String,
    pub answer: Answer,
}

pub fn parse_decision_step(text: &str) -> Result<DecisionStep> {
    parse_model_json(text)
}

#[derive(Debug, Clone, Default)]
pub struct BinarySolver {
    current: Option<DecisionStep>,
    history: Vec<Exchange>,
    awaiting_reply: bool,
}

impl BinarySolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session with the model's first step.
    pub fn begin(&mut self, first: DecisionStep) {
        self.reset();
        self.current = Some(first);
    }

    /// Record an answer to the open question. The caller forwards
    /// `answer.as_message()` to the model and feeds the reply to `advance`.
    pub fn answer(&mut self, answer: Answer) -> Result<&Exchange> {
        let question = match &self.current {
            Some(step) if step.kind == StepKind::Question && !self.awaiting_reply => step.content.clone(),
            _ => return Err(EngineError::NotAwaitingAnswer),
        };
        self.history.push(Exchange { question, answer });
        self.awaiting_reply = true;
        Ok(&self.history[self.history.len() - 1])
    }

    pub fn advance(&mut self, next: DecisionStep) {
        self.current = Some(next);
        self.awaiting_reply = false;
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
        self.awaiting_reply = false;
    }

    pub fn current(&self) -> Option<&DecisionStep> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn is_finished(&self) -> bool {
        matches!(&self.current, Some(step) if step.kind == StepKind::Result)
    }
}
