//! WASM bindings for the arbor-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Structured results cross the boundary as JSON strings.

use log::{Level, LevelFilter, Log, Metadata, Record, error};
use serde::Serialize;
use serde_json::to_string;
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::chat::ChatTranscript;
use crate::config::EngineConfig;
use crate::decision::{self, Answer, BinarySolver};
use crate::engine::TreeEngine;
use crate::error::EngineError;
use crate::output::{FrameOutput, ParseOutput, PlanOutput, SolverOutput, TransformOutput};
use crate::plan;
use crate::response::parse_tree_response;
use crate::tree::NodeId;
use crate::viewport::WheelDeltaMode;

/// `log` backend writing to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug | Level::Trace => console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. `level` is one of error/warn/info/debug/trace;
/// anything else means info. Calling it again only changes the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let filter = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    // already installed on a second call; the level still applies
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
}

fn to_json<T: Serialize>(value: &T) -> String {
    to_string(value).unwrap_or_else(|e| {
        error!("Error serializing output: {}", e);
        "{\"error\": {\"message\": \"serialization error\"}}".to_string()
    })
}

fn js_error(e: EngineError) -> JsValue {
    error!("{}", e);
    JsValue::from_str(&e.to_string())
}

/// A mounted tree view. The page forwards container, pointer and frame
/// events; `frame` returns what to paint.
#[wasm_bindgen]
pub struct TreeView {
    engine: TreeEngine,
}

#[wasm_bindgen]
impl TreeView {
    /// `config_json` may be empty or a partial `EngineConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<TreeView, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(js_error)?;
        Ok(TreeView { engine: TreeEngine::new(config) })
    }

    /// Replace the shown tree with the model's JSON response.
    pub fn render(&mut self, tree_json: &str, now: f64) -> Result<(), JsValue> {
        let tree = parse_tree_response(tree_json).map_err(js_error)?;
        self.engine.render(&tree, now).map_err(js_error)?;
        Ok(())
    }

    /// Node click. Returns whether the tree changed.
    pub fn activate(&mut self, node_id: &str, now: f64) -> Result<bool, JsValue> {
        let changed = self
            .engine
            .activate(&NodeId::from(node_id), now)
            .map_err(js_error)?;
        Ok(changed.is_some())
    }

    /// Container resize. Returns whether a re-layout happened.
    pub fn resize(&mut self, width: f64, height: f64, now: f64) -> Result<bool, JsValue> {
        let relayout = self.engine.resize(width, height, now).map_err(js_error)?;
        Ok(relayout.is_some())
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.engine.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.engine.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    /// `delta_mode` is the DOM `WheelEvent.deltaMode`.
    pub fn wheel(&mut self, delta_y: f64, delta_mode: u32, ctrl_key: bool, x: f64, y: f64) {
        self.engine
            .wheel(delta_y, WheelDeltaMode::from_dom(delta_mode), ctrl_key, x, y);
    }

    pub fn pinch(&mut self, previous_distance: f64, distance: f64, x: f64, y: f64) {
        self.engine.pinch(previous_distance, distance, x, y);
    }

    /// Frame to paint at `now` (the requestAnimationFrame timestamp), as JSON.
    pub fn frame(&mut self, now: f64) -> String {
        let scene = self.engine.frame(now);
        let output = FrameOutput::new(
            scene,
            self.engine.layout_config().card_size(),
            self.engine.transform(),
            self.engine.is_animating(now),
        );
        to_json(&output)
    }

    pub fn transform(&self) -> String {
        to_json(&TransformOutput::from(self.engine.transform()))
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.engine.is_animating(now)
    }
}

/// Parse a planner response. Returns `{"value": plan}` or `{"error": ...}`;
/// the plan carries its task and priority counts.
#[wasm_bindgen]
pub fn parse_plan(text: &str) -> String {
    let result = plan::parse_plan(text).map(PlanOutput::from);
    if let Err(e) = &result {
        error!("Error parsing plan: {}", e);
    }
    to_json(&ParseOutput::from(result))
}

/// Parse one binary-solver step. Same envelope as `parse_plan`.
#[wasm_bindgen]
pub fn parse_decision_step(text: &str) -> String {
    let result = decision::parse_decision_step(text);
    if let Err(e) = &result {
        error!("Error parsing decision step: {}", e);
    }
    to_json(&ParseOutput::from(result))
}

/// Yes/no solver session. Methods taking a model step expect the raw model
/// text; state comes back as `SolverOutput` JSON.
#[wasm_bindgen]
pub struct DecisionSession {
    solver: BinarySolver,
}

#[wasm_bindgen]
impl DecisionSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> DecisionSession {
        DecisionSession { solver: BinarySolver::new() }
    }

    pub fn begin(&mut self, step_text: &str) -> Result<String, JsValue> {
        let step = decision::parse_decision_step(step_text).map_err(js_error)?;
        self.solver.begin(step);
        Ok(self.state())
    }

    /// Record the user's answer. Returns the message to send to the model.
    pub fn answer(&mut self, yes: bool) -> Result<String, JsValue> {
        let answer = if yes { Answer::Yes } else { Answer::No };
        let exchange = self.solver.answer(answer).map_err(js_error)?;
        Ok(exchange.answer.as_message().to_string())
    }

    pub fn advance(&mut self, step_text: &str) -> Result<String, JsValue> {
        let step = decision::parse_decision_step(step_text).map_err(js_error)?;
        self.solver.advance(step);
        Ok(self.state())
    }

    pub fn reset(&mut self) {
        self.solver.reset();
    }

    pub fn state(&self) -> String {
        to_json(&SolverOutput::from(&self.solver))
    }
}

impl Default for DecisionSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Consultant chat transcript. The page streams the model reply and feeds
/// each chunk to `push_chunk`.
#[wasm_bindgen]
pub struct ChatSession {
    transcript: ChatTranscript,
}

#[wasm_bindgen]
impl ChatSession {
    /// Starts with the consultant's greeting.
    #[wasm_bindgen(constructor)]
    pub fn new(now: f64) -> ChatSession {
        ChatSession { transcript: ChatTranscript::with_greeting(now) }
    }

    /// Record the user's message. Returns it as JSON.
    pub fn send(&mut self, text: &str, now: f64) -> Result<String, JsValue> {
        let message = self.transcript.send(text, now).map_err(js_error)?;
        Ok(to_json(message))
    }

    /// Open the reply placeholder. Returns its id.
    pub fn begin_reply(&mut self, now: f64) -> Result<String, JsValue> {
        let id = self.transcript.begin_reply(now).map_err(js_error)?;
        Ok(id.to_string())
    }

    /// Append a chunk. Returns the reply text so far.
    pub fn push_chunk(&mut self, chunk: &str) -> Result<String, JsValue> {
        let text = self.transcript.push_chunk(chunk).map_err(js_error)?;
        Ok(text.to_string())
    }

    pub fn finish_reply(&mut self) -> Result<String, JsValue> {
        let message = self.transcript.finish_reply().map_err(js_error)?;
        Ok(to_json(message))
    }

    pub fn fail_reply(&mut self, now: f64) -> String {
        error!("chat reply failed");
        to_json(self.transcript.fail_reply(now))
    }

    pub fn messages(&self) -> String {
        to_json(&self.transcript.messages())
    }

    pub fn is_streaming(&self) -> bool {
        self.transcript.is_streaming()
    }
}
