//! Interactive decision-tree view: incremental disclosure, tidy layout,
//! animated enter/update/exit transitions and a pan/zoom viewport, compiled
//! to wasm for the browser frontend.

pub mod animation;
pub mod chat;
pub mod config;
pub mod decision;
pub mod disclosure;
pub mod engine;
pub mod error;
pub mod layout;
pub mod output;
pub mod plan;
pub mod response;
pub mod sizing;
pub mod tree;
pub mod viewport;
mod wasm;

pub use config::EngineConfig;
pub use engine::TreeEngine;
pub use error::{EngineError, Result};
pub use tree::{NodeId, TreeNode};
