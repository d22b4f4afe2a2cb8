//! Error type shared by every arbor-core module.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The model returned no text at all.
    #[error("no response from model")]
    EmptyResponse,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A tree node without a usable label. `path` is the node's id.
    #[error("node {path} has an empty name")]
    EmptyName { path: String },

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// Two elements of one layout pass claimed the same identity.
    #[error("duplicate node identity '{0}'")]
    DuplicateIdentity(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no tree has been rendered")]
    NoTree,

    #[error("solver is not waiting for an answer")]
    NotAwaitingAnswer,

    #[error("plan has no goal or no phases")]
    EmptyPlan,

    #[error("message is empty")]
    EmptyMessage,

    #[error("a reply is still streaming")]
    ReplyInProgress,

    #[error("no reply is streaming")]
    NoReplyInProgress,
}

pub type Result<T> = std::result::Result<T, EngineError>;
