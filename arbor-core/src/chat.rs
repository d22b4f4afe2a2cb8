//! Consultant chat transcript.
//!
//! The page owns the model connection and streams reply chunks in; this keeps
//! the message list consistent. A reply starts as an empty model message and
//! grows as chunks arrive, so the page can repaint after every chunk.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opening line shown before the user has said anything.
pub const GREETING: &str = "Hello. I'm your AI Consultant. I'm here to help you think through problems, \
brainstorm ideas, or just provide a second opinion. What's on your mind today?";

/// Shown in place of a reply when the stream fails.
pub const ERROR_REPLY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Host clock in ms when the message was created.
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    next_id: u64,
    /// Slot of the model message currently being streamed into.
    streaming: Option<usize>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript that opens with the consultant's greeting.
    pub fn with_greeting(now: f64) -> Self {
        let mut transcript = Self::new();
        transcript.messages.push(ChatMessage {
            id: "init".to_string(),
            role: Role::Model,
            text: GREETING.to_string(),
            timestamp: now,
        });
        transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Record a user message. Blank input is rejected, as is sending while a
    /// reply is still streaming.
    pub fn send(&mut self, text: &str, now: f64) -> Result<&ChatMessage> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }
        if self.streaming.is_some() {
            return Err(EngineError::ReplyInProgress);
        }
        Ok(self.push(Role::User, text.to_string(), now))
    }

    /// Open an empty model message for the reply stream. Returns its id.
    pub fn begin_reply(&mut self, now: f64) -> Result<&str> {
        if self.streaming.is_some() {
            return Err(EngineError::ReplyInProgress);
        }
        self.push(Role::Model, String::new(), now);
        let slot = self.messages.len() - 1;
        self.streaming = Some(slot);
        Ok(&self.messages[slot].id)
    }

    /// Append one streamed chunk and return the reply text so far.
    pub fn push_chunk(&mut self, chunk: &str) -> Result<&str> {
        let slot = self.streaming.ok_or(EngineError::NoReplyInProgress)?;
        let message = &mut self.messages[slot];
        message.text.push_str(chunk);
        Ok(&message.text)
    }

    /// Close the reply stream. Returns the finished reply.
    pub fn finish_reply(&mut self) -> Result<&ChatMessage> {
        let slot = self.streaming.take().ok_or(EngineError::NoReplyInProgress)?;
        Ok(&self.messages[slot])
    }

    /// The request or stream failed: drop an empty placeholder, keep any
    /// partial text, and append the apology.
    pub fn fail_reply(&mut self, now: f64) -> &ChatMessage {
        if let Some(slot) = self.streaming.take() {
            if self.messages[slot].text.is_empty() {
                self.messages.remove(slot);
            }
        }
        self.push(Role::Model, ERROR_REPLY.to_string(), now)
    }

    fn push(&mut self, role: Role, text: String, now: f64) -> &ChatMessage {
        self.next_id += 1;
        self.messages.push(ChatMessage { id: format!("m{}", self.next_id), role, text, timestamp: now });
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamed_reply_accumulates() {
        let mut chat = ChatTranscript::with_greeting(0.0);
        chat.send("Should I rent or buy?", 10.0).unwrap();
        let reply_id = chat.begin_reply(20.0).unwrap().to_string();

        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[2].text, "");
        assert_eq!(chat.push_chunk("It depends ").unwrap(), "It depends ");
        assert_eq!(chat.push_chunk("on how long you stay.").unwrap(), "It depends on how long you stay.");

        let reply = chat.finish_reply().unwrap();
        assert_eq!(reply.id, reply_id);
        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.timestamp, 20.0);
        assert!(!chat.is_streaming());
    }

    #[test]
    fn test_send_rules() {
        let mut chat = ChatTranscript::new();
        assert!(matches!(chat.send("   ", 0.0), Err(EngineError::EmptyMessage)));
        chat.send("hi", 0.0).unwrap();
        chat.begin_reply(1.0).unwrap();
        assert!(matches!(chat.send("again", 2.0), Err(EngineError::ReplyInProgress)));
        assert!(matches!(chat.begin_reply(2.0), Err(EngineError::ReplyInProgress)));
    }

    #[test]
    fn test_chunks_need_open_reply() {
        let mut chat = ChatTranscript::new();
        assert!(matches!(chat.push_chunk("x"), Err(EngineError::NoReplyInProgress)));
        assert!(matches!(chat.finish_reply(), Err(EngineError::NoReplyInProgress)));
    }

    #[test]
    fn test_failure_replaces_empty_placeholder() {
        let mut chat = ChatTranscript::new();
        chat.send("hi", 0.0).unwrap();
        chat.begin_reply(1.0).unwrap();
        chat.fail_reply(2.0);
        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", ERROR_REPLY]);
        assert!(!chat.is_streaming());
    }

    #[test]
    fn test_failure_keeps_partial_reply() {
        let mut chat = ChatTranscript::new();
        chat.send("hi", 0.0).unwrap();
        chat.begin_reply(1.0).unwrap();
        chat.push_chunk("Well,").unwrap();
        chat.fail_reply(2.0);
        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "Well,", ERROR_REPLY]);
    }

    #[test]
    fn test_ids_unique_and_json_shape() {
        let mut chat = ChatTranscript::with_greeting(5.0);
        chat.send("a", 6.0).unwrap();
        chat.send("b", 7.0).unwrap();
        let ids: Vec<&str> = chat.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["init", "m1", "m2"]);

        let json = serde_json::to_value(&chat.messages()[1]).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["timestamp"], 6.0);
    }
}
