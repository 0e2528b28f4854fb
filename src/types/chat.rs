//! Chat completion request and streaming chunk types.

use serde::{Deserialize, Serialize};

/// Streaming chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model ID.
    pub model: String,

    /// Messages array.
    pub messages: Vec<Message>,

    /// Enable streaming.
    pub stream: bool,

    /// Temperature (0.0-2.0).
    pub temperature: f32,
}

impl ChatRequest {
    /// Creates a streaming request.
    pub fn streaming(model: impl Into<String>, messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            temperature,
        }
    }
}

/// Chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: Role,

    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
}

/// Streaming chunk.
///
/// Every field is optional on the wire; only `choices[0].delta.content`
/// matters to the decoder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    /// Response ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Model ID.
    #[serde(default)]
    pub model: Option<String>,

    /// Chunk choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// Returns the content delta of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

/// Streaming choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,

    /// Delta content.
    #[serde(default)]
    pub delta: Delta,

    /// Finish reason (in final chunk).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content in streaming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    /// Role (first chunk only).
    #[serde(default)]
    pub role: Option<Role>,

    /// Content delta.
    #[serde(default)]
    pub content: Option<String>,
}
