//! In-memory conversation record for a session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A model-issued request to run one sandboxed operation. Untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Opaque token the model service attached to this request, sent back
    /// unchanged with the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl OperationRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: Option<String>) -> Self {
        self.signature = signature;
        self
    }
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User {
        text: String,
    },
    Model {
        text: Option<String>,
        requests: Vec<OperationRequest>,
    },
    /// Result of one operation, in the order the model requested it.
    Tool {
        name: String,
        text: String,
        /// False when the operation name was not recognized.
        handled: bool,
    },
}

/// Ordered, append-only record of user, model, and tool turns.
///
/// Owned by the session loop. Operations never see it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User { text: text.into() });
    }

    pub fn push_model(&mut self, text: Option<String>, requests: Vec<OperationRequest>) {
        self.turns.push(Turn::Model { text, requests });
    }

    pub fn push_tool(&mut self, name: impl Into<String>, text: impl Into<String>, handled: bool) {
        self.turns.push(Turn::Tool {
            name: name.into(),
            text: text.into(),
            handled,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Tool results in append order as `(name, text)` pairs.
    pub fn tool_results(&self) -> impl Iterator<Item = (&str, &str)> {
        self.turns.iter().filter_map(|turn| match turn {
            Turn::Tool { name, text, .. } => Some((name.as_str(), text.as_str())),
            _ => None,
        })
    }
}
