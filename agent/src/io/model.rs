//! Model-service abstraction for the turn loop.
//!
//! The [`Model`] trait decouples the turn loop from the actual backend
//! (currently the Gemini REST API). Tests use scripted models that return
//! predetermined steps without touching the network.

use anyhow::Result;

use crate::core::conversation::{ConversationState, OperationRequest};
use crate::core::operation::OperationDeclaration;

/// Input for one model step.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    /// The full conversation so far.
    pub conversation: &'a ConversationState,
    /// Operations the model may request.
    pub operations: &'a [OperationDeclaration],
}

/// Token counters reported by the model service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}

impl Usage {
    pub fn add(&mut self, other: Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
    }
}

/// One model step: free text, operation requests, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub requests: Vec<OperationRequest>,
    pub usage: Usage,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn requests(requests: Vec<OperationRequest>) -> Self {
        Self {
            requests,
            ..Self::default()
        }
    }
}

/// Abstraction over model-service backends.
///
/// Errors are fatal to the session: there is no local recovery from a failed
/// model call.
pub trait Model {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse>;
}
