//! Blocking client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::conversation::{ConversationState, OperationRequest, Turn};
use crate::core::operation::OperationDeclaration;
use crate::io::model::{Model, ModelRequest, ModelResponse, Usage};

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_instruction: String,
    pub request_timeout: Duration,
}

/// Model backend that talks to the Gemini API.
pub struct GeminiClient {
    settings: GeminiSettings,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { settings, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_base_url.trim_end_matches('/'),
            self.settings.model
        )
    }
}

impl Model for GeminiClient {
    #[instrument(
        skip_all,
        fields(model = %self.settings.model, turns = request.conversation.len())
    )]
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse> {
        let body = build_request_body(
            request.conversation,
            request.operations,
            &self.settings.system_instruction,
        );
        debug!("sending generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .context("send generateContent request")?;

        let status = response.status();
        let text = response.text().context("read generateContent response")?;
        if !status.is_success() {
            warn!(%status, "model service returned error status");
            return Err(anyhow!("model service returned {status}: {}", text.trim()));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).context("parse generateContent response")?;
        let step = parse_response(parsed)?;
        info!(
            requests = step.requests.len(),
            prompt_tokens = step.usage.prompt_tokens,
            response_tokens = step.usage.response_tokens,
            "model step received"
        );
        Ok(step)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

fn build_request_body(
    conversation: &ConversationState,
    operations: &[OperationDeclaration],
    system_instruction: &str,
) -> Value {
    let contents: Vec<Content> = conversation.turns().iter().filter_map(to_content).collect();
    let mut body = json!({ "contents": contents });
    if !operations.is_empty() {
        body["tools"] = json!([{ "functionDeclarations": operations }]);
    }
    if !system_instruction.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system_instruction }] });
    }
    body
}

/// Map one conversation turn to wire content. Model turns with nothing to say
/// are skipped because the API rejects empty parts.
fn to_content(turn: &Turn) -> Option<Content> {
    match turn {
        Turn::User { text } => Some(Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.clone()),
                ..Part::default()
            }],
        }),
        Turn::Model { text, requests } => {
            let mut parts = Vec::new();
            if let Some(text) = text.as_ref().filter(|t| !t.is_empty()) {
                parts.push(Part {
                    text: Some(text.clone()),
                    ..Part::default()
                });
            }
            for request in requests {
                parts.push(Part {
                    function_call: Some(FunctionCall {
                        name: request.name.clone(),
                        args: Some(request.arguments.clone()),
                    }),
                    thought_signature: request.signature.clone(),
                    ..Part::default()
                });
            }
            if parts.is_empty() {
                return None;
            }
            Some(Content {
                role: Some("model".to_string()),
                parts,
            })
        }
        Turn::Tool {
            name,
            text,
            handled,
        } => {
            let response = if *handled {
                json!({ "result": text })
            } else {
                json!({ "error": text })
            };
            Some(Content {
                role: Some("tool".to_string()),
                parts: vec![Part {
                    function_response: Some(FunctionResponse {
                        name: name.clone(),
                        response,
                    }),
                    ..Part::default()
                }],
            })
        }
    }
}

fn parse_response(response: GenerateContentResponse) -> Result<ModelResponse> {
    if response.candidates.is_empty() {
        return Err(anyhow!("model service returned no candidates"));
    }

    let mut text = String::new();
    let mut requests = Vec::new();
    for candidate in response.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(chunk) = part.text {
                text.push_str(&chunk);
            }
            if let Some(call) = part.function_call {
                requests.push(
                    OperationRequest::new(call.name, call.args.unwrap_or_default())
                        .with_signature(part.thought_signature),
                );
            }
        }
    }

    let usage = response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(ModelResponse {
        text: if text.is_empty() { None } else { Some(text) },
        requests,
        usage,
    })
}
