//! Chat oracle collaborator: conversation types, trait, and OpenAI
//! implementation.
//!
//! The oracle receives the conversation so far and, when action schemas
//! are offered, may either answer directly or request exactly one action
//! by name with structured arguments. The orchestrator owns all failure
//! recovery; this provider performs no internal retries so the
//! truncate-and-resend path stays observable.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::OpenAiConfig;

/// One message in the conversation.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
    /// Set on `function`-role messages: which action produced the content.
    pub name: Option<String>,
    /// Set on assistant messages that requested an action.
    pub function_call: Option<ActionCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn assistant(content: Option<String>, function_call: Option<ActionCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            name: None,
            function_call,
        }
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "function".to_string(),
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// A structured action request named by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub name: String,
    pub arguments: Value,
}

/// Declaration of one action the oracle may request, in OpenAI
/// function-calling JSON Schema form.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The oracle's next message: free text, a requested action, or both.
#[derive(Debug, Clone, Default)]
pub struct OracleReply {
    pub content: Option<String>,
    pub action: Option<ActionCall>,
}

/// Conversation state → next message.
///
/// When `actions` is supplied the oracle may request exactly one of them;
/// with `None` it must answer in plain text. Failures (timeout, payload
/// too large) surface as errors for the orchestrator to handle.
#[async_trait]
pub trait ChatOracle: Send + Sync {
    async fn converse(
        &self,
        messages: &[ChatMessage],
        actions: Option<&[ActionSchema]>,
    ) -> Result<OracleReply>;
}

/// Chat oracle backed by the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiOracle {
    model: String,
    timeout_secs: u64,
}

impl OpenAiOracle {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self {
            model: config.chat_model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ChatOracle for OpenAiOracle {
    async fn converse(
        &self,
        messages: &[ChatMessage],
        actions: Option<&[ActionSchema]>,
    ) -> Result<OracleReply> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let wire_messages: Vec<Value> = messages.iter().map(message_to_wire).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": wire_messages,
        });
        if let Some(schemas) = actions {
            body["functions"] = serde_json::to_value(schemas)?;
            body["function_call"] = Value::String("auto".to_string());
        }

        tracing::debug!(
            messages = messages.len(),
            with_actions = actions.is_some(),
            model = %self.model,
            "chat completion request"
        );

        let response = client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Encode a [`ChatMessage`] for the wire.
///
/// The API carries function-call arguments as a JSON-encoded string, not
/// an object, in both directions.
fn message_to_wire(message: &ChatMessage) -> Value {
    let mut wire = serde_json::json!({
        "role": message.role,
        "content": message.content,
    });
    if let Some(name) = &message.name {
        wire["name"] = Value::String(name.clone());
    }
    if let Some(call) = &message.function_call {
        wire["function_call"] = serde_json::json!({
            "name": call.name,
            "arguments": call.arguments.to_string(),
        });
    }
    wire
}

fn parse_chat_response(json: &Value) -> Result<OracleReply> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| anyhow::anyhow!("Malformed chat response: missing choices[0].message"))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .map(str::to_string);

    let action = message.get("function_call").and_then(|fc| {
        let name = fc.get("name")?.as_str()?.to_string();
        let arguments = fc
            .get("arguments")
            .and_then(|a| a.as_str())
            .and_then(|a| serde_json::from_str(a).ok())
            .unwrap_or_else(|| serde_json::json!({}));
        Some(ActionCall { name, arguments })
    });

    Ok(OracleReply { content, action })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response_plain_answer() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "An answer."}}]
        });
        let reply = parse_chat_response(&json).unwrap();
        assert_eq!(reply.content.as_deref(), Some("An answer."));
        assert!(reply.action.is_none());
    }

    #[test]
    fn test_parse_chat_response_function_call() {
        let json = serde_json::json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "function_call": {"name": "fetch_pages", "arguments": "{\"pages\": [1, 2]}"}
            }}]
        });
        let reply = parse_chat_response(&json).unwrap();
        assert!(reply.content.is_none());
        let action = reply.action.unwrap();
        assert_eq!(action.name, "fetch_pages");
        assert_eq!(action.arguments["pages"][1], 2);
    }

    #[test]
    fn test_parse_chat_response_bad_arguments_default_to_empty_object() {
        let json = serde_json::json!({
            "choices": [{"message": {
                "role": "assistant",
                "function_call": {"name": "search", "arguments": "not json"}
            }}]
        });
        let action = parse_chat_response(&json).unwrap().action.unwrap();
        assert_eq!(action.arguments, serde_json::json!({}));
    }

    #[test]
    fn test_parse_chat_response_missing_choices_errors() {
        assert!(parse_chat_response(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_message_to_wire_function_result() {
        let wire = message_to_wire(&ChatMessage::function("search", "found text"));
        assert_eq!(wire["role"], "function");
        assert_eq!(wire["name"], "search");
        assert_eq!(wire["content"], "found text");
    }

    #[test]
    fn test_message_to_wire_assistant_call_encodes_arguments_as_string() {
        let call = ActionCall {
            name: "fetch_pages".to_string(),
            arguments: serde_json::json!({"pages": [3]}),
        };
        let wire = message_to_wire(&ChatMessage::assistant(None, Some(call)));
        assert_eq!(wire["function_call"]["name"], "fetch_pages");
        assert!(wire["function_call"]["arguments"].is_string());
    }
}
