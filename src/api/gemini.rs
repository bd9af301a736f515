//! Client for the Gemini `generateContent` REST surface.
//!
//! The REST API is stateless; the session keeps the full turn history on this
//! side and replays it with every request. Tool declarations and the system
//! instruction are fixed at session creation, which is exactly the lifetime
//! the dispatcher needs: a session is one open chat window.

use crate::api::{LanguageModel, LanguageSession, ModelReply, Part, ToolCall, ToolDecl};
use crate::Result;
use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const API_VERSION: &str = "v1beta";

/// Factory for Gemini-backed conversation sessions.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Points the client at a different host. Intended for test servers.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base = Url::parse(base_url)
            .with_context(|| format!("Invalid language service URL '{base_url}'"))?;
        Ok(self)
    }
}

impl LanguageModel for GeminiClient {
    fn start_session(
        &self,
        system_instruction: String,
        tools: Vec<ToolDecl>,
    ) -> Box<dyn LanguageSession> {
        Box::new(GeminiSession {
            http: self.http.clone(),
            base: self.base.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            system: Content {
                role: "user".to_string(),
                parts: vec![WirePart::text(system_instruction)],
            },
            tools: vec![ToolGroup {
                function_declarations: tools,
            }],
            history: Vec::new(),
        })
    }
}

struct GeminiSession {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    model: String,
    system: Content,
    tools: Vec<ToolGroup>,
    history: Vec<Content>,
}

#[async_trait::async_trait]
impl LanguageSession for GeminiSession {
    async fn send(&mut self, parts: Vec<Part>) -> Result<ModelReply> {
        self.history.push(Content {
            role: "user".to_string(),
            parts: parts.into_iter().map(WirePart::from).collect(),
        });

        let url = self
            .base
            .join(&format!(
                "{API_VERSION}/models/{}:generateContent",
                self.model
            ))
            .context("Unable to build the generateContent URL")?;

        let request = GenerateRequest {
            system_instruction: &self.system,
            contents: &self.history,
            tools: &self.tools,
        };

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("The language service request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("The language service returned {status}: {body}");
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("The language service returned an unparsable body")?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .context("The language service returned no candidates")?;

        // The model turn joins the history so the next request carries it.
        self.history.push(content.clone());

        Ok(reply_from(content))
    }
}

fn reply_from(content: Content) -> ModelReply {
    let mut text = String::new();
    let mut calls = Vec::new();
    for part in content.parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            calls.push(ToolCall {
                id: call.id,
                name: call.name,
                args: call.args,
            });
        }
    }
    ModelReply {
        text: (!text.is_empty()).then_some(text),
        calls,
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: &'a Content,
    contents: &'a [Content],
    tools: &'a [ToolGroup],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolGroup {
    function_declarations: Vec<ToolDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => WirePart::text(text),
            Part::Inline { mime_type, data } => WirePart {
                inline_data: Some(InlineData {
                    mime_type,
                    data: BASE64.encode(data),
                }),
                ..WirePart::default()
            },
            Part::ToolResult { id, name, result } => WirePart {
                function_response: Some(WireFunctionResponse {
                    id,
                    name,
                    response: serde_json::json!({ "result": result }),
                }),
                ..WirePart::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_part_serializes_as_function_response() {
        let part = WirePart::from(Part::ToolResult {
            id: Some("call-1".to_string()),
            name: "createTransaction".to_string(),
            result: "Transação salva".to_string(),
        });
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["functionResponse"]["id"], "call-1");
        assert_eq!(json["functionResponse"]["name"], "createTransaction");
        assert_eq!(json["functionResponse"]["response"]["result"], "Transação salva");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn test_inline_part_is_base64_encoded() {
        let part = WirePart::from(Part::Inline {
            mime_type: "audio/webm".to_string(),
            data: vec![1, 2, 3],
        });
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "audio/webm");
        assert_eq!(json["inlineData"]["data"], BASE64.encode([1, 2, 3]));
    }

    #[test]
    fn test_parse_function_call_response() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "functionCall": { "name": "createTask", "args": { "title": "Treino" } } }
                    ]
                }
            }]
        });
        let parsed: GenerateResponse = serde_json::from_value(body).unwrap();
        let reply = reply_from(parsed.candidates.into_iter().next().unwrap().content.unwrap());
        assert!(reply.text.is_none());
        assert_eq!(reply.calls.len(), 1);
        assert_eq!(reply.calls[0].name, "createTask");
        assert_eq!(reply.calls[0].args["title"], "Treino");
    }

    #[test]
    fn test_parse_narration_response() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [ { "text": "Tudo certo!" } ] }
            }]
        });
        let parsed: GenerateResponse = serde_json::from_value(body).unwrap();
        let reply = reply_from(parsed.candidates.into_iter().next().unwrap().content.unwrap());
        assert_eq!(reply.text.as_deref(), Some("Tudo certo!"));
        assert!(reply.calls.is_empty());
    }
}
