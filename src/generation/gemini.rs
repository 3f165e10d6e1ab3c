//! Gemini `generateContent` client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::TextGenerator;
use crate::config::GenerationConfig;
use crate::http;
use crate::{PlannerError, Result};

const SERVICE: &str = "generation";

/// Gemini API client
pub struct GeminiClient {
    client: reqwest_middleware::ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
    structured_output: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings<'a> {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PlannerError::config("Generation API key must be set"))?;

        Ok(Self {
            client: http::build_client(config.timeout(), config.max_retries)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            structured_output: config.structured_output,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body<'a>(&self, prompt: &'a str, schema: &'a Value) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationSettings {
                response_mime_type: "application/json",
                response_json_schema: self.structured_output.then_some(schema),
            },
        }
    }
}

/// Concatenated text of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PlannerError::upstream(
            SERVICE,
            format!("prompt was blocked: {reason}"),
        ));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| PlannerError::upstream(SERVICE, "response contained no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(PlannerError::upstream(
            SERVICE,
            format!(
                "candidate carried no text (finish reason {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        ));
    }
    if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| *r != "STOP") {
        warn!("Generation finished with reason {}", reason);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt, schema), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String> {
        info!("Requesting plan from {}", self.model);
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt, schema));

        let response = http::send(SERVICE, request).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::upstream(SERVICE, format!("invalid response: {e}")))?;

        let text = extract_text(parsed)?;
        debug!("Received {} characters of generated text", text.len());
        Ok(text)
    }
}
