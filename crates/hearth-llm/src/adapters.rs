//! Provider adapters for the plan fallback chain.
//!
//! Each adapter reads its credentials once at construction; `is_enabled`
//! only inspects that captured configuration, never the environment.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use hearth_core::plan::{PlanItem, PlanRequest, PlanResponse, PlanScope};

use crate::{AdapterError, PlanAdapter};

pub const OPENAI_PROVIDER: &str = "openai_responses";
pub const BEDROCK_PROVIDER: &str = "bedrock_converse";
pub const OLLAMA_PROVIDER: &str = "ollama";

const PLAN_TEMPERATURE: f64 = 0.4;
const PLAN_MAX_OUTPUT_TOKENS: u32 = 500;

/// The default chain in fallback order: OpenAI, Bedrock, Ollama.
#[must_use]
pub fn default_chain() -> Vec<Box<dyn PlanAdapter>> {
    vec![
        Box::new(OpenAiResponsesAdapter::from_env()),
        Box::new(BedrockConverseAdapter::from_env()),
        Box::new(OllamaAdapter::from_env()),
    ]
}

/// Wrap a raw model reply as a single group-scoped plan item.
fn group_reply(provider: &'static str, text: String) -> PlanResponse {
    PlanResponse {
        provider: provider.to_string(),
        items: vec![PlanItem {
            scope: PlanScope::Group,
            intent: text,
            rationale: "llm_plan".to_string(),
            provider: provider.to_string(),
        }],
    }
}

/// OpenAI `/v1/responses` adapter; enabled when `OPENAI_API_KEY` is set.
pub struct OpenAiResponsesAdapter {
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiResponsesAdapter {
    #[must_use]
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            api_key,
            model,
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var("OPENAI_API_KEY").ok(),
            env::var("OPENAI_RESPONSES_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        )
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiReply {
    output_text: Option<String>,
    output: Option<Vec<OpenAiOutputItem>>,
}

#[derive(Deserialize)]
struct OpenAiOutputItem {
    content: Option<Vec<OpenAiContent>>,
}

#[derive(Deserialize)]
struct OpenAiContent {
    text: Option<String>,
}

impl OpenAiReply {
    /// Prefer the convenience `output_text`; otherwise walk the output
    /// blocks for the first text fragment.
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text {
            return Some(text);
        }
        self.output?
            .into_iter()
            .flat_map(|item| item.content.unwrap_or_default())
            .find_map(|content| content.text)
    }
}

#[async_trait]
impl PlanAdapter for OpenAiResponsesAdapter {
    fn provider(&self) -> &'static str {
        OPENAI_PROVIDER
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_plan(
        &self,
        prompt: &str,
        _request: &PlanRequest,
    ) -> Result<PlanResponse, AdapterError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AdapterError::Malformed("adapter disabled".to_string()));
        };
        let response = self
            .client
            .post("https://api.openai.com/v1/responses")
            .bearer_auth(api_key)
            .json(&OpenAiRequest {
                model: &self.model,
                input: prompt,
                temperature: PLAN_TEMPERATURE,
                max_output_tokens: PLAN_MAX_OUTPUT_TOKENS,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status()));
        }
        let reply: OpenAiReply = response.json().await?;
        let text = reply
            .into_text()
            .ok_or_else(|| AdapterError::Malformed("reply carried no text".to_string()))?;
        Ok(group_reply(OPENAI_PROVIDER, text))
    }
}

/// Bedrock converse-proxy adapter; enabled when both `BEDROCK_CONVERSE_URL`
/// and `BEDROCK_CONVERSE_MODEL` are set.
pub struct BedrockConverseAdapter {
    url: Option<String>,
    model: Option<String>,
    auth: Option<String>,
    client: Client,
}

impl BedrockConverseAdapter {
    #[must_use]
    pub fn new(url: Option<String>, model: Option<String>, auth: Option<String>) -> Self {
        Self {
            url,
            model,
            auth,
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var("BEDROCK_CONVERSE_URL").ok(),
            env::var("BEDROCK_CONVERSE_MODEL").ok(),
            env::var("BEDROCK_CONVERSE_AUTH").ok(),
        )
    }
}

#[derive(Serialize)]
struct BedrockRequest<'a> {
    #[serde(rename = "modelId")]
    model_id: &'a str,
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

#[derive(Deserialize)]
struct BedrockReply {
    #[serde(rename = "outputText")]
    output_text: Option<String>,
    results: Option<Vec<BedrockResult>>,
}

#[derive(Deserialize)]
struct BedrockResult {
    #[serde(rename = "outputText")]
    output_text: Option<String>,
}

#[async_trait]
impl PlanAdapter for BedrockConverseAdapter {
    fn provider(&self) -> &'static str {
        BEDROCK_PROVIDER
    }

    fn is_enabled(&self) -> bool {
        self.url.is_some() && self.model.is_some()
    }

    async fn generate_plan(
        &self,
        prompt: &str,
        _request: &PlanRequest,
    ) -> Result<PlanResponse, AdapterError> {
        let (Some(url), Some(model)) = (self.url.as_deref(), self.model.as_deref()) else {
            return Err(AdapterError::Malformed("adapter disabled".to_string()));
        };
        let mut builder = self.client.post(url).json(&BedrockRequest {
            model_id: model,
            input_text: prompt,
        });
        if let Some(auth) = &self.auth {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth.as_str());
        }
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status()));
        }
        let reply: BedrockReply = response.json().await?;
        let text = reply
            .output_text
            .or_else(|| {
                reply
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .find_map(|result| result.output_text)
            })
            .ok_or_else(|| AdapterError::Malformed("reply carried no text".to_string()))?;
        Ok(group_reply(BEDROCK_PROVIDER, text))
    }
}

/// Local Ollama adapter; enabled when `OLLAMA_HOST` is set.
pub struct OllamaAdapter {
    host: Option<String>,
    model: String,
    client: Client,
}

impl OllamaAdapter {
    #[must_use]
    pub fn new(host: Option<String>, model: String) -> Self {
        Self {
            host,
            model,
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var("OLLAMA_HOST").ok(),
            env::var("OLLAMA_PLAN_MODEL").unwrap_or_else(|_| "llama3".to_string()),
        )
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Deserialize)]
struct OllamaReply {
    response: String,
}

#[async_trait]
impl PlanAdapter for OllamaAdapter {
    fn provider(&self) -> &'static str {
        OLLAMA_PROVIDER
    }

    fn is_enabled(&self) -> bool {
        self.host.is_some()
    }

    async fn generate_plan(
        &self,
        prompt: &str,
        _request: &PlanRequest,
    ) -> Result<PlanResponse, AdapterError> {
        let Some(host) = self.host.as_deref() else {
            return Err(AdapterError::Malformed("adapter disabled".to_string()));
        };
        let url = format!("{}/api/generate", host.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: OllamaOptions {
                    temperature: PLAN_TEMPERATURE,
                },
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status()));
        }
        let reply: OllamaReply = response.json().await?;
        Ok(group_reply(OLLAMA_PROVIDER, reply.response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_enablement_tracks_api_key() {
        assert!(!OpenAiResponsesAdapter::new(None, "gpt-4o-mini".to_string()).is_enabled());
        assert!(
            OpenAiResponsesAdapter::new(Some("sk-test".to_string()), "gpt-4o-mini".to_string())
                .is_enabled()
        );
    }

    #[test]
    fn bedrock_requires_both_url_and_model() {
        assert!(!BedrockConverseAdapter::new(None, None, None).is_enabled());
        assert!(
            !BedrockConverseAdapter::new(Some("http://proxy".to_string()), None, None)
                .is_enabled()
        );
        assert!(BedrockConverseAdapter::new(
            Some("http://proxy".to_string()),
            Some("amazon.titan-text".to_string()),
            None,
        )
        .is_enabled());
    }

    #[test]
    fn ollama_enablement_tracks_host() {
        assert!(!OllamaAdapter::new(None, "llama3".to_string()).is_enabled());
        assert!(
            OllamaAdapter::new(Some("http://localhost:11434".to_string()), "llama3".to_string())
                .is_enabled()
        );
    }

    #[test]
    fn openai_reply_prefers_output_text() {
        let reply = OpenAiReply {
            output_text: Some("use the morning for foraging".to_string()),
            output: None,
        };
        assert_eq!(
            reply.into_text().as_deref(),
            Some("use the morning for foraging")
        );
    }

    #[test]
    fn openai_reply_walks_output_blocks() {
        let reply: OpenAiReply = serde_json::from_str(
            r#"{"output":[{"content":[{"text":"hunt first"}]}]}"#,
        )
        .expect("decode");
        assert_eq!(reply.into_text().as_deref(), Some("hunt first"));
    }

    #[test]
    fn group_reply_wraps_text_in_one_item() {
        let response = group_reply(OLLAMA_PROVIDER, "rest today".to_string());
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].scope, PlanScope::Group);
        assert_eq!(response.items[0].provider, OLLAMA_PROVIDER);
    }
}
