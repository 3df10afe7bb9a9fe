use crate::error::{QueryError, Result};
use crate::models::*;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-medium-online";
pub const NOT_FOUND_ANSWER: &str = "Not found in document.";

pub const LLM_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 512;
const TEMPERATURE: f32 = 0.2;

/// Answers a single question using only the supplied document text.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct PerplexityConfig {
    pub api_url: String,
    pub model: String,
    /// Absent keys are tolerated until the first call, which then fails.
    pub api_key: Option<String>,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PERPLEXITY_API_URL.to_string(),
            model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            api_key: None,
        }
    }
}

pub struct PerplexityService {
    client: Client,
    config: PerplexityConfig,
}

impl PerplexityService {
    pub fn new(config: PerplexityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(LLM_CALL_TIMEOUT)
            .build()
            .map_err(|e| QueryError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, question: &str, context: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(build_system_prompt(context)),
                ChatMessage::user(question),
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream: false,
        }
    }
}

#[async_trait]
impl AnswerSynthesizer for PerplexityService {
    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| QueryError::config("PERPLEXITY_API_KEY is not set"))?;

        let request = self.build_request(question, context);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryError::internal(format!("chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "Error response {} while requesting {}",
                status.as_u16(),
                self.config.api_url
            );
            log::error!("Response body: {}", body);
            return Err(QueryError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| QueryError::MalformedCompletion(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| QueryError::MalformedCompletion("response contained no choices".to_string()))
    }
}

pub fn build_system_prompt(context: &str) -> String {
    format!(
        "You are an expert at extracting factual details from insurance/contract documents. \
         Use ONLY information present in this document: {context}. \
         If the answer cannot be determined, say '{NOT_FOUND_ANSWER}'"
    )
}
