use crate::{
    config::Config,
    error::{AppError, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

/// 向量与摘要服务
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn summarize(&self, title: &str, content: &str) -> Result<String>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// OpenAI 兼容的 HTTP 接口
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    summary_model: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("embedding_model", &self.embedding_model)
            .field("summary_model", &self.summary_model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.embedding_api_url.trim_end_matches('/').to_string(),
            api_key: config.embedding_api_key.clone(),
            embedding_model: config.embedding_model.clone(),
            summary_model: config.summary_model.clone(),
        })
    }

    fn summary_prompt(title: &str, content: &str) -> String {
        format!(
            "Summarize the following news article in three to four sentences.\n\nTitle: {}\n\nContent: {}\n\nSummary:",
            title, content
        )
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Requesting embedding ({} chars)", text.len());

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: text,
                model: &self.embedding_model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            error!("Embedding provider returned status {}", response.status());
            return Err(AppError::ExternalService("Embedding provider request failed".to_string()));
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| AppError::ExternalService("Embedding provider returned no data".to_string()))
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        debug!("Requesting summary for: {}", title);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.summary_model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: Self::summary_prompt(title, content),
                }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            error!("Summary provider returned status {}", response.status());
            return Err(AppError::ExternalService("Summary provider request failed".to_string()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .ok_or_else(|| AppError::ExternalService("Summary provider returned no content".to_string()))
    }
}
