use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::{
    config::OpenAiSettings,
    error::LlmError,
    types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionRequest},
};

use super::LanguageModel;

/// OpenAI-compatible chat completions client.
///
/// Structured output is requested through `response_format: json_schema` with
/// `strict: true`, so the model cannot answer in free text.
pub struct OpenAiClient {
    http: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings, timeout: Duration) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("promptlist/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, settings })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let api_url = format!(
            "{uri}/chat/completions",
            uri = self.settings.api_url.trim_end_matches('/')
        );

        let body = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(request.system_instruction),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.user_prompt),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "draft_playlist",
                    "strict": true,
                    "schema": request.response_schema,
                }
            }),
        };

        debug!(model = %self.settings.model, "Requesting structured completion");

        let response = self
            .http
            .post(&api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Malformed("completion has no content".to_string()))
    }
}
