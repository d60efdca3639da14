use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{ChatCompletionRequest, ChatCompletionResponse, CompletionClient, LlmError};

/// Client for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl OpenAiClient {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        debug!(messages = request.messages.len(), "sending chat completion request");
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The error body carries the API's explanation (bad key, quota, ...)
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let completion = response.json::<ChatCompletionResponse>().await?;
        debug!(choices = completion.choices.len(), "received chat completion");
        Ok(completion)
    }
}
