use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::llm::{ChatCompletionRequest, ChatMessage, CompletionClient, LlmError};
use crate::pr::diff::truncate;

pub const DIFF_PLACEHOLDER: &str = "{diff}";

pub const DEFAULT_TEMPLATE: &str = "Generate a detailed pull request (PR) description based on the following diff data:

{diff}

The PR description should include:
- A summary of the changes
- The purpose of the changes
- Any additional context

Output the description in Markdown format.";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to generate PR description: {0}")]
    Api(#[from] LlmError),

    #[error("no choices returned in the chat completion response")]
    NoChoices,
}

/// Prompt and model parameters for [`DescriptionGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Instruction text with a `{diff}` placeholder
    pub template: String,
    pub model: String,
    pub temperature: f32,
    /// Truncate longer diffs to this many characters
    pub max_diff_chars: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_diff_chars: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            template: settings.prompt.template.clone(),
            model: settings.openai.model.clone(),
            temperature: settings.openai.temperature,
            max_diff_chars: settings.prompt.max_diff_chars,
        }
    }
}

/// Substitute `diff` into the first `{diff}` of `template`.
/// The diff is inserted verbatim, an empty diff gives the template with the
/// placeholder removed.
pub fn build_prompt(template: &str, diff: &str) -> String {
    template.replacen(DIFF_PLACEHOLDER, diff, 1)
}

/// Turns a diff into a PR description with one chat-completion call.
pub struct DescriptionGenerator<C> {
    client: C,
    config: GeneratorConfig,
}

impl<C: CompletionClient> DescriptionGenerator<C> {
    pub fn new(client: C, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build the single-message request sent for `diff`.
    pub fn request_for(&self, diff: &str) -> ChatCompletionRequest {
        let diff = match self.config.max_diff_chars {
            Some(limit) => truncate(diff, limit),
            None => diff.into(),
        };
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(build_prompt(&self.config.template, &diff))],
            temperature: self.config.temperature,
        }
    }

    /// Generate a Markdown description for `diff`.
    ///
    /// Always issues exactly one request, even for an empty diff, and returns
    /// the first choice's text unmodified.
    #[instrument(skip_all, fields(model = %self.config.model, diff_bytes = diff.len()))]
    pub async fn generate(&self, diff: &str) -> Result<String, GenerationError> {
        let request = self.request_for(diff);
        debug!(prompt_bytes = request.messages[0].content.len(), "built prompt");

        let response = self.client.create_chat_completion(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::NoChoices)?;

        let description = choice.message.content.unwrap_or_default();
        info!(description_bytes = description.len(), "generated PR description");
        Ok(description)
    }
}
