//! Chat-completions client used as the remote [`Classifier`].

use crate::classifier::{Classifier, Suggestion, build_prompt, parse_suggestions};
use crate::config::ClassifierSettings;
use crate::error::{Result, TidyError};
use crate::scanner::FileRecord;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// [`Classifier`] backed by an OpenAI-compatible chat-completions endpoint.
///
/// Sends one request per batch with the prompt from
/// [`build_prompt`](crate::classifier::build_prompt) and parses the reply
/// with [`parse_suggestions`].
pub struct OpenAiClassifier {
    client: Client,
    api_key: String,
    settings: ClassifierSettings,
}

impl OpenAiClassifier {
    /// Creates a classifier using `api_key` as the bearer token.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The OpenAI key
    /// * `settings` - Endpoint, model, sampling and timeout settings
    ///
    /// # Errors
    ///
    /// `Classifier` when the HTTP client cannot be built. No request is sent
    /// until [`Classifier::classify`] is called.
    pub fn new(api_key: impl Into<String>, settings: ClassifierSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| TidyError::Classifier(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            settings,
        })
    }

    /// Sends one user message and returns the text of the first choice.
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        log::debug!(
            "requesting classification from {} with model {}",
            self.settings.endpoint,
            self.settings.model
        );

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| TidyError::Classifier(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_error) => format!("API error: {}", api_error.error.message),
                Err(_) => format!("API error ({status}): {body}"),
            };
            return Err(TidyError::Classifier(message));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| TidyError::Classifier(format!("failed to parse response: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TidyError::Classifier("response contained no message".to_string()))
    }
}

impl Classifier for OpenAiClassifier {
    fn classify(&self, files: &[FileRecord]) -> Result<Vec<Suggestion>> {
        let reply = self.complete(&build_prompt(files))?;
        let suggestions = parse_suggestions(&reply);
        if let Err(e) = &suggestions {
            log::error!("unusable classifier reply: {e}");
        }
        suggestions
    }
}
