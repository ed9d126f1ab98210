//! Answer generation via `OpenAI` chat completions
//!
//! The collaborator invoked once the engine finalizes a question. Calls
//! happen strictly outside the engine's critical sections; failures are
//! retried here with bounded backoff and never inside the engine.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::retry::{self, RetryPolicy};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Provide clear, concise, and friendly responses.";

/// Collaborator that turns a finalized question into an answer
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Answer a finalized question
    ///
    /// # Errors
    ///
    /// Returns an error when the upstream completion call fails after
    /// retries are exhausted.
    async fn answer(&self, question: &str) -> Result<String>;
}

/// `OpenAI`-backed answer service
pub struct OpenAiAnswer {
    client: Client,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    temperature: f64,
    retry: RetryPolicy,
}

impl OpenAiAnswer {
    /// Create an answer service from LLM configuration
    #[must_use]
    pub fn new(api_key: SecretString, config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry: RetryPolicy::default(),
        }
    }

    async fn try_once(&self, request: &ChatCompletionRequest) -> AttemptResult {
        let response = match self
            .client
            .post(COMPLETIONS_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let recoverable = retry::is_recoverable_transport(&e);
                return AttemptResult::failed(
                    Error::Answer(format!("completion request failed: {e}")),
                    recoverable,
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return AttemptResult::failed(
                Error::Answer(format!("completion API error: {status} - {body}")),
                retry::is_recoverable_status(status.as_u16()),
            );
        }

        let parsed: ChatCompletionResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return AttemptResult::failed(
                    Error::Answer(format!("failed to parse completion response: {e}")),
                    false,
                );
            }
        };

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string());

        match answer {
            Some(answer) if !answer.is_empty() => AttemptResult::Ok(answer),
            _ => AttemptResult::failed(
                Error::Answer("completion response had no content".to_string()),
                false,
            ),
        }
    }
}

#[async_trait]
impl AnswerService for OpenAiAnswer {
    async fn answer(&self, question: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: question.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: None,
        };

        let mut attempt = 0;
        loop {
            match self.try_once(&request).await {
                AttemptResult::Ok(answer) => {
                    tracing::debug!(question, "answer generated");
                    return Ok(answer);
                }
                AttemptResult::Failed { error, recoverable } => {
                    if !recoverable || attempt >= self.retry.max_retries {
                        return Err(error);
                    }
                    let delay = retry::delay_for_attempt(&self.retry, attempt);
                    tracing::warn!(attempt, error = %error, "answer request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

enum AttemptResult {
    Ok(String),
    Failed { error: Error, recoverable: bool },
}

impl AttemptResult {
    const fn failed(error: Error, recoverable: bool) -> Self {
        Self::Failed { error, recoverable }
    }
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// One chat message
#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Response format directive (used for JSON-mode intent analysis)
#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_without_response_format() {
        let request = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content: "hello".to_string(),
            }],
            temperature: 0.7,
            max_tokens: 150,
            response_format: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn response_parses_first_choice_content() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#,
        )
        .unwrap();

        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hi there")
        );
    }
}
