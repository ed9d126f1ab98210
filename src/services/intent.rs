//! Intent classification for finalized questions
//!
//! Classifies a finalized question with a JSON-mode chat completion and
//! routes actionable intents (currently weather) to live data instead of a
//! free-form completion. Everything ambiguous falls through to the plain
//! answer service.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::answer::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
};
use super::weather::{Units, WeatherClient};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const CLASSIFIER_PROMPT: &str = "You are an AI that analyzes user messages to detect their intent.\n\
Respond with a JSON object containing these fields:\n\
- primary_intent: The main intent detected (weather, calendar, email, drinking, or unknown)\n\
- confidence: A score from 0 to 1 indicating confidence in the detection\n\
- entities: Array of {type, value} objects for relevant entities (dates, locations, people, etc.)\n\
- requires_clarification: Boolean indicating if user input needs clarification";

/// Minimum confidence before an intent is acted on
const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Outcome of intent classification
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentAnalysis {
    /// Detected intent: weather, calendar, email, drinking, or unknown
    #[serde(default)]
    pub primary_intent: String,
    /// Confidence score in `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
    /// Entities mentioned in the question
    #[serde(default)]
    pub entities: Vec<IntentEntity>,
    /// Whether the question needs clarification before acting
    #[serde(default)]
    pub requires_clarification: bool,
}

impl IntentAnalysis {
    /// First entity value of the given type, if any
    #[must_use]
    pub fn entity(&self, kind: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|entity| entity.kind == kind)
            .map(|entity| entity.value.as_str())
    }
}

/// One extracted entity
#[derive(Debug, Clone, Deserialize)]
pub struct IntentEntity {
    /// Entity type (e.g. "location", "date")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Entity value
    #[serde(default)]
    pub value: String,
}

/// Routes questions through intent classification to live data
pub struct IntentService {
    client: Client,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    weather: Option<WeatherClient>,
}

impl IntentService {
    /// Create an intent service
    ///
    /// `weather` enables live weather replies; without it weather intents
    /// fall through to the plain answer path.
    #[must_use]
    pub fn new(api_key: SecretString, config: &LlmConfig, weather: Option<WeatherClient>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            weather,
        }
    }

    /// Classify a question's intent
    ///
    /// # Errors
    ///
    /// Returns an error when the classification call fails or its JSON
    /// payload cannot be parsed.
    pub async fn analyze(&self, question: &str) -> Result<IntentAnalysis> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CLASSIFIER_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Analyze this message: {question}"),
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Intent(format!("classification request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Intent(format!(
                "classification API error: {status} - {body}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Intent(format!("failed to parse classification: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Intent("classification had no content".to_string()))?;

        let analysis: IntentAnalysis = serde_json::from_str(&content)
            .map_err(|e| Error::Intent(format!("classification was not valid JSON: {e}")))?;

        tracing::debug!(
            intent = %analysis.primary_intent,
            confidence = analysis.confidence,
            "intent classified"
        );
        Ok(analysis)
    }

    /// Try to answer a question from a classified intent
    ///
    /// Returns `None` when the intent is unknown, low-confidence, or has no
    /// live-data handler, signaling the caller to fall back to the plain
    /// answer service.
    pub async fn respond(&self, analysis: &IntentAnalysis) -> Option<String> {
        if analysis.requires_clarification {
            return Some(
                "I'm not sure what you're asking. Could you please be more specific?".to_string(),
            );
        }

        if analysis.confidence < CONFIDENCE_THRESHOLD {
            return None;
        }

        match analysis.primary_intent.as_str() {
            "weather" => Some(self.weather_reply(analysis).await),
            "drinking" => Some(
                "I noticed you're talking about drinking. Please be responsible!".to_string(),
            ),
            _ => None,
        }
    }

    async fn weather_reply(&self, analysis: &IntentAnalysis) -> String {
        let Some(weather) = &self.weather else {
            return "Weather lookups are not configured right now.".to_string();
        };

        let Some(location) = analysis.entity("location") else {
            return "Which city would you like to know the weather for?".to_string();
        };

        match weather.current(location, Units::Metric).await {
            Ok(current) => current.summary(),
            Err(e) => {
                tracing::warn!(location, error = %e, "weather lookup failed");
                "Sorry, I couldn't fetch the weather data at the moment.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_parses_classifier_payload() {
        let analysis: IntentAnalysis = serde_json::from_str(
            r#"{
                "primary_intent": "weather",
                "confidence": 0.92,
                "entities": [{"type": "location", "value": "Berlin"}],
                "requires_clarification": false
            }"#,
        )
        .unwrap();

        assert_eq!(analysis.primary_intent, "weather");
        assert_eq!(analysis.entity("location"), Some("Berlin"));
        assert!(!analysis.requires_clarification);
    }

    #[test]
    fn missing_fields_default_to_unknown() {
        let analysis: IntentAnalysis = serde_json::from_str("{}").unwrap();
        assert!(analysis.primary_intent.is_empty());
        assert!(analysis.entities.is_empty());
        assert!(analysis.entity("location").is_none());
    }
}
