use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, DubError};
use super::Translator;

/// Client for the public `translate_a/single` endpoint
pub struct GoogleTranslator {
    client: Client,
    config: TranslateConfig,
}

impl GoogleTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Join the translated sentence chunks of a `dt=t` response.
    ///
    /// The payload is a nested array whose first element lists
    /// `[translated, original, ...]` entries, one per sentence.
    pub fn parse_response(body: &Value) -> Result<String> {
        let sentences = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| DubError::Translation("Unexpected response shape".to_string()))?;

        let text: String = sentences
            .iter()
            .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
            .collect();

        let text = text.trim();
        if text.is_empty() {
            return Err(DubError::Translation("Empty translation received".to_string()));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.config.endpoint.trim_end_matches('/'));

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DubError::Translation(format!(
                "Translate API error {}: {}", status, error_text
            )));
        }

        let body: Value = response.json().await
            .map_err(|e| DubError::Translation(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_joins_sentences() {
        let body = json!([
            [
                ["سلام. ", "Hello. ", null, null, 10],
                ["حال شما چطور است؟", "How are you?", null, null, 10]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            GoogleTranslator::parse_response(&body).unwrap(),
            "سلام. حال شما چطور است؟"
        );
    }

    #[test]
    fn test_parse_rejects_unexpected_shapes() {
        assert!(GoogleTranslator::parse_response(&json!({"error": "quota"})).is_err());
        assert!(GoogleTranslator::parse_response(&json!([[]])).is_err());
    }
}
