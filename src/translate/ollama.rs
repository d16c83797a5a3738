use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, DubError};
use super::{Translator, language_code_to_name};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Segment translator backed by a local Ollama model
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build translation prompt, using JSON format
    fn build_translation_prompt(&self, text: &str, source_language: &str, target_language: &str) -> String {
        let source_name = language_code_to_name(source_language);
        let target_name = language_code_to_name(target_language);

        format!(
            "You are a professional translator preparing a voice-over script.\n\
             \n\
             CRITICAL: You must translate the text from {} to {} ONLY.\n\
             The target language is: {} (language code: {})\n\
             Keep formulas, code, and proper names as they are.\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             Text to translate: \"{}\"\n",
            source_name, target_name, target_name, target_language, target_name, text
        )
    }

    /// Extract the translation from a raw model response
    pub fn extract_translation(raw_response: &str) -> Result<String> {
        let raw_response = raw_response.trim();
        if raw_response.is_empty() {
            return Err(DubError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            let text = result.text.trim();
            if text.is_empty() {
                return Err(DubError::Translation("Empty translation received".to_string()));
            }
            return Ok(text.to_string());
        }

        // Models occasionally ignore the JSON instruction; keep the first real line
        raw_response
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with("Translation:"))
            .map(|line| line.trim_matches('"').to_string())
            .ok_or_else(|| DubError::Translation("No translation in response".to_string()))
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let request = TranslationRequest {
            model: self.config.model.clone(),
            prompt: self.build_translation_prompt(text, source_language, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));

        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DubError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let translation_response: TranslationResponse = response.json().await
            .map_err(|e| DubError::Translation(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response: {}", translation_response.response);

        Self::extract_translation(&translation_response.response)
    }

    async fn check_availability(&self) -> Result<()> {
        check_ollama_availability(&self.client, &self.config.endpoint, &self.config.model).await
    }
}

/// Check if Ollama is available and the model is loaded
pub async fn check_ollama_availability(client: &Client, endpoint: &str, model: &str) -> Result<()> {
    let url = format!("{}/api/show", endpoint.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&json!({ "name": model }))
        .send()
        .await
        .map_err(|e| DubError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

    if response.status().is_success() {
        info!("Ollama model '{}' is available", model);
        Ok(())
    } else {
        Err(DubError::Translation(format!(
            "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
            model, model
        )))
    }
}
