// Translation backends
//
// This module provides different translation implementations through a factory pattern:
// - Google: the public translate endpoint, one request per segment
// - Ollama: a local LLM prompted for a JSON-wrapped translation

pub mod google;
pub mod ollama;

use async_trait::async_trait;

pub use google::GoogleTranslator;
pub use ollama::{OllamaTranslator, check_ollama_availability};
use crate::config::{TranslateConfig, TranslationBackend};
use crate::error::Result;

/// Main trait for translation operations
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one piece of text between two language codes
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String>;

    /// Verify the backend is reachable before a batch starts
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator based on the configured backend
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        match config.backend {
            TranslationBackend::Google => Ok(Box::new(GoogleTranslator::new(config)?)),
            TranslationBackend::Ollama => Ok(Box::new(OllamaTranslator::new(config)?)),
        }
    }
}

/// Convert language code to full language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "fa" => "Persian (Farsi)".to_string(),
        "en" => "English".to_string(),
        "ar" => "Arabic".to_string(),
        "tr" => "Turkish".to_string(),
        "de" => "German".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "ja" => "Japanese".to_string(),
        _ => code.to_string(), // Fallback to the code itself if not found
    }
}
