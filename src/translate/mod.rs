// Machine translation provider seam
//
// The alignment core never talks to a provider; the workflow resolves
// every translation first and hands the finished strings to the syncer.
// - Ollama: local LLM served over HTTP

pub mod ollama;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::config::TranslateConfig;
use crate::error::Result;

/// Text returned by a translation provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub translated_text: String,
}

impl Translation {
    pub fn new(translated_text: impl Into<String>) -> Self {
        Self {
            translated_text: translated_text.into(),
        }
    }
}

/// Main trait for translation operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`, keeping its line structure
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Translation>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator (Ollama-backed)
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        Ok(Box::new(ollama::OllamaTranslator::new(config)?))
    }
}

/// Convert language code to full language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        "fr" => "French".to_string(),
        "de" => "German".to_string(),
        "es" => "Spanish".to_string(),
        "ru" => "Russian".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        "pl" => "Polish".to_string(),
        "nl" => "Dutch".to_string(),
        "tr" => "Turkish".to_string(),
        "ar" => "Arabic".to_string(),
        "hi" => "Hindi".to_string(),
        "sv" => "Swedish".to_string(),
        "da" => "Danish".to_string(),
        "no" => "Norwegian".to_string(),
        "fi" => "Finnish".to_string(),
        "he" => "Hebrew".to_string(),
        _ => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_names() {
        assert_eq!(language_code_to_name("ES"), "Spanish");
        assert_eq!(language_code_to_name("he"), "Hebrew");
        assert_eq!(language_code_to_name("xx"), "xx");
    }

    #[tokio::test]
    async fn mock_translator_satisfies_trait_object() {
        let mut mock = MockTranslator::new();
        mock.expect_translate()
            .returning(|text, _, _| Ok(Translation::new(text.to_uppercase())));

        let translator: Box<dyn Translator> = Box::new(mock);
        let result = translator.translate("hola", "es", "en").await.unwrap();
        assert_eq!(result.translated_text, "HOLA");
    }
}
