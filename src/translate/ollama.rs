use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SubsyncError};
use super::{Translation, Translator, language_code_to_name};

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

/// Translator backed by an Ollama server
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

    /// Perform a single translation request using Ollama with JSON format
    async fn request_translation(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let request = TranslationRequest {
            model: self.config.model.clone(),
            prompt: build_translation_prompt(text, source_language, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubsyncError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubsyncError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let translation_response: TranslationResponse = response
            .json()
            .await
            .map_err(|e| SubsyncError::Translation(format!("Failed to parse response: {}", e)))?;

        parse_model_output(&translation_response.response)
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Translation> {
        let mut attempt = 0;
        loop {
            match self.request_translation(text, source_language, target_language).await {
                Ok(translated) => return Ok(Translation::new(translated)),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Translation attempt {}/{} failed: {}. Retrying in {}s",
                        attempt, self.config.max_retries, e, self.config.retry_delay_secs
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Build the prompt; line breaks in the input must survive translation
fn build_translation_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    let source_name = language_code_to_name(source_language);
    let target_name = language_code_to_name(target_language);

    format!(
        "You are a professional subtitle translator.\n\
         \n\
         Translate the text below from {} to {} (language code: {}).\n\
         Keep exactly one output line for every input line, in the same order.\n\
         Do not merge, split, number or comment on lines.\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        source_name, target_name, target_language, target_name, text
    )
}

/// Extract the translation from the model's reply
fn parse_model_output(raw: &str) -> Result<String> {
    let raw = raw.trim();
    debug!("Raw Ollama response: {}", raw);

    if raw.is_empty() {
        return Err(SubsyncError::Translation("Empty translation received".to_string()));
    }

    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        return Ok(result.text.trim().to_string());
    }

    // Models occasionally wrap the JSON in a code fence
    let unfenced = raw
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if let Ok(result) = serde_json::from_str::<TranslationResult>(unfenced) {
        return Ok(result.text.trim().to_string());
    }

    Ok(unfenced.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_reply() {
        assert_eq!(parse_model_output("{\"text\": \" Hola\\nmundo \"}").unwrap(), "Hola\nmundo");
    }

    #[test]
    fn parses_fenced_json_reply() {
        let raw = "```json\n{\"text\": \"Hola\"}\n```";
        assert_eq!(parse_model_output(raw).unwrap(), "Hola");
    }

    #[test]
    fn falls_back_to_plain_text() {
        assert_eq!(parse_model_output("\"Hola\"").unwrap(), "Hola");
    }

    #[test]
    fn empty_reply_is_an_error() {
        assert!(matches!(parse_model_output("   "), Err(SubsyncError::Translation(_))));
    }

    #[test]
    fn prompt_names_both_languages() {
        let prompt = build_translation_prompt("one\ntwo", "en", "es");
        assert!(prompt.contains("from English to Spanish"));
        assert!(prompt.ends_with("one\ntwo\n"));
    }

    #[tokio::test]
    async fn unreachable_server_fails_after_retries() {
        let config = TranslateConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            retry_delay_secs: 0,
            timeout_secs: 2,
            ..TranslateConfig::default()
        };
        let translator = OllamaTranslator::new(config).unwrap();

        let err = translator.translate("hello", "en", "es").await.unwrap_err();
        assert!(matches!(err, SubsyncError::Translation(_)));
    }
}
