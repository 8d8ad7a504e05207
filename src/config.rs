use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubsyncError};

// Default values shared by the segmenter, syncer and wrapper
fn default_max_line_width() -> usize {
    42
}

fn default_max_pause_ms() -> u64 {
    500
}

fn default_transit_budget_bytes() -> usize {
    4500
}

fn default_window_capacity() -> usize {
    10
}

fn default_length_ratio_threshold() -> f64 {
    90.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub segment: SegmentConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Maximum rendered characters per subtitle line
    #[serde(default = "default_max_line_width")]
    pub max_line_width: usize,
    /// Gap (ms) after a sentence end that counts as a pause, and the amount the block is extended by
    #[serde(default = "default_max_pause_ms")]
    pub max_pause_ms: u64,
    /// Display time (ms) given to a block until a second word arrives
    #[serde(default = "default_max_pause_ms")]
    pub provisional_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Maximum UTF-8 bytes of text sent to the translation provider per page
    #[serde(default = "default_transit_budget_bytes")]
    pub transit_budget_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of recent distances kept for the slope and minimum
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// Candidate/reference length ratio (percent) above which growth stops
    #[serde(default = "default_length_ratio_threshold")]
    pub length_ratio_threshold: f64,
    /// Similarity metric used to compare candidates with block translations
    #[serde(default)]
    pub metric: MetricKind,
    /// Line width applied when wrapping aligned translations
    #[serde(default = "default_max_line_width")]
    pub max_line_width: usize,
    /// Skip pages whose alignment fails instead of aborting the whole file
    #[serde(default)]
    pub isolate_page_failures: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Jaccard distance over character trigrams
    #[default]
    Jaccard,
    /// Sorensen-Dice distance over character bigrams
    SorensenDice,
    /// Cosine distance over character frequency profiles
    Cosine,
    /// Levenshtein distance normalized by the longer string
    NormalizedLevenshtein,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Maximum retries for failed translations
    pub max_retries: u32,
    /// Seconds to wait between retries
    pub retry_delay_secs: u64,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_line_width: default_max_line_width(),
            max_pause_ms: default_max_pause_ms(),
            provisional_duration_ms: default_max_pause_ms(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            transit_budget_bytes: default_transit_budget_bytes(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            length_ratio_threshold: default_length_ratio_threshold(),
            metric: MetricKind::default(),
            max_line_width: default_max_line_width(),
            isolate_page_failures: false,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            max_retries: 10,
            retry_delay_secs: 5,
            timeout_secs: 300,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubsyncError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubsyncError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubsyncError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubsyncError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the segmenter, splitter or syncer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.segment.max_line_width == 0 || self.sync.max_line_width == 0 {
            return Err(SubsyncError::Config("max_line_width must be greater than zero".to_string()));
        }
        if self.page.transit_budget_bytes == 0 {
            return Err(SubsyncError::Config("transit_budget_bytes must be greater than zero".to_string()));
        }
        // A slope needs at least two samples
        if self.sync.window_capacity < 2 {
            return Err(SubsyncError::Config(format!(
                "window_capacity must be at least 2, got {}",
                self.sync.window_capacity
            )));
        }
        if !self.sync.length_ratio_threshold.is_finite() || self.sync.length_ratio_threshold <= 0.0 {
            return Err(SubsyncError::Config(format!(
                "length_ratio_threshold must be a positive number, got {}",
                self.sync.length_ratio_threshold
            )));
        }
        Ok(())
    }
}
