// Word-level transcript as handed over by the speech recognition provider.
//
// Two layouts are accepted:
// - the Amazon Transcribe job output (`results.items[]` with `type`,
//   `alternatives[0].content` and string timestamps)
// - a flat list of `{kind, content, start_time, end_time}` objects
//
// Both are normalized to `TranscriptItem` and validated item by item.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, SubsyncError};

/// One recognized word or punctuation mark
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptItem {
    /// A spoken word with its timing in seconds
    Pronunciation {
        content: String,
        start_time: f64,
        end_time: f64,
    },
    /// Punctuation inferred by the recognizer; carries no timing
    Punctuation { content: String },
}

impl TranscriptItem {
    pub fn pronunciation(content: &str, start_time: f64, end_time: f64) -> Self {
        Self::Pronunciation {
            content: content.to_string(),
            start_time,
            end_time,
        }
    }

    pub fn punctuation(content: &str) -> Self {
        Self::Punctuation {
            content: content.to_string(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Pronunciation { content, .. } | Self::Punctuation { content } => content,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        match self {
            Self::Pronunciation { start_time, .. } => Some(*start_time),
            Self::Punctuation { .. } => None,
        }
    }

    /// Check the fields required by the item's kind
    pub fn validate(&self, position: usize) -> Result<()> {
        if self.content().trim().is_empty() {
            return Err(malformed(position, "empty content"));
        }
        if let Self::Pronunciation {
            start_time,
            end_time,
            ..
        } = self
        {
            if !start_time.is_finite() || !end_time.is_finite() {
                return Err(malformed(position, "non-finite timestamp"));
            }
            if *start_time < 0.0 {
                return Err(malformed(position, "negative start_time"));
            }
            if end_time < start_time {
                return Err(malformed(
                    position,
                    &format!("end_time {} is before start_time {}", end_time, start_time),
                ));
            }
        }
        Ok(())
    }
}

fn malformed(position: usize, reason: &str) -> SubsyncError {
    SubsyncError::MalformedInput(format!("item {}: {}", position, reason))
}

/// A validated transcript ready for segmentation
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Full running text, as reported by the provider or rebuilt from the items
    pub text: String,
    pub items: Vec<TranscriptItem>,
}

// Structs for parsing the provider's JSON output
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Aws(AwsDocument),
    Flat(Vec<FlatItem>),
}

#[derive(Debug, Deserialize)]
struct AwsDocument {
    results: AwsResults,
}

#[derive(Debug, Deserialize)]
struct AwsResults {
    #[serde(default)]
    transcripts: Vec<AwsTranscriptText>,
    items: Vec<AwsItem>,
}

#[derive(Debug, Deserialize)]
struct AwsTranscriptText {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct AwsItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    alternatives: Vec<AwsAlternative>,
    start_time: Option<Value>,
    end_time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AwsAlternative {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatItem {
    kind: Option<String>,
    content: Option<String>,
    start_time: Option<Value>,
    end_time: Option<Value>,
}

/// Item fields before kind-specific validation
struct RawItem {
    kind: Option<String>,
    content: Option<String>,
    start_time: Option<Value>,
    end_time: Option<Value>,
}

impl From<AwsItem> for RawItem {
    fn from(item: AwsItem) -> Self {
        Self {
            kind: item.kind,
            content: item.alternatives.into_iter().next().and_then(|a| a.content),
            start_time: item.start_time,
            end_time: item.end_time,
        }
    }
}

impl From<FlatItem> for RawItem {
    fn from(item: FlatItem) -> Self {
        Self {
            kind: item.kind,
            content: item.content,
            start_time: item.start_time,
            end_time: item.end_time,
        }
    }
}

impl RawItem {
    fn into_item(self, position: usize) -> Result<TranscriptItem> {
        let kind = self.kind.ok_or_else(|| malformed(position, "missing kind"))?;
        let content = self.content.ok_or_else(|| malformed(position, "missing content"))?;

        let item = match kind.as_str() {
            "pronunciation" => {
                let start_time = parse_seconds(self.start_time.as_ref(), position, "start_time")?;
                let end_time = parse_seconds(self.end_time.as_ref(), position, "end_time")?;
                TranscriptItem::Pronunciation {
                    content,
                    start_time,
                    end_time,
                }
            }
            "punctuation" => TranscriptItem::Punctuation { content },
            other => return Err(malformed(position, &format!("unknown kind '{}'", other))),
        };

        item.validate(position)?;
        Ok(item)
    }
}

/// Timestamps arrive as JSON strings ("1.23") or numbers
fn parse_seconds(value: Option<&Value>, position: usize, field: &str) -> Result<f64> {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(position, &format!("{} is not a number", field))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(position, &format!("{} '{}' is not a number", field, s))),
        Some(_) => Err(malformed(position, &format!("{} has an unsupported type", field))),
        None => Err(malformed(position, &format!("missing {}", field))),
    }
}

impl Transcript {
    pub fn from_json(json: &str) -> Result<Self> {
        let document: TranscriptDocument = serde_json::from_str(json)?;

        let (reported_text, raw_items): (Option<String>, Vec<RawItem>) = match document {
            TranscriptDocument::Aws(doc) => (
                doc.results.transcripts.into_iter().next().map(|t| t.transcript),
                doc.results.items.into_iter().map(RawItem::from).collect(),
            ),
            TranscriptDocument::Flat(items) => (None, items.into_iter().map(RawItem::from).collect()),
        };

        let items = raw_items
            .into_iter()
            .enumerate()
            .map(|(position, raw)| raw.into_item(position))
            .collect::<Result<Vec<_>>>()?;

        debug!("Parsed transcript with {} items", items.len());

        let text = reported_text.unwrap_or_else(|| rebuild_text(&items));
        Ok(Self { text, items })
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SubsyncError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

fn rebuild_text(items: &[TranscriptItem]) -> String {
    let mut text = String::new();
    for item in items {
        if matches!(item, TranscriptItem::Pronunciation { .. }) && !text.is_empty() {
            text.push(' ');
        }
        text.push_str(item.content());
    }
    text
}
