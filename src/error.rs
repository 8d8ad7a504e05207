use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed transcript input: {0}")]
    MalformedInput(String),

    #[error("Block {index} has no raw translation to align against")]
    DegenerateBlock { index: usize },

    #[error("Invalid subtitle file: {0}")]
    InvalidSubtitle(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SubsyncError>;
