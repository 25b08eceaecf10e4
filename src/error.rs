use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Analyzer Error: {0}")]
    AnalyzerError(String),

    #[error("Config Parse Error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid Config: {0}")]
    InvalidConfig(String),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session Closed")]
    SessionClosed,
}
