use crate::constants::ConfigError;

/// Failure to obtain the raw departure feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Departure board request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Departure board unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger setup failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}
