/// Error types for the workout player

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Error types for player operations
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Could not extract video ID from URL: {0}")]
    UnresolvableVideo(String),

    #[error("Invalid playlist: {0}")]
    InvalidPlaylist(String),

    #[error("Embed transport error: {0}")]
    Transport(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}
