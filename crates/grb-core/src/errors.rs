/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the relay can
/// handle failures consistently (fatal at startup vs recovered per message).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
