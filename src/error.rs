use thiserror::Error;
use url::ParseError;

pub type Result<T, E = RtError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum RtError {
    #[error("WebSocket Error: {0}")]
    WebsocketError(String),

    #[error("JSON Serialization/Deserialization Error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("URL Parsing Error: {0}")]
    UrlParseError(#[from] ParseError),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}
