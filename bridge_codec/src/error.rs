//! Codec failures

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Cannot encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Args not serializable: {0}")]
    InvalidArgs(String),

    #[error("Cannot parse message: {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed envelope: {0}")]
    Malformed(String),
}
