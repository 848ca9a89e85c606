// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the component model and wire codec.

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload could not be decoded. Nothing was produced.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A value could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Why a payload failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The payload line was empty or whitespace only.
    #[error("empty payload")]
    Empty,

    /// The payload ended before the value was complete.
    #[error("truncated payload: {0}")]
    Truncated(String),

    /// The payload is not valid for the expected shape.
    #[error("malformed payload at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Eof => DecodeError::Truncated(err.to_string()),
            Category::Io | Category::Syntax | Category::Data => DecodeError::Malformed {
                line: err.line(),
                column: err.column(),
                message: err.to_string(),
            },
        }
    }
}
