// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-oriented text codec for collections and catalogs.
//!
//! Every payload is a single line of JSON. Encoders never emit a line
//! terminator; framing is the transport's job. Decoders tolerate one
//! trailing `\n` or `\r\n` so a line read straight off a socket can be
//! passed in unchanged.
//!
//! Decoding is all or nothing: an error never yields a partial collection.
//! Encoding refuses collections that would not decode again, which in
//! practice means NaN or infinite doubles: JSON has no spelling for them
//! and `serde_json` writes `null` instead.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::collection::ComponentCollection;
use crate::error::{DecodeError, Error, Result};

/// Encodes any serializable value as a single line.
pub fn encode_line<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Encode(e.to_string()))
}

/// Decodes a single line into a value.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    let payload = strip_terminator(line);
    if payload.trim().is_empty() {
        return Err(DecodeError::Empty.into());
    }
    serde_json::from_str(payload)
        .map_err(|e| Error::Decode(DecodeError::from(e)))
}

/// Encodes a collection as a single line.
///
/// Fails with [`Error::Encode`] when the collection carries a non-finite
/// double anywhere.
pub fn encode(collection: &ComponentCollection) -> Result<String> {
    if !collection.scale.is_finite() {
        return Err(Error::Encode(format!(
            "scale must be finite, got {}",
            collection.scale
        )));
    }

    let line = encode_line(collection)?;

    // Absent nested components are written as `null` too, so only a line
    // containing one needs the decode check.
    if line.contains("null") {
        if let Err(err) = decode_line::<ComponentCollection>(&line) {
            return Err(Error::Encode(format!(
                "non-finite number in collection: {err}"
            )));
        }
    }

    Ok(line)
}

pub fn decode(line: &str) -> Result<ComponentCollection> {
    decode_line(line)
}

pub fn encode_catalog(catalog: &Catalog) -> Result<String> {
    encode_line(catalog)
}

pub fn decode_catalog(line: &str) -> Result<Catalog> {
    decode_line(line)
}

/// Removes a single trailing line terminator.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
