// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the receiver service.

use std::path::PathBuf;

use thiserror::Error;

/// Service error types.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Cannot read catalog {}: {source}", path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog {}: {source}", path.display())]
    CatalogFormat {
        path: PathBuf,
        #[source]
        source: grevit_core::Error,
    },

    #[error("Cannot write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding error: {0}")]
    Encode(#[from] grevit_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
