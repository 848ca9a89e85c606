// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for a reconciliation run
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure while creating or updating a single component.
///
/// Always local to one component: the engine rolls back that component's
/// transaction and moves on.
#[derive(Error, Debug)]
pub enum CreationError {
    #[error("host rejected the component: {0}")]
    Host(String),

    #[error("missing geometry: {0}")]
    MissingGeometry(String),

    #[error("no {kind} named '{name}'")]
    Lookup { kind: &'static str, name: String },

    #[error("reference element {0} does not exist")]
    MissingReference(String),

    #[error("parameter '{name}' could not be set: {message}")]
    Parameter { name: String, message: String },

    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl CreationError {
    pub fn host(message: impl Into<String>) -> Self {
        CreationError::Host(message.into())
    }

    pub fn missing_geometry(message: impl Into<String>) -> Self {
        CreationError::MissingGeometry(message.into())
    }
}

/// Failure reported by the native document itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("transaction '{name}' failed: {message}")]
    Transaction { name: String, message: String },

    #[error("scan failed: {0}")]
    Scan(String),

    #[error("cannot delete {element}: {message}")]
    Delete { element: String, message: String },
}

/// Fatal run errors. Anything else is reported per component.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("could not open transaction '{name}': {source}")]
    Transaction {
        name: String,
        #[source]
        source: DocumentError,
    },

    #[error("document scan failed: {0}")]
    Scan(#[source] DocumentError),
}
