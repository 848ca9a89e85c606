// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Grevit Sync
//!
//! Applies a [`ComponentCollection`](grevit_core::ComponentCollection) onto
//! a native document while keeping element identity stable across runs.
//!
//! ## Overview
//!
//! - **Scan**: tagged elements are mapped by GID; GIDs found on several
//!   elements are banned for the run
//! - **Two passes**: components without references first, then deferred
//!   components with their reference resolved
//! - **Dispatch**: a registration table from component type to builder;
//!   parameters are applied with storage type checks, then the GID is tagged
//! - **Sweep**: optional removal of tagged elements the run did not reproduce
//!
//! ## Quick Start
//!
//! ```rust
//! use grevit_core::{Component, ComponentCollection, Line, Point};
//! use grevit_sync::{default_router, MemoryDocument, Reconciler};
//!
//! let mut document = MemoryDocument::new();
//! let reconciler = Reconciler::new(default_router());
//!
//! let line = Component::new(Line {
//!     from: Point::new(0.0, 0.0, 0.0),
//!     to: Point::new(1.0, 0.0, 0.0),
//!     view: String::new(),
//! })
//! .with_gid("l1");
//! let collection = ComponentCollection::new(vec![line]).with_update(true);
//!
//! let report = reconciler.run(&mut document, &collection).unwrap();
//! assert_eq!(report.created, 1);
//!
//! // Sending the same collection again updates instead of duplicating.
//! let report = reconciler.run(&mut document, &collection).unwrap();
//! assert_eq!(report.updated, 1);
//! assert_eq!(document.len(), 1);
//! ```

pub mod context;
pub mod document;
pub mod error;
pub mod memory;
pub mod reconcile;
pub mod report;
pub mod router;
pub mod sweep;

pub use context::ReconciliationContext;
pub use document::{apply_parameters, NativeDocument, ParameterOutcome, StorageType};
pub use error::{CreationError, DocumentError, Result, SyncError};
pub use memory::{default_router, ElementId, MemoryBuilder, MemoryDocument, MemoryElement};
pub use reconcile::{Reconciler, CREATE_TRANSACTION};
pub use report::{DeleteFailure, Failure, RunReport, SkipReason, Skipped, SweepReport};
pub use router::{BuildRequest, BuilderRouter, ComponentBuilder, Dispatch};
pub use sweep::{orphans, sweep, DELETE_TRANSACTION};
