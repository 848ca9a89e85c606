// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One receive-and-apply session.

use std::path::{Path, PathBuf};

use grevit_core::{codec, ComponentCollection};
use grevit_sync::{MemoryDocument, Reconciler, RunReport};
use serde::Serialize;

use crate::error::ServerError;

/// Serializable form of a run report, written next to each snapshot.
#[derive(Debug, Serialize)]
pub struct ReportRecord {
    pub session: u64,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub banned: Vec<String>,
    pub skipped: Vec<SkipRecord>,
    pub failed: Vec<FailureRecord>,
    pub document_elements: usize,
}

#[derive(Debug, Serialize)]
pub struct SkipRecord {
    #[serde(rename = "type")]
    pub component_type: String,
    pub gid: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    #[serde(rename = "type")]
    pub component_type: String,
    pub gid: String,
    pub message: String,
}

impl ReportRecord {
    pub fn new(session: u64, report: &RunReport, document: &MemoryDocument) -> Self {
        Self {
            session,
            processed: report.processed,
            created: report.created,
            updated: report.updated,
            deleted: report.deleted(),
            banned: report.banned.clone(),
            skipped: report
                .skipped
                .iter()
                .map(|s| SkipRecord {
                    component_type: s.component_type.to_string(),
                    gid: s.gid.clone(),
                    reason: s.reason.to_string(),
                })
                .collect(),
            failed: report
                .failed
                .iter()
                .map(|f| FailureRecord {
                    component_type: f.component_type.to_string(),
                    gid: f.gid.clone(),
                    message: f.message.clone(),
                })
                .collect(),
            document_elements: document.len(),
        }
    }
}

/// Applies a received collection and logs the outcome.
pub fn apply(
    session: u64,
    document: &mut MemoryDocument,
    reconciler: &Reconciler<MemoryDocument>,
    collection: &ComponentCollection,
) -> Option<RunReport> {
    match reconciler.run(document, collection) {
        Ok(report) => {
            for failure in &report.failed {
                tracing::warn!(session, failure = %failure, "Component failed");
            }
            for skipped in &report.skipped {
                tracing::info!(
                    session,
                    component_type = %skipped.component_type,
                    gid = %skipped.gid,
                    reason = %skipped.reason,
                    "Component skipped"
                );
            }
            if let Some(sweep) = &report.sweep {
                for failure in &sweep.failures {
                    tracing::warn!(
                        session,
                        gid = %failure.gid,
                        error = %failure.message,
                        "Delete failed"
                    );
                }
            }
            tracing::info!(
                session,
                processed = report.processed,
                created = report.created,
                updated = report.updated,
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                deleted = report.deleted(),
                elements = document.len(),
                "Session applied"
            );
            Some(report)
        }
        Err(err) => {
            tracing::error!(session, error = %err, "Session aborted");
            None
        }
    }
}

/// Writes the payload and, when available, the report for a session.
pub fn write_snapshot(
    dir: &Path,
    session: u64,
    collection: &ComponentCollection,
    report: Option<&ReportRecord>,
) -> Result<PathBuf, ServerError> {
    std::fs::create_dir_all(dir).map_err(|source| ServerError::Snapshot {
        path: dir.to_path_buf(),
        source,
    })?;

    let payload_path = dir.join(format!("session-{session:04}.json"));
    let mut payload = codec::encode(collection)?;
    payload.push('\n');
    std::fs::write(&payload_path, payload).map_err(|source| ServerError::Snapshot {
        path: payload_path.clone(),
        source,
    })?;

    if let Some(record) = report {
        let report_path = dir.join(format!("session-{session:04}.report.json"));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&report_path, json).map_err(|source| ServerError::Snapshot {
            path: report_path.clone(),
            source,
        })?;
    }

    Ok(payload_path)
}
