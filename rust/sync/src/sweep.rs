// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deletion sweep of stale tagged elements.
//!
//! Stale means: scanned before the run under a GID that this run either did
//! not reproduce, or reproduced as a different element. Only the scanned
//! handle is deleted; elements built this run are never touched.

use crate::context::ReconciliationContext;
use crate::document::NativeDocument;
use crate::report::{DeleteFailure, SweepReport};

/// Transaction name used by the sweep.
pub const DELETE_TRANSACTION: &str = "GrevitDelete";

/// Stale scanned entries, sorted by GID.
pub fn orphans<H>(context: &ReconciliationContext<H>) -> Vec<(String, H)>
where
    H: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    let mut stale: Vec<(String, H)> = context
        .existing_entries()
        .filter(|(gid, handle)| context.created(gid) != Some(*handle))
        .map(|(gid, handle)| (gid.to_string(), handle.clone()))
        .collect();
    stale.sort_by(|a, b| a.0.cmp(&b.0));
    stale
}

/// Deletes every orphan inside one transaction.
///
/// Nothing here aborts the run. A failed delete is reported and the sweep
/// goes on; when the transaction cannot be opened or committed every
/// orphan it covered is reported as a failure instead.
pub fn sweep<D: NativeDocument>(
    document: &mut D,
    context: &ReconciliationContext<D::Handle>,
) -> SweepReport {
    let stale = orphans(context);
    let mut report = SweepReport::default();
    if stale.is_empty() {
        return report;
    }

    if let Err(err) = document.begin_transaction(DELETE_TRANSACTION) {
        tracing::error!(error = %err, orphans = stale.len(), "Deletion sweep could not start");
        let message = err.to_string();
        report.failures = stale
            .into_iter()
            .map(|(gid, _)| DeleteFailure {
                gid,
                message: message.clone(),
            })
            .collect();
        return report;
    }

    for (gid, handle) in stale {
        match document.delete(&handle) {
            Ok(()) => {
                tracing::debug!(gid = %gid, element = ?handle, "Deleted stale element");
                report.deleted.push(gid);
            }
            Err(err) => {
                tracing::warn!(
                    gid = %gid,
                    element = ?handle,
                    error = %err,
                    "Failed to delete stale element"
                );
                report.failures.push(DeleteFailure {
                    gid,
                    message: err.to_string(),
                });
            }
        }
    }

    if let Err(err) = document.commit_transaction() {
        tracing::error!(error = %err, "Deletion sweep could not be committed");
        document.rollback_transaction();
        let message = err.to_string();
        let undone = report.deleted.drain(..).map(|gid| DeleteFailure {
            gid,
            message: message.clone(),
        });
        report.failures.extend(undone);
    }

    report
}
