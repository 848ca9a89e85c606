// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operator-facing summary of a reconciliation run.

use std::fmt;

use grevit_core::{Component, ComponentType};

/// Why a component produced no element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotRegistered,
    NotReferenceDependent,
    UnresolvedReference(String),
    NoResult,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotRegistered => f.write_str("no builder registered"),
            SkipReason::NotReferenceDependent => f.write_str("not reference dependent"),
            SkipReason::UnresolvedReference(gid) => write!(f, "unresolved reference '{gid}'"),
            SkipReason::NoResult => f.write_str("builder produced no element"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub component_type: ComponentType,
    pub gid: String,
    pub reason: SkipReason,
}

/// A component whose creation failed and was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub component_type: ComponentType,
    pub gid: String,
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.component_type, self.gid, self.message)
    }
}

/// A stale element the sweep could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub gid: String,
    pub message: String,
}

/// Outcome of the deletion sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// GIDs whose stale element was deleted
    pub deleted: Vec<String>,
    pub failures: Vec<DeleteFailure>,
}

/// Counts and per-component details of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<Skipped>,
    pub failed: Vec<Failure>,
    pub banned: Vec<String>,
    pub parameters_applied: usize,
    pub parameters_skipped: usize,
    /// `None` when the run did not sweep.
    pub sweep: Option<SweepReport>,
}

impl RunReport {
    pub(crate) fn skip(&mut self, component: &Component, reason: SkipReason) {
        self.skipped.push(Skipped {
            component_type: component.component_type(),
            gid: component.gid.clone(),
            reason,
        });
    }

    pub(crate) fn fail(&mut self, component: &Component, message: String) {
        self.failed.push(Failure {
            component_type: component.component_type(),
            gid: component.gid.clone(),
            message,
        });
    }

    pub fn deleted(&self) -> usize {
        self.sweep.as_ref().map(|s| s.deleted.len()).unwrap_or(0)
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
            && self
                .sweep
                .as_ref()
                .map(|s| s.failures.is_empty())
                .unwrap_or(true)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}, created {}, updated {}, skipped {}, failed {}, deleted {}",
            self.processed,
            self.created,
            self.updated,
            self.skipped.len(),
            self.failed.len(),
            self.deleted()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line() {
        let report = RunReport {
            processed: 4,
            created: 2,
            updated: 1,
            sweep: Some(SweepReport {
                deleted: vec!["b".into()],
                failures: Vec::new(),
            }),
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "processed 4, created 2, updated 1, skipped 0, failed 0, deleted 1"
        );
        assert!(report.is_clean());
    }
}
