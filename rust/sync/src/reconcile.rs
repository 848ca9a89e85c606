// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation engine: scan, two creation passes, optional sweep.

use grevit_core::{Component, ComponentCollection};

use crate::context::ReconciliationContext;
use crate::document::NativeDocument;
use crate::error::{Result, SyncError};
use crate::report::{RunReport, SkipReason};
use crate::router::{BuilderRouter, Dispatch};
use crate::sweep;

/// Transaction name used for each component.
pub const CREATE_TRANSACTION: &str = "GrevitCreate";

/// Applies component collections onto a native document.
pub struct Reconciler<D: NativeDocument> {
    router: BuilderRouter<D>,
}

impl<D: NativeDocument> Reconciler<D> {
    pub fn new(router: BuilderRouter<D>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &BuilderRouter<D> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut BuilderRouter<D> {
        &mut self.router
    }

    /// Runs one reconciliation.
    ///
    /// Components are built one at a time in their own transaction; a
    /// failing component is rolled back and reported. Errors are returned
    /// only when the document cannot be scanned or a component transaction
    /// cannot be opened. Sweep problems end up in the report.
    pub fn run(&self, document: &mut D, collection: &ComponentCollection) -> Result<RunReport> {
        let mut context = if collection.update {
            let scan = document.scan_tagged_elements().map_err(SyncError::Scan)?;
            ReconciliationContext::from_scan(scan, collection.scale)
        } else {
            ReconciliationContext::new(collection.scale)
        };

        let mut report = RunReport {
            banned: context.banned(),
            ..Default::default()
        };

        tracing::info!(
            items = collection.len(),
            update = collection.update,
            delete = collection.delete,
            scale = collection.scale,
            existing = context.existing_len(),
            banned = report.banned.len(),
            "Starting reconciliation"
        );

        let (ready, deferred) = collection.partition();

        for component in ready {
            self.process(document, &mut context, component, false, &mut report)?;
        }

        for component in deferred {
            self.process(document, &mut context, component, true, &mut report)?;
        }

        if collection.delete {
            report.sweep = Some(sweep::sweep(document, &context));
        }

        tracing::info!(summary = %report, "Reconciliation finished");
        Ok(report)
    }

    fn process(
        &self,
        document: &mut D,
        context: &mut ReconciliationContext<D::Handle>,
        component: &Component,
        use_reference: bool,
        report: &mut RunReport,
    ) -> Result<()> {
        report.processed += 1;

        if !self.router.is_registered(component.component_type()) {
            tracing::warn!(component = %component, "No builder registered");
            report.skip(component, SkipReason::NotRegistered);
            return Ok(());
        }

        document
            .begin_transaction(CREATE_TRANSACTION)
            .map_err(|source| SyncError::Transaction {
                name: CREATE_TRANSACTION.to_string(),
                source,
            })?;

        let dispatched = self
            .router
            .dispatch(document, context, component, use_reference)
            .and_then(|dispatch| {
                document.commit_transaction()?;
                Ok(dispatch)
            });

        match dispatched {
            Ok(Dispatch::Built {
                handle,
                updated,
                parameters,
            }) => {
                tracing::debug!(
                    component = %component,
                    element = ?handle,
                    updated,
                    parameters_applied = parameters.applied,
                    parameters_skipped = parameters.skipped,
                    "Built component"
                );
                if updated {
                    report.updated += 1;
                } else {
                    report.created += 1;
                }
                report.parameters_applied += parameters.applied;
                report.parameters_skipped += parameters.skipped;
                context.record_created(&component.gid, handle);
            }
            Ok(Dispatch::NoResult) => report.skip(component, SkipReason::NoResult),
            Ok(Dispatch::NotRegistered) => report.skip(component, SkipReason::NotRegistered),
            Ok(Dispatch::NotReferenceDependent) => {
                report.skip(component, SkipReason::NotReferenceDependent)
            }
            Ok(Dispatch::UnresolvedReference(gid)) => {
                tracing::warn!(
                    component = %component,
                    reference = %gid,
                    "Reference not found, skipping component"
                );
                report.skip(component, SkipReason::UnresolvedReference(gid));
            }
            Err(err) => {
                document.rollback_transaction();
                tracing::warn!(
                    component_type = %component.component_type(),
                    gid = %component.gid,
                    error = %err,
                    "Component failed"
                );
                report.fail(component, err.to_string());
            }
        }

        Ok(())
    }
}
