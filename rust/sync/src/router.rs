// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builder Router - dispatch from component type to creation routine
//!
//! Each component type has at most one registered builder. A builder may
//! additionally accept a resolved reference element (doors in walls,
//! hosted family instances).

use std::sync::Arc;

use grevit_core::{Component, ComponentType};
use rustc_hash::FxHashMap;

use crate::context::ReconciliationContext;
use crate::document::{apply_parameters, NativeDocument, ParameterOutcome};
use crate::error::CreationError;

/// Everything a builder gets to create or update one element.
#[derive(Debug)]
pub struct BuildRequest<'a, H> {
    pub component: &'a Component,
    /// Element tagged with this GID by an earlier run. Update it in place.
    pub existing: Option<&'a H>,
    /// Resolved reference element, only set in the reference pass.
    pub reference: Option<&'a H>,
    /// Sender units to native units.
    pub scale: f64,
}

/// Creates native elements for one or more component types.
pub trait ComponentBuilder<D: NativeDocument> {
    /// Build the element. `Ok(None)` means nothing was produced.
    fn build(
        &self,
        document: &mut D,
        request: BuildRequest<'_, D::Handle>,
    ) -> Result<Option<D::Handle>, CreationError>;

    /// Component types this builder handles
    fn supported_types(&self) -> Vec<ComponentType>;

    /// Whether the builder has a form taking a reference element.
    fn accepts_reference(&self) -> bool {
        false
    }
}

/// Result of dispatching one component.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<H> {
    /// An element was built, parameters applied and the GID tagged.
    Built {
        handle: H,
        /// The builder reused the element found by the scan.
        updated: bool,
        parameters: ParameterOutcome,
    },
    /// The builder ran but produced no element.
    NoResult,
    /// No builder is registered for the component type.
    NotRegistered,
    /// Reference pass for a component or builder without a reference form.
    NotReferenceDependent,
    /// The reference GID matched nothing created or scanned.
    UnresolvedReference(String),
}

/// Routes components to their registered builders.
pub struct BuilderRouter<D: NativeDocument> {
    builders: FxHashMap<ComponentType, Arc<dyn ComponentBuilder<D>>>,
}

impl<D: NativeDocument> Default for BuilderRouter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: NativeDocument> BuilderRouter<D> {
    /// Create an empty router
    pub fn new() -> Self {
        Self {
            builders: FxHashMap::default(),
        }
    }

    /// Register a builder for all of its supported types.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(&mut self, builder: Box<dyn ComponentBuilder<D>>) {
        let builder: Arc<dyn ComponentBuilder<D>> = Arc::from(builder);
        for component_type in builder.supported_types() {
            self.builders.insert(component_type, Arc::clone(&builder));
        }
    }

    pub fn builder_for(
        &self,
        component_type: ComponentType,
    ) -> Option<&Arc<dyn ComponentBuilder<D>>> {
        self.builders.get(&component_type)
    }

    pub fn is_registered(&self, component_type: ComponentType) -> bool {
        self.builders.contains_key(&component_type)
    }

    /// Registered types, sorted.
    pub fn registered_types(&self) -> Vec<ComponentType> {
        let mut types: Vec<ComponentType> = self.builders.keys().copied().collect();
        types.sort();
        types
    }

    /// Build one component and finish it: parameters, then the GID tag.
    ///
    /// The caller records the handle in `created` once the surrounding
    /// transaction has committed.
    pub fn dispatch(
        &self,
        document: &mut D,
        context: &ReconciliationContext<D::Handle>,
        component: &Component,
        use_reference: bool,
    ) -> Result<Dispatch<D::Handle>, CreationError> {
        let builder = match self.builders.get(&component.component_type()) {
            Some(builder) => builder,
            None => return Ok(Dispatch::NotRegistered),
        };

        let reference = if use_reference {
            if !builder.accepts_reference() {
                return Ok(Dispatch::NotReferenceDependent);
            }
            match component.reference_gid() {
                None => return Ok(Dispatch::NotReferenceDependent),
                Some(gid) if gid.trim().is_empty() => return Ok(Dispatch::NotReferenceDependent),
                Some(gid) => match context.resolve_reference(gid) {
                    Some(handle) => Some(handle.clone()),
                    None => return Ok(Dispatch::UnresolvedReference(gid.to_string())),
                },
            }
        } else {
            None
        };

        let existing = if component.has_identity() {
            context.existing(&component.gid).cloned()
        } else {
            None
        };

        let request = BuildRequest {
            component,
            existing: existing.as_ref(),
            reference: reference.as_ref(),
            scale: context.scale(),
        };

        let handle = match builder.build(document, request)? {
            Some(handle) => handle,
            None => return Ok(Dispatch::NoResult),
        };

        let parameters = apply_parameters(document, &handle, &component.parameters)?;

        if component.has_identity() {
            document.tag(&handle, &component.gid)?;
        }

        let updated = existing.as_ref() == Some(&handle);
        Ok(Dispatch::Built {
            handle,
            updated,
            parameters,
        })
    }
}
