// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The unit of transmission: an ordered set of components plus run flags.

use serde::{Deserialize, Serialize};

use crate::component::Component;

fn default_scale() -> f64 {
    1.0
}

/// Components sent in one message, with the flags that drive reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCollection {
    /// Creation priority within each pass follows this order.
    #[serde(default)]
    pub items: Vec<Component>,
    /// Reconcile against elements tagged by earlier runs.
    #[serde(default)]
    pub update: bool,
    /// Erase tagged elements that this run did not reproduce.
    #[serde(default)]
    pub delete: bool,
    /// Unit factor from sender coordinates to native coordinates.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ComponentCollection {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            update: false,
            delete: false,
            scale: default_scale(),
        }
    }
}

impl ComponentCollection {
    pub fn new(items: Vec<Component>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn push(&mut self, component: Component) {
        self.items.push(component);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Splits the items into the first (ready) and second (deferred) pass.
    ///
    /// Relative order is preserved within each bucket.
    pub fn partition(&self) -> (Vec<&Component>, Vec<&Component>) {
        self.items
            .iter()
            .partition(|component| !component.stalled_for_reference)
    }
}
