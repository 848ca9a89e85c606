// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native document boundary.
//!
//! A host adapter implements [`NativeDocument`] once; per-type creation is
//! supplied separately through [`ComponentBuilder`](crate::ComponentBuilder)s.

use std::fmt::Debug;
use std::hash::Hash;

use grevit_core::{Parameter, ParameterTarget, ParameterValue};

use crate::error::{CreationError, DocumentError};

/// Storage type of a native parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Text,
    Double,
    Integer,
    Boolean,
    ElementId,
}

impl StorageType {
    /// Whether a value may be written into this storage. No coercion.
    pub fn accepts(&self, value: &ParameterValue) -> bool {
        matches!(
            (self, value),
            (StorageType::Text, ParameterValue::Text(_))
                | (StorageType::Double, ParameterValue::Double(_))
                | (StorageType::Integer, ParameterValue::Integer(_))
                | (StorageType::Boolean, ParameterValue::Boolean(_))
                | (StorageType::ElementId, ParameterValue::ElementId(_))
                | (StorageType::ElementId, ParameterValue::ElementName(_))
        )
    }
}

/// Operations the reconciliation engine needs from a host document.
///
/// All mutation happens between `begin_transaction` and
/// `commit_transaction`/`rollback_transaction`. Transactions do not nest.
pub trait NativeDocument {
    /// Opaque reference to a native element.
    type Handle: Clone + Eq + Hash + Debug;

    /// Every element carrying a Grevit tag, with the GID read from it.
    ///
    /// The same GID may appear more than once; the engine bans those.
    fn scan_tagged_elements(&self) -> Result<Vec<(String, Self::Handle)>, DocumentError>;

    /// Storage type of a parameter on an element, `None` if it has none.
    fn parameter_storage(
        &self,
        element: &Self::Handle,
        target: ParameterTarget<'_>,
    ) -> Option<StorageType>;

    /// Writes a value already checked against [`parameter_storage`].
    ///
    /// [`parameter_storage`]: NativeDocument::parameter_storage
    fn set_parameter(
        &mut self,
        element: &Self::Handle,
        target: ParameterTarget<'_>,
        value: &ParameterValue,
    ) -> Result<(), CreationError>;

    /// Embeds the GID on the element so later scans find it.
    fn tag(&mut self, element: &Self::Handle, gid: &str) -> Result<(), CreationError>;

    fn delete(&mut self, element: &Self::Handle) -> Result<(), DocumentError>;

    fn begin_transaction(&mut self, name: &str) -> Result<(), DocumentError>;

    fn commit_transaction(&mut self) -> Result<(), DocumentError>;

    fn rollback_transaction(&mut self);
}

/// Counts from applying a component's parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies parameters onto an element.
///
/// Parameters the element does not have, or whose value does not match the
/// storage type, are skipped and counted. Host write failures propagate.
pub fn apply_parameters<D: NativeDocument + ?Sized>(
    document: &mut D,
    element: &D::Handle,
    parameters: &[Parameter],
) -> Result<ParameterOutcome, CreationError> {
    let mut outcome = ParameterOutcome::default();

    for parameter in parameters {
        let target = parameter.target();
        match document.parameter_storage(element, target) {
            Some(storage) if storage.accepts(&parameter.value) => {
                document.set_parameter(element, target, &parameter.value)?;
                outcome.applied += 1;
            }
            Some(storage) => {
                tracing::debug!(
                    parameter = %parameter.name,
                    storage = ?storage,
                    value = parameter.value.type_name(),
                    "Skipping parameter with mismatched type"
                );
                outcome.skipped += 1;
            }
            None => {
                tracing::debug!(parameter = %parameter.name, "Skipping unknown parameter");
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_accepts_only_matching_values() {
        assert!(StorageType::Double.accepts(&ParameterValue::Double(1.0)));
        assert!(!StorageType::Double.accepts(&ParameterValue::Integer(1)));
        assert!(!StorageType::Integer.accepts(&ParameterValue::Double(1.0)));
        assert!(!StorageType::Text.accepts(&ParameterValue::Boolean(true)));

        let by_id = ParameterValue::ElementId(7);
        let by_name = ParameterValue::ElementName("L1".into());
        assert!(StorageType::ElementId.accepts(&by_id));
        assert!(StorageType::ElementId.accepts(&by_name));
        assert!(!StorageType::ElementId.accepts(&ParameterValue::Integer(7)));
    }
}
