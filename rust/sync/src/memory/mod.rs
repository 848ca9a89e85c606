// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory native document.
//!
//! A complete [`NativeDocument`] without a host application behind it:
//! numbered elements, a parameter schema, tags and snapshot based
//! transactions. The receiver service applies collections onto it and the
//! engine tests run against it.

mod builders;

pub use builders::{default_router, MemoryBuilder};

use std::collections::{BTreeMap, BTreeSet};

use grevit_core::{Catalog, ComponentKind, ComponentType, ParameterTarget, ParameterValue};

use crate::document::{NativeDocument, StorageType};
use crate::error::{CreationError, DocumentError};

/// Element handle of a [`MemoryDocument`].
pub type ElementId = u64;

/// A parameter every element of the document carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub id: i64,
    pub name: String,
    pub storage: StorageType,
}

/// One native element.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryElement {
    pub id: ElementId,
    pub category: String,
    pub family: String,
    pub type_name: String,
    /// Payload with coordinates already converted to native units.
    pub kind: ComponentKind,
    /// Element this one is hosted on.
    pub host: Option<ElementId>,
    pub tag: Option<String>,
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl MemoryElement {
    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }

    /// Display name used for by-name element lookups.
    pub fn name(&self) -> Option<&str> {
        let name = match &self.kind {
            ComponentKind::Level(k) => k.name.as_str(),
            ComponentKind::Grid(k) => k.name.as_str(),
            ComponentKind::Room(k) => k.name.as_str(),
            ComponentKind::ReferencePlane(k) => k.name.as_str(),
            _ => self.type_name.as_str(),
        };
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    name: String,
    elements: BTreeMap<ElementId, MemoryElement>,
    next_id: ElementId,
}

/// Element store with snapshot transactions.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    elements: BTreeMap<ElementId, MemoryElement>,
    next_id: ElementId,
    schema: Vec<ParameterDefinition>,
    loaded: Catalog,
    transaction: Option<Snapshot>,
    refuse_transactions: bool,
    refuse_commits: bool,
    pinned: BTreeSet<ElementId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document with the built-in parameter schema.
    pub fn new() -> Self {
        let schema = [
            (-1010106, "Comments", StorageType::Text),
            (-1001203, "Mark", StorageType::Text),
            (-1001107, "Offset", StorageType::Double),
            (-1001300, "Count", StorageType::Integer),
            (-1001400, "Structural", StorageType::Boolean),
            (-1001500, "Host", StorageType::ElementId),
        ]
        .into_iter()
        .map(|(id, name, storage)| ParameterDefinition {
            id,
            name: name.to_string(),
            storage,
        })
        .collect();

        Self {
            elements: BTreeMap::new(),
            next_id: 1,
            schema,
            loaded: Catalog::new(),
            transaction: None,
            refuse_transactions: false,
            refuse_commits: false,
            pinned: BTreeSet::new(),
        }
    }

    /// Document that already has some families loaded.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            loaded: catalog,
            ..Self::new()
        }
    }

    /// Adds a parameter to the schema, replacing one with the same name.
    pub fn define_parameter(&mut self, id: i64, name: &str, storage: StorageType) {
        self.schema.retain(|d| d.name != name);
        self.schema.push(ParameterDefinition {
            id,
            name: name.to_string(),
            storage,
        });
    }

    /// Makes every following `begin_transaction` fail.
    pub fn refuse_transactions(&mut self, refuse: bool) {
        self.refuse_transactions = refuse;
    }

    /// Makes every following `commit_transaction` fail. The transaction
    /// stays open so it can still be rolled back.
    pub fn refuse_commits(&mut self, refuse: bool) {
        self.refuse_commits = refuse;
    }

    /// Pins an element so `delete` refuses it.
    pub fn pin(&mut self, id: ElementId) {
        self.pinned.insert(id);
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, id: ElementId) -> Option<&MemoryElement> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut MemoryElement> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &MemoryElement> {
        self.elements.values()
    }

    /// Elements tagged with a GID, in id order.
    pub fn tagged(&self, gid: &str) -> Vec<&MemoryElement> {
        self.elements
            .values()
            .filter(|e| e.tag.as_deref() == Some(gid))
            .collect()
    }

    /// First element with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<&MemoryElement> {
        self.elements.values().find(|e| e.name() == Some(name))
    }

    /// Stores a new element and returns its id.
    ///
    /// The `id` field of the argument is overwritten.
    pub fn insert(&mut self, mut element: MemoryElement) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        element.id = id;
        self.elements.insert(id, element);
        id
    }

    /// Loaded families plus every family type placed in the document.
    pub fn catalog(&self) -> Catalog {
        let mut catalog = self.loaded.clone();
        for element in self.elements.values() {
            if !element.family.is_empty() {
                catalog.add_type(&element.category, &element.family, &element.type_name);
            }
        }
        catalog
    }

    fn definition(&self, target: ParameterTarget<'_>) -> Option<&ParameterDefinition> {
        match target {
            ParameterTarget::Name(name) => self.schema.iter().find(|d| d.name == name),
            ParameterTarget::Id(id) => self.schema.iter().find(|d| d.id == id),
        }
    }
}

impl NativeDocument for MemoryDocument {
    type Handle = ElementId;

    fn scan_tagged_elements(&self) -> Result<Vec<(String, ElementId)>, DocumentError> {
        Ok(self
            .elements
            .values()
            .filter_map(|e| e.tag.as_ref().map(|gid| (gid.clone(), e.id)))
            .collect())
    }

    fn parameter_storage(
        &self,
        element: &ElementId,
        target: ParameterTarget<'_>,
    ) -> Option<StorageType> {
        if !self.contains(*element) {
            return None;
        }
        self.definition(target).map(|d| d.storage)
    }

    fn set_parameter(
        &mut self,
        element: &ElementId,
        target: ParameterTarget<'_>,
        value: &ParameterValue,
    ) -> Result<(), CreationError> {
        let name = match self.definition(target) {
            Some(definition) => definition.name.clone(),
            None => {
                return Err(CreationError::Parameter {
                    name: format!("{target:?}"),
                    message: "not defined".to_string(),
                })
            }
        };

        let value = match value {
            ParameterValue::ElementName(wanted) => match self.find_by_name(wanted) {
                Some(found) => {
                    let id = i64::try_from(found.id).map_err(|_| CreationError::Parameter {
                        name: name.clone(),
                        message: format!("element id {} is out of range", found.id),
                    })?;
                    ParameterValue::ElementId(id)
                }
                None => {
                    return Err(CreationError::Lookup {
                        kind: "element",
                        name: wanted.clone(),
                    })
                }
            },
            other => other.clone(),
        };

        let target_element = self
            .elements
            .get_mut(element)
            .ok_or_else(|| CreationError::MissingReference(element.to_string()))?;
        target_element.parameters.insert(name, value);
        Ok(())
    }

    fn tag(&mut self, element: &ElementId, gid: &str) -> Result<(), CreationError> {
        let target = self
            .elements
            .get_mut(element)
            .ok_or_else(|| CreationError::MissingReference(element.to_string()))?;
        target.tag = Some(gid.to_string());
        Ok(())
    }

    fn delete(&mut self, element: &ElementId) -> Result<(), DocumentError> {
        if self.pinned.contains(element) {
            return Err(DocumentError::Delete {
                element: element.to_string(),
                message: "element is pinned".to_string(),
            });
        }
        match self.elements.remove(element) {
            Some(_) => Ok(()),
            None => Err(DocumentError::Delete {
                element: element.to_string(),
                message: "no such element".to_string(),
            }),
        }
    }

    fn begin_transaction(&mut self, name: &str) -> Result<(), DocumentError> {
        if self.refuse_transactions {
            return Err(DocumentError::Transaction {
                name: name.to_string(),
                message: "document is read-only".to_string(),
            });
        }
        if let Some(open) = &self.transaction {
            return Err(DocumentError::Transaction {
                name: name.to_string(),
                message: format!("transaction '{}' is still open", open.name),
            });
        }
        self.transaction = Some(Snapshot {
            name: name.to_string(),
            elements: self.elements.clone(),
            next_id: self.next_id,
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), DocumentError> {
        let Some(open) = &self.transaction else {
            return Err(DocumentError::Transaction {
                name: String::new(),
                message: "no open transaction".to_string(),
            });
        };
        if self.refuse_commits {
            return Err(DocumentError::Transaction {
                name: open.name.clone(),
                message: "commit refused".to_string(),
            });
        }
        self.transaction = None;
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        if let Some(snapshot) = self.transaction.take() {
            tracing::debug!(transaction = %snapshot.name, "Rolling back");
            self.elements = snapshot.elements;
            self.next_id = snapshot.next_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grevit_core::{Level, Line};

    fn level(name: &str) -> MemoryElement {
        MemoryElement {
            id: 0,
            category: "Levels".into(),
            family: String::new(),
            type_name: String::new(),
            kind: Level {
                name: name.into(),
                ..Default::default()
            }
            .into(),
            host: None,
            tag: None,
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn rollback_restores_elements_and_ids() {
        let mut doc = MemoryDocument::new();
        let first = doc.insert(level("L1"));

        doc.begin_transaction("t").unwrap();
        doc.insert(level("L2"));
        doc.delete(&first).unwrap();
        doc.rollback_transaction();

        assert_eq!(doc.len(), 1);
        assert!(doc.contains(first));
        assert_eq!(doc.insert(level("L3")), 2);
    }

    #[test]
    fn transactions_do_not_nest() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction("outer").unwrap();
        assert!(doc.begin_transaction("inner").is_err());
        doc.commit_transaction().unwrap();
        assert!(doc.commit_transaction().is_err());
    }

    #[test]
    fn parameter_by_id_and_element_name() {
        let mut doc = MemoryDocument::new();
        let l1 = doc.insert(level("Level 1"));
        let el = doc.insert(MemoryElement {
            kind: Line::default().into(),
            ..level("")
        });

        assert_eq!(
            doc.parameter_storage(&el, ParameterTarget::Id(-1001203)),
            Some(StorageType::Text)
        );
        assert_eq!(
            doc.parameter_storage(&el, ParameterTarget::Name("Nope")),
            None
        );

        doc.set_parameter(
            &el,
            ParameterTarget::Name("Host"),
            &ParameterValue::ElementName("Level 1".into()),
        )
        .unwrap();
        assert_eq!(
            doc.element(el).unwrap().parameters.get("Host"),
            Some(&ParameterValue::ElementId(l1 as i64))
        );

        let missing = doc.set_parameter(
            &el,
            ParameterTarget::Name("Host"),
            &ParameterValue::ElementName("Level 9".into()),
        );
        assert!(matches!(missing, Err(CreationError::Lookup { .. })));
    }

    #[test]
    fn refused_commit_can_be_rolled_back() {
        let mut doc = MemoryDocument::new();
        doc.refuse_commits(true);

        doc.begin_transaction("t").unwrap();
        doc.insert(level("L1"));
        assert!(doc.commit_transaction().is_err());
        assert!(doc.in_transaction());

        doc.rollback_transaction();
        assert!(doc.is_empty());
    }

    #[test]
    fn pinned_element_survives_delete() {
        let mut doc = MemoryDocument::new();
        let id = doc.insert(level("L1"));
        doc.pin(id);

        assert!(matches!(doc.delete(&id), Err(DocumentError::Delete { .. })));
        assert!(doc.contains(id));
    }

    #[test]
    fn deleting_twice_fails() {
        let mut doc = MemoryDocument::new();
        let id = doc.insert(level("L1"));

        doc.delete(&id).unwrap();
        assert!(doc.is_empty());
        assert!(doc.delete(&id).is_err());
    }
}
