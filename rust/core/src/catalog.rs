// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target-side catalog of categories, families and types.
//!
//! The receiver answers every payload with its catalog so the sender can
//! offer valid style/family/type names.

use serde::{Deserialize, Serialize};

/// A loadable family and its type names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Family {
    pub name: String,
    pub types: Vec<String>,
}

/// A category grouping families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub name: String,
    pub families: Vec<Family>,
}

/// Everything the target document knows how to place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a family type, creating the category and family as needed.
    ///
    /// Duplicate type names are ignored. Insertion order is kept.
    pub fn add_type(&mut self, category: &str, family: &str, type_name: &str) {
        let category_index = match self.categories.iter().position(|c| c.name == category) {
            Some(index) => index,
            None => {
                self.categories.push(Category {
                    name: category.to_string(),
                    families: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        let families = &mut self.categories[category_index].families;

        let family_index = match families.iter().position(|f| f.name == family) {
            Some(index) => index,
            None => {
                families.push(Family {
                    name: family.to_string(),
                    types: Vec::new(),
                });
                families.len() - 1
            }
        };
        let types = &mut families[family_index].types;

        if !type_name.is_empty() && !types.iter().any(|t| t == type_name) {
            types.push(type_name.to_string());
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// First family with the given name in any category.
    pub fn family(&self, name: &str) -> Option<&Family> {
        self.categories
            .iter()
            .flat_map(|c| c.families.iter())
            .find(|f| f.name == name)
    }

    /// Type names of a family, empty when the family is unknown.
    pub fn types_of(&self, family: &str) -> &[String] {
        self.family(family)
            .map(|f| f.types.as_slice())
            .unwrap_or(&[])
    }

    pub fn family_count(&self) -> usize {
        self.categories.iter().map(|c| c.families.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_type_builds_tree() {
        let mut catalog = Catalog::new();
        catalog.add_type("Walls", "Basic Wall", "Generic - 200mm");
        catalog.add_type("Walls", "Basic Wall", "Generic - 300mm");
        catalog.add_type("Walls", "Basic Wall", "Generic - 200mm");
        catalog.add_type("Doors", "Single-Flush", "0915 x 2134mm");

        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.family_count(), 2);
        assert_eq!(
            catalog.types_of("Basic Wall"),
            &["Generic - 200mm".to_string(), "Generic - 300mm".to_string()]
        );
        assert!(catalog.category("Doors").is_some());
    }

    #[test]
    fn unknown_family_has_no_types() {
        let catalog = Catalog::new();
        assert!(catalog.types_of("Nope").is_empty());
        assert!(catalog.is_empty());
    }
}
