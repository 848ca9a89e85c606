// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed name/value parameters attached to components.

use serde::{Deserialize, Serialize};

/// A dynamically typed parameter value.
///
/// The variant is carried on the wire so a double such as `3.0` never
/// comes back as an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ParameterValue {
    Text(String),
    Double(f64),
    Integer(i64),
    Boolean(bool),
    /// Reference to a native element by its numeric id.
    ElementId(i64),
    /// Reference to a native element looked up by name on the target.
    ElementName(String),
}

impl ParameterValue {
    /// Short name of the value's type, used in log output.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Text(_) => "text",
            ParameterValue::Double(_) => "double",
            ParameterValue::Integer(_) => "integer",
            ParameterValue::Boolean(_) => "boolean",
            ParameterValue::ElementId(_) => "element id",
            ParameterValue::ElementName(_) => "element name",
        }
    }

    /// True for the two element reference forms.
    pub fn is_element_reference(&self) -> bool {
        matches!(
            self,
            ParameterValue::ElementId(_) | ParameterValue::ElementName(_)
        )
    }
}

/// How a parameter name addresses the target parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterTarget<'a> {
    /// Lookup by display name.
    Name(&'a str),
    /// Lookup by the host's numeric parameter id.
    Id(i64),
}

/// A named parameter value to apply onto the created native element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParameterValue::Text(value.into()))
    }

    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, ParameterValue::Double(value))
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ParameterValue::Integer(value))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, ParameterValue::Boolean(value))
    }

    /// Resolves the name into a lookup target.
    ///
    /// A name that parses as an integer addresses the parameter id.
    pub fn target(&self) -> ParameterTarget<'_> {
        match self.name.trim().parse::<i64>() {
            Ok(id) => ParameterTarget::Id(id),
            Err(_) => ParameterTarget::Name(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_name_targets_parameter_id() {
        let p = Parameter::text("-1001203", "x");
        assert_eq!(p.target(), ParameterTarget::Id(-1001203));

        let p = Parameter::text("Comments", "x");
        assert_eq!(p.target(), ParameterTarget::Name("Comments"));
    }

    #[test]
    fn double_keeps_its_kind_on_the_wire() {
        let p = Parameter::double("Offset", 3.0);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Offset","value":{"kind":"double","value":3.0}}"#
        );

        let back: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, ParameterValue::Double(3.0));
    }

    #[test]
    fn element_references() {
        assert!(ParameterValue::ElementId(42).is_element_reference());
        let by_name = ParameterValue::ElementName("Level 1".into());
        assert!(by_name.is_element_reference());
        assert!(!ParameterValue::Integer(42).is_element_reference());
    }
}
