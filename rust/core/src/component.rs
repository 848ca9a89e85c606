// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The component model.
//!
//! A [`Component`] is the unit of synchronization: a stable identity (GID),
//! target-side style selectors, a parameter list and a concrete
//! [`ComponentKind`]. Kinds that are built from other components (a wall's
//! baseline, a slab's outline loops) embed full components, so every nested
//! slot carries its own `"type"` discriminant on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Face, Point, StructuralType};
use crate::parameter::Parameter;

/// A typed geometric or architectural component with a stable identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Client-assigned identity, stable across runs. Empty means none.
    #[serde(default)]
    pub gid: String,
    /// Family name (BIM hosts) or style name (CAD hosts). Empty = default.
    #[serde(default)]
    pub family_or_style: String,
    /// Type name (BIM hosts) or layer name (CAD hosts). Empty = default.
    #[serde(default)]
    pub type_or_layer: String,
    /// Build after the first pass because it references another component.
    #[serde(default)]
    pub stalled_for_reference: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

impl Component {
    /// Creates a component with no identity and default selectors.
    pub fn new(kind: impl Into<ComponentKind>) -> Self {
        Self {
            gid: String::new(),
            family_or_style: String::new(),
            type_or_layer: String::new(),
            stalled_for_reference: false,
            parameters: Vec::new(),
            kind: kind.into(),
        }
    }

    /// Returns a fresh random identity.
    pub fn new_gid() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn with_gid(mut self, gid: impl Into<String>) -> Self {
        self.gid = gid.into();
        self
    }

    pub fn with_style(
        mut self,
        family_or_style: impl Into<String>,
        type_or_layer: impl Into<String>,
    ) -> Self {
        self.family_or_style = family_or_style.into();
        self.type_or_layer = type_or_layer.into();
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Marks the component as deferred to the reference pass.
    pub fn stalled(mut self) -> Self {
        self.stalled_for_reference = true;
        self
    }

    /// True when the component carries a usable identity.
    pub fn has_identity(&self) -> bool {
        !self.gid.trim().is_empty()
    }

    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }

    /// GID of the element this component must be attached to.
    ///
    /// `None` for kinds that have no reference slot. `Some("")` is returned
    /// when the kind has the slot but it was left empty.
    pub fn reference_gid(&self) -> Option<&str> {
        match &self.kind {
            ComponentKind::FamilyInstance(k) => Some(&k.reference_gid),
            ComponentKind::SpotCoordinate(k) => Some(&k.reference_gid),
            ComponentKind::Door(k) => Some(&k.reference_gid),
            ComponentKind::CurtainGridLine(k) => Some(&k.reference_gid),
            _ => None,
        }
    }

    /// Components embedded directly in this one, in field order.
    pub fn nested(&self) -> Vec<&Component> {
        match &self.kind {
            ComponentKind::Wall(k) => k.curve.as_deref().into_iter().collect(),
            ComponentKind::WallProfileBased(k) => k.curves.iter().collect(),
            ComponentKind::Slab(k) => k.outline.iter().flat_map(|l| l.outline.iter()).collect(),
            ComponentKind::CurveElement(k) => k.curve.as_deref().into_iter().collect(),
            ComponentKind::Stair(k) => [&k.front, &k.back, &k.left, &k.right]
                .into_iter()
                .filter_map(|c| c.as_deref())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.component_type(), self.gid)?;
        if !self.family_or_style.is_empty() {
            write!(f, " ({})", self.family_or_style)?;
        }
        if !self.type_or_layer.is_empty() {
            write!(f, " ({})", self.type_or_layer)?;
        }
        Ok(())
    }
}

/// A closed loop of curve components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loop {
    pub outline: Vec<Component>,
}

/// Straight segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub from: Point,
    pub to: Point,
    /// Target view for view-specific (detail) lines.
    pub view: String,
}

/// Circular arc around a center, angles in radians.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arc {
    pub center: Point,
    pub start: f64,
    pub end: f64,
    pub radius: f64,
}

/// Arc through three points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Curve3Points {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// NURBS curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spline {
    pub control_points: Vec<Point>,
    pub weights: Vec<f64>,
    pub knots: Vec<f64>,
    pub degree: u32,
    pub is_periodic: bool,
    pub is_closed: bool,
    pub is_rational: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingPoint {
    pub point: Point,
}

/// Curve based wall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Wall {
    /// Baseline: a Line, Arc, Curve3Points, Polyline or Spline component.
    pub curve: Option<Box<Component>>,
    pub level_bottom: String,
    pub height: f64,
    pub join: bool,
    pub flip: bool,
}

/// Wall built from a closed elevation profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallProfileBased {
    pub curves: Vec<Component>,
    pub level: String,
}

/// Floor slab bounded by one outer loop and optional inner loops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Slab {
    pub outline: Vec<Loop>,
    pub level_bottom: String,
    /// Slope arrow start.
    pub bottom: Point,
    /// Slope arrow end.
    pub top: Point,
    pub slope: f64,
    pub height: f64,
    pub structural: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Column {
    pub location: Point,
    pub location_top: Point,
    pub level_bottom: String,
    pub structural: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    pub height: f64,
    /// Also create a plan view for the level.
    pub add_view: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextNote {
    pub location: Point,
    pub text: String,
    pub view: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grid {
    pub from: Point,
    pub to: Point,
    pub name: String,
}

/// Spot coordinate annotation placed on a referenced element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpotCoordinate {
    pub location_point: Point,
    pub reference_gid: String,
    pub view: String,
    pub bend_point: Point,
    pub end_point: Point,
    pub ref_point: Point,
    pub has_leader: bool,
    pub is_elevation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topography {
    pub points: Vec<Point>,
}

/// Point based family instance, optionally hosted on a referenced element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyInstance {
    pub points: Vec<Point>,
    pub view: String,
    pub level: String,
    pub structural_type: StructuralType,
    pub reference_gid: String,
}

/// Room or space. Hosts without boundary support place it unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub name: String,
    pub number: String,
    pub phase: String,
    pub associative: bool,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferencePlane {
    pub end_a: Point,
    pub end_b: Point,
    pub cut_vector: Point,
    pub name: String,
    pub view: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hatch {
    pub outline: Vec<Point>,
    pub view: String,
    pub pattern: String,
}

/// Extruded point outline with optional slant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extrusion {
    pub outline: Vec<Point>,
    pub height: f64,
    pub slanted: f64,
}

/// Polyline extruded along a vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleExtrusion {
    pub polyline: Polyline,
    pub vector: Point,
}

/// Door inserted into a referenced wall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Door {
    pub location_point: Point,
    pub reference_gid: String,
}

/// Numbered placement point of an adaptive component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptivePoint {
    pub index: u32,
    pub point: Point,
}

/// Adaptive component driven by numbered placement points.
///
/// Points are a list rather than a map: integer map keys do not survive
/// the buffered decoding of tagged variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adaptive {
    pub points: Vec<AdaptivePoint>,
}

impl Adaptive {
    /// Placement points sorted by their number.
    pub fn ordered_points(&self) -> Vec<&Point> {
        let mut sorted: Vec<&AdaptivePoint> = self.points.iter().collect();
        sorted.sort_by_key(|p| p.index);
        sorted.into_iter().map(|p| &p.point).collect()
    }
}

/// Model or detail curve element wrapping a curve component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurveElement {
    pub curve: Option<Box<Component>>,
    pub is_detail_curve: bool,
    pub is_model_curve: bool,
    pub is_room_bounding: bool,
}

/// Stair run bounded by four edge curves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stair {
    pub front: Option<Box<Component>>,
    pub back: Option<Box<Component>>,
    pub left: Option<Box<Component>>,
    pub right: Option<Box<Component>>,
}

/// Swaps the panel type of a curtain panel between two grid lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurtainPanel {
    pub panel_id: i64,
    pub panel_type: String,
    pub vertical_gid: String,
    pub horizontal_gid: String,
}

/// Grid line on a referenced curtain wall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurtainGridLine {
    pub point: Point,
    pub reference_gid: String,
    pub horizontal: bool,
    pub single: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faces {
    pub faces: Vec<Face>,
}

macro_rules! component_kinds {
    ($($variant:ident),+ $(,)?) => {
        /// Concrete payload of a component, tagged by `"type"` on the wire.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum ComponentKind {
            $($variant($variant),)+
        }

        /// Discriminant of [`ComponentKind`], used as the dispatch key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentType {
            $($variant,)+
        }

        impl ComponentKind {
            pub fn component_type(&self) -> ComponentType {
                match self {
                    $(ComponentKind::$variant(_) => ComponentType::$variant,)+
                }
            }
        }

        impl ComponentType {
            /// Every component type, in declaration order.
            pub const ALL: &'static [ComponentType] = &[$(ComponentType::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ComponentType::$variant => stringify!($variant),)+
                }
            }
        }

        $(
            impl From<$variant> for ComponentKind {
                fn from(kind: $variant) -> Self {
                    ComponentKind::$variant(kind)
                }
            }
        )+
    };
}

component_kinds!(
    Line,
    Arc,
    Curve3Points,
    Polyline,
    Spline,
    DrawingPoint,
    Wall,
    WallProfileBased,
    Slab,
    Column,
    Level,
    TextNote,
    Grid,
    SpotCoordinate,
    Topography,
    FamilyInstance,
    Room,
    ReferencePlane,
    Hatch,
    Extrusion,
    SimpleExtrusion,
    Door,
    Adaptive,
    CurveElement,
    Stair,
    CurtainPanel,
    CurtainGridLine,
    Faces,
);

impl ComponentType {
    /// Curve kinds that can serve as a wall baseline or loop edge.
    pub fn is_curve(&self) -> bool {
        matches!(
            self,
            ComponentType::Line
                | ComponentType::Arc
                | ComponentType::Curve3Points
                | ComponentType::Polyline
                | ComponentType::Spline
        )
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, x1: f64) -> Component {
        Component::new(Line {
            from: Point::new(x0, 0.0, 0.0),
            to: Point::new(x1, 0.0, 0.0),
            view: String::new(),
        })
    }

    #[test]
    fn reference_gid_only_on_reference_kinds() {
        let door = Component::new(Door {
            location_point: Point::default(),
            reference_gid: "wall-1".into(),
        });
        assert_eq!(door.reference_gid(), Some("wall-1"));

        let empty_instance = Component::new(FamilyInstance::default());
        assert_eq!(empty_instance.reference_gid(), Some(""));

        assert_eq!(line(0.0, 1.0).reference_gid(), None);
    }

    #[test]
    fn nested_collects_embedded_components() {
        let wall = Component::new(Wall {
            curve: Some(Box::new(line(0.0, 5.0))),
            ..Default::default()
        });
        assert_eq!(wall.nested().len(), 1);

        let slab = Component::new(Slab {
            outline: vec![
                Loop {
                    outline: vec![line(0.0, 1.0), line(1.0, 2.0)],
                },
                Loop {
                    outline: vec![line(0.2, 0.4)],
                },
            ],
            ..Default::default()
        });
        assert_eq!(slab.nested().len(), 3);

        let stair = Component::new(Stair {
            front: Some(Box::new(line(0.0, 1.0))),
            back: None,
            left: Some(Box::new(line(1.0, 2.0))),
            right: None,
        });
        assert_eq!(stair.nested().len(), 2);
    }

    #[test]
    fn component_type_names() {
        assert_eq!(ComponentType::Curve3Points.as_str(), "Curve3Points");
        assert_eq!(ComponentType::ALL.len(), 28);
        assert!(ComponentType::Spline.is_curve());
        assert!(!ComponentType::Wall.is_curve());
    }

    #[test]
    fn identity_ignores_blank_gid() {
        assert!(!line(0.0, 1.0).has_identity());
        assert!(!line(0.0, 1.0).with_gid("  ").has_identity());
        assert!(line(0.0, 1.0).with_gid("a").has_identity());
    }

    #[test]
    fn adaptive_points_sorted_by_index() {
        let adaptive = Adaptive {
            points: vec![
                AdaptivePoint {
                    index: 2,
                    point: Point::new(2.0, 0.0, 0.0),
                },
                AdaptivePoint {
                    index: 1,
                    point: Point::new(1.0, 0.0, 0.0),
                },
            ],
        };
        let xs: Vec<f64> = adaptive.ordered_points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }

    #[test]
    fn new_gid_is_unique() {
        assert_ne!(Component::new_gid(), Component::new_gid());
    }

    #[test]
    fn display_names_type_and_selectors() {
        let c = line(0.0, 1.0).with_gid("g1").with_style("Lines", "A-WALL");
        assert_eq!(c.to_string(), "Line g1 (Lines) (A-WALL)");
    }
}
