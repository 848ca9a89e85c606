// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain geometric values embedded in components.
//!
//! These carry no identity of their own. Coordinates are in sender units;
//! the collection's `scale` converts them at the native boundary.

use serde::{Deserialize, Serialize};

/// A location in 3D space with an optional reference id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Sender-side reference id of the point, empty when unused.
    pub id: String,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            id: String::new(),
        }
    }

    /// Returns the point multiplied by a unit conversion factor.
    ///
    /// The reference id is kept as-is.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
            id: self.id.clone(),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A planar face given by three or four corners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Face {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    /// Ignored when `is_triangle` is set.
    pub d: Point,
    pub is_triangle: bool,
}

impl Face {
    /// Corners of the face in order, three for triangles.
    pub fn corners(&self) -> Vec<&Point> {
        if self.is_triangle {
            vec![&self.a, &self.b, &self.c]
        } else {
            vec![&self.a, &self.b, &self.c, &self.d]
        }
    }
}

/// Structural role of a family instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralType {
    Beam,
    Brace,
    Column,
    Footing,
    #[default]
    NonStructural,
    UnknownFraming,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scaled_keeps_reference_id() {
        let mut p = Point::new(1.0, 2.0, 3.0);
        p.id = "p1".to_string();

        let s = p.scaled(3.28084);
        assert_relative_eq!(s.x, 3.28084);
        assert_relative_eq!(s.y, 6.56168);
        assert_relative_eq!(s.z, 9.84252);
        assert_eq!(s.id, "p1");
    }

    #[test]
    fn distance_between_points() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 12.0);
        assert_relative_eq!(a.distance_to(&b), 13.0);
    }

    #[test]
    fn triangle_face_has_three_corners() {
        let face = Face {
            a: Point::new(0.0, 0.0, 0.0),
            b: Point::new(1.0, 0.0, 0.0),
            c: Point::new(0.0, 1.0, 0.0),
            d: Point::default(),
            is_triangle: true,
        };
        assert_eq!(face.corners().len(), 3);
    }

    #[test]
    fn missing_point_fields_default_to_zero() {
        let p: Point = serde_json::from_str(r#"{"x":1.5}"#).unwrap();
        assert_eq!(p, Point::new(1.5, 0.0, 0.0));
    }
}
