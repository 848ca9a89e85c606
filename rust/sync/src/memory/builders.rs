// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builders placing components into a [`MemoryDocument`].

use std::collections::BTreeMap;

use grevit_core::{Component, ComponentKind, ComponentType, Point};

use super::{ElementId, MemoryDocument, MemoryElement};
use crate::error::CreationError;
use crate::router::{BuildRequest, BuilderRouter, ComponentBuilder};

/// Router with a builder for every component type.
pub fn default_router() -> BuilderRouter<MemoryDocument> {
    use ComponentType::*;

    let mut router = BuilderRouter::new();
    router.register(Box::new(MemoryBuilder::new(
        "Lines",
        &[Line, Arc, Curve3Points, Polyline, Spline, CurveElement],
    )));
    router.register(Box::new(MemoryBuilder::new("Points", &[DrawingPoint])));
    router.register(Box::new(MemoryBuilder::new("Walls", &[Wall, WallProfileBased])));
    router.register(Box::new(MemoryBuilder::new("Floors", &[Slab])));
    router.register(Box::new(MemoryBuilder::new("Columns", &[Column])));
    router.register(Box::new(MemoryBuilder::new("Levels", &[Level])));
    router.register(Box::new(MemoryBuilder::new("Text Notes", &[TextNote])));
    router.register(Box::new(MemoryBuilder::new("Grids", &[Grid])));
    router.register(Box::new(MemoryBuilder::new("Topography", &[Topography])));
    router.register(Box::new(MemoryBuilder::new("Rooms", &[Room])));
    router.register(Box::new(MemoryBuilder::new("Reference Planes", &[ReferencePlane])));
    router.register(Box::new(MemoryBuilder::new("Filled Regions", &[Hatch])));
    router.register(Box::new(MemoryBuilder::new(
        "Mass",
        &[Extrusion, SimpleExtrusion, Faces],
    )));
    router.register(Box::new(MemoryBuilder::new("Adaptive Components", &[Adaptive])));
    router.register(Box::new(MemoryBuilder::new("Stairs", &[Stair])));
    router.register(Box::new(MemoryBuilder::new("Curtain Panels", &[CurtainPanel])));
    router.register(Box::new(MemoryBuilder::hosted("Doors", &[Door])));
    router.register(Box::new(MemoryBuilder::hosted("Generic Models", &[FamilyInstance])));
    router.register(Box::new(MemoryBuilder::hosted("Spot Coordinates", &[SpotCoordinate])));
    router.register(Box::new(MemoryBuilder::hosted("Curtain Grids", &[CurtainGridLine])));
    router
}

/// Upserting builder for one category of elements.
///
/// Geometry is checked, scaled into native units and stored. When the
/// request carries an existing element of the same type it is rewritten in
/// place; otherwise a new element is inserted.
#[derive(Debug, Clone)]
pub struct MemoryBuilder {
    category: &'static str,
    types: Vec<ComponentType>,
    hosted: bool,
}

impl MemoryBuilder {
    pub fn new(category: &'static str, types: &[ComponentType]) -> Self {
        Self {
            category,
            types: types.to_vec(),
            hosted: false,
        }
    }

    /// Builder whose elements can be hosted on a reference element.
    pub fn hosted(category: &'static str, types: &[ComponentType]) -> Self {
        Self {
            hosted: true,
            ..Self::new(category, types)
        }
    }
}

impl ComponentBuilder<MemoryDocument> for MemoryBuilder {
    fn build(
        &self,
        document: &mut MemoryDocument,
        request: BuildRequest<'_, ElementId>,
    ) -> Result<Option<ElementId>, CreationError> {
        let component = request.component;
        validate(component)?;
        check_levels(document, component)?;

        let host = match request.reference {
            Some(reference) if !document.contains(*reference) => {
                return Err(CreationError::MissingReference(reference.to_string()))
            }
            Some(reference) => Some(*reference),
            None => None,
        };

        let mut kind = component.kind.clone();
        scale_kind(&mut kind, request.scale);

        if let Some(existing) = request.existing {
            if let Some(element) = document.element_mut(*existing) {
                if element.component_type() == component.component_type() {
                    element.category = self.category.to_string();
                    element.family = component.family_or_style.clone();
                    element.type_name = component.type_or_layer.clone();
                    element.kind = kind;
                    if host.is_some() {
                        element.host = host;
                    }
                    return Ok(Some(*existing));
                }
            }
        }

        let id = document.insert(MemoryElement {
            id: 0,
            category: self.category.to_string(),
            family: component.family_or_style.clone(),
            type_name: component.type_or_layer.clone(),
            kind,
            host,
            tag: None,
            parameters: BTreeMap::new(),
        });
        Ok(Some(id))
    }

    fn supported_types(&self) -> Vec<ComponentType> {
        self.types.clone()
    }

    fn accepts_reference(&self) -> bool {
        self.hosted
    }
}

fn is_curve(component: &Component) -> bool {
    component.component_type().is_curve()
}

/// Rejects components a host could not place.
fn validate(component: &Component) -> Result<(), CreationError> {
    match &component.kind {
        ComponentKind::Line(k) => {
            if k.from.distance_to(&k.to) < 1e-9 {
                return Err(CreationError::missing_geometry("line has zero length"));
            }
        }
        ComponentKind::Polyline(k) if k.points.len() < 2 => {
            return Err(CreationError::missing_geometry("polyline needs two points"));
        }
        ComponentKind::Spline(k) if k.control_points.len() < 2 => {
            return Err(CreationError::missing_geometry("spline needs two control points"));
        }
        ComponentKind::Wall(k) => match k.curve.as_deref() {
            None => return Err(CreationError::missing_geometry("wall has no baseline")),
            Some(curve) if !is_curve(curve) => {
                return Err(CreationError::host(format!(
                    "wall baseline must be a curve, got {}",
                    curve.component_type()
                )))
            }
            Some(_) => {}
        },
        ComponentKind::WallProfileBased(k) if k.curves.is_empty() => {
            return Err(CreationError::missing_geometry("wall profile is empty"));
        }
        ComponentKind::Slab(k) if k.outline.iter().all(|l| l.outline.is_empty()) => {
            return Err(CreationError::missing_geometry("slab outline is empty"));
        }
        ComponentKind::CurveElement(k) if k.curve.is_none() => {
            return Err(CreationError::missing_geometry("curve element has no curve"));
        }
        ComponentKind::Stair(k)
            if [&k.front, &k.back, &k.left, &k.right]
                .iter()
                .any(|edge| edge.is_none()) =>
        {
            return Err(CreationError::missing_geometry("stair needs four edges"));
        }
        ComponentKind::Topography(k) if k.points.len() < 3 => {
            return Err(CreationError::missing_geometry("topography needs three points"));
        }
        ComponentKind::Hatch(k) if k.outline.len() < 3 => {
            return Err(CreationError::missing_geometry("hatch outline needs three points"));
        }
        ComponentKind::Extrusion(k) if k.outline.len() < 3 => {
            return Err(CreationError::missing_geometry("extrusion outline needs three points"));
        }
        ComponentKind::FamilyInstance(k) if k.points.is_empty() => {
            return Err(CreationError::missing_geometry("family instance has no location"));
        }
        ComponentKind::Adaptive(k) if k.points.is_empty() => {
            return Err(CreationError::missing_geometry("adaptive component has no points"));
        }
        ComponentKind::Faces(k) if k.faces.is_empty() => {
            return Err(CreationError::missing_geometry("no faces"));
        }
        _ => {}
    }
    Ok(())
}

/// Named levels must already exist in the document.
fn check_levels(document: &MemoryDocument, component: &Component) -> Result<(), CreationError> {
    let level = match &component.kind {
        ComponentKind::Wall(k) => k.level_bottom.as_str(),
        ComponentKind::WallProfileBased(k) => k.level.as_str(),
        ComponentKind::Slab(k) => k.level_bottom.as_str(),
        ComponentKind::Column(k) => k.level_bottom.as_str(),
        ComponentKind::FamilyInstance(k) => k.level.as_str(),
        _ => "",
    };
    if level.is_empty() {
        return Ok(());
    }

    let found = document
        .elements()
        .any(|e| e.component_type() == ComponentType::Level && e.name() == Some(level));
    if found {
        Ok(())
    } else {
        Err(CreationError::Lookup {
            kind: "level",
            name: level.to_string(),
        })
    }
}

fn scale_point(point: &mut Point, factor: f64) {
    *point = point.scaled(factor);
}

fn scale_points(points: &mut [Point], factor: f64) {
    for point in points {
        scale_point(point, factor);
    }
}

fn scale_component(component: &mut Component, factor: f64) {
    scale_kind(&mut component.kind, factor);
}

/// Converts every coordinate and length into native units.
fn scale_kind(kind: &mut ComponentKind, factor: f64) {
    if factor == 1.0 {
        return;
    }

    match kind {
        ComponentKind::Line(k) => {
            scale_point(&mut k.from, factor);
            scale_point(&mut k.to, factor);
        }
        ComponentKind::Arc(k) => {
            scale_point(&mut k.center, factor);
            k.radius *= factor;
        }
        ComponentKind::Curve3Points(k) => {
            scale_point(&mut k.a, factor);
            scale_point(&mut k.b, factor);
            scale_point(&mut k.c, factor);
        }
        ComponentKind::Polyline(k) => scale_points(&mut k.points, factor),
        ComponentKind::Spline(k) => scale_points(&mut k.control_points, factor),
        ComponentKind::DrawingPoint(k) => scale_point(&mut k.point, factor),
        ComponentKind::Wall(k) => {
            if let Some(curve) = k.curve.as_deref_mut() {
                scale_component(curve, factor);
            }
            k.height *= factor;
        }
        ComponentKind::WallProfileBased(k) => {
            for curve in &mut k.curves {
                scale_component(curve, factor);
            }
        }
        ComponentKind::Slab(k) => {
            for edge in k.outline.iter_mut().flat_map(|l| l.outline.iter_mut()) {
                scale_component(edge, factor);
            }
            scale_point(&mut k.bottom, factor);
            scale_point(&mut k.top, factor);
            k.height *= factor;
        }
        ComponentKind::Column(k) => {
            scale_point(&mut k.location, factor);
            scale_point(&mut k.location_top, factor);
        }
        ComponentKind::Level(k) => k.height *= factor,
        ComponentKind::TextNote(k) => scale_point(&mut k.location, factor),
        ComponentKind::Grid(k) => {
            scale_point(&mut k.from, factor);
            scale_point(&mut k.to, factor);
        }
        ComponentKind::SpotCoordinate(k) => {
            scale_point(&mut k.location_point, factor);
            scale_point(&mut k.bend_point, factor);
            scale_point(&mut k.end_point, factor);
            scale_point(&mut k.ref_point, factor);
        }
        ComponentKind::Topography(k) => scale_points(&mut k.points, factor),
        ComponentKind::FamilyInstance(k) => scale_points(&mut k.points, factor),
        ComponentKind::Room(k) => scale_points(&mut k.points, factor),
        ComponentKind::ReferencePlane(k) => {
            scale_point(&mut k.end_a, factor);
            scale_point(&mut k.end_b, factor);
        }
        ComponentKind::Hatch(k) => scale_points(&mut k.outline, factor),
        ComponentKind::Extrusion(k) => {
            scale_points(&mut k.outline, factor);
            k.height *= factor;
        }
        ComponentKind::SimpleExtrusion(k) => {
            scale_points(&mut k.polyline.points, factor);
            scale_point(&mut k.vector, factor);
        }
        ComponentKind::Door(k) => scale_point(&mut k.location_point, factor),
        ComponentKind::Adaptive(k) => {
            for placement in &mut k.points {
                scale_point(&mut placement.point, factor);
            }
        }
        ComponentKind::CurveElement(k) => {
            if let Some(curve) = k.curve.as_deref_mut() {
                scale_component(curve, factor);
            }
        }
        ComponentKind::Stair(k) => {
            for edge in [&mut k.front, &mut k.back, &mut k.left, &mut k.right] {
                if let Some(edge) = edge.as_deref_mut() {
                    scale_component(edge, factor);
                }
            }
        }
        ComponentKind::CurtainPanel(_) => {}
        ComponentKind::CurtainGridLine(k) => scale_point(&mut k.point, factor),
        ComponentKind::Faces(k) => {
            for face in &mut k.faces {
                scale_point(&mut face.a, factor);
                scale_point(&mut face.b, factor);
                scale_point(&mut face.c, factor);
                scale_point(&mut face.d, factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use grevit_core::{Arc, Line, Wall};

    #[test]
    fn scaling_reaches_nested_curves() {
        let mut kind: ComponentKind = Wall {
            curve: Some(Box::new(Component::new(Arc {
                center: Point::new(1.0, 2.0, 0.0),
                radius: 2.0,
                ..Default::default()
            }))),
            height: 3.0,
            ..Default::default()
        }
        .into();

        scale_kind(&mut kind, 3.28084);

        let ComponentKind::Wall(wall) = kind else {
            panic!("expected wall");
        };
        assert_relative_eq!(wall.height, 9.84252);
        let Some(ComponentKind::Arc(arc)) = wall.curve.map(|c| c.kind) else {
            panic!("expected arc baseline");
        };
        assert_relative_eq!(arc.center.y, 6.56168);
        assert_relative_eq!(arc.radius, 6.56168);
    }

    #[test]
    fn wall_without_baseline_is_rejected() {
        let wall = Component::new(Wall::default());
        assert!(matches!(
            validate(&wall),
            Err(CreationError::MissingGeometry(_))
        ));

        let bad = Component::new(Wall {
            curve: Some(Box::new(Component::new(Wall::default()))),
            ..Default::default()
        });
        assert!(matches!(validate(&bad), Err(CreationError::Host(_))));
    }

    #[test]
    fn zero_length_line_is_rejected() {
        let line = Component::new(Line::default());
        assert!(validate(&line).is_err());
    }
}
