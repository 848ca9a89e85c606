// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Grevit Core
//!
//! Component model and wire codec shared by every Grevit endpoint.
//!
//! ## Overview
//!
//! - **Components**: typed geometric and architectural elements carrying a
//!   stable client-assigned identity (GID)
//! - **Collections**: the unit of transmission, with update/delete/scale flags
//! - **Catalog**: the target's categories, families and types
//! - **Codec**: single-line text encoding for collections and catalogs
//!
//! ## Quick Start
//!
//! ```rust
//! use grevit_core::{codec, Component, ComponentCollection, Line, Point};
//!
//! let line = Component::new(Line {
//!     from: Point::new(0.0, 0.0, 0.0),
//!     to: Point::new(10.0, 0.0, 0.0),
//!     view: String::new(),
//! })
//! .with_gid("baseline-1");
//!
//! let collection = ComponentCollection::new(vec![line]).with_update(true);
//! let payload = codec::encode(&collection).unwrap();
//! assert_eq!(codec::decode(&payload).unwrap(), collection);
//! ```

pub mod catalog;
pub mod codec;
pub mod collection;
pub mod component;
pub mod error;
pub mod geometry;
pub mod parameter;

pub use catalog::{Catalog, Category, Family};
pub use collection::ComponentCollection;
pub use component::{
    Adaptive, AdaptivePoint, Arc, Column, Component, ComponentKind, ComponentType,
    CurtainGridLine, CurtainPanel, Curve3Points, CurveElement, Door, DrawingPoint, Extrusion,
    FamilyInstance, Faces, Grid, Hatch, Level, Line, Loop, Polyline, ReferencePlane, Room,
    SimpleExtrusion, Slab, Spline, SpotCoordinate, Stair, TextNote, Topography, Wall,
    WallProfileBased,
};
pub use error::{DecodeError, Error, Result};
pub use geometry::{Face, Point, StructuralType};
pub use parameter::{Parameter, ParameterTarget, ParameterValue};
