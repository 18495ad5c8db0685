//! Mesh processing for the boba exporter
//!
//! This crate provides:
//! - [`weld`] - Fat-vertex welding of polygon meshes into indexed triangle lists
//! - [`streams`] - Flat per-attribute data streams and index width selection
//! - [`triangle`] - Closest point on a triangle with feature classification
//! - [`world`] - World-space geometry with face, vertex and edge normals
//! - [`bounds`] - Bounding boxes and spheres

pub mod bounds;
pub mod error;
pub mod streams;
pub mod triangle;
pub mod weld;
pub mod world;

pub use bounds::*;
pub use error::*;
pub use streams::*;
pub use triangle::*;
pub use weld::*;
pub use world::*;
