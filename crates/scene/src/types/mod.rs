//! Type definitions for the exported scene model.

mod light;
mod material;
mod mesh;
mod object;

pub use light::*;
pub use material::*;
pub use mesh::*;
pub use object::*;
