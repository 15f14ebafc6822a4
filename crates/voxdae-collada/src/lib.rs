//! COLLADA scene assembly and serialization for meshed voxel models.
#![forbid(unsafe_code)]

mod document;
mod scene;
mod writer;

pub use document::{
    Asset, Document, Effect, FloatSource, Geometry, GeometryInstance, Input, Material,
    MaterialBinding, Node, Semantic, TriangleSet, VisualScene,
};
pub use scene::{GeometryLayout, SPECULAR, assemble_scene};
pub use writer::{sanitize_id, to_string, write_document};
