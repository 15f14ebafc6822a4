//! In-memory COLLADA document; only the subset the converter emits.

use voxdae_geom::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    pub authoring_tool: String,
    /// ISO-8601 timestamps.
    pub created: String,
    pub modified: String,
}

impl Asset {
    pub fn at(timestamp: impl Into<String>) -> Self {
        let ts = timestamp.into();
        Self {
            authoring_tool: concat!("voxdae ", env!("CARGO_PKG_VERSION")).to_string(),
            created: ts.clone(),
            modified: ts,
        }
    }

    pub fn now() -> Self {
        Self::at(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Phong effect with constant diffuse and specular colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    pub id: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub effect: String,
}

/// Float array of XYZ triples.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatSource {
    pub id: String,
    pub data: Vec<f32>,
}

impl FloatSource {
    pub const PARAMS: [&'static str; 3] = ["X", "Y", "Z"];

    #[inline]
    pub fn count(&self) -> usize {
        self.data.len() / Self::PARAMS.len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Semantic {
    Vertex,
    Normal,
}

impl Semantic {
    pub fn as_str(self) -> &'static str {
        match self {
            Semantic::Vertex => "VERTEX",
            Semantic::Normal => "NORMAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    pub offset: u32,
    pub semantic: Semantic,
    /// Id of the referenced float source.
    pub source: String,
}

/// Indexed triangle list; `indices` interleaves one entry per input per corner.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleSet {
    pub material: String,
    pub inputs: Vec<Input>,
    pub indices: Vec<u32>,
}

impl TriangleSet {
    pub fn triangle_count(&self) -> usize {
        let stride = self.inputs.iter().map(|i| i.offset as usize + 1).max().unwrap_or(1);
        self.indices.len() / stride / 3
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub id: String,
    pub name: String,
    pub sources: Vec<FloatSource>,
    pub primitives: Vec<TriangleSet>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialBinding {
    pub symbol: String,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeometryInstance {
    pub geometry: String,
    pub bindings: Vec<MaterialBinding>,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub translate: Option<Vec3>,
    pub instances: Vec<GeometryInstance>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True for pure transform nodes (anchors).
    pub fn is_transform_only(&self) -> bool {
        self.instances.is_empty() && self.children.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualScene {
    pub id: String,
    pub nodes: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub asset: Asset,
    pub effects: Vec<Effect>,
    pub materials: Vec<Material>,
    pub geometries: Vec<Geometry>,
    /// The single active scene.
    pub scene: Option<VisualScene>,
}

impl Document {
    pub fn new(asset: Asset) -> Self {
        Self {
            asset,
            effects: Vec::new(),
            materials: Vec::new(),
            geometries: Vec::new(),
            scene: None,
        }
    }

    pub fn geometry(&self, id: &str) -> Option<&Geometry> {
        self.geometries.iter().find(|g| g.id == id)
    }
}
