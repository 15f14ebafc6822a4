use serde::Deserialize;
use voxdae_geom::axes;
use voxdae_mesh::{IndexPair, MaterialSet, ModelMesh, VertexData};
use voxdae_model::AnchorPoint;

use crate::document::{
    Asset, Document, Effect, FloatSource, Geometry, GeometryInstance, Input, Material,
    MaterialBinding, Node, Semantic, TriangleSet, VisualScene,
};

/// Fixed specular term for every material (pure green).
pub const SPECULAR: [f32; 3] = [0.0, 1.0, 0.0];

const SCENE_ID: &str = "scene";

/// How material sets map to geometries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryLayout {
    /// One geometry over the shared buffer with a triangle set per material.
    #[default]
    Merged,
    /// One standalone geometry per material.
    PerMaterial,
}

fn material_id(set: &MaterialSet) -> String {
    format!("material{}", set.label)
}

fn flatten(idx: &[IndexPair]) -> Vec<u32> {
    idx.iter().flat_map(|p| p.iter().copied()).collect()
}

fn triangle_set(set: &MaterialSet, idx: &[IndexPair], vertices: &str, normals: &str) -> TriangleSet {
    TriangleSet {
        material: material_id(set),
        inputs: vec![
            Input {
                offset: 0,
                semantic: Semantic::Vertex,
                source: vertices.to_string(),
            },
            Input {
                offset: 1,
                semantic: Semantic::Normal,
                source: normals.to_string(),
            },
        ],
        indices: flatten(idx),
    }
}

fn sources(data: &VertexData, vertices: &str, normals: &str) -> Vec<FloatSource> {
    vec![
        FloatSource {
            id: vertices.to_string(),
            data: data.pos.clone(),
        },
        FloatSource {
            id: normals.to_string(),
            data: data.norm.clone(),
        },
    ]
}

fn binding(set: &MaterialSet) -> MaterialBinding {
    let id = material_id(set);
    MaterialBinding {
        symbol: id.clone(),
        target: id,
    }
}

/// Builds the document for one model: an effect and material per set, geometry per `layout`,
/// a mesh node named `name`, and one transform-only node per anchor point.
pub fn assemble_scene(
    name: &str,
    mesh: &ModelMesh,
    points: &[AnchorPoint],
    layout: GeometryLayout,
    asset: Asset,
) -> Document {
    let mut doc = Document::new(asset);

    for set in mesh.sets() {
        let effect = format!("effect{}", set.label);
        doc.effects.push(Effect {
            id: effect.clone(),
            diffuse: set.diffuse(),
            specular: SPECULAR,
        });
        let id = material_id(set);
        doc.materials.push(Material {
            id: id.clone(),
            name: id,
            effect,
        });
    }

    let mut mesh_node = Node::named(name);
    match layout {
        GeometryLayout::Merged => {
            let geometry = Geometry {
                id: "geometry".to_string(),
                name: name.to_string(),
                sources: sources(mesh.shared(), "vertices", "normals"),
                primitives: mesh
                    .sets()
                    .iter()
                    .map(|s| triangle_set(s, &s.shared_idx, "vertices", "normals"))
                    .collect(),
            };
            mesh_node.instances.push(GeometryInstance {
                geometry: geometry.id.clone(),
                bindings: mesh.sets().iter().map(binding).collect(),
            });
            doc.geometries.push(geometry);
        }
        GeometryLayout::PerMaterial => {
            for set in mesh.sets() {
                let id = format!("geometry{}", set.label);
                let vertices = format!("vertices{}", set.label);
                let normals = format!("normals{}", set.label);
                doc.geometries.push(Geometry {
                    id: id.clone(),
                    name: id.clone(),
                    sources: sources(&set.build.data, &vertices, &normals),
                    primitives: vec![triangle_set(set, &set.build.idx, &vertices, &normals)],
                });
                mesh_node.instances.push(GeometryInstance {
                    geometry: id,
                    bindings: vec![binding(set)],
                });
            }
        }
    }

    let mut nodes = Vec::with_capacity(1 + points.len());
    nodes.push(mesh_node);
    for pt in points {
        nodes.push(Node {
            translate: Some(axes::grid_to_output(pt.pos).as_vec3()),
            ..Node::named(pt.name.clone())
        });
    }
    log::debug!(
        "assembled scene `{}`: {} materials, {} geometries, {} anchors",
        name,
        doc.materials.len(),
        doc.geometries.len(),
        points.len()
    );
    doc.scene = Some(VisualScene {
        id: SCENE_ID.to_string(),
        nodes,
    });
    doc
}
