//! COLLADA 1.4.1 XML serialization.

use std::collections::HashSet;
use std::fmt::Display;
use std::io::{self, Write};

use crate::document::{Document, Effect, FloatSource, Geometry, Node, Semantic, TriangleSet};

const NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";

/// Escapes text and attribute values.
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Turns an arbitrary name into a usable XML id (`[A-Za-z_][A-Za-z0-9_.-]*`).
pub fn sanitize_id(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

fn join<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    let mut out = String::new();
    for (i, v) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&v.to_string());
    }
    out
}

fn vertices_id(source: &str) -> String {
    format!("{source}-vertices")
}

/// Every id the document emits outside the scene graph.
fn reserved_ids(doc: &Document) -> HashSet<String> {
    let mut used = HashSet::new();
    used.extend(doc.effects.iter().map(|e| e.id.clone()));
    used.extend(doc.materials.iter().map(|m| m.id.clone()));
    for g in &doc.geometries {
        used.insert(g.id.clone());
        for s in &g.sources {
            used.insert(s.id.clone());
            used.insert(format!("{}-array", s.id));
            used.insert(vertices_id(&s.id));
        }
    }
    if let Some(scene) = &doc.scene {
        used.insert(scene.id.clone());
    }
    used
}

/// Sanitizes `name` into an id not yet in `used`, suffixing `_2`, `_3`, ... on collision.
fn claim_id(used: &mut HashSet<String>, name: &str) -> String {
    let base = sanitize_id(name);
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn write_effect(w: &mut impl Write, e: &Effect) -> io::Result<()> {
    let [dr, dg, db] = e.diffuse;
    let [sr, sg, sb] = e.specular;
    writeln!(w, "    <effect id=\"{}\" name=\"{}\">", esc(&e.id), esc(&e.id))?;
    writeln!(w, "      <profile_COMMON>")?;
    writeln!(w, "        <technique sid=\"common\">")?;
    writeln!(w, "          <phong>")?;
    writeln!(w, "            <diffuse><color>{dr} {dg} {db} 1</color></diffuse>")?;
    writeln!(w, "            <specular><color>{sr} {sg} {sb} 1</color></specular>")?;
    writeln!(w, "          </phong>")?;
    writeln!(w, "        </technique>")?;
    writeln!(w, "      </profile_COMMON>")?;
    writeln!(w, "    </effect>")
}

fn write_source(w: &mut impl Write, s: &FloatSource) -> io::Result<()> {
    let id = esc(&s.id);
    writeln!(w, "        <source id=\"{id}\">")?;
    writeln!(
        w,
        "          <float_array id=\"{id}-array\" count=\"{}\">{}</float_array>",
        s.data.len(),
        join(&s.data)
    )?;
    writeln!(w, "          <technique_common>")?;
    writeln!(
        w,
        "            <accessor source=\"#{id}-array\" count=\"{}\" stride=\"{}\">",
        s.count(),
        FloatSource::PARAMS.len()
    )?;
    for p in FloatSource::PARAMS {
        writeln!(w, "              <param name=\"{p}\" type=\"float\"/>")?;
    }
    writeln!(w, "            </accessor>")?;
    writeln!(w, "          </technique_common>")?;
    writeln!(w, "        </source>")
}

fn write_triangles(w: &mut impl Write, t: &TriangleSet) -> io::Result<()> {
    writeln!(
        w,
        "        <triangles count=\"{}\" material=\"{}\">",
        t.triangle_count(),
        esc(&t.material)
    )?;
    for input in &t.inputs {
        let source = match input.semantic {
            Semantic::Vertex => vertices_id(&input.source),
            Semantic::Normal => input.source.clone(),
        };
        writeln!(
            w,
            "          <input offset=\"{}\" semantic=\"{}\" source=\"#{}\"/>",
            input.offset,
            input.semantic.as_str(),
            esc(&source)
        )?;
    }
    writeln!(w, "          <p>{}</p>", join(&t.indices))?;
    writeln!(w, "        </triangles>")
}

fn write_geometry(w: &mut impl Write, g: &Geometry) -> io::Result<()> {
    writeln!(w, "    <geometry id=\"{}\" name=\"{}\">", esc(&g.id), esc(&g.name))?;
    writeln!(w, "      <mesh>")?;
    for s in &g.sources {
        write_source(w, s)?;
    }
    // A mesh has exactly one <vertices>; it wraps the positions used as VERTEX input.
    let position = g
        .primitives
        .iter()
        .flat_map(|t| t.inputs.iter())
        .find(|i| i.semantic == Semantic::Vertex)
        .map(|i| i.source.as_str())
        .or_else(|| g.sources.first().map(|s| s.id.as_str()));
    if let Some(pos) = position {
        let pos = esc(pos);
        writeln!(w, "        <vertices id=\"{}\">", vertices_id(&pos))?;
        writeln!(w, "          <input semantic=\"POSITION\" source=\"#{pos}\"/>")?;
        writeln!(w, "        </vertices>")?;
    }
    for t in &g.primitives {
        write_triangles(w, t)?;
    }
    writeln!(w, "      </mesh>")?;
    writeln!(w, "    </geometry>")
}

fn write_node(
    w: &mut impl Write,
    n: &Node,
    depth: usize,
    used: &mut HashSet<String>,
) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    writeln!(
        w,
        "{pad}<node id=\"{}\" name=\"{}\">",
        claim_id(used, &n.name),
        esc(&n.name)
    )?;
    if let Some(t) = n.translate {
        writeln!(w, "{pad}  <translate>{} {} {}</translate>", t.x, t.y, t.z)?;
    }
    for inst in &n.instances {
        writeln!(w, "{pad}  <instance_geometry url=\"#{}\">", esc(&inst.geometry))?;
        if !inst.bindings.is_empty() {
            writeln!(w, "{pad}    <bind_material>")?;
            writeln!(w, "{pad}      <technique_common>")?;
            for b in &inst.bindings {
                writeln!(
                    w,
                    "{pad}        <instance_material symbol=\"{}\" target=\"#{}\"/>",
                    esc(&b.symbol),
                    esc(&b.target)
                )?;
            }
            writeln!(w, "{pad}      </technique_common>")?;
            writeln!(w, "{pad}    </bind_material>")?;
        }
        writeln!(w, "{pad}  </instance_geometry>")?;
    }
    for child in &n.children {
        write_node(w, child, depth + 1, used)?;
    }
    writeln!(w, "{pad}</node>")
}

/// Serializes `doc` as a COLLADA 1.4.1 document.
pub fn write_document(doc: &Document, mut w: impl Write) -> io::Result<()> {
    let w = &mut w;
    writeln!(w, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    writeln!(w, "<COLLADA xmlns=\"{NAMESPACE}\" version=\"1.4.1\">")?;

    writeln!(w, "  <asset>")?;
    writeln!(
        w,
        "    <contributor><authoring_tool>{}</authoring_tool></contributor>",
        esc(&doc.asset.authoring_tool)
    )?;
    writeln!(w, "    <created>{}</created>", esc(&doc.asset.created))?;
    writeln!(w, "    <modified>{}</modified>", esc(&doc.asset.modified))?;
    writeln!(w, "    <unit name=\"meter\" meter=\"1\"/>")?;
    writeln!(w, "    <up_axis>Y_UP</up_axis>")?;
    writeln!(w, "  </asset>")?;

    writeln!(w, "  <library_effects>")?;
    for e in &doc.effects {
        write_effect(w, e)?;
    }
    writeln!(w, "  </library_effects>")?;

    writeln!(w, "  <library_materials>")?;
    for m in &doc.materials {
        writeln!(w, "    <material id=\"{}\" name=\"{}\">", esc(&m.id), esc(&m.name))?;
        writeln!(w, "      <instance_effect url=\"#{}\"/>", esc(&m.effect))?;
        writeln!(w, "    </material>")?;
    }
    writeln!(w, "  </library_materials>")?;

    writeln!(w, "  <library_geometries>")?;
    for g in &doc.geometries {
        write_geometry(w, g)?;
    }
    writeln!(w, "  </library_geometries>")?;

    if let Some(scene) = &doc.scene {
        writeln!(w, "  <library_visual_scenes>")?;
        writeln!(w, "    <visual_scene id=\"{}\">", esc(&scene.id))?;
        let mut used = reserved_ids(doc);
        for n in &scene.nodes {
            write_node(w, n, 3, &mut used)?;
        }
        writeln!(w, "    </visual_scene>")?;
        writeln!(w, "  </library_visual_scenes>")?;
        writeln!(w, "  <scene>")?;
        writeln!(w, "    <instance_visual_scene url=\"#{}\"/>", esc(&scene.id))?;
        writeln!(w, "  </scene>")?;
    }

    writeln!(w, "</COLLADA>")?;
    w.flush()
}

/// Serializes into a string; convenient for tests and small models.
pub fn to_string(doc: &Document) -> io::Result<String> {
    let mut buf = Vec::new();
    write_document(doc, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sanitized() {
        assert_eq!(sanitize_id("left hand"), "left_hand");
        assert_eq!(sanitize_id("3d"), "_3d");
        assert_eq!(sanitize_id("a.b-c_d"), "a.b-c_d");
        assert_eq!(sanitize_id(""), "_");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(esc("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn colliding_names_get_numbered_ids() {
        let mut used = HashSet::from(["scene".to_string(), "geometry".to_string()]);
        assert_eq!(claim_id(&mut used, "a b"), "a_b");
        assert_eq!(claim_id(&mut used, "a_b"), "a_b_2");
        assert_eq!(claim_id(&mut used, "a b"), "a_b_3");
        assert_eq!(claim_id(&mut used, "scene"), "scene_2");
        assert_eq!(claim_id(&mut used, "geometry"), "geometry_2");
    }

    #[test]
    fn floats_print_compactly() {
        assert_eq!(join([1.0f32, -0.5, 0.0]), "1 -0.5 0");
    }
}
