//! UV footprints from mesh primitives.
//!
//! A primitive names a material symbol; scene instances bind that symbol to a
//! material and, optionally, bind effect texcoord semantics to input sets:
//!
//! ```text
//! <triangles material="sym"> <input semantic="TEXCOORD" source="#uv" set="0"/> <p>..</p>
//! <instance_geometry url="#geo"> .. <instance_material symbol="sym" target="#Mat">
//!     <bind_vertex_input semantic="CHANNEL0" input_semantic="TEXCOORD" input_set="0"/>
//! ```
//!
//! Each resulting [`TexcoordBinding`] records which texcoord source a material
//! reads and the range of coordinates its faces index.

use std::collections::HashMap;

use log::debug;
use xmltree::Element;

use wrapfix_spec::{FootprintTable, UvFootprint};

use crate::document::{
    attr, attr_usize, children_named, descendants_named, fragment, parse_floats, parse_indices,
    text, DaeDocument,
};
use crate::error::{DaeError, DaeResult};

/// Primitive element names that carry faces.
pub const PRIMITIVES: [&str; 5] = ["triangles", "polylist", "polygons", "tristrips", "trifans"];

/// One material reading one texcoord source through one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct TexcoordBinding {
    pub geometry_id: String,
    /// Index of the primitive among its mesh's primitives.
    pub primitive: usize,
    pub material_id: String,
    /// Id of the `<source>` holding the coordinates.
    pub source_id: String,
    /// Input set of the texcoord input (0 when omitted).
    pub set: usize,
    /// Effect texcoord semantics bound to this set by `bind_vertex_input`.
    pub semantics: Vec<String>,
    /// True for the first texcoord input of the primitive, the one read when
    /// no semantic binding applies.
    pub primary: bool,
    /// Range of coordinates indexed by the primitive's faces.
    pub footprint: Option<UvFootprint>,
}

impl TexcoordBinding {
    fn same_site(&self, other: &TexcoordBinding) -> bool {
        self.geometry_id == other.geometry_id
            && self.primitive == other.primitive
            && self.material_id == other.material_id
            && self.source_id == other.source_id
    }
}

/// Float source with its accessor layout.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FloatSource {
    pub id: String,
    pub array_id: String,
    pub values: Vec<f64>,
    pub count: usize,
    pub stride: usize,
    pub offset: usize,
}

impl FloatSource {
    /// Reads a `<source>` with a `float_array` and `technique_common/accessor`.
    pub fn parse(source: &Element) -> DaeResult<Self> {
        let id = attr(source, "id").unwrap_or_default().to_string();
        let context = format!("source '{}'", id);
        let array = source
            .get_child("float_array")
            .ok_or_else(|| DaeError::invalid(&context, "missing <float_array>"))?;
        let values = parse_floats(&text(array), &context)?;
        let accessor = source
            .get_child("technique_common")
            .and_then(|t| t.get_child("accessor"));
        let (stride, offset, count) = match accessor {
            Some(accessor) => {
                let stride = attr_usize(accessor, "stride", 1)?.max(1);
                let offset = attr_usize(accessor, "offset", 0)?;
                let count = attr_usize(accessor, "count", values.len() / stride)?;
                (stride, offset, count)
            }
            None => (2, 0, values.len() / 2),
        };
        Ok(Self {
            array_id: attr(array, "id").unwrap_or_default().to_string(),
            id,
            values,
            count,
            stride,
            offset,
        })
    }

    /// First two components of element `index`; a missing second component reads as 0.
    pub fn uv(&self, index: usize) -> DaeResult<[f64; 2]> {
        let base = self.offset + index * self.stride;
        let out_of_range = || DaeError::IndexOutOfRange {
            source_id: self.id.clone(),
            index,
            len: self.count,
        };
        if index >= self.count {
            return Err(out_of_range());
        }
        let u = *self.values.get(base).ok_or_else(out_of_range)?;
        let v = if self.stride >= 2 {
            *self.values.get(base + 1).ok_or_else(out_of_range)?
        } else {
            0.0
        };
        Ok([u, v])
    }
}

/// Symbol binding from one geometry instance.
#[derive(Debug, Clone, PartialEq)]
struct MaterialBinding {
    symbol: String,
    material_id: String,
    /// `(effect semantic, input set)` pairs for texcoords.
    vertex_inputs: Vec<(String, usize)>,
}

/// Input of a primitive or `<vertices>` element.
#[derive(Debug, Clone)]
struct Input {
    semantic: String,
    source: String,
    offset: usize,
    set: usize,
}

fn parse_inputs(el: &Element) -> DaeResult<Vec<Input>> {
    children_named(el, "input")
        .map(|input| -> DaeResult<Input> {
            Ok(Input {
                semantic: attr(input, "semantic").unwrap_or_default().to_string(),
                source: fragment(attr(input, "source").unwrap_or_default()).to_string(),
                offset: attr_usize(input, "offset", 0)?,
                set: attr_usize(input, "set", 0)?,
            })
        })
        .collect()
}

/// Texcoord usage of every material in a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshScan {
    bindings: Vec<TexcoordBinding>,
}

impl MeshScan {
    /// Scans every mesh primitive and scene instance.
    pub fn scan(doc: &DaeDocument) -> DaeResult<Self> {
        let instances = collect_instances(doc)?;
        let mut sources: HashMap<String, FloatSource> = HashMap::new();
        let mut bindings: Vec<TexcoordBinding> = Vec::new();

        for geometry in doc.library("library_geometries").filter(|e| e.name == "geometry") {
            let geometry_id = attr(geometry, "id").unwrap_or_default();
            let Some(mesh) = geometry.get_child("mesh") else {
                continue;
            };

            let mut vertices: HashMap<&str, Vec<Input>> = HashMap::new();
            for v in children_named(mesh, "vertices") {
                vertices.insert(attr(v, "id").unwrap_or_default(), parse_inputs(v)?);
            }

            let primitives = crate::document::child_elements(mesh)
                .filter(|e| PRIMITIVES.contains(&e.name.as_str()));
            for (index, primitive) in primitives.enumerate() {
                let inputs = parse_inputs(primitive)?;
                let Some(stride) = inputs.iter().map(|i| i.offset + 1).max() else {
                    continue;
                };

                // Texcoords declared on <vertices> share the VERTEX offset.
                let mut texcoords: Vec<(String, usize, usize)> = Vec::new();
                for input in &inputs {
                    match input.semantic.as_str() {
                        "TEXCOORD" => texcoords.push((input.source.clone(), input.offset, input.set)),
                        "VERTEX" => {
                            for shared in vertices.get(input.source.as_str()).into_iter().flatten() {
                                if shared.semantic == "TEXCOORD" {
                                    texcoords.push((shared.source.clone(), input.offset, shared.set));
                                }
                            }
                        }
                        _ => {}
                    }
                }
                if texcoords.is_empty() {
                    continue;
                }

                let symbol = attr(primitive, "material").unwrap_or_default();
                let targets: Vec<MaterialBinding> = match instances.get(geometry_id) {
                    Some(list) => list.iter().filter(|b| b.symbol == symbol).cloned().collect(),
                    None if !symbol.is_empty() => vec![MaterialBinding {
                        symbol: symbol.to_string(),
                        material_id: symbol.to_string(),
                        vertex_inputs: Vec::new(),
                    }],
                    None => Vec::new(),
                };
                if targets.is_empty() {
                    continue;
                }

                let context = format!("geometry '{}' <{}>", geometry_id, primitive.name);
                let mut indices = Vec::new();
                for p in children_named(primitive, "p") {
                    indices.extend(parse_indices(&text(p), &context)?);
                }

                for (k, (source_id, offset, set)) in texcoords.iter().enumerate() {
                    if !sources.contains_key(source_id) {
                        let element = mesh
                            .children
                            .iter()
                            .filter_map(xmltree::XMLNode::as_element)
                            .find(|e| e.name == "source" && attr(e, "id") == Some(source_id.as_str()))
                            .ok_or_else(|| DaeError::unresolved("source", source_id, &context))?;
                        sources.insert(source_id.clone(), FloatSource::parse(element)?);
                    }
                    let source = &sources[source_id];

                    let mut points = Vec::with_capacity(indices.len() / stride);
                    for tuple in indices.chunks_exact(stride) {
                        points.push(source.uv(tuple[*offset])?);
                    }
                    let footprint = UvFootprint::from_points(points);

                    for target in &targets {
                        let semantics = target
                            .vertex_inputs
                            .iter()
                            .filter(|(_, input_set)| input_set == set)
                            .map(|(semantic, _)| semantic.clone())
                            .collect();
                        let binding = TexcoordBinding {
                            geometry_id: geometry_id.to_string(),
                            primitive: index,
                            material_id: target.material_id.clone(),
                            source_id: source_id.clone(),
                            set: *set,
                            semantics,
                            primary: k == 0,
                            footprint,
                        };
                        match bindings.iter_mut().find(|b| b.same_site(&binding)) {
                            Some(existing) => {
                                for semantic in binding.semantics {
                                    if !existing.semantics.contains(&semantic) {
                                        existing.semantics.push(semantic);
                                    }
                                }
                            }
                            None => bindings.push(binding),
                        }
                    }
                }
            }
        }

        debug!("mesh scan found {} texcoord binding(s)", bindings.len());
        Ok(Self { bindings })
    }

    /// All bindings in document order.
    pub fn bindings(&self) -> &[TexcoordBinding] {
        &self.bindings
    }

    /// Bindings a texture lookup with `texcoord` in `material_id` reads.
    ///
    /// Bindings whose semantic matches win; otherwise the primary texcoord
    /// input of each primitive bound to the material.
    pub fn bindings_for(&self, material_id: &str, texcoord: &str) -> Vec<&TexcoordBinding> {
        let of_material = || self.bindings.iter().filter(move |b| b.material_id == material_id);
        let exact: Vec<&TexcoordBinding> = of_material()
            .filter(|b| b.semantics.iter().any(|s| s == texcoord))
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        of_material().filter(|b| b.primary).collect()
    }

    /// Footprints keyed by material and texcoord semantic.
    ///
    /// Primary inputs are also recorded under the empty semantic, the
    /// fallback for lookups whose semantic nothing binds.
    pub fn footprints(&self) -> FootprintTable {
        let mut table = FootprintTable::new();
        for binding in &self.bindings {
            let Some(footprint) = binding.footprint else {
                continue;
            };
            for semantic in &binding.semantics {
                table.insert_site(&binding.material_id, semantic, footprint);
            }
            if binding.primary {
                table.insert_site(&binding.material_id, "", footprint);
            }
        }
        table
    }
}

/// Geometry id -> symbol bindings of every instance in the scene graph.
fn collect_instances(doc: &DaeDocument) -> DaeResult<HashMap<String, Vec<MaterialBinding>>> {
    let mut controllers: HashMap<&str, &str> = HashMap::new();
    for controller in doc.library("library_controllers").filter(|e| e.name == "controller") {
        let target = controller
            .get_child("skin")
            .or_else(|| controller.get_child("morph"))
            .and_then(|e| attr(e, "source"))
            .map(fragment);
        if let (Some(id), Some(target)) = (attr(controller, "id"), target) {
            controllers.insert(id, target);
        }
    }

    let mut instances: HashMap<String, Vec<MaterialBinding>> = HashMap::new();
    let root = doc.root();
    let geometry_instances = descendants_named(root, "instance_geometry")
        .into_iter()
        .map(|i| (i, false));
    let controller_instances = descendants_named(root, "instance_controller")
        .into_iter()
        .map(|i| (i, true));

    for (instance, via_controller) in geometry_instances.chain(controller_instances) {
        let url = fragment(attr(instance, "url").unwrap_or_default());
        let geometry_id = if via_controller {
            // Controllers may chain (skin over morph); follow until a geometry.
            let mut current = url;
            let mut hops = 0;
            while let Some(next) = controllers.get(current) {
                current = *next;
                hops += 1;
                if hops > controllers.len() {
                    break;
                }
            }
            if current == url {
                return Err(DaeError::unresolved("controller", url, "instance_controller"));
            }
            current
        } else {
            url
        };

        let entry = instances.entry(geometry_id.to_string()).or_default();
        let materials = instance
            .get_child("bind_material")
            .and_then(|b| b.get_child("technique_common"))
            .map(|t| children_named(t, "instance_material").collect::<Vec<_>>())
            .unwrap_or_default();
        for material in materials {
            let vertex_inputs = children_named(material, "bind_vertex_input")
                .filter(|b| {
                    attr(b, "input_semantic")
                        .map_or(true, |s| s.eq_ignore_ascii_case("TEXCOORD"))
                })
                .map(|b| -> DaeResult<(String, usize)> {
                    Ok((
                        attr(b, "semantic").unwrap_or_default().to_string(),
                        attr_usize(b, "input_set", 0)?,
                    ))
                })
                .collect::<DaeResult<Vec<_>>>()?;
            let binding = MaterialBinding {
                symbol: attr(material, "symbol").unwrap_or_default().to_string(),
                material_id: fragment(attr(material, "target").unwrap_or_default()).to_string(),
                vertex_inputs,
            };
            if !entry.contains(&binding) {
                entry.push(binding);
            }
        }
    }

    Ok(instances)
}
