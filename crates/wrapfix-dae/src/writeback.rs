//! Rewrites a document from condensed material graphs.
//!
//! For every texture node that now samples an atlas:
//!
//! - the texcoords its material reads are remapped by the node's UV transform
//! - its `sampler2D` switches to `CLAMP` on both axes
//! - its surface (or `instance_image`) points at a new `<image>` for the atlas
//!
//! Lookups that named an image directly get a fresh surface/sampler pair so
//! the clamp addressing has somewhere to live.

use std::collections::BTreeMap;

use log::{debug, info};
use xmltree::{Element, XMLNode};

use wrapfix_spec::{ImageRef, TextureSamplerRef, UvTransform};

use crate::document::{
    attr, child_elements, find_mut, format_floats, set_child_text, set_text, text,
    text_element, visit_mut, DaeDocument,
};
use crate::error::{DaeError, DaeResult};
use crate::graph::MaterialGraphSet;
use crate::mesh::{FloatSource, MeshScan};

/// Token written into `wrap_s`/`wrap_t` of redirected samplers.
const CLAMP_TOKEN: &str = "CLAMP";

/// What a write-back changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBackReport {
    /// Ids of `<image>` elements added for atlases.
    pub images_added: Vec<String>,
    /// Texture lookups redirected into atlases.
    pub samplers_redirected: usize,
    /// Ids of texcoord sources whose coordinates were remapped.
    pub sources_transformed: Vec<String>,
}

struct Redirect<'a> {
    sampler: &'a TextureSamplerRef,
    atlas: ImageRef,
    transform: UvTransform,
}

/// Applies every condensed texture node of `graphs` to `doc`.
///
/// `samplers` must be the slice `graphs` was built from. Fails before touching
/// the document when one texcoord source would need two different transforms,
/// or when a condensed lookup shares its coordinates with an uncondensed one.
pub fn write_back(
    doc: &mut DaeDocument,
    scan: &MeshScan,
    samplers: &[TextureSamplerRef],
    graphs: &MaterialGraphSet,
) -> DaeResult<WriteBackReport> {
    let mut redirects = Vec::new();
    for (index, sampler) in samplers.iter().enumerate() {
        if !graphs.is_condensed(index) {
            continue;
        }
        if let Some((graph, node)) = graphs.locate(index) {
            if let Some(texture) = graph.image_texture(node) {
                redirects.push(Redirect {
                    sampler,
                    atlas: texture.image.clone(),
                    transform: graph.uv_transform(node),
                });
            }
        }
    }

    let mut report = WriteBackReport::default();
    if redirects.is_empty() {
        return Ok(report);
    }

    if let Some(conflict) = texcoord_conflicts(scan, samplers, graphs).into_iter().next() {
        return Err(conflict.into());
    }
    let planned = plan_texcoords(scan, &redirects);

    for (source_id, transform) in &planned {
        if transform.is_identity() {
            continue;
        }
        transform_source(doc, source_id, transform)?;
        report.sources_transformed.push(source_id.clone());
    }

    let use_ref = doc.uses_init_from_ref();
    for redirect in &redirects {
        if ensure_atlas_image(doc, &redirect.atlas, use_ref)? {
            report.images_added.push(redirect.atlas.id.clone());
        }

        let effect_id = redirect.sampler.effect_id.as_str();
        let effect = find_mut(doc.root_mut(), &|e: &Element| {
            e.name == "effect" && attr(e, "id") == Some(effect_id)
        })
        .ok_or_else(|| DaeError::unresolved("effect", effect_id, "write-back"))?;

        match &redirect.sampler.sampler_sid {
            Some(sid) => redirect_sampler(effect, effect_id, sid, &redirect.atlas.id)?,
            None => redirect_direct(
                effect,
                effect_id,
                &redirect.sampler.image.id,
                &redirect.atlas.id,
                use_ref,
            )?,
        }
        debug!(
            "redirected '{}' to atlas '{}'",
            redirect.sampler.label(),
            redirect.atlas.id
        );
        report.samplers_redirected += 1;
    }

    info!(
        "write-back: {} lookup(s) redirected, {} texcoord source(s) remapped, {} atlas image(s) added",
        report.samplers_redirected,
        report.sources_transformed.len(),
        report.images_added.len()
    );
    Ok(report)
}

/// A texcoord source whose readers cannot all be satisfied by one rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct TexcoordConflict {
    pub source_id: String,
    /// Indices of the condensed samplers reading the source.
    pub condensed: Vec<usize>,
    pub detail: String,
}

impl From<TexcoordConflict> for DaeError {
    fn from(conflict: TexcoordConflict) -> Self {
        DaeError::ConflictingTexcoords {
            source_id: conflict.source_id,
            detail: conflict.detail,
        }
    }
}

/// Finds texcoord sources that condensed lookups would remap while another
/// reader needs them unchanged or remapped differently.
///
/// `samplers` must be the slice `graphs` was built from. Conflicts come back
/// ordered by source id.
pub fn texcoord_conflicts(
    scan: &MeshScan,
    samplers: &[TextureSamplerRef],
    graphs: &MaterialGraphSet,
) -> Vec<TexcoordConflict> {
    // Per source: (sampler index, transform if condensed), in sampler order.
    let mut readers: BTreeMap<&str, Vec<(usize, Option<UvTransform>)>> = BTreeMap::new();
    for (index, sampler) in samplers.iter().enumerate() {
        let transform = condensed_transform(graphs, index);
        for binding in scan.bindings_for(&sampler.material_id, &sampler.texcoord) {
            let entry = readers.entry(binding.source_id.as_str()).or_default();
            if !entry.iter().any(|&(seen, _)| seen == index) {
                entry.push((index, transform));
            }
        }
    }

    let mut conflicts = Vec::new();
    for (source_id, entry) in readers {
        let condensed: Vec<(usize, UvTransform)> = entry
            .iter()
            .filter_map(|&(index, transform)| transform.map(|t| (index, t)))
            .collect();
        let Some(&(owner, expected)) = condensed.first() else {
            continue;
        };

        let detail = if let Some(&(other, _)) = condensed.iter().find(|(_, t)| *t != expected) {
            format!(
                "'{}' and '{}' map into different atlas regions",
                samplers[owner].label(),
                samplers[other].label()
            )
        } else if let Some(&(other, _)) = entry
            .iter()
            .find(|(_, t)| t.is_none() && !expected.is_identity())
        {
            format!(
                "'{}' is condensed but '{}' reads the same coordinates unchanged",
                samplers[owner].label(),
                samplers[other].label()
            )
        } else {
            continue;
        };

        conflicts.push(TexcoordConflict {
            source_id: source_id.to_string(),
            condensed: condensed.iter().map(|&(index, _)| index).collect(),
            detail,
        });
    }
    conflicts
}

fn condensed_transform(graphs: &MaterialGraphSet, index: usize) -> Option<UvTransform> {
    if !graphs.is_condensed(index) {
        return None;
    }
    graphs
        .locate(index)
        .map(|(graph, node)| graph.uv_transform(node))
}

/// Transform per texcoord source read by a redirected lookup.
fn plan_texcoords(scan: &MeshScan, redirects: &[Redirect<'_>]) -> BTreeMap<String, UvTransform> {
    let mut planned = BTreeMap::new();
    for redirect in redirects {
        let sampler = redirect.sampler;
        for binding in scan.bindings_for(&sampler.material_id, &sampler.texcoord) {
            planned
                .entry(binding.source_id.clone())
                .or_insert(redirect.transform);
        }
    }
    planned
}

fn transform_source(doc: &mut DaeDocument, source_id: &str, transform: &UvTransform) -> DaeResult<()> {
    let source = find_mut(doc.root_mut(), &|e: &Element| {
        e.name == "source" && attr(e, "id") == Some(source_id)
    })
    .ok_or_else(|| DaeError::unresolved("source", source_id, "write-back"))?;

    let parsed = FloatSource::parse(source)?;
    let mut values = parsed.values.clone();
    for index in 0..parsed.count {
        let base = parsed.offset + index * parsed.stride;
        let [u, v] = transform.apply(parsed.uv(index)?);
        values[base] = u;
        if parsed.stride >= 2 {
            values[base + 1] = v;
        }
    }

    let array = source
        .get_mut_child("float_array")
        .ok_or_else(|| DaeError::invalid(format!("source '{}'", source_id), "missing <float_array>"))?;
    set_text(array, format_floats(&values));
    Ok(())
}

/// Adds an `<image>` for the atlas unless one already exists. Returns true if added.
fn ensure_atlas_image(doc: &mut DaeDocument, atlas: &ImageRef, use_ref: bool) -> DaeResult<bool> {
    let existing = doc
        .library("library_images")
        .find(|e| e.name == "image" && attr(e, "id") == Some(atlas.id.as_str()))
        .map(crate::document::image_path);
    if let Some(path) = existing {
        let same = ImageRef::new(&atlas.id, path).normalized_path() == atlas.normalized_path();
        return if same {
            Ok(false)
        } else {
            Err(DaeError::invalid(
                format!("image '{}'", atlas.id),
                format!("id already names another file, cannot add atlas '{}'", atlas.path),
            ))
        };
    }

    let mut image = Element::new("image");
    image.attributes.insert("id".to_string(), atlas.id.clone());
    image.attributes.insert("name".to_string(), atlas.id.clone());
    let init_from = if use_ref {
        let mut init = Element::new("init_from");
        init.children
            .push(XMLNode::Element(text_element("ref", atlas.path.as_str())));
        init
    } else {
        text_element("init_from", atlas.path.as_str())
    };
    image.children.push(XMLNode::Element(init_from));

    let root = doc.root_mut();
    if root.get_child("library_images").is_none() {
        let at = root
            .children
            .iter()
            .rposition(|c| c.as_element().is_some_and(|e| e.name == "asset"))
            .map(|i| i + 1)
            .unwrap_or(0);
        root.children
            .insert(at, XMLNode::Element(Element::new("library_images")));
    }
    if let Some(library) = root.get_mut_child("library_images") {
        library.children.push(XMLNode::Element(image));
    }
    Ok(true)
}

/// Clamps a `sampler2D` and points its image at the atlas.
fn redirect_sampler(effect: &mut Element, effect_id: &str, sid: &str, atlas_id: &str) -> DaeResult<()> {
    let is_sampler = |e: &Element| {
        e.name == "newparam" && attr(e, "sid") == Some(sid) && e.get_child("sampler2D").is_some()
    };
    let newparam = find_mut(effect, &is_sampler).ok_or_else(|| {
        DaeError::unresolved("sampler", sid, format!("effect '{}'", effect_id))
    })?;
    let Some(sampler) = newparam.get_mut_child("sampler2D") else {
        return Err(DaeError::unresolved("sampler", sid, format!("effect '{}'", effect_id)));
    };

    set_child_text(sampler, "wrap_s", &["source", "instance_image"], CLAMP_TOKEN);
    set_child_text(sampler, "wrap_t", &["source", "instance_image", "wrap_s"], CLAMP_TOKEN);

    if let Some(instance) = sampler.get_mut_child("instance_image") {
        instance
            .attributes
            .insert("url".to_string(), format!("#{}", atlas_id));
        return Ok(());
    }
    let surface_sid = sampler.get_child("source").map(text).unwrap_or_default();

    let is_surface = |e: &Element| {
        e.name == "newparam"
            && attr(e, "sid") == Some(surface_sid.as_str())
            && e.get_child("surface").is_some()
    };
    match find_mut(effect, &is_surface).and_then(|n| n.get_mut_child("surface")) {
        Some(surface) => match surface.get_mut_child("init_from") {
            Some(init) => match init.get_mut_child("ref") {
                Some(reference) => set_text(reference, atlas_id),
                None => set_text(init, atlas_id),
            },
            None => set_child_text(surface, "init_from", &[], atlas_id),
        },
        None => {
            // The sampler named the image itself; point it at the atlas.
            if let Some(sampler) = find_mut(effect, &is_sampler).and_then(|n| n.get_mut_child("sampler2D")) {
                set_child_text(sampler, "source", &[], atlas_id);
            }
        }
    }
    Ok(())
}

/// Gives a direct image lookup its own clamped sampler into the atlas.
fn redirect_direct(
    effect: &mut Element,
    effect_id: &str,
    image_id: &str,
    atlas_id: &str,
    use_ref: bool,
) -> DaeResult<()> {
    let surface_sid = format!("{}-surface", atlas_id);
    let sampler_sid = format!("{}-sampler", atlas_id);

    let profile = find_mut(effect, &|e: &Element| e.name == "profile_COMMON").ok_or_else(|| {
        DaeError::unresolved("profile_COMMON", effect_id, format!("effect '{}'", effect_id))
    })?;

    let present = child_elements(profile)
        .any(|e| e.name == "newparam" && attr(e, "sid") == Some(sampler_sid.as_str()));
    if !present {
        let mut params = Vec::new();
        let mut sampler = Element::new("sampler2D");
        if use_ref {
            let mut instance = Element::new("instance_image");
            instance
                .attributes
                .insert("url".to_string(), format!("#{}", atlas_id));
            sampler.children.push(XMLNode::Element(instance));
        } else {
            let mut surface = Element::new("surface");
            surface
                .attributes
                .insert("type".to_string(), "2D".to_string());
            surface
                .children
                .push(XMLNode::Element(text_element("init_from", atlas_id)));
            params.push(newparam(&surface_sid, surface));
            sampler
                .children
                .push(XMLNode::Element(text_element("source", surface_sid.as_str())));
        }
        sampler
            .children
            .push(XMLNode::Element(text_element("wrap_s", CLAMP_TOKEN)));
        sampler
            .children
            .push(XMLNode::Element(text_element("wrap_t", CLAMP_TOKEN)));
        params.push(newparam(&sampler_sid, sampler));

        let at = profile
            .children
            .iter()
            .rposition(|c| {
                c.as_element()
                    .is_some_and(|e| matches!(e.name.as_str(), "asset" | "image" | "newparam"))
            })
            .map(|i| i + 1)
            .unwrap_or(0);
        for (offset, param) in params.into_iter().enumerate() {
            profile.children.insert(at + offset, XMLNode::Element(param));
        }
    }

    visit_mut(effect, &mut |e: &mut Element| {
        if e.name == "texture" && attr(e, "texture") == Some(image_id) {
            e.attributes
                .insert("texture".to_string(), sampler_sid.clone());
        }
    });
    Ok(())
}

fn newparam(sid: &str, value: Element) -> Element {
    let mut param = Element::new("newparam");
    param.attributes.insert("sid".to_string(), sid.to_string());
    param.children.push(XMLNode::Element(value));
    param
}
