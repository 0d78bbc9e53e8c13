//! Sampler patching.
//!
//! Matches container materials and images to extracted sampler references,
//! then edits the sampler table so every matched texture samples with the
//! wrap pair the source document declared.

use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use wrapfix_spec::{ImageRef, TextureSamplerRef, WrapMode, WrapPair};

use crate::container::GlbDocument;
use crate::error::{GlbError, GlbResult};

/// LINEAR.
pub const DEFAULT_MAG_FILTER: u64 = 9729;
/// LINEAR_MIPMAP_LINEAR.
pub const DEFAULT_MIN_FILTER: u64 = 9987;

/// What happened to one texture's sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    /// Already sampled with the wanted pair.
    Unchanged,
    /// Pointed at an existing sampler with the wanted pair and filters.
    Relinked,
    /// The texture's own sampler had its wrap fields rewritten.
    UpdatedInPlace,
    /// A new sampler was appended and linked.
    Created,
}

/// One texture edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerEdit {
    /// Texture index in the container.
    pub texture: usize,
    /// Sampler index the texture uses afterwards.
    pub sampler: Option<usize>,
    /// Usage label of the matched sampler reference.
    pub label: String,
    pub wrap: WrapPair,
    pub action: EditAction,
}

/// Outcome of patching one container.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchReport {
    pub edits: Vec<SamplerEdit>,
    /// Labels of sampler references no container texture matched.
    pub unmatched: Vec<String>,
}

impl PatchReport {
    /// Number of edits with the given action.
    pub fn count(&self, action: EditAction) -> usize {
        self.edits.iter().filter(|e| e.action == action).count()
    }

    /// Number of textures whose sampling changed.
    pub fn changed(&self) -> usize {
        self.edits.len() - self.count(EditAction::Unchanged)
    }
}

/// Writes extracted wrap modes into a container's samplers.
#[derive(Debug, Clone, Copy)]
pub struct GlbWrapPatcher<'a> {
    samplers: &'a [TextureSamplerRef],
}

impl<'a> GlbWrapPatcher<'a> {
    /// Creates a patcher for the given usages.
    pub fn new(samplers: &'a [TextureSamplerRef]) -> Self {
        Self { samplers }
    }

    /// Edits the document in place.
    pub fn patch(&self, doc: &mut GlbDocument) -> GlbResult<PatchReport> {
        if !doc.json.is_object() {
            return Err(GlbError::InvalidReference(
                "scene description is not a JSON object".to_string(),
            ));
        }

        let (targets, unmatched) = self.match_textures(doc)?;
        let mut report = PatchReport {
            edits: Vec::with_capacity(targets.len()),
            unmatched,
        };

        for (texture, sampler) in targets {
            let (action, index) = apply_wrap(&mut doc.json, texture, sampler.wrap)?;
            debug!(
                "texture {} ({}) -> {} via sampler {:?}: {:?}",
                texture,
                sampler.label(),
                sampler.wrap,
                index,
                action
            );
            report.edits.push(SamplerEdit {
                texture,
                sampler: index,
                label: sampler.label(),
                wrap: sampler.wrap,
                action,
            });
        }

        info!(
            "patched {} of {} matched texture(s), {} unmatched usage(s)",
            report.changed(),
            report.edits.len(),
            report.unmatched.len()
        );
        Ok(report)
    }

    /// Parses, patches and re-serializes container bytes.
    pub fn patch_bytes(&self, data: &[u8]) -> GlbResult<(Vec<u8>, PatchReport)> {
        let mut doc = GlbDocument::parse(data)?;
        let report = self.patch(&mut doc)?;
        Ok((doc.to_bytes()?, report))
    }

    /// Patches `input` and writes the result atomically to `output`.
    ///
    /// `output` may equal `input`; on failure it is left untouched.
    pub fn patch_file(&self, input: &Path, output: &Path) -> GlbResult<PatchReport> {
        let mut doc = GlbDocument::read(input)?;
        let report = self.patch(&mut doc)?;
        doc.write_atomic(output)?;
        Ok(report)
    }

    /// Pairs container textures with sampler references.
    ///
    /// Materials match by name (then id); images match by name or URI stem
    /// prefix, the longest stem winning. A texture claimed twice keeps the
    /// first claim.
    fn match_textures(
        &self,
        doc: &GlbDocument,
    ) -> GlbResult<(Vec<(usize, &'a TextureSamplerRef)>, Vec<String>)> {
        let samplers: &'a [TextureSamplerRef] = self.samplers;
        let empty = Vec::new();
        let materials = doc.array("materials").unwrap_or(&empty);
        let textures = doc.array("textures").unwrap_or(&empty);
        let images = doc.array("images").unwrap_or(&empty);

        let mut matched = vec![false; samplers.len()];
        let mut targets: Vec<(usize, &'a TextureSamplerRef)> = Vec::new();

        for (material_index, material) in materials.iter().enumerate() {
            let name = material
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let candidates: Vec<usize> = samplers
                .iter()
                .enumerate()
                .filter(|(_, s)| s.material_name == name || s.material_id == name)
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let mut refs = Vec::new();
            texture_refs(material, &mut refs);
            for texture_index in refs {
                let texture = textures.get(texture_index).ok_or_else(|| {
                    GlbError::InvalidReference(format!(
                        "material {} references missing texture {}",
                        material_index, texture_index
                    ))
                })?;
                let Some(image_index) = texture.get("source").and_then(Value::as_u64) else {
                    continue;
                };
                let image = images.get(image_index as usize).ok_or_else(|| {
                    GlbError::InvalidReference(format!(
                        "texture {} references missing image {}",
                        texture_index, image_index
                    ))
                })?;
                let stem = container_image_stem(image).to_ascii_lowercase();

                let best = candidates
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let wanted = samplers[i].image.stem().to_ascii_lowercase();
                        !wanted.is_empty() && stem.starts_with(&wanted)
                    })
                    .max_by_key(|&i| samplers[i].image.stem().len());
                let Some(best) = best else {
                    debug!(
                        "material '{}' texture {} (image '{}') has no matching usage",
                        name, texture_index, stem
                    );
                    continue;
                };

                matched[best] = true;
                let sampler = &samplers[best];
                match targets.iter().find(|(t, _)| *t == texture_index) {
                    Some((_, first)) if first.wrap != sampler.wrap => warn!(
                        "texture {} is used as {} by '{}' and {} by '{}'; keeping {}",
                        texture_index,
                        first.wrap,
                        first.label(),
                        sampler.wrap,
                        sampler.label(),
                        first.wrap
                    ),
                    Some(_) => {}
                    None => targets.push((texture_index, sampler)),
                }
            }
        }

        let unmatched = samplers
            .iter()
            .zip(&matched)
            .filter(|(_, m)| !**m)
            .map(|(s, _)| s.label())
            .collect();
        Ok((targets, unmatched))
    }
}

/// Collects `index` values of every `*Texture` object, extensions included.
fn texture_refs(value: &Value, out: &mut Vec<usize>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.ends_with("Texture") {
                    if let Some(index) = child.get("index").and_then(Value::as_u64) {
                        if !out.contains(&(index as usize)) {
                            out.push(index as usize);
                        }
                    }
                }
                texture_refs(child, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| texture_refs(item, out)),
        _ => {}
    }
}

/// Image name, or the URI's file stem when unnamed.
fn container_image_stem(image: &Value) -> String {
    if let Some(name) = image.get("name").and_then(Value::as_str) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    image
        .get("uri")
        .and_then(Value::as_str)
        .map(|uri| ImageRef::new("", uri).stem())
        .unwrap_or_default()
}

fn wrap_codes(sampler: &Value) -> (u64, u64) {
    let code = |key: &str| {
        sampler
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(WrapMode::GL_REPEAT)
    };
    (code("wrapS"), code("wrapT"))
}

fn filters(sampler: Option<&Value>) -> (Option<u64>, Option<u64>) {
    match sampler {
        Some(s) => (
            s.get("magFilter").and_then(Value::as_u64),
            s.get("minFilter").and_then(Value::as_u64),
        ),
        None => (Some(DEFAULT_MAG_FILTER), Some(DEFAULT_MIN_FILTER)),
    }
}

fn texture_object(json: &mut Value, texture: usize) -> GlbResult<&mut Map<String, Value>> {
    json.get_mut("textures")
        .and_then(|t| t.get_mut(texture))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| GlbError::InvalidReference(format!("texture {} is missing", texture)))
}

/// Applies the sampler edit rules for one texture.
fn apply_wrap(
    json: &mut Value,
    texture: usize,
    wanted: WrapPair,
) -> GlbResult<(EditAction, Option<usize>)> {
    let want = (wanted.s.gl_code(), wanted.t.gl_code());
    let samplers: Vec<Value> = json
        .get("samplers")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let current = texture_object(json, texture)?
        .get("sampler")
        .and_then(Value::as_u64)
        .map(|i| i as usize);
    let current_value = match current {
        Some(index) => Some(samplers.get(index).ok_or_else(|| {
            GlbError::InvalidReference(format!(
                "texture {} references missing sampler {}",
                texture, index
            ))
        })?),
        None => None,
    };

    let current_codes = current_value
        .map(wrap_codes)
        .unwrap_or((WrapMode::GL_REPEAT, WrapMode::GL_REPEAT));
    if current_codes == want {
        return Ok((EditAction::Unchanged, current));
    }

    let wanted_filters = filters(current_value);
    if let Some(existing) = samplers
        .iter()
        .position(|s| wrap_codes(s) == want && filters(Some(s)) == wanted_filters)
    {
        texture_object(json, texture)?.insert("sampler".to_string(), existing.into());
        return Ok((EditAction::Relinked, Some(existing)));
    }

    if let Some(index) = current {
        let users = json
            .get("textures")
            .and_then(Value::as_array)
            .map(|all| {
                all.iter()
                    .filter(|t| t.get("sampler").and_then(Value::as_u64) == Some(index as u64))
                    .count()
            })
            .unwrap_or(0);
        if users == 1 {
            if let Some(sampler) = json
                .get_mut("samplers")
                .and_then(|s| s.get_mut(index))
                .and_then(Value::as_object_mut)
            {
                sampler.insert("wrapS".to_string(), want.0.into());
                sampler.insert("wrapT".to_string(), want.1.into());
                return Ok((EditAction::UpdatedInPlace, Some(index)));
            }
        }
    }

    let mut sampler = Map::new();
    if let Some(mag) = wanted_filters.0 {
        sampler.insert("magFilter".to_string(), mag.into());
    }
    if let Some(min) = wanted_filters.1 {
        sampler.insert("minFilter".to_string(), min.into());
    }
    sampler.insert("wrapS".to_string(), want.0.into());
    sampler.insert("wrapT".to_string(), want.1.into());

    let root = json
        .as_object_mut()
        .ok_or_else(|| GlbError::InvalidReference("scene description is not an object".into()))?;
    let list = root
        .entry("samplers")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(list) = list.as_array_mut() else {
        return Err(GlbError::InvalidReference(
            "'samplers' is not an array".to_string(),
        ));
    };
    list.push(Value::Object(sampler));
    let created = list.len() - 1;

    texture_object(json, texture)?.insert("sampler".to_string(), created.into());
    Ok((EditAction::Created, Some(created)))
}
