//! Recovers per-texture wrap intent from a COLLADA document.
//!
//! Recognized sampler fields, in priority order:
//!
//! | Slot | Fields | Source tag |
//! |------|--------|------------|
//! | `sampler2D` | `wrap_s`, `wrap_t` tokens | [`WrapSource::Declared`] |
//! | `sampler2D/extra/technique` | `wrapU`, `wrapV`, `mirrorU`, `mirrorV` flags | [`WrapSource::Extra`] |
//! | none | configured base mode | [`WrapSource::Defaulted`] |

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use xmltree::Element;

use wrapfix_spec::{FixupConfig, ImageRef, TextureSamplerRef, WrapMode, WrapPair, WrapSource};

use crate::document::{
    attr, child_elements, descendants_named, fragment, image_path, text, DaeDocument,
};
use crate::error::{DaeError, DaeResult};

/// Prefix the exporting tool puts in front of effect ids.
pub const EFFECT_PREFIX: &str = "Effect_";

/// Typed view of one `sampler2D` parameter.
#[derive(Debug, Clone, PartialEq)]
struct SamplerParam {
    /// Surface sid from `<source>` (1.4).
    source: Option<String>,
    /// Image id from `<instance_image url>` (1.5).
    instance_image: Option<String>,
    wrap: WrapPair,
    origin: WrapSource,
}

/// Parameters and texture lookups of one effect.
#[derive(Debug, Default)]
struct EffectParams {
    surfaces: HashMap<String, String>,
    samplers: HashMap<String, SamplerParam>,
    /// `(texture attribute, texcoord)` in document order.
    lookups: Vec<(String, String)>,
}

/// Vendor extension flags found under `sampler2D/extra`.
#[derive(Debug, Default, Clone, Copy)]
struct ExtraFlags {
    wrap_u: Option<bool>,
    wrap_v: Option<bool>,
    mirror_u: Option<bool>,
    mirror_v: Option<bool>,
}

impl ExtraFlags {
    fn is_empty(&self) -> bool {
        self.wrap_u.is_none()
            && self.wrap_v.is_none()
            && self.mirror_u.is_none()
            && self.mirror_v.is_none()
    }

    fn axis(wrap: Option<bool>, mirror: Option<bool>, base: WrapMode) -> WrapMode {
        match (mirror, wrap) {
            (Some(true), _) => WrapMode::Mirror,
            (_, Some(false)) => WrapMode::Clamp,
            (_, Some(true)) => WrapMode::Repeat,
            _ => base,
        }
    }

    fn pair(&self, base: WrapMode) -> WrapPair {
        WrapPair::new(
            Self::axis(self.wrap_u, self.mirror_u, base),
            Self::axis(self.wrap_v, self.mirror_v, base),
        )
    }
}

/// Extracts [`TextureSamplerRef`]s from a COLLADA document.
#[derive(Debug, Clone, Copy)]
pub struct DaeWrapExtractor {
    base_wrap: WrapMode,
}

impl Default for DaeWrapExtractor {
    fn default() -> Self {
        Self::new(WrapMode::Repeat)
    }
}

impl DaeWrapExtractor {
    /// Creates an extractor; `base_wrap` stands in for missing or `NONE` wrap data.
    pub fn new(base_wrap: WrapMode) -> Self {
        Self { base_wrap }
    }

    /// Creates an extractor from the invocation config.
    pub fn from_config(config: &FixupConfig) -> Self {
        Self::new(config.base_wrap)
    }

    /// Returns one sampler reference per distinct texture usage, in discovery order.
    ///
    /// Materials are visited in document order, then effects that no material
    /// instantiates. Fails when a texture, surface or image reference does not
    /// resolve, or when a wrap token is unknown.
    pub fn extract(&self, doc: &DaeDocument) -> DaeResult<Vec<TextureSamplerRef>> {
        let images = collect_images(doc);

        let mut effects: Vec<(&str, &Element)> = Vec::new();
        for effect in doc.library("library_effects").filter(|e| e.name == "effect") {
            if let Some(id) = attr(effect, "id") {
                effects.push((id, effect));
            }
        }

        let mut samplers = Vec::new();
        let mut seen = HashSet::new();
        let mut instanced = HashSet::new();

        for material in doc.library("library_materials").filter(|e| e.name == "material") {
            let material_id = attr(material, "id").unwrap_or_default();
            let material_name = attr(material, "name").unwrap_or(material_id);
            let effect_url = material
                .get_child("instance_effect")
                .and_then(|e| attr(e, "url"))
                .map(fragment)
                .ok_or_else(|| {
                    DaeError::unresolved("effect", "", format!("material '{}'", material_id))
                })?;
            let (effect_id, effect) = effects
                .iter()
                .find(|(id, _)| *id == effect_url)
                .copied()
                .ok_or_else(|| {
                    DaeError::unresolved(
                        "effect",
                        effect_url,
                        format!("material '{}'", material_id),
                    )
                })?;
            instanced.insert(effect_id);

            for sampler in self.effect_samplers(effect_id, effect, &images)? {
                let sampler = sampler
                    .with_material_name(material_name)
                    .with_effect(effect_id);
                let sampler = TextureSamplerRef {
                    material_id: material_id.to_string(),
                    ..sampler
                };
                if seen.insert(sampler.clone()) {
                    samplers.push(sampler);
                }
            }
        }

        for &(effect_id, effect) in effects.iter().filter(|(id, _)| !instanced.contains(id)) {
            let name = effect_id.strip_prefix(EFFECT_PREFIX).unwrap_or(effect_id);
            debug!("effect '{}' has no material, reporting as '{}'", effect_id, name);
            for sampler in self.effect_samplers(effect_id, effect, &images)? {
                let sampler = TextureSamplerRef {
                    material_id: name.to_string(),
                    material_name: name.to_string(),
                    ..sampler
                };
                if seen.insert(sampler.clone()) {
                    samplers.push(sampler);
                }
            }
        }

        info!(
            "extracted {} texture usage(s) from {} effect(s)",
            samplers.len(),
            effects.len()
        );
        Ok(samplers)
    }

    /// Resolves every texture lookup of one effect.
    fn effect_samplers(
        &self,
        effect_id: &str,
        effect: &Element,
        images: &HashMap<String, ImageRef>,
    ) -> DaeResult<Vec<TextureSamplerRef>> {
        let params = self.effect_params(effect_id, effect)?;
        let context = format!("effect '{}'", effect_id);
        let mut out = Vec::new();

        for (texture, texcoord) in &params.lookups {
            let (image_id, sid, wrap, origin) = match params.samplers.get(texture) {
                Some(sampler) => {
                    let image_id = match (&sampler.instance_image, &sampler.source) {
                        (Some(image), _) => image.clone(),
                        (None, Some(surface)) => match params.surfaces.get(surface) {
                            Some(image) => image.clone(),
                            // Some exporters point the sampler straight at the image.
                            None if images.contains_key(surface) => surface.clone(),
                            None => {
                                return Err(DaeError::unresolved("surface", surface, &context))
                            }
                        },
                        (None, None) => {
                            return Err(DaeError::unresolved("surface", "", &context));
                        }
                    };
                    (image_id, Some(texture.clone()), sampler.wrap, sampler.origin)
                }
                None if images.contains_key(texture) => (
                    texture.clone(),
                    None,
                    WrapPair::uniform(self.base_wrap),
                    WrapSource::Defaulted,
                ),
                None => return Err(DaeError::unresolved("texture", texture, &context)),
            };

            let image = images
                .get(&image_id)
                .cloned()
                .ok_or_else(|| DaeError::unresolved("image", &image_id, &context))?;

            debug!(
                "{}: texture '{}' -> image '{}' wrap {} ({:?})",
                effect_id, texture, image.id, wrap, origin
            );

            let mut sampler = TextureSamplerRef::new(effect_id, image, wrap)
                .with_texcoord(texcoord.clone())
                .with_source(origin);
            if let Some(sid) = sid {
                sampler = sampler.with_sampler_sid(sid);
            }
            out.push(sampler);
        }

        Ok(out)
    }

    fn effect_params(&self, effect_id: &str, effect: &Element) -> DaeResult<EffectParams> {
        let mut params = EffectParams::default();

        for newparam in descendants_named(effect, "newparam") {
            let Some(sid) = attr(newparam, "sid") else {
                continue;
            };
            if let Some(surface) = newparam.get_child("surface") {
                let image = surface
                    .get_child("init_from")
                    .map(|init| match init.get_child("ref") {
                        Some(reference) => text(reference),
                        None => text(init),
                    })
                    .unwrap_or_default();
                params.surfaces.insert(sid.to_string(), fragment(&image).to_string());
            } else if let Some(sampler) = newparam.get_child("sampler2D") {
                let param = self.sampler_param(effect_id, sid, sampler)?;
                params.samplers.insert(sid.to_string(), param);
            }
        }

        for texture in descendants_named(effect, "texture") {
            let Some(target) = attr(texture, "texture") else {
                continue;
            };
            let texcoord = attr(texture, "texcoord").unwrap_or_default();
            params
                .lookups
                .push((target.to_string(), texcoord.to_string()));
        }

        Ok(params)
    }

    fn sampler_param(&self, effect_id: &str, sid: &str, sampler: &Element) -> DaeResult<SamplerParam> {
        let source = sampler
            .get_child("source")
            .map(text)
            .filter(|s| !s.is_empty());
        let instance_image = sampler
            .get_child("instance_image")
            .and_then(|e| attr(e, "url"))
            .map(|url| fragment(url).to_string());

        let wrap_s = sampler.get_child("wrap_s").map(text);
        let wrap_t = sampler.get_child("wrap_t").map(text);

        let (wrap, origin) = if wrap_s.is_some() || wrap_t.is_some() {
            let s = self.parse_token(effect_id, sid, wrap_s)?;
            let t = self.parse_token(effect_id, sid, wrap_t)?;
            (WrapPair::new(s, t), WrapSource::Declared)
        } else {
            let flags = extra_flags(effect_id, sampler)?;
            if flags.is_empty() {
                (WrapPair::uniform(self.base_wrap), WrapSource::Defaulted)
            } else {
                (flags.pair(self.base_wrap), WrapSource::Extra)
            }
        };

        Ok(SamplerParam {
            source,
            instance_image,
            wrap,
            origin,
        })
    }

    fn parse_token(&self, effect_id: &str, sid: &str, token: Option<String>) -> DaeResult<WrapMode> {
        match token {
            None => Ok(self.base_wrap),
            Some(token) => WrapMode::from_vendor_token(&token, self.base_wrap).ok_or_else(|| {
                DaeError::InvalidWrapToken {
                    sampler: format!("{}/{}", effect_id, sid),
                    token,
                }
            }),
        }
    }
}

fn collect_images(doc: &DaeDocument) -> HashMap<String, ImageRef> {
    let mut images = HashMap::new();
    let scoped = doc
        .library("library_effects")
        .flat_map(|effect| descendants_named(effect, "image"));
    for image in doc
        .library("library_images")
        .filter(|e| e.name == "image")
        .chain(scoped)
    {
        if let Some(id) = attr(image, "id") {
            images
                .entry(id.to_string())
                .or_insert_with(|| ImageRef::new(id, image_path(image)));
        }
    }
    images
}

fn extra_flags(effect_id: &str, sampler: &Element) -> DaeResult<ExtraFlags> {
    let mut flags = ExtraFlags::default();
    let Some(extra) = sampler.get_child("extra") else {
        return Ok(flags);
    };
    for technique in child_elements(extra).filter(|e| e.name == "technique") {
        for field in child_elements(technique) {
            let slot = match field.name.as_str() {
                "wrapU" => &mut flags.wrap_u,
                "wrapV" => &mut flags.wrap_v,
                "mirrorU" => &mut flags.mirror_u,
                "mirrorV" => &mut flags.mirror_v,
                _ => continue,
            };
            *slot = Some(parse_flag(&text(field)).ok_or_else(|| {
                DaeError::invalid(
                    format!("effect '{}' <{}>", effect_id, field.name),
                    format!("'{}' is not a boolean", text(field)),
                )
            })?);
        }
    }
    Ok(flags)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SCENE;
    use pretty_assertions::assert_eq;

    fn extract(xml: &str) -> DaeResult<Vec<TextureSamplerRef>> {
        let doc = DaeDocument::parse(xml.as_bytes()).unwrap();
        DaeWrapExtractor::default().extract(&doc)
    }

    fn effect_doc(body: &str) -> String {
        format!(
            r##"<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <library_images><image id="img"><init_from>img.png</init_from></image></library_images>
  <library_materials><material id="m" name="M"><instance_effect url="#fx"/></material></library_materials>
  <library_effects><effect id="fx"><profile_COMMON>{}</profile_COMMON></effect></library_effects>
</COLLADA>"##,
            body
        )
    }

    #[test]
    fn test_extracts_scene_in_discovery_order() {
        let samplers = extract(SCENE).unwrap();
        let summary: Vec<(String, String, String, WrapPair, WrapSource)> = samplers
            .iter()
            .map(|s| {
                (
                    s.material_id.clone(),
                    s.image.id.clone(),
                    s.texcoord.clone(),
                    s.wrap,
                    s.source,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "Floor".to_string(),
                    "tile_png".to_string(),
                    "CHANNEL0".to_string(),
                    WrapPair::new(WrapMode::Mirror, WrapMode::Repeat),
                    WrapSource::Declared,
                ),
                (
                    "Wall".to_string(),
                    "moss_png".to_string(),
                    "UVSET0".to_string(),
                    WrapPair::new(WrapMode::Clamp, WrapMode::Mirror),
                    WrapSource::Extra,
                ),
                (
                    "Trim".to_string(),
                    "tile_png".to_string(),
                    "CHANNEL0".to_string(),
                    WrapPair::uniform(WrapMode::Repeat),
                    WrapSource::Defaulted,
                ),
            ]
        );
        assert_eq!(samplers[0].effect_id, "Effect_Floor");
        assert_eq!(samplers[0].sampler_sid.as_deref(), Some("tile-sampler"));
        assert_eq!(samplers[0].image.path, "textures/tile.png");
        assert_eq!(samplers[2].effect_id, "Effect_Trim");
        assert_eq!(samplers[2].sampler_sid, None);
    }

    #[test]
    fn test_missing_wrap_data_uses_base_mode() {
        let xml = effect_doc(
            r#"<newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
               <newparam sid="samp"><sampler2D><source>surf</source></sampler2D></newparam>
               <technique sid="common"><lambert><diffuse><texture texture="samp" texcoord="UV"/></diffuse></lambert></technique>"#,
        );
        let doc = DaeDocument::parse(xml.as_bytes()).unwrap();

        let repeat = DaeWrapExtractor::default().extract(&doc).unwrap();
        assert_eq!(repeat[0].wrap, WrapPair::uniform(WrapMode::Repeat));
        assert_eq!(repeat[0].source, WrapSource::Defaulted);

        let mirror = DaeWrapExtractor::new(WrapMode::Mirror).extract(&doc).unwrap();
        assert_eq!(mirror[0].wrap, WrapPair::uniform(WrapMode::Mirror));
    }

    #[test]
    fn test_none_token_and_single_axis() {
        let xml = effect_doc(
            r#"<newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
               <newparam sid="samp"><sampler2D><source>surf</source><wrap_s>none</wrap_s></sampler2D></newparam>
               <technique sid="common"><lambert><diffuse><texture texture="samp" texcoord="UV"/></diffuse></lambert></technique>"#,
        );
        let doc = DaeDocument::parse(xml.as_bytes()).unwrap();
        let samplers = DaeWrapExtractor::new(WrapMode::Clamp).extract(&doc).unwrap();
        assert_eq!(samplers[0].wrap, WrapPair::uniform(WrapMode::Clamp));
        assert_eq!(samplers[0].source, WrapSource::Declared);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let xml = effect_doc(
            r#"<newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
               <newparam sid="samp"><sampler2D><source>surf</source><wrap_s>SPIRAL</wrap_s></sampler2D></newparam>
               <technique sid="common"><lambert><diffuse><texture texture="samp" texcoord="UV"/></diffuse></lambert></technique>"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(
            err,
            DaeError::InvalidWrapToken { ref sampler, ref token } if sampler == "fx/samp" && token == "SPIRAL"
        ));
    }

    #[test]
    fn test_unresolved_texture_is_rejected() {
        let xml = effect_doc(
            r#"<technique sid="common"><lambert><diffuse><texture texture="ghost" texcoord="UV"/></diffuse></lambert></technique>"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(
            err,
            DaeError::UnresolvedReference { kind: "texture", ref id, .. } if id == "ghost"
        ));
    }

    #[test]
    fn test_unresolved_surface_image_is_rejected() {
        let xml = effect_doc(
            r#"<newparam sid="surf"><surface type="2D"><init_from>missing</init_from></surface></newparam>
               <newparam sid="samp"><sampler2D><source>surf</source></sampler2D></newparam>
               <technique sid="common"><lambert><diffuse><texture texture="samp" texcoord="UV"/></diffuse></lambert></technique>"#,
        );
        let err = extract(&xml).unwrap_err();
        assert!(matches!(
            err,
            DaeError::UnresolvedReference { kind: "image", ref id, .. } if id == "missing"
        ));
    }

    #[test]
    fn test_instance_image_sampler() {
        let xml = effect_doc(
            r##"<newparam sid="samp"><sampler2D><instance_image url="#img"/><wrap_s>MIRROR</wrap_s><wrap_t>MIRROR</wrap_t></sampler2D></newparam>
               <technique sid="common"><lambert><diffuse><texture texture="samp" texcoord="UV"/></diffuse></lambert></technique>"##,
        );
        let samplers = extract(&xml).unwrap();
        assert_eq!(samplers[0].image.id, "img");
        assert_eq!(samplers[0].wrap, WrapPair::uniform(WrapMode::Mirror));
    }

    #[test]
    fn test_duplicate_lookups_are_reported_once() {
        let xml = effect_doc(
            r#"<newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
               <newparam sid="samp"><sampler2D><source>surf</source></sampler2D></newparam>
               <technique sid="common"><phong>
                 <diffuse><texture texture="samp" texcoord="UV"/></diffuse>
                 <specular><texture texture="samp" texcoord="UV"/></specular>
               </phong></technique>"#,
        );
        assert_eq!(extract(&xml).unwrap().len(), 1);
    }

    #[test]
    fn test_extra_flag_precedence() {
        assert_eq!(
            ExtraFlags::axis(Some(false), Some(true), WrapMode::Repeat),
            WrapMode::Mirror
        );
        assert_eq!(ExtraFlags::axis(Some(false), None, WrapMode::Repeat), WrapMode::Clamp);
        assert_eq!(ExtraFlags::axis(Some(true), Some(false), WrapMode::Clamp), WrapMode::Repeat);
        assert_eq!(ExtraFlags::axis(None, None, WrapMode::Clamp), WrapMode::Clamp);
    }
}
