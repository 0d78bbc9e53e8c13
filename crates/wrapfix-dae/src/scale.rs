//! Uniform scale normalization.
//!
//! Multiplies every length in the document by one factor: vertex positions,
//! node translations, and the translation column of node, bind-shape and
//! inverse-bind matrices. Rotation and scale basis vectors are left alone, so
//! skinned meshes stay attached to their skeletons.

use std::collections::HashSet;

use log::info;
use serde::Serialize;
use xmltree::Element;

use crate::document::{
    attr, children_named, descendants_named, format_floats, fragment, parse_floats, set_text,
    text, visit_mut, DaeDocument,
};
use crate::error::{DaeError, DaeResult};

/// Indices of the translation column in a row-major 4x4 matrix.
const TRANSLATION: [usize; 3] = [3, 7, 11];

/// Counts of the values a normalization touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScaleReport {
    /// Position sources scaled.
    pub position_sources: usize,
    /// `<translate>` elements scaled.
    pub translates: usize,
    /// Node `<matrix>` elements scaled.
    pub matrices: usize,
    /// Skin `<bind_shape_matrix>` elements scaled.
    pub bind_shapes: usize,
    /// Inverse bind matrices scaled.
    pub inverse_binds: usize,
}

/// Scales the document's geometry and skeletons by `factor`.
pub fn normalize_scale(doc: &mut DaeDocument, factor: f64) -> DaeResult<ScaleReport> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DaeError::invalid(
            "scale factor",
            format!("{} is not a positive finite number", factor),
        ));
    }

    let positions = position_arrays(doc);
    let inverse_binds = inverse_bind_arrays(doc);

    let mut report = ScaleReport::default();
    let mut failure: Option<DaeError> = None;

    visit_mut(doc.root_mut(), &mut |el: &mut Element| {
        if failure.is_some() {
            return;
        }
        let outcome = match el.name.as_str() {
            "float_array" => {
                let id = attr(el, "id").unwrap_or_default();
                if positions.contains(id) {
                    report.position_sources += 1;
                    scale_values(el, factor, |_| true)
                } else if inverse_binds.contains(id) {
                    report.inverse_binds += 1;
                    scale_matrices(el, factor)
                } else {
                    Ok(())
                }
            }
            "translate" => {
                report.translates += 1;
                scale_values(el, factor, |_| true)
            }
            "matrix" => {
                report.matrices += 1;
                scale_matrices(el, factor)
            }
            "bind_shape_matrix" => {
                report.bind_shapes += 1;
                scale_matrices(el, factor)
            }
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            failure = Some(err);
        }
    });

    if let Some(err) = failure {
        return Err(err);
    }

    info!(
        "scaled by {}: {} position source(s), {} translate(s), {} matrix(es), {} bind shape(s), {} inverse bind array(s)",
        factor,
        report.position_sources,
        report.translates,
        report.matrices,
        report.bind_shapes,
        report.inverse_binds
    );
    Ok(report)
}

fn scale_values(el: &mut Element, factor: f64, pick: impl Fn(usize) -> bool) -> DaeResult<()> {
    let context = format!("<{}>", el.name);
    let mut values = parse_floats(&text(el), &context)?;
    for (i, value) in values.iter_mut().enumerate() {
        if pick(i) {
            *value *= factor;
        }
    }
    set_text(el, format_floats(&values));
    Ok(())
}

/// Scales the translation column of every 4x4 matrix in `el`.
fn scale_matrices(el: &mut Element, factor: f64) -> DaeResult<()> {
    let count = text(el).split_whitespace().count();
    if count % 16 != 0 {
        return Err(DaeError::invalid(
            format!("<{}> {}", el.name, attr(el, "id").or(attr(el, "sid")).unwrap_or_default()),
            format!("{} values is not a whole number of 4x4 matrices", count),
        ));
    }
    scale_values(el, factor, |i| TRANSLATION.contains(&(i % 16)))
}

/// Float array ids behind every POSITION input.
fn position_arrays(doc: &DaeDocument) -> HashSet<String> {
    let mut arrays = HashSet::new();
    for geometry in doc.library("library_geometries") {
        let Some(mesh) = geometry.get_child("mesh") else {
            continue;
        };
        let mut sources = HashSet::new();
        for input in descendants_named(mesh, "input") {
            if attr(input, "semantic") == Some("POSITION") {
                if let Some(source) = attr(input, "source") {
                    sources.insert(fragment(source).to_string());
                }
            }
        }
        arrays.extend(float_arrays_of(mesh, &sources));
    }
    arrays
}

/// Float array ids behind every skin INV_BIND_MATRIX input.
fn inverse_bind_arrays(doc: &DaeDocument) -> HashSet<String> {
    let mut arrays = HashSet::new();
    for controller in doc.library("library_controllers") {
        let Some(skin) = controller.get_child("skin") else {
            continue;
        };
        let sources: HashSet<String> = skin
            .get_child("joints")
            .map(|joints| {
                children_named(joints, "input")
                    .filter(|i| attr(i, "semantic") == Some("INV_BIND_MATRIX"))
                    .filter_map(|i| attr(i, "source"))
                    .map(|s| fragment(s).to_string())
                    .collect()
            })
            .unwrap_or_default();
        arrays.extend(float_arrays_of(skin, &sources));
    }
    arrays
}

fn float_arrays_of(parent: &Element, sources: &HashSet<String>) -> Vec<String> {
    children_named(parent, "source")
        .filter(|s| attr(s, "id").is_some_and(|id| sources.contains(id)))
        .filter_map(|s| s.get_child("float_array"))
        .filter_map(|a| attr(a, "id"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SCENE, SKINNED};
    use pretty_assertions::assert_eq;

    fn values(doc: &DaeDocument, name: &str, id: Option<&str>) -> Vec<f64> {
        let el = descendants_named(doc.root(), name)
            .into_iter()
            .find(|e| id.is_none() || attr(e, "id") == id)
            .unwrap();
        parse_floats(&text(el), name).unwrap()
    }

    #[test]
    fn test_vertex_scales_by_factor() {
        let mut doc = DaeDocument::parse(SCENE.as_bytes()).unwrap();
        let report = normalize_scale(&mut doc, 100.0).unwrap();

        let floor = values(&doc, "float_array", Some("floor-pos-array"));
        assert_eq!(&floor[3..6], &[100.0, 0.0, 0.0]);
        assert_eq!(report.position_sources, 2);
        assert_eq!(report.translates, 1);
        assert_eq!(report.matrices, 1);

        assert_eq!(values(&doc, "translate", None), vec![100.0, 200.0, 300.0]);
        assert_eq!(
            values(&doc, "matrix", None),
            vec![1.0, 0.0, 0.0, 400.0, 0.0, 1.0, 0.0, 500.0, 0.0, 0.0, 1.0, 600.0, 0.0, 0.0, 0.0, 1.0]
        );
        // Texcoords are not lengths.
        assert_eq!(
            values(&doc, "float_array", Some("floor-uv-array")),
            vec![0.0, 0.0, 2.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_skeleton_scales_consistently() {
        let mut doc = DaeDocument::parse(SKINNED.as_bytes()).unwrap();
        let report = normalize_scale(&mut doc, 10.0).unwrap();
        assert_eq!(
            report,
            ScaleReport {
                position_sources: 1,
                translates: 0,
                matrices: 1,
                bind_shapes: 1,
                inverse_binds: 1,
            }
        );

        assert_eq!(
            values(&doc, "float_array", Some("body-pos-array")),
            vec![10.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, -10.0, -10.0, 0.0]
        );
        // Joint basis keeps its scale of 2; only the translation grows.
        assert_eq!(
            values(&doc, "matrix", None),
            vec![2.0, 0.0, 0.0, 10.0, 0.0, 2.0, 0.0, 10.0, 0.0, 0.0, 2.0, 10.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            values(&doc, "bind_shape_matrix", None),
            vec![1.0, 0.0, 0.0, 5.0, 0.0, 1.0, 0.0, 2.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            values(&doc, "float_array", Some("body-inv-bind-array")),
            vec![1.0, 0.0, 0.0, -10.0, 0.0, 1.0, 0.0, -20.0, 0.0, 0.0, 1.0, -30.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = (0..4).map(|k| a[row * 4 + k] * b[k * 4 + col]).sum();
            }
        }
        out
    }

    fn transform_point(m: &[f64], p: &[f64]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (row, value) in out.iter_mut().enumerate() {
            *value = m[row * 4] * p[0] + m[row * 4 + 1] * p[1] + m[row * 4 + 2] * p[2] + m[row * 4 + 3];
        }
        out
    }

    /// Every vertex of the skinned body as posed by its single joint:
    /// joint * inverse bind * bind shape * position.
    fn posed_vertices(doc: &DaeDocument) -> Vec<[f64; 3]> {
        let joint = values(doc, "matrix", None);
        let inverse_bind = values(doc, "float_array", Some("body-inv-bind-array"));
        let bind_shape = values(doc, "bind_shape_matrix", None);
        let skin = mul(&mul(&joint, &inverse_bind), &bind_shape);
        values(doc, "float_array", Some("body-pos-array"))
            .chunks(3)
            .map(|p| transform_point(&skin, p))
            .collect()
    }

    #[test]
    fn test_skinned_pose_scales_uniformly() {
        let mut doc = DaeDocument::parse(SKINNED.as_bytes()).unwrap();
        let before = posed_vertices(&doc);
        normalize_scale(&mut doc, 100.0).unwrap();
        let after = posed_vertices(&doc);

        assert_eq!(before.len(), 4);
        for (old, new) in before.iter().zip(&after) {
            for axis in 0..3 {
                assert!(
                    (new[axis] - old[axis] * 100.0).abs() < 1e-9,
                    "{:?} -> {:?}",
                    old,
                    new
                );
            }
        }
    }

    #[test]
    fn test_rejects_bad_factor() {
        let mut doc = DaeDocument::parse(SCENE.as_bytes()).unwrap();
        assert!(normalize_scale(&mut doc, 0.0).is_err());
        assert!(normalize_scale(&mut doc, f64::NAN).is_err());
        assert!(normalize_scale(&mut doc, -1.0).is_err());
    }

    #[test]
    fn test_rejects_truncated_matrix() {
        let xml = SCENE.replace("1 0 0 4 0 1 0 5 0 0 1 6 0 0 0 1", "1 0 0 4 0 1 0 5");
        let mut doc = DaeDocument::parse(xml.as_bytes()).unwrap();
        let err = normalize_scale(&mut doc, 2.0).unwrap_err();
        assert!(matches!(err, DaeError::InvalidValue { .. }));
    }
}
