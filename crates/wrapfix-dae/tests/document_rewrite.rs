//! End-to-end rewrites of a COLLADA document through the public API.

use pretty_assertions::assert_eq;

use wrapfix_dae::{normalize_scale, write_back, DaeDocument, DaeWrapExtractor, MaterialGraphSet, MeshScan};
use wrapfix_spec::resolve::resolve_groups;
use wrapfix_spec::{ImageRef, Layout, Strategy, UvFootprint, UvTransform, WrapMode, WrapPair};

const DOCUMENT: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <library_images>
    <image id="brick_png"><init_from>./brick.png</init_from></image>
  </library_images>
  <library_materials>
    <material id="Brick" name="Brick"><instance_effect url="#Effect_Brick"/></material>
  </library_materials>
  <library_effects>
    <effect id="Effect_Brick">
      <profile_COMMON>
        <newparam sid="brick-surface"><surface type="2D"><init_from>brick_png</init_from></surface></newparam>
        <newparam sid="brick-sampler"><sampler2D><source>brick-surface</source><wrap_s>MIRROR</wrap_s><wrap_t>REPEAT</wrap_t><minfilter>LINEAR</minfilter></sampler2D></newparam>
        <technique sid="common"><phong><diffuse><texture texture="brick-sampler" texcoord="CHANNEL0"/></diffuse></phong></technique>
      </profile_COMMON>
    </effect>
  </library_effects>
  <library_geometries>
    <geometry id="wall">
      <mesh>
        <source id="wall-pos">
          <float_array id="wall-pos-array" count="9">1 0 0 0 1 0 0 0 1</float_array>
          <technique_common><accessor source="#wall-pos-array" count="3" stride="3"/></technique_common>
        </source>
        <source id="wall-uv">
          <float_array id="wall-uv-array" count="6">-0.5 0 1.5 0 0.5 1</float_array>
          <technique_common><accessor source="#wall-uv-array" count="3" stride="2"/></technique_common>
        </source>
        <vertices id="wall-verts"><input semantic="POSITION" source="#wall-pos"/></vertices>
        <triangles material="brick" count="1">
          <input semantic="VERTEX" source="#wall-verts" offset="0"/>
          <input semantic="TEXCOORD" source="#wall-uv" offset="1" set="0"/>
          <p>0 0 1 1 2 2</p>
        </triangles>
      </mesh>
    </geometry>
  </library_geometries>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="wall-node">
        <translate>0 0 0.5</translate>
        <instance_geometry url="#wall">
          <bind_material><technique_common>
            <instance_material symbol="brick" target="#Brick">
              <bind_vertex_input semantic="CHANNEL0" input_semantic="TEXCOORD" input_set="0"/>
            </instance_material>
          </technique_common></bind_material>
        </instance_geometry>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>
"##;

#[test]
fn test_condensed_document_survives_disk_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall.dae");
    std::fs::write(&path, DOCUMENT).unwrap();

    let mut doc = DaeDocument::read(&path).unwrap();
    let samplers = DaeWrapExtractor::default().extract(&doc).unwrap();
    let scan = MeshScan::scan(&doc).unwrap();
    let plans = resolve_groups(&samplers, &scan.footprints());
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].strategy, Strategy::Condense(Layout::MirrorS));
    assert_eq!(
        plans[0].group.members[0].footprint,
        Some(UvFootprint::new(-0.5, 1.5, 0.0, 1.0))
    );

    // Three tiles on S cover cells -1..2.
    let transform = UvTransform::new([1.0 / 3.0, 0.0], [1.0 / 3.0, 1.0]);
    let mut graphs = MaterialGraphSet::build(&samplers);
    assert!(graphs.condense(0, ImageRef::new("brick_condensed", "brick_condensed.png"), transform));
    let report = write_back(&mut doc, &scan, &samplers, &graphs).unwrap();
    assert_eq!(report.samplers_redirected, 1);
    doc.write_atomic(&path).unwrap();

    let reread = DaeDocument::read(&path).unwrap();
    let samplers = DaeWrapExtractor::default().extract(&reread).unwrap();
    assert_eq!(samplers.len(), 1);
    assert_eq!(samplers[0].image, ImageRef::new("brick_condensed", "brick_condensed.png"));
    assert_eq!(samplers[0].wrap, WrapPair::uniform(WrapMode::Clamp));

    let footprint = MeshScan::scan(&reread).unwrap().bindings()[0].footprint.unwrap();
    assert!(footprint.within_unit());
    assert!((footprint.s.min - 1.0 / 6.0).abs() < 1e-9);
    assert!((footprint.s.max - 5.0 / 6.0).abs() < 1e-9);

    // With every mirror baked in, nothing is left to correct.
    let plans = resolve_groups(&samplers, &MeshScan::scan(&reread).unwrap().footprints());
    assert_eq!(plans[0].strategy, Strategy::Condense(Layout::Single));
}

#[test]
fn test_scale_normalization_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall.dae");
    let mut doc = DaeDocument::parse(DOCUMENT.as_bytes()).unwrap();
    let report = normalize_scale(&mut doc, 100.0).unwrap();
    assert_eq!(report.position_sources, 1);
    assert_eq!(report.translates, 1);
    doc.write_atomic(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("100 0 0 0 100 0 0 0 100"));
    assert!(text.contains("0 0 50"));
    // Texture coordinates keep their values.
    assert!(text.contains("-0.5 0 1.5 0 0.5 1"));
}
