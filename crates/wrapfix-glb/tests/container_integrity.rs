//! Container integrity after patching.
//!
//! Patched containers must keep the BIN chunk byte-for-byte, declare a total
//! length equal to the header plus every padded chunk, and still load in an
//! independent glTF reader with the new sampler settings.

use std::path::Path;

use gltf::texture::WrappingMode;
use pretty_assertions::assert_eq;
use serde_json::json;

use wrapfix_glb::{padded_len, GlbDocument, GlbError, GlbWrapPatcher, CHUNK_BIN, CHUNK_JSON};
use wrapfix_spec::{ImageRef, TextureSamplerRef, WrapMode, WrapPair};

// =============================================================================
// Helper Functions
// =============================================================================

const BIN: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
    0x07,
];

/// A small but valid container: one embedded image used by two materials.
fn scene_json() -> serde_json::Value {
    json!({
        "asset": {"version": "2.0", "generator": "test"},
        "buffers": [{"byteLength": 16}],
        "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 16}],
        "images": [
            {"name": "tile", "mimeType": "image/png", "bufferView": 0},
            {"name": "moss.001", "mimeType": "image/png", "bufferView": 0}
        ],
        "samplers": [{"magFilter": 9729, "minFilter": 9987}],
        "textures": [
            {"source": 0, "sampler": 0},
            {"source": 1, "sampler": 0}
        ],
        "materials": [
            {"name": "Floor", "pbrMetallicRoughness": {"baseColorTexture": {"index": 0}}},
            {"name": "Wall", "pbrMetallicRoughness": {"baseColorTexture": {"index": 1}}}
        ]
    })
}

fn build_glb(json: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
    // Unaligned JSON so the chunk carries space padding.
    let mut text = serde_json::to_vec(json).unwrap();
    if text.len() % 4 == 0 {
        text.push(b' ');
    }
    let json_len = padded_len(text.len());
    let total = 12 + 8 + json_len + 8 + bin.len();

    let mut out = Vec::new();
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&text);
    out.resize(out.len() + json_len - text.len(), b' ');
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(bin);
    out
}

/// Splits a container into `(type, payload)` chunks.
fn chunks(data: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let mut out = Vec::new();
    let mut offset = 12;
    while offset < data.len() {
        let len = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
        let ty = u32::from_le_bytes(data[offset + 4..offset + 8].try_into().unwrap());
        out.push((ty, data[offset + 8..offset + 8 + len].to_vec()));
        offset += 8 + len;
    }
    out
}

fn usages() -> Vec<TextureSamplerRef> {
    vec![
        TextureSamplerRef::new(
            "Floor",
            ImageRef::new("tile_png", "textures/tile.png"),
            WrapPair::new(WrapMode::Mirror, WrapMode::Repeat),
        ),
        TextureSamplerRef::new(
            "Wall",
            ImageRef::new("moss_png", "moss.png"),
            WrapPair::uniform(WrapMode::Clamp),
        ),
    ]
}

fn write(path: &Path, bytes: &[u8]) {
    std::fs::write(path, bytes).unwrap();
}

// =============================================================================
// Integrity
// =============================================================================

#[test]
fn test_bin_chunk_unchanged_and_lengths_consistent() {
    let input = build_glb(&scene_json(), &BIN);
    let samplers = usages();
    let (output, report) = GlbWrapPatcher::new(&samplers).patch_bytes(&input).unwrap();

    assert_eq!(report.changed(), 2);
    assert!(report.unmatched.is_empty());

    let declared = u32::from_le_bytes(output[8..12].try_into().unwrap()) as usize;
    assert_eq!(declared, output.len());

    let parts = chunks(&output);
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].0, CHUNK_JSON);
    assert_eq!(parts[1].0, CHUNK_BIN);
    assert_eq!(parts[1].1, BIN.to_vec());

    let sum: usize = parts.iter().map(|(_, p)| 8 + padded_len(p.len())).sum();
    assert_eq!(declared, 12 + sum);
    assert!(parts.iter().all(|(_, p)| p.len() % 4 == 0));
}

#[test]
fn test_patched_container_loads_in_gltf_reader() {
    let input = build_glb(&scene_json(), &BIN);
    let samplers = usages();
    let (output, _) = GlbWrapPatcher::new(&samplers).patch_bytes(&input).unwrap();

    let gltf = gltf::Gltf::from_slice(&output).unwrap();
    assert_eq!(gltf.blob.as_deref(), Some(&BIN[..]));

    let floor = gltf.textures().next().unwrap().sampler();
    assert_eq!(floor.wrap_s(), WrappingMode::MirroredRepeat);
    assert_eq!(floor.wrap_t(), WrappingMode::Repeat);

    let wall = gltf.textures().nth(1).unwrap().sampler();
    assert_eq!(wall.wrap_s(), WrappingMode::ClampToEdge);
    assert_eq!(wall.wrap_t(), WrappingMode::ClampToEdge);
}

#[test]
fn test_patching_twice_is_stable() {
    let input = build_glb(&scene_json(), &BIN);
    let samplers = usages();
    let patcher = GlbWrapPatcher::new(&samplers);
    let (once, _) = patcher.patch_bytes(&input).unwrap();
    let (twice, report) = patcher.patch_bytes(&once).unwrap();
    assert_eq!(report.changed(), 0);
    assert_eq!(once, twice);
}

// =============================================================================
// Atomic Writes
// =============================================================================

#[test]
fn test_patch_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.glb");
    write(&path, &build_glb(&scene_json(), &BIN));

    let samplers = usages();
    let report = GlbWrapPatcher::new(&samplers).patch_file(&path, &path).unwrap();
    assert_eq!(report.changed(), 2);

    let doc = GlbDocument::read(&path).unwrap();
    assert_eq!(doc.bin.as_deref(), Some(&BIN[..]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_malformed_input_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.glb");
    let output = dir.path().join("out.glb");
    let mut bytes = build_glb(&scene_json(), &BIN);
    bytes[0..4].copy_from_slice(b"gltf");
    write(&input, &bytes);
    write(&output, b"previous");

    let samplers = usages();
    let err = GlbWrapPatcher::new(&samplers)
        .patch_file(&input, &output)
        .unwrap_err();
    assert!(matches!(err, GlbError::InvalidMagic(_)));
    assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    assert_eq!(std::fs::read(&input).unwrap(), bytes);
}
