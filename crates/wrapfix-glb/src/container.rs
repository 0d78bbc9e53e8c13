//! GLB container parsing and serialization.
//!
//! Layout:
//!
//! ```text
//! [magic "glTF"][version u32][total length u32]
//! [chunk length u32]["JSON"][JSON bytes, space padded]
//! [chunk length u32]["BIN\0"][buffer bytes, zero padded]   (optional)
//! ```
//!
//! All integers are little-endian and every chunk length is a multiple of 4.

use std::io::Write;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::debug;
use serde_json::Value;

use crate::error::{GlbError, GlbResult};

/// Container magic.
pub const GLB_MAGIC: &[u8; 4] = b"glTF";
/// Supported container version.
pub const GLB_VERSION: u32 = 2;
/// Size of the file header.
pub const HEADER_SIZE: usize = 12;
/// Size of a chunk header.
pub const CHUNK_HEADER_SIZE: usize = 8;
/// "JSON" chunk type.
pub const CHUNK_JSON: u32 = 0x4E4F534A;
/// "BIN\0" chunk type.
pub const CHUNK_BIN: u32 = 0x004E4942;

/// Rounds up to the next multiple of 4.
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// A parsed GLB container.
#[derive(Debug, Clone, PartialEq)]
pub struct GlbDocument {
    /// Container version from the header.
    pub version: u32,
    /// Scene description.
    pub json: Value,
    /// BIN chunk contents exactly as stored, padding included.
    pub bin: Option<Vec<u8>>,
}

impl GlbDocument {
    /// Creates a document from a scene description and optional buffer.
    pub fn new(json: Value, bin: Option<Vec<u8>>) -> Self {
        Self {
            version: GLB_VERSION,
            json,
            bin,
        }
    }

    /// Parses a container, validating header, chunk structure and lengths.
    pub fn parse(data: &[u8]) -> GlbResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(GlbError::Truncated {
                needed: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[0..4]);
        if &magic != GLB_MAGIC {
            return Err(GlbError::InvalidMagic(magic));
        }

        let version = LittleEndian::read_u32(&data[4..8]);
        if version != GLB_VERSION {
            return Err(GlbError::UnsupportedVersion(version));
        }

        let declared = LittleEndian::read_u32(&data[8..12]);
        if declared as usize != data.len() {
            return Err(GlbError::LengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        let mut offset = HEADER_SIZE;
        let mut json: Option<Value> = None;
        let mut bin: Option<Vec<u8>> = None;

        while offset < data.len() {
            if offset + CHUNK_HEADER_SIZE > data.len() {
                return Err(GlbError::InvalidChunk {
                    offset,
                    detail: "truncated chunk header".to_string(),
                });
            }
            let length = LittleEndian::read_u32(&data[offset..offset + 4]) as usize;
            let chunk_type = LittleEndian::read_u32(&data[offset + 4..offset + 8]);
            let start = offset + CHUNK_HEADER_SIZE;

            if length % 4 != 0 {
                return Err(GlbError::InvalidChunk {
                    offset,
                    detail: format!("length {} is not 4-byte aligned", length),
                });
            }
            let end = start
                .checked_add(length)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| GlbError::InvalidChunk {
                    offset,
                    detail: format!("length {} runs past the end of the container", length),
                })?;
            let payload = &data[start..end];

            match chunk_type {
                CHUNK_JSON if json.is_none() && bin.is_none() => {
                    json = Some(parse_json_chunk(payload)?);
                }
                CHUNK_BIN if json.is_some() && bin.is_none() => {
                    bin = Some(payload.to_vec());
                }
                CHUNK_JSON | CHUNK_BIN => {
                    return Err(GlbError::InvalidChunk {
                        offset,
                        detail: format!("unexpected {} chunk", chunk_name(chunk_type)),
                    });
                }
                other => {
                    return Err(GlbError::InvalidChunk {
                        offset,
                        detail: format!("unknown chunk type 0x{:08X}", other),
                    });
                }
            }

            debug!(
                "chunk {} at offset {} ({} bytes)",
                chunk_name(chunk_type),
                offset,
                length
            );
            offset = end;
        }

        let json = json.ok_or_else(|| GlbError::InvalidChunk {
            offset: HEADER_SIZE,
            detail: "missing JSON chunk".to_string(),
        })?;

        Ok(Self { version, json, bin })
    }

    /// Reads and parses a container file.
    pub fn read(path: &Path) -> GlbResult<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Serializes the container.
    ///
    /// The scene description is fully re-serialized and space padded; the
    /// BIN chunk is copied through, zero padded only if its length is not
    /// already aligned.
    pub fn to_bytes(&self) -> GlbResult<Vec<u8>> {
        let json = serde_json::to_vec(&self.json)?;
        let json_len = padded_len(json.len());
        let bin_len = self.bin.as_ref().map(|b| padded_len(b.len()));

        let total = HEADER_SIZE
            + CHUNK_HEADER_SIZE
            + json_len
            + bin_len.map(|len| CHUNK_HEADER_SIZE + len).unwrap_or(0);
        let total_u32 = u32::try_from(total).map_err(|_| GlbError::TooLarge(total))?;

        let mut out = Vec::with_capacity(total);
        out.write_all(GLB_MAGIC)?;
        out.write_u32::<LittleEndian>(self.version)?;
        out.write_u32::<LittleEndian>(total_u32)?;

        out.write_u32::<LittleEndian>(json_len as u32)?;
        out.write_u32::<LittleEndian>(CHUNK_JSON)?;
        out.write_all(&json)?;
        out.resize(out.len() + json_len - json.len(), b' ');

        if let (Some(bin), Some(bin_len)) = (&self.bin, bin_len) {
            out.write_u32::<LittleEndian>(bin_len as u32)?;
            out.write_u32::<LittleEndian>(CHUNK_BIN)?;
            out.write_all(bin)?;
            out.resize(out.len() + bin_len - bin.len(), 0);
        }

        Ok(out)
    }

    /// Writes the container atomically: a sibling temp file renamed into place.
    pub fn write_atomic(&self, path: &Path) -> GlbResult<()> {
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".wrapfix_")
            .suffix(".glb.tmp")
            .tempfile_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.persist(path).map_err(|e| GlbError::Io(e.error))?;
        Ok(())
    }

    /// Array under a top-level key, if present.
    pub fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.json.get(key).and_then(Value::as_array)
    }
}

fn parse_json_chunk(payload: &[u8]) -> GlbResult<Value> {
    let end = payload
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    Ok(serde_json::from_slice(&payload[..end])?)
}

fn chunk_name(chunk_type: u32) -> &'static str {
    match chunk_type {
        CHUNK_JSON => "JSON",
        CHUNK_BIN => "BIN",
        _ => "unknown",
    }
}
