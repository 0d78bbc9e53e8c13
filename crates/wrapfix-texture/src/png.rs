//! PNG decode and deterministic encode.
//!
//! Atlases are written with fixed compression settings so the same source
//! image and layout always produce byte-identical files.

use std::io::Write;
use std::path::Path;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType, Transformations};

use crate::buffer::{PixelBuffer, PixelFormat};
use crate::error::{TextureError, TextureResult};

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level. Use a fixed value for determinism.
    pub compression: Compression,
    /// Filter type. Use a fixed value for determinism.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

fn pixel_format(color: ColorType, depth: BitDepth) -> TextureResult<PixelFormat> {
    let format = match (color, depth) {
        (ColorType::Grayscale, BitDepth::Eight) => PixelFormat::Gray8,
        (ColorType::GrayscaleAlpha, BitDepth::Eight) => PixelFormat::GrayAlpha8,
        (ColorType::Rgb, BitDepth::Eight) => PixelFormat::Rgb8,
        (ColorType::Rgba, BitDepth::Eight) => PixelFormat::Rgba8,
        (ColorType::Grayscale, BitDepth::Sixteen) => PixelFormat::Gray16,
        (ColorType::GrayscaleAlpha, BitDepth::Sixteen) => PixelFormat::GrayAlpha16,
        (ColorType::Rgb, BitDepth::Sixteen) => PixelFormat::Rgb16,
        (ColorType::Rgba, BitDepth::Sixteen) => PixelFormat::Rgba16,
        (color, depth) => {
            return Err(TextureError::UnsupportedFormat(format!(
                "{:?} at {:?} bits per sample",
                color, depth
            )))
        }
    };
    Ok(format)
}

fn color_type(format: PixelFormat) -> (ColorType, BitDepth) {
    match format {
        PixelFormat::Gray8 => (ColorType::Grayscale, BitDepth::Eight),
        PixelFormat::GrayAlpha8 => (ColorType::GrayscaleAlpha, BitDepth::Eight),
        PixelFormat::Rgb8 => (ColorType::Rgb, BitDepth::Eight),
        PixelFormat::Rgba8 => (ColorType::Rgba, BitDepth::Eight),
        PixelFormat::Gray16 => (ColorType::Grayscale, BitDepth::Sixteen),
        PixelFormat::GrayAlpha16 => (ColorType::GrayscaleAlpha, BitDepth::Sixteen),
        PixelFormat::Rgb16 => (ColorType::Rgb, BitDepth::Sixteen),
        PixelFormat::Rgba16 => (ColorType::Rgba, BitDepth::Sixteen),
    }
}

/// Decodes PNG bytes into a pixel buffer.
///
/// Palettes, sub-byte depths and `tRNS` transparency are expanded; sixteen
/// bit samples are kept as stored (big-endian).
pub fn decode_png(bytes: &[u8]) -> TextureResult<PixelBuffer> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(Transformations::EXPAND);
    let mut reader = decoder.read_info()?;

    let mut pixels = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());

    let format = pixel_format(info.color_type, info.bit_depth)?;
    PixelBuffer::new(info.width, info.height, format, pixels)
}

/// Reads and decodes a PNG file.
pub fn read_png(path: &Path) -> TextureResult<PixelBuffer> {
    let bytes = std::fs::read(path)?;
    decode_png(&bytes)
}

/// Encodes a pixel buffer to any writer.
pub fn write_png_to_writer<W: Write>(
    buffer: &PixelBuffer,
    writer: W,
    config: &PngConfig,
) -> TextureResult<()> {
    let (color, depth) = color_type(buffer.format);
    let mut encoder = Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(color);
    encoder.set_depth(depth);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(buffer.as_bytes())?;
    png_writer.finish()?;

    Ok(())
}

/// Encodes a pixel buffer to PNG bytes.
pub fn encode_png(buffer: &PixelBuffer, config: &PngConfig) -> TextureResult<Vec<u8>> {
    let mut data = Vec::new();
    write_png_to_writer(buffer, &mut data, config)?;
    Ok(data)
}

/// Compute the BLAKE3 hash of PNG data.
pub fn hash_png(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checker(format: PixelFormat) -> PixelBuffer {
        let bpp = format.bytes_per_pixel();
        let data = (0..4 * 3 * bpp).map(|i| (i * 37 % 251) as u8).collect();
        PixelBuffer::new(4, 3, format, data).unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_pixels() {
        for format in [PixelFormat::Rgba8, PixelFormat::Gray16] {
            let img = checker(format);
            let bytes = encode_png(&img, &PngConfig::default()).unwrap();
            assert_eq!(decode_png(&bytes).unwrap(), img);
        }
    }

    #[test]
    fn test_encode_deterministic() {
        let img = checker(PixelFormat::Rgb8);
        let a = encode_png(&img, &PngConfig::default()).unwrap();
        let b = encode_png(&img, &PngConfig::default()).unwrap();
        assert_eq!(hash_png(&a), hash_png(&b));
        assert_eq!(hash_png(&a).len(), 64);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_png(b"not a png").unwrap_err();
        assert!(matches!(err, TextureError::Decoding(_)));
    }

    #[test]
    fn test_read_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        let img = checker(PixelFormat::GrayAlpha8);
        std::fs::write(&path, encode_png(&img, &PngConfig::default()).unwrap()).unwrap();
        assert_eq!(read_png(&path).unwrap(), img);
    }
}
