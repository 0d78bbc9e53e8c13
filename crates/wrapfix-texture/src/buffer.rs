//! Opaque pixel buffers and nearest-texel sampling.
//!
//! Pixels are never interpreted, only copied, so every layout the PNG
//! decoder produces after expansion is supported as-is.

use wrapfix_spec::{UvOrigin, WrapMode, WrapPair};

use crate::error::{TextureError, TextureResult};

/// Channel layout and depth of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
}

impl PixelFormat {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Gray16 => 1,
            PixelFormat::GrayAlpha8 | PixelFormat::GrayAlpha16 => 2,
            PixelFormat::Rgb8 | PixelFormat::Rgb16 => 3,
            PixelFormat::Rgba8 | PixelFormat::Rgba16 => 4,
        }
    }

    /// Bytes per channel sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PixelFormat::Gray8
            | PixelFormat::GrayAlpha8
            | PixelFormat::Rgb8
            | PixelFormat::Rgba8 => 1,
            _ => 2,
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels() * self.bytes_per_sample()
    }
}

/// A row-major pixel buffer with row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw pixel bytes, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions(format!(
                "{}x{} image has no pixels",
                width, height
            )));
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(TextureError::InvalidDimensions(format!(
                "expected {} bytes for {}x{} {:?}, got {}",
                expected,
                width,
                height,
                format,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Creates a zero-filled buffer.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> TextureResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| {
                TextureError::InvalidDimensions(format!("{}x{} image is too large", width, height))
            })?;
        Self::new(width, height, format, vec![0; len])
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn row_len(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Bytes of one row.
    pub fn row(&self, y: u32) -> &[u8] {
        let len = self.row_len();
        let start = y as usize * len;
        &self.data[start..start + len]
    }

    /// Bytes of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.row_len() + x as usize * bpp;
        &self.data[start..start + bpp]
    }

    /// Copy with columns reversed.
    pub fn flipped_horizontal(&self) -> PixelBuffer {
        let bpp = self.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..self.height {
            for pixel in self.row(y).chunks_exact(bpp).rev() {
                data.extend_from_slice(pixel);
            }
        }
        PixelBuffer { data, ..*self }
    }

    /// Copy with rows reversed.
    pub fn flipped_vertical(&self) -> PixelBuffer {
        let mut data = Vec::with_capacity(self.data.len());
        for y in (0..self.height).rev() {
            data.extend_from_slice(self.row(y));
        }
        PixelBuffer { data, ..*self }
    }

    /// Copies `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// Rows are copied verbatim; `src` must fit and share the pixel format.
    pub fn blit(&mut self, src: &PixelBuffer, x: u32, y: u32) -> TextureResult<()> {
        if src.format != self.format {
            return Err(TextureError::UnsupportedFormat(format!(
                "cannot copy {:?} pixels into a {:?} buffer",
                src.format, self.format
            )));
        }
        let fits_x = x.checked_add(src.width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(src.height).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(TextureError::InvalidDimensions(format!(
                "{}x{} tile at ({}, {}) exceeds {}x{} buffer",
                src.width, src.height, x, y, self.width, self.height
            )));
        }

        let bpp = self.format.bytes_per_pixel();
        let dst_row_len = self.row_len();
        let offset = x as usize * bpp;
        for row in 0..src.height {
            let start = (y + row) as usize * dst_row_len + offset;
            let src_row = src.row(row);
            self.data[start..start + src_row.len()].copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Nearest texel at UV `(u, v)` under the given wrap pair.
    ///
    /// `origin` says which image row `v = 0` refers to.
    pub fn sample(&self, u: f64, v: f64, wrap: WrapPair, origin: UvOrigin) -> &[u8] {
        let x = wrap_texel((u * self.width as f64).floor() as i64, self.width, wrap.s);
        let t = wrap_texel((v * self.height as f64).floor() as i64, self.height, wrap.t);
        let y = match origin {
            UvOrigin::TopLeft => t,
            UvOrigin::BottomLeft => self.height - 1 - t,
        };
        self.pixel(x, y)
    }
}

/// Maps an unbounded texel index into `[0, size)` under `mode`.
pub fn wrap_texel(index: i64, size: u32, mode: WrapMode) -> u32 {
    let size = size as i64;
    let wrapped = match mode {
        WrapMode::Repeat => index.rem_euclid(size),
        WrapMode::Mirror => {
            let m = index.rem_euclid(2 * size);
            if m >= size {
                2 * size - 1 - m
            } else {
                m
            }
        }
        WrapMode::Clamp => index.clamp(0, size - 1),
    };
    wrapped as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height).map(|i| i as u8).collect();
        PixelBuffer::new(width, height, PixelFormat::Gray8, data).unwrap()
    }

    #[test]
    fn test_new_checks_length() {
        assert!(PixelBuffer::new(2, 2, PixelFormat::Rgba8, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, PixelFormat::Rgba8, vec![0; 15]),
            Err(TextureError::InvalidDimensions(_))
        ));
        assert!(PixelBuffer::new(0, 2, PixelFormat::Gray8, vec![]).is_err());
        assert_eq!(PixelFormat::Rgba16.bytes_per_pixel(), 8);
    }

    #[test]
    fn test_flips() {
        let img = gradient(3, 2);
        assert_eq!(img.flipped_horizontal().as_bytes(), &[2, 1, 0, 5, 4, 3]);
        assert_eq!(img.flipped_vertical().as_bytes(), &[3, 4, 5, 0, 1, 2]);
        assert_eq!(img.flipped_horizontal().flipped_horizontal(), img);
    }

    #[test]
    fn test_blit() {
        let mut dst = PixelBuffer::blank(4, 2, PixelFormat::Gray8).unwrap();
        dst.blit(&gradient(2, 2), 2, 0).unwrap();
        assert_eq!(dst.as_bytes(), &[0, 0, 0, 1, 0, 0, 2, 3]);
        assert!(dst.blit(&gradient(2, 2), 3, 0).is_err());
    }

    #[test]
    fn test_wrap_texel() {
        assert_eq!(wrap_texel(-1, 4, WrapMode::Repeat), 3);
        assert_eq!(wrap_texel(5, 4, WrapMode::Repeat), 1);
        assert_eq!(wrap_texel(4, 4, WrapMode::Mirror), 3);
        assert_eq!(wrap_texel(-1, 4, WrapMode::Mirror), 0);
        assert_eq!(wrap_texel(-5, 4, WrapMode::Mirror), 3);
        assert_eq!(wrap_texel(9, 4, WrapMode::Clamp), 3);
        assert_eq!(wrap_texel(-9, 4, WrapMode::Clamp), 0);
    }

    #[test]
    fn test_sample_origin() {
        let img = gradient(2, 2);
        let wrap = WrapPair::default();
        assert_eq!(img.sample(0.25, 0.25, wrap, UvOrigin::TopLeft), &[0]);
        assert_eq!(img.sample(0.25, 0.25, wrap, UvOrigin::BottomLeft), &[2]);
        assert_eq!(img.sample(1.25, 0.75, wrap, UvOrigin::BottomLeft), &[0]);
    }
}
