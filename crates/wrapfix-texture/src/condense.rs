//! Atlas condensation.
//!
//! An atlas is a grid of copies of the source image, one per UV cell the
//! group samples. On a mirrored axis the copy for an odd cell is flipped, so
//! clamp-addressed lookups into the atlas see exactly the texels the original
//! wrap mode would have produced.
//!
//! ```text
//!   cells  -1     0     1            (MirrorS, S window [-1, 2))
//!        +-----+-----+-----+
//!        | flip| src | flip|
//!        +-----+-----+-----+
//! ```

use log::{debug, info};
use wrapfix_spec::{
    Axis, CellWindow, Layout, TextureSamplerRef, UvOrigin, UvTransform, WrapGroup,
};

use crate::buffer::PixelBuffer;
use crate::error::{TextureError, TextureResult};

/// UV transform for one group member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberTransform {
    pub sampler: TextureSamplerRef,
    /// Maps the member's original coordinates into the atlas.
    pub transform: UvTransform,
}

/// A composited atlas plus the per-member UV remaps into it.
#[derive(Debug, Clone, PartialEq)]
pub struct CondensedAtlas {
    pub image: PixelBuffer,
    pub layout: Layout,
    /// Covered cell window on S and T.
    pub cells: [CellWindow; 2],
    pub members: Vec<MemberTransform>,
}

impl CondensedAtlas {
    /// Returns true if the atlas is the untouched source image.
    pub fn is_noop(&self) -> bool {
        self.members.iter().all(|m| m.transform.is_identity()) && self.layout.is_noop()
    }

    /// Transform shared by every member.
    pub fn transform(&self) -> UvTransform {
        self.members
            .first()
            .map(|m| m.transform)
            .unwrap_or_default()
    }
}

/// Bakes wrap variants of one image into a clamp-addressed atlas.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureCondenser {
    origin: UvOrigin,
}

impl TextureCondenser {
    /// Creates a condenser for texture coordinates with the given V origin.
    pub fn new(origin: UvOrigin) -> Self {
        Self { origin }
    }

    /// Condenses `group` sampled from `source` into an atlas for `layout`.
    ///
    /// Fails with an unsupported footprint error when any corrected member
    /// samples outside [-1,2]x[-1,2]. A `Single` layout returns the source
    /// image unchanged with identity transforms.
    pub fn condense(
        &self,
        group: &WrapGroup,
        layout: Layout,
        source: &PixelBuffer,
    ) -> TextureResult<CondensedAtlas> {
        if let Some(footprint) = group.corrected_footprint() {
            footprint.ensure_condensable(group.name())?;
        }

        if layout.is_noop() {
            debug!("group '{}' needs no atlas", group.name());
            return Ok(CondensedAtlas {
                image: source.clone(),
                layout,
                cells: [CellWindow::UNIT, CellWindow::UNIT],
                members: member_transforms(group, UvTransform::IDENTITY),
            });
        }

        let cells = [group.cell_window(Axis::S), group.cell_window(Axis::T)];
        let image = compose(source, layout, cells, self.origin)?;
        let transform = atlas_transform(cells);

        info!(
            "condensed '{}' into {} atlas ({}x{} cells, {}x{} px)",
            group.name(),
            layout,
            cells[0].len(),
            cells[1].len(),
            image.width,
            image.height
        );

        Ok(CondensedAtlas {
            image,
            layout,
            cells,
            members: member_transforms(group, transform),
        })
    }
}

fn member_transforms(group: &WrapGroup, transform: UvTransform) -> Vec<MemberTransform> {
    group
        .members
        .iter()
        .map(|m| MemberTransform {
            sampler: m.sampler.clone(),
            transform,
        })
        .collect()
}

/// Maps cell window coordinates onto [0,1] of the atlas.
pub fn atlas_transform(cells: [CellWindow; 2]) -> UvTransform {
    let axis = |w: CellWindow| {
        let n = w.len().max(1) as f64;
        (-(w.start as f64) / n, 1.0 / n)
    };
    let (offset_s, scale_s) = axis(cells[0]);
    let (offset_t, scale_t) = axis(cells[1]);
    UvTransform::new([offset_s, offset_t], [scale_s, scale_t])
}

/// Composites the tile grid.
///
/// Tiles are copied at exact pixel boundaries. With a bottom-left origin
/// the lowest T cell is stored in the bottom row of tiles.
fn compose(
    source: &PixelBuffer,
    layout: Layout,
    cells: [CellWindow; 2],
    origin: UvOrigin,
) -> TextureResult<PixelBuffer> {
    let columns = cells[0].len();
    let rows = cells[1].len();
    let too_large =
        || TextureError::InvalidDimensions(format!("{}x{} tile atlas is too large", columns, rows));
    let width = source.width.checked_mul(columns).ok_or_else(too_large)?;
    let height = source.height.checked_mul(rows).ok_or_else(too_large)?;

    let flipped_s = source.flipped_horizontal();
    let flipped_t = source.flipped_vertical();
    let flipped_both = flipped_s.flipped_vertical();

    let mut atlas = PixelBuffer::blank(width, height, source.format)?;
    for (row, cell_t) in cells[1].cells().enumerate() {
        let flip_t = layout.mirrors(Axis::T) && cell_t.rem_euclid(2) == 1;
        let block_row = match origin {
            UvOrigin::TopLeft => row as u32,
            UvOrigin::BottomLeft => rows - 1 - row as u32,
        };
        for (column, cell_s) in cells[0].cells().enumerate() {
            let flip_s = layout.mirrors(Axis::S) && cell_s.rem_euclid(2) == 1;
            let tile = match (flip_s, flip_t) {
                (false, false) => source,
                (true, false) => &flipped_s,
                (false, true) => &flipped_t,
                (true, true) => &flipped_both,
            };
            debug!(
                "tile ({}, {}) flip_s={} flip_t={}",
                cell_s, cell_t, flip_s, flip_t
            );
            atlas.blit(
                tile,
                column as u32 * source.width,
                block_row * source.height,
            )?;
        }
    }
    Ok(atlas)
}
