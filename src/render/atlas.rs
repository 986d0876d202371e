use std::path::Path;

use image::{GenericImage, RgbaImage};

use super::util::texture::{ImageTexture, TextureConfig};
use crate::block::{BlockProperties, BLOCKS};

/// Tile side length, in pixels, of every packed texture.
pub const TILE_SIZE: u32 = 16;
/// Atlas grid dimensions: 9 columns x 5 rows of 16x16 tiles.
pub const ATLAS_COLUMNS: u32 = 9;
pub const ATLAS_ROWS: u32 = 5;
/// Water's animated strip occupies tile indices `[10, 41]` (32 frames) within the atlas row they
/// fall on.
pub const WATER_FRAME_COUNT: u32 = 32;

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("io error loading tile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode tile {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

fn load_tile(path: &Path) -> Result<image::DynamicImage, AtlasError> {
    let bytes = std::fs::read(path).map_err(|source| AtlasError::Io {
        path: path.display().to_string(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| AtlasError::Decode {
        path: path.display().to_string(),
        source,
    })
}

/// Which of a block's three texture slots an atlas index came from, so the source PNG can be
/// looked up per-face rather than per-block.
#[derive(Clone, Copy)]
enum TileFace {
    Top,
    Bottom,
    Sides,
}

/// Resolves the PNG for `name`'s `face` slot: tries a face-specific file first
/// (`<name>_top.png`/`<name>_bottom.png`/`<name>_side.png`), falling back to `<name>.png` for
/// blocks whose faces all share one texture.
fn load_face_tile(
    tiles_dir: &Path,
    name: &str,
    face: TileFace,
) -> Result<image::DynamicImage, AtlasError> {
    let lower = name.to_lowercase();
    let suffix = match face {
        TileFace::Top => "_top",
        TileFace::Bottom => "_bottom",
        TileFace::Sides => "_side",
    };

    let face_path = tiles_dir.join(format!("{lower}{suffix}.png"));
    if face_path.is_file() {
        return load_tile(&face_path);
    }

    load_tile(&tiles_dir.join(format!("{lower}.png")))
}

fn tile_position(index: u32) -> (u32, u32) {
    (index % ATLAS_COLUMNS, index / ATLAS_COLUMNS)
}

fn blit_tile(atlas: &mut RgbaImage, tile: &image::DynamicImage, index: u32) {
    let (col, row) = tile_position(index);
    let rgba = tile.to_rgba8();
    atlas
        .copy_from(&rgba, col * TILE_SIZE, row * TILE_SIZE)
        .expect("tile does not fit within the atlas bounds");
}

/// Packs one static tile per distinct block texture id plus the 32-frame water strip into a
/// single RGBA atlas, per the 9x5 grid layout fixed by the external texture contract.
///
/// `tiles_dir` holds one `<block_name>.png` per block (lowercase) and one `water_still.png`
/// vertical strip of `WATER_FRAME_COUNT` stacked 16x16 frames.
pub fn build_atlas(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    tiles_dir: impl AsRef<Path>,
) -> Result<ImageTexture, AtlasError> {
    let tiles_dir = tiles_dir.as_ref();
    let mut atlas = RgbaImage::new(ATLAS_COLUMNS * TILE_SIZE, ATLAS_ROWS * TILE_SIZE);

    let mut seen_indices = std::collections::HashSet::new();
    for BlockProperties {
        name,
        texture_top,
        texture_bottom,
        texture_sides,
        ..
    } in BLOCKS
    {
        for (texture_id, face) in [
            (texture_top, TileFace::Top),
            (texture_bottom, TileFace::Bottom),
            (texture_sides, TileFace::Sides),
        ] {
            let index = texture_id as u32;
            if index == 0 || !seen_indices.insert(index) {
                continue;
            }

            let tile = load_face_tile(tiles_dir, name, face)?;
            blit_tile(&mut atlas, &tile, index);
        }
    }

    let water_strip = load_tile(&tiles_dir.join("water_still.png"))?;
    for frame in 0..WATER_FRAME_COUNT {
        let frame_image = water_strip.crop_imm(0, frame * TILE_SIZE, TILE_SIZE, TILE_SIZE);
        blit_tile(&mut atlas, &frame_image, 10 + frame);
    }

    Ok(ImageTexture::from_image(
        device,
        queue,
        &image::DynamicImage::ImageRgba8(atlas),
        &TextureConfig::default(),
    ))
}

/// Atlas-space UV offset and scale for tile `texture_id`, nearest-neighbor/repeat sampled in the
/// shader.
pub fn tile_uv_rect(texture_id: f32) -> ([f32; 2], [f32; 2]) {
    let index = texture_id as u32;
    let (col, row) = tile_position(index);
    let scale = [1.0 / ATLAS_COLUMNS as f32, 1.0 / ATLAS_ROWS as f32];
    let offset = [col as f32 * scale[0], row as f32 * scale[1]];
    (offset, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_position_wraps_at_the_column_count() {
        assert_eq!(tile_position(0), (0, 0));
        assert_eq!(tile_position(8), (8, 0));
        assert_eq!(tile_position(9), (0, 1));
        assert_eq!(tile_position(41), (5, 4));
    }
}
