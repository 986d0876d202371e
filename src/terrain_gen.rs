use crate::{
    block::{self, BlockId},
    noise::{Spline, TerrainNoise},
};

/// Sea level; columns at or below this height and above the surface are filled with water.
pub const WATER_LEVEL: i32 = 55;

/// Horizontal frequency applied to world coordinates before sampling the named noise fields.
const NOISE_FREQUENCY: f32 = 0.005;

fn continental_spline() -> Spline {
    Spline::new(vec![
        (-1.0, 30.0),
        (-0.5, 50.0),
        (0.0, 80.0),
        (0.3, 100.0),
        (0.6, 130.0),
        (1.0, 160.0),
    ])
}

fn erosion_spline() -> Spline {
    Spline::new(vec![(-1.0, 0.0), (0.0, 10.0), (0.5, 25.0), (1.0, 40.0)])
}

/// A pure, stateless column-height generator: two instances built from the same `world_seed`
/// always agree on `height_at` for the same `(world_x, world_z)`, regardless of call order.
pub struct TerrainGen {
    noise: TerrainNoise,
    continental_spline: Spline,
    erosion_spline: Spline,
}

impl TerrainGen {
    pub fn new(world_seed: u32) -> Self {
        Self {
            noise: TerrainNoise::new(world_seed),
            continental_spline: continental_spline(),
            erosion_spline: erosion_spline(),
        }
    }

    /// Column height at `(world_x, world_z)`, per the height rule in the terrain spline design.
    pub fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        let sample_x = world_x as f32 * NOISE_FREQUENCY;
        let sample_z = world_z as f32 * NOISE_FREQUENCY;

        let c = self
            .noise
            .continentalness
            .sample2d(sample_x, sample_z)
            .clamp(-1.0, 1.0);
        let e = self
            .noise
            .erosion
            .sample2d(sample_x, sample_z)
            .clamp(-1.0, 1.0);

        let base_height = self.continental_spline.evaluate(c);
        let erosion_effect = self.erosion_spline.evaluate(e);
        let mut h = base_height - erosion_effect;

        if e < 0.3 {
            let p = self
                .noise
                .peaks_and_valleys
                .sample2d(sample_x, sample_z)
                .clamp(-1.0, 1.0);
            let m = (p - e).max(0.0);
            h += m * m * m.sqrt() * 50.0;
        }

        h.floor() as i32
    }

    /// Block type at world-y `world_y` within a column of height `height`.
    pub fn block_at(height: i32, world_y: i32) -> BlockId {
        if world_y < height - 3 {
            block::STONE
        } else if world_y < height - 1 {
            block::DIRT
        } else if world_y < height {
            block::GRASS
        } else if world_y <= WATER_LEVEL {
            block::WATER
        } else {
            block::AIR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_deterministic_across_evaluation_order() {
        let gen_a = TerrainGen::new(12345);
        let gen_b = TerrainGen::new(12345);

        let forward: Vec<_> = (0..16).map(|x| gen_a.height_at(x, 0)).collect();
        let backward: Vec<_> = (0..16).rev().map(|x| gen_b.height_at(x, 0)).collect();

        assert_eq!(forward, backward.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn flat_column_matches_spline_values_when_noise_is_zero() {
        // continentalSpline(0) - erosionSpline(0) = 80 - 10 = 70
        let height = continental_spline().evaluate(0.0) - erosion_spline().evaluate(0.0);
        assert_eq!(height, 70.0);
    }

    #[test]
    fn block_rule_matches_the_column_boundaries() {
        let height = 70;
        assert_eq!(TerrainGen::block_at(height, height - 10), block::STONE);
        assert_eq!(TerrainGen::block_at(height, height - 3), block::DIRT);
        assert_eq!(TerrainGen::block_at(height, height - 1), block::GRASS);
        assert_eq!(TerrainGen::block_at(height, height), block::WATER);
        assert_eq!(TerrainGen::block_at(height, WATER_LEVEL), block::WATER);
        assert_eq!(TerrainGen::block_at(height, WATER_LEVEL + 1), block::AIR);
    }

    #[test]
    fn scenario_seed_12345_chunk_origin_has_correct_surface_column() {
        let gen = TerrainGen::new(12345);
        let height = gen.height_at(0, 0);

        assert_eq!(TerrainGen::block_at(height, height - 1), block::GRASS);
        assert_eq!(TerrainGen::block_at(height, height - 2), block::DIRT);
        assert_eq!(TerrainGen::block_at(height, height - 3), block::DIRT);
        assert_eq!(TerrainGen::block_at(height, height - 4), block::STONE);

        let above_surface_and_sea_level = height.max(WATER_LEVEL + 1);
        assert_eq!(
            TerrainGen::block_at(height, above_surface_and_sea_level),
            block::AIR
        );
    }
}
