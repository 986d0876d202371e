use bracket_noise::prelude::{FastNoise, FractalType, NoiseType};

/// A deterministic scalar noise field, seeded independently of any other field derived from the
/// same world seed.
///
/// Wraps `bracket_noise::FastNoise` (Simplex core with built-in FBm) rather than hand-rolling a
/// Simplex implementation; each field gets its own `FastNoise` instance so that, for example,
/// `continentalness` and `erosion` never share internal octave/offset state.
pub struct NoiseField {
    noise: FastNoise,
}

impl NoiseField {
    /// `seed` should already be mixed with a field-specific discriminant by the caller so that
    /// distinct named fields derived from the same world seed are uncorrelated.
    fn new(seed: u64, octaves: i32, lacunarity: f32, gain: f32) -> Self {
        let mut noise = FastNoise::seeded(seed);
        noise.set_noise_type(NoiseType::SimplexFractal);
        noise.set_fractal_type(FractalType::FBM);
        noise.set_fractal_octaves(octaves);
        noise.set_fractal_lacunarity(lacunarity);
        noise.set_fractal_gain(gain);
        Self { noise }
    }

    /// 2D Simplex noise in `[-1, 1]`
    pub fn sample2d(&self, x: f32, y: f32) -> f32 {
        self.noise.get_noise(x, y)
    }

    /// 3D Simplex noise in `[-1, 1]`
    pub fn sample3d(&self, x: f32, y: f32, z: f32) -> f32 {
        self.noise.get_noise3d(x, y, z)
    }
}

/// Seed discriminants mixed into `world_seed` to derive each named field's independent seed.
const CONTINENTALNESS_DISCRIMINANT: u64 = 0x9E3779B97F4A7C15;
const EROSION_DISCRIMINANT: u64 = 0xC2B2AE3D27D4EB4F;
const PEAKS_AND_VALLEYS_DISCRIMINANT: u64 = 0x165667B19E3779F9;

fn mix_seed(world_seed: u32, discriminant: u64) -> u64 {
    (world_seed as u64).wrapping_mul(discriminant) ^ discriminant.rotate_left(17)
}

/// The three named FBm fields the terrain generator's splines are evaluated against.
pub struct TerrainNoise {
    pub continentalness: NoiseField,
    pub erosion: NoiseField,
    pub peaks_and_valleys: NoiseField,
}

impl TerrainNoise {
    pub fn new(world_seed: u32) -> Self {
        Self {
            continentalness: NoiseField::new(
                mix_seed(world_seed, CONTINENTALNESS_DISCRIMINANT),
                3,
                1.5,
                0.5,
            ),
            erosion: NoiseField::new(mix_seed(world_seed, EROSION_DISCRIMINANT), 4, 2.0, 0.5),
            peaks_and_valleys: NoiseField::new(
                mix_seed(world_seed, PEAKS_AND_VALLEYS_DISCRIMINANT),
                4,
                2.0,
                0.5,
            ),
        }
    }
}

/// A sorted list of `(input, output)` knots, evaluated by clamped linear interpolation.
#[derive(Clone, Debug)]
pub struct Spline {
    knots: Vec<(f32, f32)>,
}

impl Spline {
    /// `knots` must already be sorted ascending by input value.
    pub fn new(knots: Vec<(f32, f32)>) -> Self {
        debug_assert!(!knots.is_empty(), "a spline needs at least one knot");
        debug_assert!(
            knots.windows(2).all(|w| w[0].0 <= w[1].0),
            "spline knots must be sorted ascending by input"
        );
        Self { knots }
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let first = self.knots.first().unwrap();
        let last = self.knots.last().unwrap();

        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        let upper_index = self
            .knots
            .iter()
            .position(|&(input, _)| input > t)
            .expect("t is within the knot range");
        let (lo_t, lo_v) = self.knots[upper_index - 1];
        let (hi_t, hi_v) = self.knots[upper_index];

        let alpha = (t - lo_t) / (hi_t - lo_t);
        lo_v + (hi_v - lo_v) * alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_clamps_below_and_above_range() {
        let spline = Spline::new(vec![(-1.0, 30.0), (0.0, 80.0), (1.0, 160.0)]);
        assert_eq!(spline.evaluate(-5.0), 30.0);
        assert_eq!(spline.evaluate(5.0), 160.0);
    }

    #[test]
    fn spline_interpolates_linearly_between_knots() {
        let spline = Spline::new(vec![(0.0, 0.0), (1.0, 10.0)]);
        assert_eq!(spline.evaluate(0.5), 5.0);
    }

    #[test]
    fn spline_matches_continental_spline_at_known_knots() {
        let spline = Spline::new(vec![
            (-1.0, 30.0),
            (-0.5, 50.0),
            (0.0, 80.0),
            (0.3, 100.0),
            (0.6, 130.0),
            (1.0, 160.0),
        ]);
        assert_eq!(spline.evaluate(0.0), 80.0);
        assert_eq!(spline.evaluate(1.0), 160.0);
    }

    #[test]
    fn distinct_fields_derived_from_the_same_seed_are_uncorrelated() {
        let noise = TerrainNoise::new(12345);
        let a = noise.continentalness.sample2d(10.0, 10.0);
        let b = noise.erosion.sample2d(10.0, 10.0);
        assert_ne!(a, b);
    }
}
