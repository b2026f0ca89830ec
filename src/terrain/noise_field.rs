//! Multi-octave coherent noise with a radial falloff mask

use glam::{DVec2, Vec2};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Smallest noise scale accepted; smaller (or non-positive) scales are clamped to this.
pub const MIN_NOISE_SCALE: f32 = 0.001;

/// Empirical headroom applied when normalizing the octave sum.
pub const NORMALIZATION_HEADROOM: f32 = 1.5;

/// Range of the per-octave random offsets drawn from the seed.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Parameters controlling noise sampling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub scale: f32,          // Horizontal scale (larger = smoother)
    pub octaves: u32,        // FBM octaves (detail levels)
    pub persistence: f32,    // Amplitude multiplier per octave (0.5 typical)
    pub lacunarity: f32,     // Frequency multiplier per octave (2.0 typical)
    pub seed: u32,
    pub offset: Vec2,        // Global sample offset
    pub falloff_radius: f32, // Island falloff size; larger = wider land
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 50.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 12345,
            offset: Vec2::ZERO,
            falloff_radius: 1000.0,
        }
    }
}

impl NoiseSettings {
    /// Copy with authoring parameters clamped into their usable ranges.
    ///
    /// Scale is clamped to [`MIN_NOISE_SCALE`], octaves to at least one,
    /// lacunarity to at least one and persistence into `[0, 1]`. Never fails.
    pub fn validated(&self) -> Self {
        let scale = if self.scale.is_finite() { self.scale.max(MIN_NOISE_SCALE) } else { MIN_NOISE_SCALE };
        Self {
            scale,
            octaves: self.octaves.max(1),
            persistence: self.persistence.clamp(0.0, 1.0),
            lacunarity: self.lacunarity.max(1.0),
            seed: self.seed,
            offset: self.offset,
            falloff_radius: self.falloff_radius.max(0.0),
        }
    }

    /// Sum of all octave amplitudes: `1 + p + p^2 + ...`
    pub fn max_amplitude_sum(&self) -> f32 {
        let mut amplitude = 1.0;
        let mut sum = 0.0;
        for _ in 0..self.octaves {
            sum += amplitude;
            amplitude *= self.persistence;
        }
        sum
    }

    /// Divisor mapping the shifted octave sum into roughly `[0, 1]`.
    pub fn normalization_divisor(&self) -> f32 {
        2.0 * self.max_amplitude_sum() / NORMALIZATION_HEADROOM
    }
}

/// Radial falloff mask: a gaussian bump scaled by `map_size`, capped at one.
///
/// Values stay at one near the origin and taper toward zero far from it,
/// which flattens terrain toward the world extremes.
pub fn falloff(x: f32, y: f32, map_size: f32) -> f32 {
    falloff_f64(x as f64, y as f64, map_size as f64) as f32
}

fn falloff_f64(x: f64, y: f64, map_size: f64) -> f64 {
    let variance = map_size * 10.0;
    if variance <= 0.0 {
        return 0.0;
    }
    let gauss = map_size * (-(x * x / variance + y * y / variance) / 2.0).exp()
        / (2.0 * std::f64::consts::PI);
    gauss.min(1.0)
}

/// Simple deterministic RNG used to draw per-octave offsets from the seed
struct OctaveRng {
    state: u64,
}

impl OctaveRng {
    fn new(seed: u32) -> Self {
        Self { state: (seed as u64).wrapping_add(1) }
    }

    /// Advance state and return next u32
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let mut h = (self.state >> 32) as u32;
        h = h.wrapping_mul(0x45d9f3b);
        h ^= h >> 16;
        h = h.wrapping_mul(0x45d9f3b);
        h ^= h >> 16;
        h
    }

    /// Integer in `[min, max)`
    fn range(&mut self, min: i32, max: i32) -> i32 {
        let span = (max as i64 - min as i64) as u64;
        (min as i64 + (self.next_u32() as u64 % span) as i64) as i32
    }
}

/// Noise sampler bound to one sample center.
///
/// Octave offsets are drawn once at construction so every sample taken from
/// the same field (and every field built from the same settings) shares them;
/// continuity across chunk borders depends on this.
pub struct NoiseField {
    settings: NoiseSettings,
    perlin: Perlin,
    octave_offsets: Vec<DVec2>,
    falloff_origin: DVec2,
    divisor: f64,
}

impl NoiseField {
    /// Build a field for `sample_center`. Settings are clamped first.
    pub fn new(settings: &NoiseSettings, sample_center: Vec2) -> Self {
        let settings = settings.validated();
        let mut rng = OctaveRng::new(settings.seed);
        let offset = settings.offset.as_dvec2();
        let center = sample_center.as_dvec2();

        // Grid rows run toward -Z, so the Y offset is subtracted.
        let octave_offsets = (0..settings.octaves)
            .map(|_| {
                let ox = rng.range(-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE) as f64;
                let oy = rng.range(-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE) as f64;
                DVec2::new(ox + offset.x + center.x, oy - offset.y - center.y)
            })
            .collect();

        let falloff_origin = DVec2::new(offset.x + center.x, -offset.y - center.y);
        let divisor = settings.normalization_divisor() as f64;

        Self {
            perlin: Perlin::new(settings.seed),
            settings,
            octave_offsets,
            falloff_origin,
            divisor,
        }
    }

    /// Clamped settings in use
    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Raw octave sum at a grid-relative position (cell coordinate minus half extent)
    pub fn octave_sum(&self, x: f64, y: f64) -> f64 {
        let scale = self.settings.scale as f64;
        let persistence = self.settings.persistence as f64;
        let lacunarity = self.settings.lacunarity as f64;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;

        for offset in &self.octave_offsets {
            let sample_x = (x + offset.x) / scale * frequency;
            let sample_y = (y + offset.y) / scale * frequency;

            let value = self.perlin.get([sample_x, sample_y]).clamp(-1.0, 1.0);
            total += value * amplitude;

            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total
    }

    /// Normalized, falloff-attenuated height at a grid-relative position
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let normalized = (self.octave_sum(x, y) + 1.0) / self.divisor;
        let mask = falloff_f64(
            x + self.falloff_origin.x,
            y + self.falloff_origin.y,
            self.settings.falloff_radius as f64,
        );
        (normalized * mask) as f32
    }
}
