//! # Perlin Noise
//!
//! Seeded gradient noise used by the terrain generator. Wraps `noise::Perlin` so the
//! rest of the engine sees a single bounded, deterministic sampler.

use ::noise::{NoiseFn, Perlin};

/// Octave accumulation settings for fractional Brownian motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Octaves {
    pub count: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
}

impl Default for Octaves {
    fn default() -> Self {
        Self {
            count: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// A seeded Perlin sampler.
///
/// For a fixed seed and input every method returns the same value on every call and
/// every thread. All outputs lie in `[-1, 1]`.
#[derive(Clone, Copy, Debug)]
pub struct PerlinNoise {
    perlin: Perlin,
    seed: u32,
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples 3D noise at `(x, y, z)`.
    pub fn get_noise_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        self.perlin.get([x, y, z]).clamp(-1.0, 1.0)
    }

    /// Samples 2D noise at `(x, z)`.
    pub fn get_noise_2d(&self, x: f64, z: f64) -> f64 {
        self.perlin.get([x, z]).clamp(-1.0, 1.0)
    }

    /// Samples 4D noise, used where a 3D field has to follow a curved embedding.
    pub fn get_noise_4d(&self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        self.perlin.get([x, y, z, w]).clamp(-1.0, 1.0)
    }

    /// Layered 2D noise, normalized by the total amplitude.
    pub fn fbm_2d(&self, x: f64, z: f64, octaves: Octaves) -> f64 {
        self.accumulate(octaves, |frequency| self.get_noise_2d(x * frequency, z * frequency))
    }

    /// Layered 3D noise, normalized by the total amplitude.
    pub fn fbm_3d(&self, x: f64, y: f64, z: f64, octaves: Octaves) -> f64 {
        self.accumulate(octaves, |frequency| {
            self.get_noise_3d(x * frequency, y * frequency, z * frequency)
        })
    }

    fn accumulate(&self, octaves: Octaves, sample: impl Fn(f64) -> f64) -> f64 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut sum = 0.0;
        let mut norm = 0.0;

        for _ in 0..octaves.count.max(1) {
            sum += amplitude * sample(frequency);
            norm += amplitude;
            amplitude *= octaves.persistence;
            frequency *= octaves.lacunarity;
        }

        if norm > 0.0 {
            (sum / norm).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points(seed: u64, count: usize) -> Vec<[f64; 3]> {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..count)
            .map(|_| {
                [
                    (rng.f64() - 0.5) * 2000.0,
                    (rng.f64() - 0.5) * 2000.0,
                    (rng.f64() - 0.5) * 2000.0,
                ]
            })
            .collect()
    }

    #[test]
    fn samples_stay_in_unit_range() {
        let noise = PerlinNoise::new(1337);
        for [x, y, z] in sample_points(3, 1000) {
            let value = noise.get_noise_3d(x, y, z);
            assert!((-1.0..=1.0).contains(&value), "{value} out of range");
            let layered = noise.fbm_3d(x * 0.01, y * 0.01, z * 0.01, Octaves::default());
            assert!((-1.0..=1.0).contains(&layered));
        }
    }

    #[test]
    fn same_seed_and_input_repeat_exactly() {
        let a = PerlinNoise::new(42);
        let b = PerlinNoise::new(42);
        for [x, y, z] in sample_points(4, 200) {
            let first = a.get_noise_3d(x, y, z);
            assert_eq!(first.to_bits(), a.get_noise_3d(x, y, z).to_bits());
            assert_eq!(first.to_bits(), b.get_noise_3d(x, y, z).to_bits());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = PerlinNoise::new(1);
        let b = PerlinNoise::new(2);
        let differing = sample_points(5, 100)
            .into_iter()
            .filter(|[x, y, z]| a.get_noise_3d(*x, *y, *z) != b.get_noise_3d(*x, *y, *z))
            .count();
        assert!(differing > 50);
    }
}
