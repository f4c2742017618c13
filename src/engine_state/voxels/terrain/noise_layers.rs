//! Seeded noise fields and the per-cell hash used by terrain generation.
//!
//! Every field is a `noise::Value` lattice keyed by the world seed plus a fixed
//! per-layer offset. Sampling is a pure function of position, so neighbouring
//! chunks agree on their shared border without talking to each other.

use noise::{NoiseFn, Value};

/// Salts separating independent per-cell decisions.
pub(super) const SALT_FILLER: u64 = 0x51;
pub(super) const SALT_TREE: u64 = 0x7e;
pub(super) const SALT_TREE_SHAPE: u64 = 0x7f;

/// The full set of noise layers sampled by the generator.
pub(super) struct NoiseLayers {
    pub continent: Value,
    pub hills: Value,
    pub detail: Value,
    pub mountain: Value,
    pub warp_x: Value,
    pub warp_z: Value,
    pub river: Value,
    pub lake: Value,
    pub moisture: Value,
    pub temperature: Value,
    pub cave_coarse: Value,
    pub cave_fine: Value,
    /// One field per ore kind, in [`super::ORES`] order.
    pub ores: [Value; 4],
}

impl NoiseLayers {
    pub fn new(seed: u32) -> Self {
        let layer = |offset: u32| Value::new(seed.wrapping_add(offset.wrapping_mul(0x9e37)));
        NoiseLayers {
            continent: layer(1),
            hills: layer(2),
            detail: layer(3),
            mountain: layer(4),
            warp_x: layer(5),
            warp_z: layer(6),
            river: layer(7),
            lake: layer(8),
            moisture: layer(9),
            temperature: layer(10),
            cave_coarse: layer(11),
            cave_fine: layer(12),
            ores: [layer(13), layer(14), layer(15), layer(16)],
        }
    }
}

/// Samples a 2D field at `(x, z) * frequency`, roughly in `[-1, 1]`.
#[inline]
pub(super) fn sample2(field: &Value, x: f64, z: f64, frequency: f64) -> f64 {
    field.get([x * frequency, z * frequency])
}

/// Samples a 2D field remapped to `[0, 1]`.
#[inline]
pub(super) fn sample2_unit(field: &Value, x: f64, z: f64, frequency: f64) -> f64 {
    ((sample2(field, x, z, frequency) + 1.0) * 0.5).clamp(0.0, 1.0)
}

#[inline]
pub(super) fn sample3(field: &Value, x: f64, y: f64, z: f64, frequency: f64) -> f64 {
    field.get([x * frequency, y * frequency, z * frequency])
}

/// Stateless splitmix64 hash of a world column.
pub(super) fn hash_column(seed: u32, x: i32, z: i32, salt: u64) -> u64 {
    let mut state = (seed as u64) ^ salt.wrapping_mul(0xd6e8_feb8_6659_fd93);
    state ^= (x as u32 as u64) << 32 | (z as u32 as u64);
    splitmix64(state)
}

/// A generator seeded from one column hash, for decisions that need several draws.
pub(super) fn column_rng(seed: u32, x: i32, z: i32, salt: u64) -> fastrand::Rng {
    fastrand::Rng::with_seed(hash_column(seed, x, z, salt))
}

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_position_sensitive() {
        assert_eq!(hash_column(1337, 4, -9, SALT_TREE), hash_column(1337, 4, -9, SALT_TREE));
        assert_ne!(hash_column(1337, 4, -9, SALT_TREE), hash_column(1337, -9, 4, SALT_TREE));
        assert_ne!(hash_column(1337, 4, -9, SALT_TREE), hash_column(1338, 4, -9, SALT_TREE));
        assert_ne!(hash_column(1337, 4, -9, SALT_TREE), hash_column(1337, 4, -9, SALT_FILLER));
    }

    #[test]
    fn test_column_rng_repeats() {
        let mut a = column_rng(7, 100, 200, SALT_TREE_SHAPE);
        let mut b = column_rng(7, 100, 200, SALT_TREE_SHAPE);
        assert_eq!(a.u32(..), b.u32(..));
        assert_eq!(a.i32(0..11), b.i32(0..11));
    }

    #[test]
    fn test_samples_are_pure() {
        let layers = NoiseLayers::new(42);
        let first = sample2(&layers.continent, 12.5, -3.0, 0.01);
        let second = sample2(&layers.continent, 12.5, -3.0, 0.01);
        assert_eq!(first, second);
        let unit = sample2_unit(&layers.moisture, 900.0, 12.0, 0.004);
        assert!((0.0..=1.0).contains(&unit));
    }
}
