use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const DEGREES_TO_RADIANS: f32 = PI / 180.0;
pub const RADIANS_TO_DEGREES: f32 = 180.0 / PI;

const SIN_BITS: u32 = 14;
const SIN_MASK: i32 = !(-1 << SIN_BITS);
const SIN_COUNT: usize = (SIN_MASK + 1) as usize;
const RAD_TO_INDEX: f32 = SIN_COUNT as f32 / TAU;
const DEG_TO_INDEX: f32 = SIN_COUNT as f32 / 360.0;

const MAX_ABSOLUTE_ERROR: f32 = 0.000_01;
const MAX_RELATIVE_ERROR: f32 = 0.01;

static SIN_TABLE: OnceLock<Box<[f32]>> = OnceLock::new();

fn sin_table() -> &'static [f32] {
    SIN_TABLE.get_or_init(|| {
        let mut table = (0..SIN_COUNT)
            .map(|index| ((index as f32 + 0.5) / SIN_COUNT as f32 * TAU).sin())
            .collect::<Vec<_>>();
        // Quadrant angles are pinned so sin/cos return exact 0 and +-1 there.
        for degrees in (0..360).step_by(90) {
            let index = table_index(degrees as f32 * DEG_TO_INDEX);
            table[index] = (degrees as f32 * DEGREES_TO_RADIANS).sin();
        }
        table.into_boxed_slice()
    })
}

fn table_index(raw: f32) -> usize {
    ((raw as i32) & SIN_MASK) as usize
}

/// Sine from the lookup table; accuracy is bounded by the table resolution.
pub fn sin(radians: f32) -> f32 {
    sin_table()[table_index(radians * RAD_TO_INDEX)]
}

pub fn cos(radians: f32) -> f32 {
    sin_table()[table_index((radians + FRAC_PI_2) * RAD_TO_INDEX)]
}

pub fn sin_deg(degrees: f32) -> f32 {
    sin_table()[table_index(degrees * DEG_TO_INDEX)]
}

pub fn cos_deg(degrees: f32) -> f32 {
    sin_table()[table_index((degrees + 90.0) * DEG_TO_INDEX)]
}

pub fn radians(degrees: f32) -> f32 {
    degrees * DEGREES_TO_RADIANS
}

pub fn degrees(radians: f32) -> f32 {
    radians * RADIANS_TO_DEGREES
}

/// Upper bound wins first, so `min > max` yields `min`.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    let capped = if value > max { max } else { value };
    if capped < min {
        min
    } else {
        capped
    }
}

pub fn clamp_i(value: i32, min: i32, max: i32) -> i32 {
    let capped = if value > max { max } else { value };
    if capped < min {
        min
    } else {
        capped
    }
}

pub fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub fn sign_i(value: i32) -> i32 {
    if value < 0 {
        -1
    } else {
        1
    }
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if (a - b).abs() < MAX_ABSOLUTE_ERROR {
        return true;
    }
    let relative_error = if b.abs() > a.abs() {
        ((a - b) / b).abs()
    } else {
        ((a - b) / a).abs()
    };
    relative_error <= MAX_RELATIVE_ERROR
}

pub fn is_power_of_two(n: u32) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Smallest power of two strictly greater than `n` (`0 -> 1`, `4 -> 8`).
pub fn next_power_of_two(mut n: u32) -> u32 {
    let mut x = 1u32;
    while n > 0 {
        n /= 2;
        x = x.saturating_mul(2);
    }
    x
}

/// Closest power of two; ties resolve to the lower one.
pub fn nearest_power_of_two(n: u32) -> u32 {
    let higher = next_power_of_two(n);
    let lower = higher / 2;
    if n - lower <= higher - n {
        lower
    } else {
        higher
    }
}

pub fn next_power_of_ten(mut n: u32) -> u32 {
    let mut x = 1u32;
    while n > 0 {
        n /= 10;
        x = x.saturating_mul(10);
    }
    x
}

/// Camera distance at which a square of side `side`, facing the camera,
/// spans the projection's reference screen edge.
pub fn z_distance_for_square(field_of_view_degrees: f32, side: f32) -> f32 {
    let half_angle = (field_of_view_degrees * DEGREES_TO_RADIANS * 0.5) as f64;
    let z_factor = (1.0 / half_angle.tan()) as f32 * 0.5;
    z_factor * side
}

#[derive(Debug, Clone)]
pub struct MathRandom {
    rng: SmallRng,
}

impl MathRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[0, range]`.
    pub fn int(&mut self, range: i32) -> i32 {
        self.rng.random_range(0..=range.max(0))
    }

    /// Uniform integer in `[start, end]`.
    pub fn int_between(&mut self, start: i32, end: i32) -> i32 {
        start + self.int(end - start)
    }

    /// Uniform float in `[0, 1)`.
    pub fn float(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    pub fn float_range(&mut self, range: f32) -> f32 {
        self.float() * range
    }

    pub fn float_between(&mut self, start: f32, end: f32) -> f32 {
        start + self.float() * (end - start)
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random::<bool>()
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.float() < probability
    }

    pub fn sign(&mut self) -> i32 {
        if self.boolean() {
            1
        } else {
            -1
        }
    }
}
