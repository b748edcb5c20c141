//! Density field contract and sampling helpers.

use glam::Vec3A;

/// A scalar density field over 3D space. Negative values are inside solid
/// material, non-negative values are empty space.
///
/// Implementations must be deterministic and smooth enough for
/// central-difference normal estimation at step size 0.001.
pub trait DensityField {
    fn density(&self, p: Vec3A) -> f32;
}

impl<F: Fn(Vec3A) -> f32> DensityField for F {
    fn density(&self, p: Vec3A) -> f32 {
        self(p)
    }
}

/// Unnormalized gradient of the field at `p` via central differences with
/// per-axis step `h`.
pub fn central_gradient(field: &impl DensityField, p: Vec3A, h: f32) -> Vec3A {
    let dx = Vec3A::new(h, 0.0, 0.0);
    let dy = Vec3A::new(0.0, h, 0.0);
    let dz = Vec3A::new(0.0, 0.0, h);
    Vec3A::new(
        field.density(p + dx) - field.density(p - dx),
        field.density(p + dy) - field.density(p - dy),
        field.density(p + dz) - field.density(p - dz),
    )
}

/// Approximate the zero crossing between `p0` and `p1` by keeping the sample
/// with minimum |density| among 9 equally spaced points (8 segments). Ties
/// keep the sample closest to `p0`.
pub fn approximate_zero_crossing(field: &impl DensityField, p0: Vec3A, p1: Vec3A) -> Vec3A {
    const STEPS: u32 = 8;
    let mut min_value = f32::MAX;
    let mut best_t = 0.0;
    for i in 0..=STEPS {
        let t = i as f32 / STEPS as f32;
        let d = field.density(p0 + (p1 - p0) * t).abs();
        if d < min_value {
            min_value = d;
            best_t = t;
        }
    }
    p0 + (p1 - p0) * best_t
}
