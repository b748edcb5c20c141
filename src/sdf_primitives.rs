//! Distance-field constructors for tests, benches, and demos.
//!
//! Each returns a closure implementing [`DensityField`](crate::DensityField):
//! negative inside, non-negative outside.

use glam::{Vec2, Vec3A, Vec3Swizzles};

pub fn sphere(center: Vec3A, radius: f32) -> impl Fn(Vec3A) -> f32 {
    move |p| (p - center).length() - radius
}

pub fn plane(origin: Vec3A, normal: Vec3A) -> impl Fn(Vec3A) -> f32 {
    move |p| (p - origin).dot(normal)
}

pub fn cuboid(center: Vec3A, half_extent: Vec3A) -> impl Fn(Vec3A) -> f32 {
    move |p| {
        let q = (p - center).abs() - half_extent;
        q.max(Vec3A::ZERO).length() + q.max_element().min(0.0)
    }
}

pub fn torus(center: Vec3A, radii: Vec2) -> impl Fn(Vec3A) -> f32 {
    move |p| {
        let p = p - center;
        let q = Vec2::new(p.xz().length() - radii.x, p.y);
        q.length() - radii.y
    }
}
