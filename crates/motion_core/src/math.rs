//! Shared vector helpers for the detectors and analyzers
//!
//! Every helper degrades instead of failing: near-zero vectors normalize to
//! zero and dot products are clamped to [-1, 1] before `acos`.

use nalgebra::Vector3;

pub type Vec3 = Vector3<f32>;

/// Vectors shorter than this are treated as zero.
pub const EPSILON: f32 = 1e-4;

/// Millimetres per metre (sensor positions are in mm).
pub const MM_PER_M: f32 = 1000.0;

/// Microseconds per second (timestamps are in µs).
pub const US_PER_S: f32 = 1_000_000.0;

/// m/s → km/h
pub const MPS_TO_KMH: f32 = 3.6;

/// Vertical axis (+Y up).
#[inline]
pub fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Forward axis (+Z, toward the target).
#[inline]
pub fn forward() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

/// Unit vector, or zero when `v` is too short to have a direction.
#[inline]
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let len = v.norm();
    if len < EPSILON {
        Vec3::zeros()
    } else {
        v / len
    }
}

#[inline]
pub fn dot(a: &Vec3, b: &Vec3) -> f32 {
    a.dot(b)
}

/// Angle between two vectors in degrees (0..=180).
///
/// A zero-length input yields 90°, the angle `acos(0)` of a zero dot product.
pub fn angle_between_deg(a: &Vec3, b: &Vec3) -> f32 {
    let d = dot(&normalize_or_zero(a), &normalize_or_zero(b)).clamp(-1.0, 1.0);
    d.acos().to_degrees()
}

/// Interior angle at `vertex` formed by `a` and `c`, in degrees.
///
/// 180° = fully straight limb.
pub fn joint_angle_deg(a: &Vec3, vertex: &Vec3, c: &Vec3) -> f32 {
    angle_between_deg(&(a - vertex), &(c - vertex))
}

/// Drops the vertical component.
#[inline]
pub fn horizontal(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
