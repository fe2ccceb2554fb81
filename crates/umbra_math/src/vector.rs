//! Vector helpers that glam does not provide in the form the renderer needs.

use crate::Vec3;

/// Extension trait for `Vec3` with ray tracing predicates.
pub trait Vec3Ext {
    /// True if every component is within 1e-8 of zero.
    fn is_near_zero(&self) -> bool;
}

impl Vec3Ext for Vec3 {
    fn is_near_zero(&self) -> bool {
        const S: f64 = 1e-8;
        self.x.abs() < S && self.y.abs() < S && self.z.abs() < S
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with unit normal `n`.
///
/// `etai_over_etat` is the ratio of the incident to the transmitted index.
/// Callers handle total internal reflection before calling this.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f64) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
