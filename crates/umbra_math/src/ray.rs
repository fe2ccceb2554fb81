use crate::Vec3;

/// A ray in 3D space with origin, direction, and time.
///
/// Rays represent a half-line starting at `origin` and traveling in
/// `direction` (not necessarily normalized). `time` in [0, 1] drives motion
/// blur, and an optional wavelength tag (meters) is carried for dispersive
/// materials.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    time: f64,
    wavelength: Option<f64>,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
            wavelength: None,
        }
    }

    /// Create a ray at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    /// Tag the ray with a wavelength in meters.
    #[inline]
    pub fn with_wavelength(mut self, wavelength: f64) -> Self {
        self.wavelength = Some(wavelength);
        self
    }

    /// Create a ray from `origin` along `direction` that inherits this ray's
    /// time and wavelength tag.
    #[inline]
    pub fn spawn(&self, origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            ..*self
        }
    }

    /// Overwrite origin and direction in place, keeping time and wavelength.
    #[inline]
    pub fn set(&mut self, origin: Vec3, direction: Vec3) {
        self.origin = origin;
        self.direction = direction;
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the time value of the ray (used for motion blur).
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Wavelength tag in meters, if any.
    #[inline]
    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.direction
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.5), Vec3::new(2.5, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_accessors() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let direction = Vec3::new(0.0, 1.0, 0.0);
        let ray = Ray::new(origin, direction, 0.5);

        assert_eq!(ray.origin(), origin);
        assert_eq!(ray.direction(), direction);
        assert_eq!(ray.time(), 0.5);
        assert_eq!(ray.wavelength(), None);
    }

    #[test]
    fn test_spawn_keeps_time_and_wavelength() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.25).with_wavelength(550e-9);
        let child = ray.spawn(Vec3::ONE, Vec3::Y);

        assert_eq!(child.origin(), Vec3::ONE);
        assert_eq!(child.direction(), Vec3::Y);
        assert_eq!(child.time(), 0.25);
        assert_eq!(child.wavelength(), Some(550e-9));
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X, 0.75);
        ray.set(Vec3::ONE, Vec3::Z);

        assert_eq!(ray.at(1.0), Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(ray.time(), 0.75);
    }
}
