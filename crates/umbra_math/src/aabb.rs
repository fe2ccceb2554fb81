use crate::{Interval, Ray, Vec3};
use std::ops::Add;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self::new(
            Interval::new(a.x.min(b.x), a.x.max(b.x)),
            Interval::new(a.y.min(b.y), a.y.max(b.y)),
            Interval::new(a.z.min(b.z), a.z.max(b.z)),
        )
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Uses the slab method - efficient ray-box intersection test.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> bool {
        self.hit_interval(r, ray_t).is_some()
    }

    /// Slab test returning the parameter range the ray spends inside the box.
    ///
    /// `ray_t` is taken by value: narrowing happens on a local copy, so a
    /// caller can reuse its interval for sibling boxes.
    pub fn hit_interval(&self, r: &Ray, mut ray_t: Interval) -> Option<Interval> {
        let origin = r.origin();
        let direction = r.direction();

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            // A zero component yields a signed infinity here.
            let adinv = 1.0 / direction[axis];

            let mut t0 = (slab.min - origin[axis]) * adinv;
            let mut t1 = (slab.max - origin[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            // f64::max/min discard a NaN operand (0 * inf when the origin lies
            // on a slab plane), so the running bounds are kept in that case.
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return None;
            }
        }

        Some(ray_t)
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(
            (self.x.min + self.x.max) * 0.5,
            (self.y.min + self.y.max) * 0.5,
            (self.z.min + self.z.max) * 0.5,
        )
    }

    /// Total surface area, zero for empty boxes.
    pub fn surface_area(&self) -> f64 {
        if self.x.is_empty() || self.y.is_empty() || self.z.is_empty() {
            return 0.0;
        }
        let (dx, dy, dz) = (self.x.size(), self.y.size(), self.z.size());
        2.0 * (dx * dy + dy * dz + dz * dx)
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Translate (move) the AABB by an offset vector.
impl Add<Vec3> for Aabb {
    type Output = Aabb;

    fn add(self, offset: Vec3) -> Aabb {
        Aabb {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.x, Interval::new(0.0, 10.0));
        assert_eq!(aabb.y, Interval::new(0.0, 10.0));
        assert_eq!(aabb.z, Interval::new(0.0, 10.0));
    }

    #[test]
    fn test_aabb_pads_flat_axis() {
        let flat = Aabb::from_points(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(flat.z.size() > 0.0);
        assert!(flat.z.contains(1.0));
    }

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let box2 = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.x, Interval::new(0.0, 10.0));
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &box1), box1);
    }

    #[test]
    fn test_slab_entry_distance() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z, 0.0);
        let inside = unit_box()
            .hit_interval(&ray, Interval::new(0.0, f64::INFINITY))
            .expect("ray through the box must hit");

        assert!((inside.min - 1.0).abs() < 1e-9);
        assert!((inside.max - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_slab_miss_on_x() {
        let ray = Ray::new(Vec3::new(2.0, 0.5, -1.0), Vec3::Z, 0.0);
        assert!(!unit_box().hit(&ray, Interval::new(0.0, f64::INFINITY)));
    }

    #[test]
    fn test_aabb_hit_directions() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let toward = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0);
        assert!(aabb.hit(&toward, Interval::new(0.0, 100.0)));

        let away = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, 0.0);
        assert!(!aabb.hit(&away, Interval::new(0.0, 100.0)));

        // Interval ends before the box starts.
        assert!(!aabb.hit(&toward, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_slab_origin_on_plane_with_zero_direction() {
        // Origin exactly on the x = 0 slab plane, no x motion: 0 * inf = NaN.
        let ray = Ray::new(Vec3::new(0.0, 0.5, -1.0), Vec3::Z, 0.0);
        assert!(unit_box().hit(&ray, Interval::new(0.0, f64::INFINITY)));
    }

    #[test]
    fn test_caller_interval_not_mutated() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, -1.0), Vec3::Z, 0.0);
        let ray_t = Interval::new(0.0, 100.0);
        assert!(unit_box().hit(&ray, ray_t));
        assert_eq!(ray_t, Interval::new(0.0, 100.0));
    }

    #[test]
    fn test_aabb_longest_axis() {
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
    }

    #[test]
    fn test_aabb_translate() {
        let translated = unit_box() + Vec3::new(5.0, 0.0, 0.0);

        assert_eq!(translated.x, Interval::new(5.0, 6.0));
        assert_eq!(translated.y, Interval::new(0.0, 1.0));
    }

    #[test]
    fn test_aabb_surface_area() {
        assert!((unit_box().surface_area() - 6.0).abs() < 1e-12);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(aabb.centroid(), Vec3::splat(5.0));
    }
}
