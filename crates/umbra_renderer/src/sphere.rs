//! Sphere primitive for ray tracing.

use crate::random::random_to_sphere;
use crate::{HitRecord, Hittable, Material};
use rand::RngCore;
use std::f64::consts::PI;
use umbra_math::{Aabb, Interval, Onb, Ray, Vec3};

/// A sphere primitive, optionally moving linearly over the shutter interval.
pub struct Sphere<M: Material> {
    /// Center at time 0
    center: Vec3,
    /// Displacement from time 0 to time 1
    motion: Vec3,
    radius: f64,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Sphere<M> {
    /// Create a stationary sphere.
    pub fn new(center: Vec3, radius: f64, material: M) -> Self {
        Self::moving(center, center, radius, material)
    }

    /// Create a sphere moving from `center0` at time 0 to `center1` at time 1.
    pub fn moving(center0: Vec3, center1: Vec3, radius: f64, material: M) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let box0 = Aabb::from_points(center0 - rvec, center0 + rvec);
        let box1 = Aabb::from_points(center1 - rvec, center1 + rvec);

        Self {
            center: center0,
            motion: center1 - center0,
            radius,
            material,
            bbox: Aabb::surrounding(&box0, &box1),
        }
    }

    /// Center at the given time.
    pub fn center(&self, time: f64) -> Vec3 {
        self.center + time * self.motion
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f64, f64) {
        // theta: angle down from +Y
        // phi: angle around Y axis from -X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }

    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let center = self.center(ray.time());
        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let outward_normal = (ray.at(root) - center) / self.radius;
        Some(HitRecord::new(
            ray,
            root,
            outward_normal,
            Self::get_sphere_uv(outward_normal),
            &self.material,
        ))
    }
}

impl<M: Material> Hittable for Sphere<M> {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        _rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.intersect(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Light sampling uses the time-0 position.
    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        let ray = Ray::new_simple(origin, direction);
        if self.intersect(&ray, Interval::new(0.001, f64::INFINITY)).is_none() {
            return 0.0;
        }

        let dist_squared = (self.center - origin).length_squared();
        let cos_theta_max = (1.0 - self.radius * self.radius / dist_squared).max(0.0).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);

        1.0 / solid_angle
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center - origin;
        let distance_squared = direction.length_squared();
        let uvw = Onb::new(direction);
        uvw.transform(random_to_sphere(rng, self.radius, distance_squared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_gray(center: Vec3, radius: f64) -> Sphere<Lambertian> {
        Sphere::new(center, radius, Lambertian::new(Vec3::splat(0.5)))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = unit_gray(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rng = StdRng::seed_from_u64(0);

        let rec = sphere
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .expect("ray at the sphere must hit");

        assert!((rec.t - 0.5).abs() < 1e-9);
        assert!((rec.p - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-9);
        assert!((rec.normal - Vec3::Z).length() < 1e-9);
        assert!(rec.front_face);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_gray(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(sphere
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .is_none());
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = unit_gray(Vec3::ZERO, 2.0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        let mut rng = StdRng::seed_from_u64(0);

        let rec = sphere
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .unwrap();
        assert!((rec.t - 2.0).abs() < 1e-9);
        assert!(!rec.front_face);
        assert!((rec.normal + Vec3::X).length() < 1e-9);
    }

    #[test]
    fn test_sphere_respects_interval() {
        let sphere = unit_gray(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        let mut rng = StdRng::seed_from_u64(0);

        // Both roots (0.5 and 1.5) lie outside (0.001, 0.4).
        assert!(sphere.hit(&ray, Interval::new(0.001, 0.4), &mut rng).is_none());
        // Only the far root lies inside (0.6, 10).
        let rec = sphere.hit(&ray, Interval::new(0.6, 10.0), &mut rng).unwrap();
        assert!((rec.t - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_moving_sphere_follows_ray_time() {
        let sphere = Sphere::moving(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(2.0, 0.0, -5.0),
            0.5,
            Lambertian::new(Vec3::ONE),
        );
        let mut rng = StdRng::seed_from_u64(0);
        let interval = Interval::new(0.001, f64::INFINITY);

        let at_start = Ray::new(Vec3::ZERO, -Vec3::Z, 0.0);
        let at_end = Ray::new(Vec3::new(2.0, 0.0, 0.0), -Vec3::Z, 1.0);
        let at_end_from_origin = Ray::new(Vec3::ZERO, -Vec3::Z, 1.0);

        assert!(sphere.hit(&at_start, interval, &mut rng).is_some());
        assert!(sphere.hit(&at_end, interval, &mut rng).is_some());
        assert!(sphere.hit(&at_end_from_origin, interval, &mut rng).is_none());

        let bbox = sphere.bounding_box();
        assert_eq!(bbox.x.min, -0.5);
        assert_eq!(bbox.x.max, 2.5);
    }

    #[test]
    fn test_sphere_uv() {
        let (u, v) = Sphere::<Lambertian>::get_sphere_uv(Vec3::X);
        assert!((u - 0.5).abs() < 1e-12);
        assert!((v - 0.5).abs() < 1e-12);

        let (_, v) = Sphere::<Lambertian>::get_sphere_uv(Vec3::Y);
        assert!((v - 1.0).abs() < 1e-12);

        let (u, _) = Sphere::<Lambertian>::get_sphere_uv(-Vec3::Z);
        assert!((u - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_light_sampling() {
        let sphere = unit_gray(Vec3::new(0.0, 0.0, -4.0), 1.0);
        let mut rng = StdRng::seed_from_u64(9);

        let cos_max = (1.0 - 1.0 / 16.0f64).sqrt();
        let expected = 1.0 / (2.0 * PI * (1.0 - cos_max));

        for _ in 0..500 {
            let d = sphere.random(Vec3::ZERO, &mut rng);
            let pdf = sphere.pdf_value(Vec3::ZERO, d);
            assert!((pdf - expected).abs() < 1e-9 * expected);
        }
        assert_eq!(sphere.pdf_value(Vec3::ZERO, Vec3::Z), 0.0);
    }
}
