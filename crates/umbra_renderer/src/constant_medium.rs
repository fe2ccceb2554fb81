//! Constant-density participating media (fog, smoke).

use crate::random::gen_f64;
use crate::texture::Texture;
use crate::{HitRecord, Hittable, Isotropic};
use rand::RngCore;
use std::sync::Arc;
use umbra_math::{Aabb, Color, Interval, Ray, Vec3};

/// Offset past the entry point when searching for the exit crossing.
const EXIT_EPSILON: f64 = 1e-8;

/// A volume of uniform density bounded by a closed surface.
///
/// The boundary must report hits from inside as well as outside (spheres and
/// boxes do). Rays scatter inside with probability given by Beer-Lambert
/// transmittance.
pub struct ConstantMedium<H: Hittable> {
    boundary: H,
    neg_inv_density: f64,
    phase_function: Isotropic,
}

impl<H: Hittable> ConstantMedium<H> {
    pub fn new(boundary: H, density: f64, albedo: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::new(albedo),
        }
    }

    pub fn from_texture(boundary: H, density: f64, texture: Arc<dyn Texture>) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::from_texture(texture),
        }
    }
}

impl<H: Hittable> Hittable for ConstantMedium<H> {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let entry = self.boundary.hit(ray, Interval::UNIVERSE, rng)?;
        let exit = self.boundary.hit(
            ray,
            Interval::new(entry.t + EXIT_EPSILON, f64::INFINITY),
            rng,
        )?;

        let mut t_enter = entry.t.max(ray_t.min);
        let t_exit = exit.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }
        // The ray may start inside the volume.
        t_enter = t_enter.max(0.0);

        let ray_length = ray.direction().length();
        let distance_inside_boundary = (t_exit - t_enter) * ray_length;
        let hit_distance = self.neg_inv_density * gen_f64(rng).ln();

        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        Some(HitRecord {
            p: ray.at(t),
            // Arbitrary: a medium has no surface.
            normal: Vec3::X,
            material: &self.phase_function,
            u: 0.0,
            v: 0.0,
            t,
            front_face: true,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fog_ball(density: f64) -> ConstantMedium<Sphere<Lambertian>> {
        let boundary = Sphere::new(Vec3::ZERO, 1.0, Lambertian::new(Color::ONE));
        ConstantMedium::new(boundary, density, Color::splat(0.8))
    }

    #[test]
    fn test_dense_medium_scatters_near_entry() {
        let medium = fog_ball(1e6);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);

        let rec = medium
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .expect("dense fog always scatters");
        assert!(rec.t >= 4.0 && rec.t < 4.01);
        assert!(rec.front_face);
    }

    #[test]
    fn test_thin_medium_scatter_fraction_matches_transmittance() {
        let density = 0.5;
        let medium = fog_ball(density);
        let mut rng = StdRng::seed_from_u64(2);
        // Unnormalized direction: distances must be measured in world units.
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 2.0));

        let n = 20_000;
        let scattered = (0..n)
            .filter(|_| {
                medium
                    .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
                    .is_some()
            })
            .count();

        // Chord length 2: P(scatter) = 1 - exp(-density * 2).
        let expected = 1.0 - (-density * 2.0f64).exp();
        assert!((scattered as f64 / n as f64 - expected).abs() < 0.015);
    }

    #[test]
    fn test_ray_starting_inside() {
        let medium = fog_ball(1e6);
        let mut rng = StdRng::seed_from_u64(3);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);

        let rec = medium
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .unwrap();
        assert!(rec.t < 0.01);
    }

    #[test]
    fn test_miss_and_clipped_interval() {
        let medium = fog_ball(1e6);
        let mut rng = StdRng::seed_from_u64(4);

        let miss = Ray::new_simple(Vec3::new(0.0, 3.0, -5.0), Vec3::Z);
        assert!(medium.hit(&miss, Interval::new(0.001, f64::INFINITY), &mut rng).is_none());

        // The interval ends before the medium begins.
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(medium.hit(&ray, Interval::new(0.001, 3.0), &mut rng).is_none());
    }

    #[test]
    fn test_bbox_matches_boundary() {
        let medium = fog_ball(1.0);
        assert_eq!(medium.bounding_box().x, Interval::new(-1.0, 1.0));
    }
}
