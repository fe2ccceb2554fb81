//! Sampling helpers over a caller-owned random source.
//!
//! Every function takes `&mut dyn RngCore` so each render task can own its
//! generator; nothing here touches a shared or thread-global RNG.

use rand::{Rng, RngCore};
use std::f64::consts::PI;
use umbra_math::Vec3;

/// Uniform real in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform real in [min, max).
#[inline]
pub fn gen_range(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    min + (max - min) * gen_f64(rng)
}

/// Vector with each component uniform in [min, max).
pub fn random_vec3(rng: &mut dyn RngCore, min: f64, max: f64) -> Vec3 {
    Vec3::new(
        gen_range(rng, min, max),
        gen_range(rng, min, max),
        gen_range(rng, min, max),
    )
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Rejection sampling keeps the distribution uniform.
    loop {
        let v = random_vec3(rng, -1.0, 1.0);
        let len_sq = v.length_squared();
        if 1e-160 < len_sq && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Uniform point in the unit disk on the z = 0 plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_range(rng, -1.0, 1.0), gen_range(rng, -1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Cosine-weighted direction about +Z.
pub fn random_cosine_direction(rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f64(rng);
    let r2 = gen_f64(rng);

    let phi = 2.0 * PI * r1;
    let x = phi.cos() * r2.sqrt();
    let y = phi.sin() * r2.sqrt();
    let z = (1.0 - r2).sqrt();

    Vec3::new(x, y, z)
}

/// Uniform direction about +Z inside the cone subtended by a sphere of
/// `radius` at squared distance `distance_squared`.
pub fn random_to_sphere(rng: &mut dyn RngCore, radius: f64, distance_squared: f64) -> Vec3 {
    let r1 = gen_f64(rng);
    let r2 = gen_f64(rng);
    let cos_theta_max = (1.0 - radius * radius / distance_squared).max(0.0).sqrt();
    let z = 1.0 + r2 * (cos_theta_max - 1.0);

    let phi = 2.0 * PI * r1;
    let sin_theta = (1.0 - z * z).max(0.0).sqrt();
    let x = phi.cos() * sin_theta;
    let y = phi.sin() * sin_theta;

    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gen_range_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let x = gen_range(&mut rng, -2.0, 3.0);
            assert!((-2.0..3.0).contains(&x));
        }
    }

    #[test]
    fn test_unit_vector_length_and_mean() {
        let mut rng = StdRng::seed_from_u64(2);
        let n = 20_000;
        let mut sum = Vec3::ZERO;
        for _ in 0..n {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-9);
            sum += v;
        }
        // Uniform on the sphere: the mean direction vanishes.
        assert!((sum / n as f64).length() < 0.03);
    }

    #[test]
    fn test_unit_disk() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let p = random_in_unit_disk(&mut rng);
            assert!(p.length_squared() < 1.0);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_cosine_direction_upper_hemisphere() {
        let mut rng = StdRng::seed_from_u64(4);
        let n = 20_000;
        let mut mean_z = 0.0;
        for _ in 0..n {
            let d = random_cosine_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-9);
            assert!(d.z >= 0.0);
            mean_z += d.z;
        }
        // E[cos θ] under a cosine-weighted lobe is 2/3.
        assert!((mean_z / n as f64 - 2.0 / 3.0).abs() < 0.01);
    }

    #[test]
    fn test_to_sphere_stays_in_cone() {
        let mut rng = StdRng::seed_from_u64(5);
        let (radius, dist_sq): (f64, f64) = (1.0, 16.0);
        let cos_max = (1.0 - radius * radius / dist_sq).sqrt();
        for _ in 0..1000 {
            let d = random_to_sphere(&mut rng, radius, dist_sq);
            assert!((d.length() - 1.0).abs() < 1e-9);
            assert!(d.z >= cos_max - 1e-12);
        }
    }
}
