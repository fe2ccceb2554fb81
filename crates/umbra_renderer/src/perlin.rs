//! Gradient (Perlin) noise.

use crate::random::random_unit_vector;
use rand::{Rng, RngCore};
use umbra_math::Vec3;

const POINT_COUNT: usize = 256;

/// Perlin noise with random unit gradients and per-axis permutations.
#[derive(Clone)]
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let gradients = (0..POINT_COUNT).map(|_| random_unit_vector(rng)).collect();
        Self {
            gradients,
            perm_x: generate_perm(rng),
            perm_y: generate_perm(rng),
            perm_z: generate_perm(rng),
        }
    }

    /// Noise value in roughly [-1, 1].
    pub fn noise(&self, p: Vec3) -> f64 {
        let f = p - p.floor();
        let i = p.x.floor() as i64;
        let j = p.y.floor() as i64;
        let k = p.z.floor() as i64;

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    let index = self.perm_x[wrap(i + di as i64)]
                        ^ self.perm_y[wrap(j + dj as i64)]
                        ^ self.perm_z[wrap(k + dk as i64)];
                    *cell = self.gradients[index];
                }
            }
        }

        perlin_interp(&c, f)
    }

    /// Sum of `depth` octaves of |noise| with halving weight.
    pub fn turbulence(&self, p: Vec3, depth: usize) -> f64 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

#[inline]
fn wrap(i: i64) -> usize {
    i.rem_euclid(POINT_COUNT as i64) as usize
}

fn generate_perm(rng: &mut dyn RngCore) -> Vec<usize> {
    let mut p: Vec<usize> = (0..POINT_COUNT).collect();
    for i in (1..POINT_COUNT).rev() {
        let target = rng.gen_range(0..=i);
        p.swap(i, target);
    }
    p
}

/// Trilinear interpolation of gradient dot products with Hermite smoothing.
fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], f: Vec3) -> f64 {
    let uu = f.x * f.x * (3.0 - 2.0 * f.x);
    let vv = f.y * f.y * (3.0 - 2.0 * f.y);
    let ww = f.z * f.z * (3.0 - 2.0 * f.z);

    let mut accum = 0.0;
    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f64, j as f64, k as f64);
                let weight = Vec3::new(f.x - fi, f.y - fj, f.z - fk);
                accum += (fi * uu + (1.0 - fi) * (1.0 - uu))
                    * (fj * vv + (1.0 - fj) * (1.0 - vv))
                    * (fk * ww + (1.0 - fk) * (1.0 - ww))
                    * gradient.dot(weight);
            }
        }
    }
    accum
}
