//! Probability density functions over directions.
//!
//! Each PDF pairs a density evaluation (solid-angle measure) with a sampler
//! drawing directions from that density. The integrator combines a
//! material's own PDF with light sampling through [`MixturePdf`].

use crate::random::{gen_f64, random_cosine_direction, random_unit_vector};
use crate::Hittable;
use rand::RngCore;
use std::f64::consts::PI;
use umbra_math::{Onb, Vec3};

/// A sampling strategy for scattered directions.
pub trait Pdf {
    /// Density of `direction` in solid-angle measure.
    fn value(&self, direction: Vec3) -> f64;

    /// Draw a direction distributed according to [`Pdf::value`].
    fn generate(&self, rng: &mut dyn RngCore) -> Vec3;
}

/// Uniform density over the whole sphere of directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpherePdf;

impl Pdf for SpherePdf {
    fn value(&self, _direction: Vec3) -> f64 {
        1.0 / (4.0 * PI)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        random_unit_vector(rng)
    }
}

/// Cosine-weighted density about a normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(w: Vec3) -> Self {
        Self { uvw: Onb::new(w) }
    }
}

impl Pdf for CosinePdf {
    fn value(&self, direction: Vec3) -> f64 {
        let cosine_theta = direction.normalize().dot(self.uvw.w());
        (cosine_theta / PI).max(0.0)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.uvw.transform(random_cosine_direction(rng))
    }
}

/// Samples directions toward a hittable, typically a light.
#[derive(Clone, Copy)]
pub struct HittablePdf<'a> {
    objects: &'a dyn Hittable,
    origin: Vec3,
}

impl<'a> HittablePdf<'a> {
    pub fn new(objects: &'a dyn Hittable, origin: Vec3) -> Self {
        Self { objects, origin }
    }
}

impl Pdf for HittablePdf<'_> {
    fn value(&self, direction: Vec3) -> f64 {
        self.objects.pdf_value(self.origin, direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.objects.random(self.origin, rng)
    }
}

/// Equal-weight mixture of two densities.
#[derive(Clone, Copy)]
pub struct MixturePdf<'a> {
    p: [&'a dyn Pdf; 2],
}

impl<'a> MixturePdf<'a> {
    pub fn new(p0: &'a dyn Pdf, p1: &'a dyn Pdf) -> Self {
        Self { p: [p0, p1] }
    }
}

impl Pdf for MixturePdf<'_> {
    fn value(&self, direction: Vec3) -> f64 {
        0.5 * self.p[0].value(direction) + 0.5 * self.p[1].value(direction)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        if gen_f64(rng) < 0.5 {
            self.p[0].generate(rng)
        } else {
            self.p[1].generate(rng)
        }
    }
}

/// The densities a material can hand to the integrator.
#[derive(Debug, Clone, Copy)]
pub enum ScatterPdf {
    Cosine(CosinePdf),
    Sphere(SpherePdf),
}

impl Pdf for ScatterPdf {
    fn value(&self, direction: Vec3) -> f64 {
        match self {
            ScatterPdf::Cosine(pdf) => pdf.value(direction),
            ScatterPdf::Sphere(pdf) => pdf.value(direction),
        }
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            ScatterPdf::Cosine(pdf) => pdf.generate(rng),
            ScatterPdf::Sphere(pdf) => pdf.generate(rng),
        }
    }
}
