//! Material trait for surface scattering.

use crate::pdf::{CosinePdf, Pdf, ScatterPdf, SpherePdf};
use crate::random::{gen_f64, random_unit_vector};
use crate::texture::{SolidColor, Texture};
use crate::HitRecord;
use rand::RngCore;
use std::f64::consts::PI;
use std::sync::Arc;
use umbra_math::{reflect, refract, Color, Ray, Vec3, Vec3Ext};

/// How a scattered ray is chosen.
#[derive(Debug, Clone, Copy)]
pub enum ScatterKind {
    /// Draw the direction from a density; the integrator may mix it with
    /// light sampling and reweights by [`Material::scattering_pdf`].
    Pdf(ScatterPdf),
    /// Follow exactly this ray with weight 1 (mirror and glass).
    Specular(Ray),
}

/// Result of a scattering event.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    pub attenuation: Color,
    pub kind: ScatterKind,
}

impl ScatterRecord {
    /// True when the integrator must skip PDF weighting.
    pub fn skip_pdf(&self) -> bool {
        matches!(self.kind, ScatterKind::Specular(_))
    }
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    fn scatter(
        &self,
        _ray_in: &Ray,
        _rec: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        None
    }

    /// Light emitted at the hit point. Most materials return black.
    fn emitted(&self, _ray_in: &Ray, _rec: &HitRecord, _u: f64, _v: f64, _p: Vec3) -> Color {
        Color::ZERO
    }

    /// Density of this material's own scattering distribution for
    /// `scattered`, in solid angle.
    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, _scattered: &Ray) -> f64 {
        0.0
    }
}

impl<M: Material + ?Sized> Material for Arc<M> {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        (**self).scatter(ray_in, rec, rng)
    }

    fn emitted(&self, ray_in: &Ray, rec: &HitRecord, u: f64, v: f64, p: Vec3) -> Color {
        (**self).emitted(ray_in, rec, u, v, p)
    }

    fn scattering_pdf(&self, ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f64 {
        (**self).scattering_pdf(ray_in, rec, scattered)
    }
}

/// Absorbs everything and emits nothing.
///
/// Used for geometry that only exists to be sampled, such as entries of a
/// light list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMaterial;

impl Material for NoMaterial {}

/// Replace a degenerate sampled direction with the surface normal.
#[inline]
pub fn fallback_to_normal(direction: Vec3, normal: Vec3) -> Vec3 {
    if direction.is_near_zero() {
        normal
    } else {
        direction
    }
}

/// Lambertian (diffuse) material.
#[derive(Clone)]
pub struct Lambertian {
    texture: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self::from_texture(Arc::new(SolidColor::new(albedo)))
    }

    pub fn from_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        _ray_in: &Ray,
        rec: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        Some(ScatterRecord {
            attenuation: self.texture.value(rec.u, rec.v, rec.p),
            kind: ScatterKind::Pdf(ScatterPdf::Cosine(CosinePdf::new(rec.normal))),
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f64 {
        let cos_theta = rec.normal.dot(scattered.direction().normalize());
        (cos_theta / PI).max(0.0)
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f64,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal).normalize();
        let direction = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz can push the ray below the surface or cancel the reflection
        // outright; treat both as absorbed.
        if direction.is_near_zero() || direction.dot(rec.normal) <= 0.0 {
            return None;
        }
        let direction = direction.normalize();

        Some(ScatterRecord {
            attenuation: self.albedo,
            kind: ScatterKind::Specular(ray_in.spawn(rec.p, direction)),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction relative to the enclosing medium
    ior: f64,
    /// Cauchy coefficients (a, b) with wavelength in micrometres
    dispersion: Option<(f64, f64)>,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f64) -> Self {
        Self {
            ior,
            dispersion: None,
        }
    }

    /// Glass whose index follows Cauchy's equation `a + b / λ²` for rays
    /// carrying a wavelength. Untagged rays see the index at 550 nm.
    ///
    /// [`Camera::render`](crate::Camera::render) traces untagged RGB rays,
    /// so dispersion only shows when the caller tags rays itself with
    /// [`Ray::with_wavelength`].
    pub fn with_dispersion(a: f64, b: f64) -> Self {
        Self {
            ior: a + b / (0.55 * 0.55),
            dispersion: Some((a, b)),
        }
    }

    /// Index of refraction seen by `ray`.
    pub fn index_for(&self, ray: &Ray) -> f64 {
        match (self.dispersion, ray.wavelength()) {
            (Some((a, b)), Some(meters)) => {
                let micrometres = meters * 1e6;
                a + b / (micrometres * micrometres)
            }
            _ => self.ior,
        }
    }

    /// Schlick's approximation for reflectance
    pub fn reflectance(cosine: f64, refraction_index: f64) -> f64 {
        let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        let ior = self.index_for(ray_in);
        let ri = if rec.front_face { 1.0 / ior } else { ior };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection does not consume a random draw.
        let cannot_refract = ri * sin_theta > 1.0;
        let direction = if cannot_refract || Self::reflectance(cos_theta, ri) > gen_f64(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ri)
        };

        Some(ScatterRecord {
            attenuation: Color::ONE,
            kind: ScatterKind::Specular(ray_in.spawn(rec.p, direction)),
        })
    }
}

/// One-sided diffuse light emitter.
#[derive(Clone)]
pub struct DiffuseLight {
    texture: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self::from_texture(Arc::new(SolidColor::new(emit)))
    }

    pub fn from_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for DiffuseLight {
    fn emitted(&self, _ray_in: &Ray, rec: &HitRecord, u: f64, v: f64, p: Vec3) -> Color {
        if !rec.front_face {
            return Color::ZERO;
        }
        self.texture.value(u, v, p)
    }
}

/// Isotropic phase function for participating media.
#[derive(Clone)]
pub struct Isotropic {
    texture: Arc<dyn Texture>,
}

impl Isotropic {
    pub fn new(albedo: Color) -> Self {
        Self::from_texture(Arc::new(SolidColor::new(albedo)))
    }

    pub fn from_texture(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Isotropic {
    fn scatter(
        &self,
        _ray_in: &Ray,
        rec: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        Some(ScatterRecord {
            attenuation: self.texture.value(rec.u, rec.v, rec.p),
            kind: ScatterKind::Pdf(ScatterPdf::Sphere(SpherePdf)),
        })
    }

    fn scattering_pdf(&self, _ray_in: &Ray, _rec: &HitRecord, scattered: &Ray) -> f64 {
        SpherePdf.value(scattered.direction())
    }
}
