//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive radiance estimation bounded by a maximum depth
//! - Light importance sampling mixed with the material's own density
//! - Stratified multi-sampling per pixel
//! - Gamma correction and 8-bit quantization of the output

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::material::{fallback_to_normal, ScatterKind};
use crate::pdf::{HittablePdf, MixturePdf, Pdf};
use crate::{Camera, Hittable, RenderError, RenderResult, Viewport};
use log::{debug, info};
use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use umbra_math::{Color, Interval, Ray};

/// Minimum t for shading rays; avoids re-hitting the surface just left.
const SHADOW_ACNE_EPSILON: f64 = 0.001;

/// Render-loop knobs that are not camera optics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Seed for the per-pixel random sources
    pub seed: u64,
    /// Edge length of a square bucket in pixels
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Compute the radiance carried back along `ray`.
///
/// `lights` is an optional hittable (usually a [`crate::HittableList`]) that
/// diffuse bounces importance-sample; it is not intersected for visibility.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    lights: Option<&dyn Hittable>,
    depth: u32,
    background: Color,
    rng: &mut dyn RngCore,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, Interval::new(SHADOW_ACNE_EPSILON, f64::INFINITY), rng) else {
        return background;
    };

    let emission = rec.material.emitted(ray, &rec, rec.u, rec.v, rec.p);

    let Some(srec) = rec.material.scatter(ray, &rec, rng) else {
        return emission;
    };

    let material_pdf = match srec.kind {
        ScatterKind::Specular(scattered) => {
            let incoming = ray_color(&scattered, world, lights, depth - 1, background, rng);
            return emission + srec.attenuation * incoming;
        }
        ScatterKind::Pdf(pdf) => pdf,
    };

    let (direction, sampling_pdf) = match lights {
        Some(lights) => {
            let light_pdf = HittablePdf::new(lights, rec.p);
            let mixture = MixturePdf::new(&light_pdf, &material_pdf);
            let direction = fallback_to_normal(mixture.generate(rng), rec.normal);
            (direction, mixture.value(direction))
        }
        None => {
            let direction = fallback_to_normal(material_pdf.generate(rng), rec.normal);
            (direction, material_pdf.value(direction))
        }
    };

    if sampling_pdf <= 0.0 {
        return emission;
    }

    let scattered = ray.spawn(rec.p, direction);
    let scattering_pdf = rec.material.scattering_pdf(ray, &rec, &scattered);
    let incoming = ray_color(&scattered, world, lights, depth - 1, background, rng);

    emission + srec.attenuation * scattering_pdf * incoming / sampling_pdf
}

/// Everything a worker needs to shade pixels; shared read-only.
#[derive(Clone, Copy)]
pub struct Integrator<'a> {
    pub viewport: &'a Viewport,
    pub world: &'a dyn Hittable,
    pub lights: Option<&'a dyn Hittable>,
    pub max_depth: u32,
    pub background: Color,
}

impl Integrator<'_> {
    /// Average of the stratified samples for pixel (x, y).
    pub fn render_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        let sqrt_spp = self.viewport.sqrt_spp();
        let mut pixel_color = Color::ZERO;

        for s_j in 0..sqrt_spp {
            for s_i in 0..sqrt_spp {
                let ray = self.viewport.get_ray(x, y, s_i, s_j, rng);
                pixel_color += ray_color(
                    &ray,
                    self.world,
                    self.lights,
                    self.max_depth,
                    self.background,
                    rng,
                );
            }
        }

        pixel_color * self.viewport.samples_scale()
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Inverse of [`linear_to_gamma`] on [0, 1].
#[inline]
pub fn gamma_to_linear(gamma: f64) -> f64 {
    if gamma > 0.0 {
        gamma * gamma
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let intensity = Interval::new(0.0, 0.999);
    let quantize = |c: f64| (256.0 * intensity.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}

/// Row-major buffer of linear colors.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Copy a rendered bucket into its slots.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (row, chunk) in result.pixels.chunks(bucket.width as usize).enumerate() {
            let start = self.index(bucket.x, bucket.y + row as u32);
            self.pixels[start..start + chunk.len()].copy_from_slice(chunk);
        }
    }

    /// Gamma-corrected, quantized RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgba(*c)).collect()
    }
}

impl Camera {
    /// Render `world` into a new buffer of linear colors.
    ///
    /// Buckets run in parallel; each pixel draws from its own random source
    /// seeded from `config.seed`, so the result does not depend on scheduling.
    pub fn render(
        &self,
        world: &dyn Hittable,
        lights: Option<&dyn Hittable>,
        config: &RenderConfig,
    ) -> RenderResult<ImageBuffer> {
        let viewport = self.viewport()?;
        if config.bucket_size == 0 {
            return Err(RenderError::InvalidConfig(
                "bucket size must be positive".into(),
            ));
        }

        let (width, height) = (viewport.image_width, viewport.image_height);
        let buckets = generate_buckets(width, height, config.bucket_size);
        let total = buckets.len();

        info!(
            "Rendering {}x{} at {} spp, depth {}, {} buckets on {} threads",
            width,
            height,
            viewport.effective_samples(),
            self.config().max_depth,
            total,
            rayon::current_num_threads()
        );
        let start = Instant::now();

        let integrator = Integrator {
            viewport,
            world,
            lights,
            max_depth: self.config().max_depth,
            background: self.config().background,
        };

        // Best-effort progress; lost updates only affect the log.
        let done = AtomicUsize::new(0);
        let step = (total / 10).max(1);

        let results: Vec<BucketResult> = buckets
            .par_iter()
            .map(|bucket| {
                let result = render_bucket(bucket, &integrator, width, config.seed);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % step == 0 || finished == total {
                    debug!(
                        "Render progress: {}% ({}/{} buckets)",
                        finished * 100 / total,
                        finished,
                        total
                    );
                }
                result
            })
            .collect();

        let mut image = ImageBuffer::new(width, height);
        for result in &results {
            image.write_bucket(result);
        }

        info!("Render finished in {:.2?}", start.elapsed());
        Ok(image)
    }
}
