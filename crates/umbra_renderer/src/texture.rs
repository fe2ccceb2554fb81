//! Textures: colors as a function of surface coordinates and position.

use crate::perlin::Perlin;
use rand::RngCore;
use std::sync::Arc;
use umbra_core::Image;
use umbra_math::{Color, Interval, Vec3};

/// Trait for anything that can color a surface point.
pub trait Texture: Send + Sync {
    fn value(&self, u: f64, v: f64, p: Vec3) -> Color;
}

/// A constant color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::new(Color::new(red, green, blue))
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f64, _v: f64, _p: Vec3) -> Color {
        self.albedo
    }
}

/// Alternating 3D cells of two textures, keyed on world position.
#[derive(Clone)]
pub struct CheckerTexture {
    inv_scale: f64,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl CheckerTexture {
    /// `scale` is the edge length of one cell.
    pub fn new(scale: f64, even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    pub fn from_colors(scale: f64, even: Color, odd: Color) -> Self {
        Self::new(
            scale,
            Arc::new(SolidColor::new(even)),
            Arc::new(SolidColor::new(odd)),
        )
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f64, v: f64, p: Vec3) -> Color {
        let cell = (self.inv_scale * p).floor();
        let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;

        if sum.rem_euclid(2) == 0 {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// Nearest-texel lookup into a decoded image.
#[derive(Clone)]
pub struct ImageTexture {
    image: Arc<Image>,
}

impl ImageTexture {
    pub fn new(image: Arc<Image>) -> Self {
        if image.is_empty() {
            log::warn!("Image texture {} has no pixel data, rendering cyan", image.path);
        }
        Self { image }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f64, v: f64, _p: Vec3) -> Color {
        // Cyan marks missing image data.
        if self.image.is_empty() {
            return Color::new(0.0, 1.0, 1.0);
        }

        let unit = Interval::new(0.0, 1.0);
        let u = unit.clamp(u);
        // Image rows run top to bottom.
        let v = 1.0 - unit.clamp(v);

        let i = (u * self.image.width as f64) as i64;
        let j = (v * self.image.height as f64) as i64;
        let [r, g, b, _] = self.image.pixel(i, j);

        Color::new(r as f64, g as f64, b as f64)
    }
}

/// Perlin marble: sine bands along z, perturbed by turbulence.
#[derive(Clone)]
pub struct NoiseTexture {
    noise: Perlin,
    scale: f64,
}

impl NoiseTexture {
    pub fn new(scale: f64, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f64, _v: f64, p: Vec3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.noise.turbulence(p, 7);
        Color::splat(0.5) * (1.0 + phase.sin())
    }
}
