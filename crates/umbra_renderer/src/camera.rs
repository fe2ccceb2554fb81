//! Camera for ray generation.

use crate::random::{gen_f64, random_in_unit_disk};
use crate::{RenderError, RenderResult};
use log::warn;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use umbra_math::{Color, Ray, Vec3, Vec3Ext};

/// Plain camera options, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub image_width: u32,
    /// Width over height
    pub aspect_ratio: f64,
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Vertical field of view in degrees
    pub vfov: f64,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f64,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f64,
    /// Radiance returned by rays that escape the scene
    pub background: Color,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_width: 400,
            aspect_ratio: 16.0 / 9.0,
            samples_per_pixel: 10,
            max_depth: 10,
            vfov: 90.0,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            background: Color::ZERO,
        }
    }
}

impl CameraConfig {
    /// Image height derived from width and aspect ratio, at least 1.
    pub fn image_height(&self) -> u32 {
        ((self.image_width as f64 / self.aspect_ratio) as u32).max(1)
    }

    fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: String| Err(RenderError::InvalidConfig(msg));

        if self.image_width == 0 {
            return invalid("image width must be positive".into());
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return invalid(format!("aspect ratio {} is not positive", self.aspect_ratio));
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples per pixel must be at least 1".into());
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return invalid(format!("vertical fov {} outside (0, 180)", self.vfov));
        }
        if !self.focus_dist.is_finite() || self.focus_dist <= 0.0 {
            return invalid(format!("focus distance {} is not positive", self.focus_dist));
        }
        if !self.defocus_angle.is_finite() || self.defocus_angle < 0.0 {
            return invalid(format!("defocus angle {} is negative", self.defocus_angle));
        }
        let view = self.look_from - self.look_at;
        if view.is_near_zero() {
            return invalid("look_from and look_at coincide".into());
        }
        if self.vup.cross(view.normalize()).is_near_zero() {
            return invalid("up vector is parallel to the view direction".into());
        }
        Ok(())
    }
}

/// Derived frame computed by [`Camera::initialize`].
#[derive(Debug, Clone)]
pub struct Viewport {
    pub image_width: u32,
    pub image_height: u32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_angle: f64,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    /// Strata per axis: floor(sqrt(samples_per_pixel))
    sqrt_spp: u32,
    recip_sqrt_spp: f64,
}

impl Viewport {
    /// Strata per pixel axis.
    pub fn sqrt_spp(&self) -> u32 {
        self.sqrt_spp
    }

    /// Samples actually taken per pixel.
    pub fn effective_samples(&self) -> u32 {
        self.sqrt_spp * self.sqrt_spp
    }

    /// Scale applied to the summed samples of one pixel.
    pub fn samples_scale(&self) -> f64 {
        1.0 / self.effective_samples() as f64
    }

    /// Camera basis (right, up, backward).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Generate a ray for pixel (i, j), jittered inside stratum (s_i, s_j).
    ///
    /// The ray starts on the defocus disk (or the center for a pinhole) and
    /// carries a uniform random time in [0, 1).
    pub fn get_ray(&self, i: u32, j: u32, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = self.sample_square_stratified(s_i, s_j, rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f64) + offset.x) * self.pixel_delta_u
            + ((j as f64) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let ray_direction = pixel_sample - ray_origin;
        let ray_time = gen_f64(rng);

        Ray::new(ray_origin, ray_direction, ray_time)
    }

    /// Point in the [-0.5, 0.5] square restricted to one stratum.
    fn sample_square_stratified(&self, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Vec3 {
        let px = ((s_i as f64 + gen_f64(rng)) * self.recip_sqrt_spp) - 0.5;
        let py = ((s_j as f64 + gen_f64(rng)) * self.recip_sqrt_spp) - 0.5;
        Vec3::new(px, py, 0.0)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

/// Camera for generating rays into the scene.
///
/// Changing the configuration drops the derived [`Viewport`]; rendering
/// requires a fresh [`Camera::initialize`].
#[derive(Debug, Clone, Default)]
pub struct Camera {
    config: CameraConfig,
    viewport: Option<Viewport>,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CameraConfig) -> Self {
        Self {
            config,
            viewport: None,
        }
    }

    /// Set image width and aspect ratio.
    pub fn with_image(mut self, width: u32, aspect_ratio: f64) -> Self {
        self.config.image_width = width;
        self.config.aspect_ratio = aspect_ratio;
        self.viewport = None;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.config.samples_per_pixel = samples;
        self.config.max_depth = max_depth;
        self.viewport = None;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.config.look_from = look_from;
        self.config.look_at = look_at;
        self.config.vup = vup;
        self.viewport = None;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f64, defocus_angle: f64, focus_dist: f64) -> Self {
        self.config.vfov = vfov;
        self.config.defocus_angle = defocus_angle;
        self.config.focus_dist = focus_dist;
        self.viewport = None;
        self
    }

    /// Set background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.config.background = color;
        self.viewport = None;
        self
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Mutable access to the options. Invalidates the derived viewport.
    pub fn config_mut(&mut self) -> &mut CameraConfig {
        self.viewport = None;
        &mut self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.viewport.is_some()
    }

    /// The derived frame, or [`RenderError::NotInitialized`].
    pub fn viewport(&self) -> RenderResult<&Viewport> {
        self.viewport.as_ref().ok_or(RenderError::NotInitialized)
    }

    /// Validate the configuration and compute the derived frame.
    pub fn initialize(&mut self) -> RenderResult<()> {
        self.viewport = None;
        self.config.validate()?;
        let cfg = &self.config;

        let image_width = cfg.image_width;
        let image_height = cfg.image_height();

        let sqrt_spp = ((cfg.samples_per_pixel as f64).sqrt() as u32).max(1);
        if sqrt_spp * sqrt_spp != cfg.samples_per_pixel {
            warn!(
                "samples_per_pixel {} is not a perfect square; taking {} stratified samples",
                cfg.samples_per_pixel,
                sqrt_spp * sqrt_spp
            );
        }

        let center = cfg.look_from;

        // Calculate viewport dimensions
        let theta = cfg.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * cfg.focus_dist;
        let viewport_width = viewport_height * (image_width as f64 / image_height as f64);

        // Calculate camera basis vectors
        let w = (cfg.look_from - cfg.look_at).normalize();
        let u = cfg.vup.cross(w).normalize();
        let v = w.cross(u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        // Calculate pixel delta vectors
        let pixel_delta_u = viewport_u / image_width as f64;
        let pixel_delta_v = viewport_v / image_height as f64;

        // Calculate upper left pixel location
        let viewport_upper_left = center - cfg.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = cfg.focus_dist * (cfg.defocus_angle / 2.0).to_radians().tan();

        self.viewport = Some(Viewport {
            image_width,
            image_height,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_angle: cfg.defocus_angle,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            sqrt_spp,
            recip_sqrt_spp: 1.0 / sqrt_spp as f64,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_initialize() {
        let mut camera = Camera::new()
            .with_image(800, 4.0 / 3.0)
            .with_position(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize().unwrap();
        let viewport = camera.viewport().unwrap();

        assert_eq!(viewport.center(), Vec3::ZERO);
        assert_eq!(viewport.image_height, 600);
        let (_, _, w) = viewport.basis();
        assert!((w - Vec3::Z).length() < 0.001);
    }

    #[test]
    fn test_camera_ray_direction() {
        let mut camera = Camera::new()
            .with_image(100, 1.0)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);
        camera.initialize().unwrap();
        let viewport = camera.viewport().unwrap();

        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = viewport.get_ray(50, 50, 0, 0, &mut rng);
        assert!(ray.direction().z < 0.0);
        assert!(ray.direction().x.abs() < 0.05 && ray.direction().y.abs() < 0.05);
        assert!((0.0..1.0).contains(&ray.time()));
    }

    #[test]
    fn test_stratified_offsets_stay_in_stratum() {
        let mut camera = Camera::new()
            .with_image(1, 1.0)
            .with_quality(16, 5)
            .with_lens(90.0, 0.0, 1.0);
        camera.initialize().unwrap();
        let viewport = camera.viewport().unwrap();
        assert_eq!(viewport.sqrt_spp(), 4);

        let mut rng = StdRng::seed_from_u64(7);
        for s_i in 0..4 {
            for s_j in 0..4 {
                let p = viewport.sample_square_stratified(s_i, s_j, &mut rng);
                let lo_x = s_i as f64 * 0.25 - 0.5;
                let lo_y = s_j as f64 * 0.25 - 0.5;
                assert!(p.x >= lo_x && p.x < lo_x + 0.25);
                assert!(p.y >= lo_y && p.y < lo_y + 0.25);
            }
        }
    }

    #[test]
    fn test_effective_samples_floor_square() {
        let mut camera = Camera::new().with_quality(10, 5);
        camera.initialize().unwrap();
        let viewport = camera.viewport().unwrap();
        assert_eq!(viewport.effective_samples(), 9);
        assert!((viewport.samples_scale() - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_defocus_origins_on_disk() {
        let mut camera = Camera::new()
            .with_image(10, 1.0)
            .with_lens(40.0, 10.0, 5.0);
        camera.initialize().unwrap();
        let viewport = camera.viewport().unwrap();

        let radius = 5.0 * (5.0f64).to_radians().tan();
        let mut rng = StdRng::seed_from_u64(3);
        let mut moved = false;
        for _ in 0..50 {
            let ray = viewport.get_ray(5, 5, 0, 0, &mut rng);
            let d = ray.origin() - viewport.center();
            assert!(d.length() <= radius + 1e-9);
            assert!(d.z.abs() < 1e-12);
            moved |= d.length() > 1e-6;
        }
        assert!(moved);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let cases = [
            Camera::new().with_image(0, 1.0),
            Camera::new().with_image(100, 0.0),
            Camera::new().with_image(100, f64::NAN),
            Camera::new().with_quality(0, 5),
            Camera::new().with_lens(0.0, 0.0, 1.0),
            Camera::new().with_lens(180.0, 0.0, 1.0),
            Camera::new().with_lens(90.0, -1.0, 1.0),
            Camera::new().with_lens(90.0, 0.0, 0.0),
            Camera::new().with_position(Vec3::ONE, Vec3::ONE, Vec3::Y),
            Camera::new().with_position(Vec3::ZERO, Vec3::Y, Vec3::Y),
        ];
        for mut camera in cases {
            let err = camera.initialize().unwrap_err();
            assert!(matches!(err, RenderError::InvalidConfig(_)), "{err}");
            assert!(!camera.is_initialized());
        }
    }

    #[test]
    fn test_config_change_invalidates() {
        let mut camera = Camera::new();
        camera.initialize().unwrap();
        assert!(camera.is_initialized());

        camera.config_mut().max_depth = 3;
        assert_eq!(camera.viewport().unwrap_err(), RenderError::NotInitialized);
    }

    #[test]
    fn test_config_json_defaults() {
        let config: CameraConfig =
            serde_json::from_str(r#"{ "image_width": 64, "vfov": 40.0 }"#).unwrap();
        assert_eq!(config.image_width, 64);
        assert_eq!(config.vfov, 40.0);
        assert_eq!(config.samples_per_pixel, CameraConfig::default().samples_per_pixel);
        assert_eq!(config.image_height(), 36);
    }
}
