//! Umbra renderer - CPU path tracing
//!
//! A Monte Carlo path tracer with importance sampling toward lights, a BVH
//! over arbitrary hittables, participating media and a bucketed parallel
//! render loop.

mod bucket;
mod bvh;
mod camera;
mod constant_medium;
mod error;
mod hittable;
mod instance;
mod material;
mod pdf;
mod perlin;
mod quad;
pub mod random;
mod renderer;
mod sphere;
mod texture;

pub use bucket::{
    generate_buckets, pixel_seed, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE,
};
pub use bvh::{BvhNode, SplitStrategy};
pub use camera::{Camera, CameraConfig, Viewport};
pub use constant_medium::ConstantMedium;
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use instance::{RotateY, Translate};
pub use material::{
    fallback_to_normal, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal,
    NoMaterial, ScatterKind, ScatterRecord,
};
pub use pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf, ScatterPdf, SpherePdf};
pub use perlin::Perlin;
pub use quad::{quad_box, PlanarShape, Quad};
pub use renderer::{
    color_to_rgba, gamma_to_linear, linear_to_gamma, ray_color, ImageBuffer, Integrator,
    RenderConfig,
};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture};

/// Re-export common math types from umbra_math
pub use umbra_math::{Aabb, Color, Interval, Ray, Vec3};
