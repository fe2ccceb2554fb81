//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel using rayon.

use crate::renderer::Integrator;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cmp::Ordering;
use umbra_math::Color;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    fn distance_sq_to(&self, cx: f64, cy: f64) -> f64 {
        let bx = self.x as f64 + self.width as f64 / 2.0;
        let by = self.y as f64 + self.height as f64 / 2.0;
        (bx - cx).powi(2) + (by - cy).powi(2)
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Generate buckets for an image, ordered from the center outward.
///
/// Center buckets finish first, which is where a partial render is most
/// useful to look at.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    // Generate grid of buckets
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, 0));
            x += bucket_size;
        }
        y += bucket_size;
    }

    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    // Stable sort keeps row-major order among equidistant buckets.
    buckets.sort_by(|a, b| {
        a.distance_sq_to(cx, cy)
            .partial_cmp(&b.distance_sq_to(cx, cy))
            .unwrap_or(Ordering::Equal)
    });

    // Update indices after sorting
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Seed for the random source of one pixel.
///
/// SplitMix64 finalizer over the render seed and the row-major pixel index,
/// so neighbouring pixels get unrelated streams.
pub fn pixel_seed(seed: u64, pixel_index: u64) -> u64 {
    let mut z = seed ^ pixel_index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

/// Render a single bucket.
///
/// Every pixel gets its own generator, seeded from its position in an image
/// `image_width` pixels wide.
pub fn render_bucket(
    bucket: &Bucket,
    integrator: &Integrator,
    image_width: u32,
    seed: u64,
) -> BucketResult {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let global_x = bucket.x + local_x;
            let global_y = bucket.y + local_y;
            let index = global_y as u64 * image_width as u64 + global_x as u64;

            let mut rng = SmallRng::seed_from_u64(pixel_seed(seed, index));
            pixels.push(integrator.render_pixel(global_x, global_y, &mut rng));
        }
    }

    BucketResult {
        bucket: *bucket,
        pixels,
    }
}
