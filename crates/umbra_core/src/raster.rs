//! Decoded images for texture lookups.
//!
//! Images are decoded with the `image` crate and stored as linear RGBA floats
//! so the renderer never deals with file formats or sRGB encoding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during image loading.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: ::image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pixel data does not match {width}x{height} RGBA ({len} bytes)")]
    Dimensions { width: u32, height: u32, len: usize },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// A decoded image.
///
/// Pixels are linear RGBA in [0, 1], row-major, top row first.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
    /// Original file path (for debugging)
    pub path: String,
}

impl Image {
    /// Create an image from linear pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Build an image from sRGB-encoded 8-bit RGBA bytes already in memory.
    pub fn from_srgba8(width: u32, height: u32, bytes: &[u8]) -> ImageResult<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(ImageError::Dimensions {
                width,
                height,
                len: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();

        Ok(Self::new(width, height, pixels, "<memory>"))
    }

    /// Decode an image file.
    pub fn load(path: impl AsRef<Path>) -> ImageResult<Self> {
        let path = path.as_ref();
        // Open and sniff separately so a missing file surfaces as `Io`.
        let reader = ::image::io::Reader::open(path)?.with_guessed_format()?;
        let img = reader.decode().map_err(|source| ImageError::Decode {
            path: path.display().to_string(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut image = Self::from_srgba8(width, height, rgba.as_raw())?;
        image.path = path.to_string_lossy().to_string();
        Ok(image)
    }

    /// True if the image holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Get the pixel at integer coordinates, clamped to the image edges.
    ///
    /// Returns opaque magenta for an empty image.
    pub fn pixel(&self, x: i64, y: i64) -> [f32; 4] {
        if self.is_empty() {
            return [1.0, 0.0, 1.0, 1.0];
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or([1.0, 0.0, 1.0, 1.0])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Cache for loaded images.
///
/// Images are loaded on-demand and cached for reuse.
pub struct ImageCache {
    images: HashMap<String, Arc<Image>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create an image cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using cache if available.
    pub fn load(&mut self, path: &str) -> ImageResult<Arc<Image>> {
        if let Some(image) = self.images.get(path) {
            return Ok(image.clone());
        }

        let full_path = self.resolve_path(path);
        let image = Arc::new(Image::load(&full_path)?);
        self.images.insert(path.to_string(), image.clone());

        log::debug!(
            "Loaded image: {} ({}x{}, {:.1} KB)",
            path,
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        Ok(image)
    }

    /// Get a cached image without loading.
    pub fn get(&self, path: &str) -> Option<Arc<Image>> {
        self.images.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
