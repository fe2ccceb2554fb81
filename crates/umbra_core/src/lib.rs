//! Umbra Core - decoded inputs consumed by the renderer.
//!
//! This crate provides:
//!
//! - **Images**: linear RGBA pixel grids decoded with the `image` crate,
//!   plus a path-keyed cache so a file shared by several textures loads once
//! - **Spectral tables**: the "SPEC" RGB-to-spectrum coefficient format
//!   (Jakob & Hanika 2019)
//!
//! # Example
//!
//! ```ignore
//! use umbra_core::ImageCache;
//!
//! let mut cache = ImageCache::with_base_dir("assets");
//! let earth = cache.load("earthmap.jpg")?;
//! println!("{}x{}", earth.width, earth.height);
//! ```

pub mod raster;
pub mod spectral;

pub use raster::{Image, ImageCache, ImageError, ImageResult};
pub use spectral::{SigmoidPolynomial, SpectralError, SpectralResult, SpectralTable};
