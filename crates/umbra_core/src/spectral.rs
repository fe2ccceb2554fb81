//! RGB to spectrum coefficient tables.
//!
//! Implements lookup into the precomputed tables of Jakob & Hanika,
//! "A Low-Dimensional Function Space for Efficient Spectral Upsampling"
//! (2019). A table maps an RGB triple to the three coefficients of a sigmoid
//! polynomial whose value over wavelength reproduces that color.
//!
//! File layout (little-endian):
//!
//! | field  | type      | count         |
//! |--------|-----------|---------------|
//! | magic  | `b"SPEC"` | 4 bytes       |
//! | res    | `u32`     | 1             |
//! | scale  | `f32`     | res           |
//! | data   | `f32`     | 3 * res³ * 3  |
//!
//! The tables stand alone. The render loop works in RGB and never tags rays
//! with a wavelength, so spectral rendering needs a caller that samples a
//! wavelength, tags rays with `Ray::with_wavelength`, and evaluates the
//! returned polynomial at that wavelength.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

const MAGIC: &[u8; 4] = b"SPEC";
const N_COEFFS: usize = 3;
/// Published tables use 64; anything above this is a corrupt header.
pub const MAX_RESOLUTION: u32 = 1024;

#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a spectral table (magic {0:?})")]
    BadMagic([u8; 4]),

    #[error("Table resolution {0} is too small (need at least 2)")]
    Resolution(u32),

    #[error("Table resolution {0} exceeds the maximum of {max}", max = MAX_RESOLUTION)]
    ResolutionTooLarge(u32),
}

pub type SpectralResult<T> = Result<T, SpectralError>;

/// Coefficients of `s(λ) = sigmoid(c0·λ² + c1·λ + c2)` with λ in nm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidPolynomial {
    pub c0: f32,
    pub c1: f32,
    pub c2: f32,
}

impl SigmoidPolynomial {
    /// The spectrum that is zero everywhere.
    pub const BLACK: SigmoidPolynomial = SigmoidPolynomial {
        c0: 0.0,
        c1: 0.0,
        c2: f32::NEG_INFINITY,
    };

    /// Evaluate the reflectance at a wavelength in nanometres.
    pub fn eval(&self, lambda_nm: f32) -> f32 {
        let x = (self.c0 * lambda_nm + self.c1) * lambda_nm + self.c2;
        if x.is_infinite() {
            return if x > 0.0 { 1.0 } else { 0.0 };
        }
        0.5 + 0.5 * x / (1.0 + x * x).sqrt()
    }
}

/// A loaded RGB-to-spectrum table.
#[derive(Debug, Clone)]
pub struct SpectralTable {
    resolution: usize,
    scale: Vec<f32>,
    data: Vec<f32>,
}

impl SpectralTable {
    /// Load a table from disk.
    pub fn load(path: impl AsRef<Path>) -> SpectralResult<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(BufReader::new(File::open(path)?))?;
        log::debug!(
            "Loaded spectral table {} (resolution {})",
            path.display(),
            table.resolution
        );
        Ok(table)
    }

    /// Parse a table from any byte source.
    pub fn from_reader(mut reader: impl Read) -> SpectralResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(SpectralError::BadMagic(magic));
        }

        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let res = u32::from_le_bytes(word);
        if res < 2 {
            return Err(SpectralError::Resolution(res));
        }
        if res > MAX_RESOLUTION {
            return Err(SpectralError::ResolutionTooLarge(res));
        }
        let resolution = res as usize;

        let data_len = (res as u64)
            .checked_pow(3)
            .and_then(|n| n.checked_mul(3 * N_COEFFS as u64))
            .ok_or(SpectralError::ResolutionTooLarge(res))?;

        let scale = read_f32s(&mut reader, resolution as u64)?;
        let data = read_f32s(&mut reader, data_len)?;

        Ok(Self {
            resolution,
            scale,
            data,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Look up the sigmoid polynomial for a linear RGB triple in [0, 1].
    pub fn lookup(&self, rgb: [f32; 3]) -> SigmoidPolynomial {
        let rgb = rgb.map(|c| c.clamp(0.0, 1.0));

        // The table is indexed by the largest component.
        let mut i = 0;
        for j in 1..3 {
            if rgb[j] >= rgb[i] {
                i = j;
            }
        }

        let z = rgb[i];
        if z <= 0.0 {
            return SigmoidPolynomial::BLACK;
        }

        let res = self.resolution;
        let scale = (res - 1) as f32 / z;
        let x = rgb[(i + 1) % 3] * scale;
        let y = rgb[(i + 2) % 3] * scale;

        let xi = (x as usize).min(res - 2);
        let yi = (y as usize).min(res - 2);
        let zi = self.find_interval(z);

        let dx = N_COEFFS;
        let dy = N_COEFFS * res;
        let dz = N_COEFFS * res * res;
        let base = (((i * res + zi) * res + yi) * res + xi) * N_COEFFS;

        let x1 = x - xi as f32;
        let x0 = 1.0 - x1;
        let y1 = y - yi as f32;
        let y0 = 1.0 - y1;
        let z1 = (z - self.scale[zi]) / (self.scale[zi + 1] - self.scale[zi]);
        let z0 = 1.0 - z1;

        let mut c = [0.0f32; N_COEFFS];
        for (j, out) in c.iter_mut().enumerate() {
            let o = base + j;
            let d = &self.data;
            *out = ((d[o] * x0 + d[o + dx] * x1) * y0 + (d[o + dy] * x0 + d[o + dy + dx] * x1) * y1)
                * z0
                + ((d[o + dz] * x0 + d[o + dz + dx] * x1) * y0
                    + (d[o + dz + dy] * x0 + d[o + dz + dy + dx] * x1) * y1)
                    * z1;
        }

        SigmoidPolynomial {
            c0: c[0],
            c1: c[1],
            c2: c[2],
        }
    }

    /// Largest index `k` in [0, res - 2] with `scale[k] <= z`.
    fn find_interval(&self, z: f32) -> usize {
        let upper = self.resolution - 2;
        let k = self.scale.partition_point(|&s| s <= z);
        k.saturating_sub(1).min(upper)
    }
}

/// Read `count` little-endian floats.
///
/// The buffer grows with the bytes actually read, so a truncated file fails
/// without first reserving the size its header claims.
fn read_f32s(reader: &mut impl Read, count: u64) -> SpectralResult<Vec<f32>> {
    let expected = count
        .checked_mul(4)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "table size overflows"))?;

    let mut bytes = Vec::new();
    reader.by_ref().take(expected).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {expected} bytes of table data, found {}", bytes.len()),
        )
        .into());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
