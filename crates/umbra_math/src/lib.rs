//! Math types shared by the Umbra crates.
//!
//! Geometry is double precision throughout; `Vec3` is glam's `DVec3`.

pub use glam::{DMat3 as Mat3, DMat4 as Mat4, DQuat as Quat, DVec3 as Vec3};

mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;
mod vector;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;
pub use vector::{reflect, refract, Vec3Ext};

/// Linear RGB color.
pub type Color = Vec3;
