//! Planar primitives: parallelograms, triangles and ellipses.
//!
//! All three share the plane setup and intersection; they differ only in
//! the interior test on the plane-local coordinates (alpha, beta), their area
//! and how a point is sampled for light sampling.

use crate::random::{gen_f64, random_in_unit_disk};
use crate::{HitRecord, Hittable, HittableList, Material};
use rand::RngCore;
use std::f64::consts::PI;
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Interior test applied on the plane spanned by `u` and `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarShape {
    /// Corner `q`, edges `u` and `v`.
    Parallelogram,
    /// Vertices `q`, `q + u`, `q + v`.
    Triangle,
    /// Center `q`, semi-axes `u` and `v`.
    Ellipse,
}

impl PlanarShape {
    fn contains(self, alpha: f64, beta: f64) -> bool {
        match self {
            PlanarShape::Parallelogram => {
                let unit = Interval::new(0.0, 1.0);
                unit.contains(alpha) && unit.contains(beta)
            }
            PlanarShape::Triangle => alpha >= 0.0 && beta >= 0.0 && alpha + beta <= 1.0,
            PlanarShape::Ellipse => alpha * alpha + beta * beta <= 1.0,
        }
    }
}

/// A planar primitive defined by a point `q` and two edge vectors.
pub struct Quad<M: Material> {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// n / (n · n), solves for plane coordinates without a 2x2 system
    w: Vec3,
    normal: Vec3,
    /// Plane offset: normal · x = d
    d: f64,
    area: f64,
    shape: PlanarShape,
    material: M,
    bbox: Aabb,
}

impl<M: Material> Quad<M> {
    /// A parallelogram with corner `q` and edges `u`, `v`.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: M) -> Self {
        Self::with_shape(PlanarShape::Parallelogram, q, u, v, material)
    }

    /// A triangle with vertices `q`, `q + u`, `q + v`.
    pub fn triangle(q: Vec3, u: Vec3, v: Vec3, material: M) -> Self {
        Self::with_shape(PlanarShape::Triangle, q, u, v, material)
    }

    /// An ellipse centered at `q` with semi-axes `u`, `v`.
    pub fn ellipse(center: Vec3, u: Vec3, v: Vec3, material: M) -> Self {
        Self::with_shape(PlanarShape::Ellipse, center, u, v, material)
    }

    pub fn with_shape(shape: PlanarShape, q: Vec3, u: Vec3, v: Vec3, material: M) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let d = normal.dot(q);
        let w = n / n.dot(n);

        let (area, bbox) = match shape {
            PlanarShape::Parallelogram => {
                let diagonal1 = Aabb::from_points(q, q + u + v);
                let diagonal2 = Aabb::from_points(q + u, q + v);
                (n.length(), Aabb::surrounding(&diagonal1, &diagonal2))
            }
            PlanarShape::Triangle => {
                let edge = Aabb::from_points(q, q + u);
                let apex = Aabb::from_points(q, q + v);
                (0.5 * n.length(), Aabb::surrounding(&edge, &apex))
            }
            PlanarShape::Ellipse => {
                // Conservative: the parallelogram circumscribing the ellipse.
                let diagonal1 = Aabb::from_points(q - u - v, q + u + v);
                let diagonal2 = Aabb::from_points(q + u - v, q - u + v);
                (PI * n.length(), Aabb::surrounding(&diagonal1, &diagonal2))
            }
        };

        Self {
            q,
            u,
            v,
            w,
            normal,
            d,
            area,
            shape,
            material,
            bbox,
        }
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let denom = self.normal.dot(ray.direction());

        // No hit if the ray is parallel to the plane.
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let intersection = ray.at(t);
        let planar_hitpt = intersection - self.q;
        let alpha = self.w.dot(planar_hitpt.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar_hitpt));

        if !self.shape.contains(alpha, beta) {
            return None;
        }

        let uv = match self.shape {
            PlanarShape::Ellipse => (0.5 * (alpha + 1.0), 0.5 * (beta + 1.0)),
            _ => (alpha, beta),
        };

        Some(HitRecord::new(ray, t, self.normal, uv, &self.material))
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self.shape {
            PlanarShape::Parallelogram => self.q + gen_f64(rng) * self.u + gen_f64(rng) * self.v,
            PlanarShape::Triangle => {
                let mut a = gen_f64(rng);
                let mut b = gen_f64(rng);
                // Fold the upper half of the unit square back onto the triangle.
                if a + b > 1.0 {
                    a = 1.0 - a;
                    b = 1.0 - b;
                }
                self.q + a * self.u + b * self.v
            }
            PlanarShape::Ellipse => {
                let p = random_in_unit_disk(rng);
                self.q + p.x * self.u + p.y * self.v
            }
        }
    }
}

impl<M: Material> Hittable for Quad<M> {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        _rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        self.intersect(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        let ray = Ray::new_simple(origin, direction);
        let Some(rec) = self.intersect(&ray, Interval::new(0.001, f64::INFINITY)) else {
            return 0.0;
        };

        let distance_squared = rec.t * rec.t * direction.length_squared();
        let cosine = (direction.dot(rec.normal) / direction.length()).abs();

        distance_squared / (cosine * self.area)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.random_point(rng) - origin
    }
}

/// The six faces of the box with opposite corners `a` and `b`.
pub fn quad_box(a: Vec3, b: Vec3, material: Arc<dyn Material>) -> HittableList {
    let mut sides = HittableList::new();

    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    let faces = [
        (Vec3::new(min.x, min.y, max.z), dx, dy),  // front
        (Vec3::new(max.x, min.y, max.z), -dz, dy), // right
        (Vec3::new(max.x, min.y, min.z), -dx, dy), // back
        (Vec3::new(min.x, min.y, min.z), dz, dy),  // left
        (Vec3::new(min.x, max.y, max.z), dx, -dz), // top
        (Vec3::new(min.x, min.y, min.z), dx, dz),  // bottom
    ];
    for (q, u, v) in faces {
        sides.add(Quad::new(q, u, v, material.clone()));
    }

    sides
}
