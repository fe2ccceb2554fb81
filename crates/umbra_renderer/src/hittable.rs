//! Hittable trait and HitRecord for ray-object intersection.

use crate::Material;
use rand::{Rng, RngCore};
use std::sync::Arc;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Borrowed from the object that was hit; it lives only as long as the
/// shading call that consumes it.
#[derive(Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: &'a dyn Material,
    /// UV texture coordinates
    pub u: f64,
    pub v: f64,
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Build a record for a hit at `t`, orienting `outward_normal` against
    /// the ray.
    pub fn new(
        ray: &Ray,
        t: f64,
        outward_normal: Vec3,
        (u, v): (f64, f64),
        material: &'a dyn Material,
    ) -> Self {
        let mut rec = Self {
            p: ray.at(t),
            normal: outward_normal,
            material,
            u,
            v,
            t,
            front_face: true,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    /// `outward_normal` must be unit length.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Find the closest intersection with `ray_t.surrounds(t)`.
    ///
    /// `rng` is only consumed by probabilistic surfaces such as participating
    /// media.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore)
        -> Option<HitRecord<'a>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Solid-angle density of sampling `direction` from `origin` toward this
    /// object with [`Hittable::random`]. Zero for objects that cannot be
    /// importance-sampled.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3) -> f64 {
        0.0
    }

    /// Random direction from `origin` toward this object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        Vec3::X
    }
}

macro_rules! forward_hittable {
    ($($ptr:ident),*) => {$(
        impl<H: Hittable + ?Sized> Hittable for $ptr<H> {
            fn hit<'a>(
                &'a self,
                ray: &Ray,
                ray_t: Interval,
                rng: &mut dyn RngCore,
            ) -> Option<HitRecord<'a>> {
                (**self).hit(ray, ray_t, rng)
            }

            fn bounding_box(&self) -> Aabb {
                (**self).bounding_box()
            }

            fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
                (**self).pdf_value(origin, direction)
            }

            fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
                (**self).random(origin, rng)
            }
        }
    )*};
}

// Shared geometry (e.g. one mesh under several transforms) goes through Arc.
forward_hittable!(Box, Arc);

/// A list of hittable objects.
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Hittable + 'static) {
        self.push(Box::new(object));
    }

    /// Add an already boxed object to the list.
    pub fn push(&mut self, object: Box<dyn Hittable>) {
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Take ownership of the objects, e.g. to build a BVH over them.
    pub fn into_objects(self) -> Vec<Box<dyn Hittable>> {
        self.objects
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Box<dyn Hittable>>> for HittableList {
    fn from(objects: Vec<Box<dyn Hittable>>) -> Self {
        let mut list = Self::new();
        for object in objects {
            list.push(object);
        }
        list
    }
}

impl Hittable for HittableList {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let mut closest: Option<HitRecord<'a>> = None;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, closest_so_far), rng) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f64;
        self.objects
            .iter()
            .map(|object| weight * object.pdf_value(origin, direction))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let index = rng.gen_range(0..self.objects.len());
        self.objects[index].random(origin, rng)
    }
}
