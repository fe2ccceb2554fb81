//! Spatial transform wrappers for hittables.

use crate::{HitRecord, Hittable};
use rand::RngCore;
use umbra_math::{Aabb, Interval, Mat3, Mat4, Mat4Ext, Ray, Vec3};

/// Moves an object by a fixed offset.
pub struct Translate<H: Hittable> {
    object: H,
    offset: Vec3,
    bbox: Aabb,
}

impl<H: Hittable> Translate<H> {
    pub fn new(object: H, offset: Vec3) -> Self {
        let bbox = object.bounding_box() + offset;
        Self {
            object,
            offset,
            bbox,
        }
    }
}

impl<H: Hittable> Hittable for Translate<H> {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        // Move the ray backwards by the offset instead of moving the object.
        let offset_ray = ray.spawn(ray.origin() - self.offset, ray.direction());

        let mut rec = self.object.hit(&offset_ray, ray_t, rng)?;
        rec.p += self.offset;
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.object.pdf_value(origin - self.offset, direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.object.random(origin - self.offset, rng)
    }
}

/// Rotates an object about the Y axis.
pub struct RotateY<H: Hittable> {
    object: H,
    /// Object space to world space
    to_world: Mat3,
    /// World space to object space
    to_object: Mat3,
    bbox: Aabb,
}

impl<H: Hittable> RotateY<H> {
    /// Rotate counter-clockwise (looking down -Y) by `degrees`.
    pub fn new(object: H, degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let to_world = Mat3::from_rotation_y(radians);
        let bbox = Mat4::from_rotation_y(radians).transform_aabb(&object.bounding_box());

        Self {
            object,
            to_world,
            to_object: to_world.transpose(),
            bbox,
        }
    }
}

impl<H: Hittable> Hittable for RotateY<H> {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        let rotated = ray.spawn(
            self.to_object * ray.origin(),
            self.to_object * ray.direction(),
        );

        let mut rec = self.object.hit(&rotated, ray_t, rng)?;
        rec.p = self.to_world * rec.p;
        rec.normal = self.to_world * rec.normal;
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f64 {
        self.object
            .pdf_value(self.to_object * origin, self.to_object * direction)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.to_world * self.object.random(self.to_object * origin, rng)
    }
}
