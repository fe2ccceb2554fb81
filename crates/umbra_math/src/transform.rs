// Transform utilities for Mat4
//
// glam::DMat4 already provides transform_point3(), transform_vector3() and
// inverse(); this adds the box helper the instancing wrappers need.

use crate::{Aabb, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let lo = aabb.min();
        let hi = aabb.max();

        let mut result_min = Vec3::INFINITY;
        let mut result_max = Vec3::NEG_INFINITY;

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let transformed = self.transform_point3(corner);
            result_min = result_min.min(transformed);
            result_max = result_max.max(transformed);
        }

        Aabb::from_points(result_min, result_max)
    }
}
