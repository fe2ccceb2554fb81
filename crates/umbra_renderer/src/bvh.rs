//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over boxed hittables. Every leaf holds exactly one object,
//! and a branch's box is the union of its children's boxes.

use crate::{HitRecord, Hittable, HittableList};
use log::info;
use rand::RngCore;
use std::cmp::Ordering;
use std::time::Instant;
use umbra_math::{Aabb, Interval, Ray};

/// Number of buckets used by the binned surface-area heuristic.
const SAH_BUCKETS: usize = 12;

/// How a node's objects are divided between its two children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Sort by box minimum along the longest axis and split at the median.
    #[default]
    LongestAxis,
    /// Binned surface-area heuristic, falling back to the median split.
    SurfaceArea,
}

/// BVH node - either a branch with two children or a leaf with one object.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node wrapping a single primitive.
    Leaf {
        object: Box<dyn Hittable>,
        bbox: Aabb,
    },
    /// Empty node (no objects at all).
    Empty,
}

impl BvhNode {
    /// Build a BVH using the longest-axis median split.
    pub fn new(objects: Vec<Box<dyn Hittable>>) -> Self {
        Self::with_strategy(objects, SplitStrategy::LongestAxis)
    }

    /// Build a BVH with an explicit split strategy.
    pub fn with_strategy(objects: Vec<Box<dyn Hittable>>, strategy: SplitStrategy) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }

        let start = Instant::now();
        let count = objects.len();
        let node = Self::build(objects, strategy);

        info!(
            "Built BVH over {} objects ({:?}): {} nodes, depth {}, {:.2?}",
            count,
            strategy,
            node.node_count(),
            node.depth(),
            start.elapsed()
        );
        node
    }

    /// Recursive BVH construction.
    fn build(mut objects: Vec<Box<dyn Hittable>>, strategy: SplitStrategy) -> Self {
        if objects.len() <= 1 {
            return match objects.pop() {
                Some(object) => {
                    let bbox = object.bounding_box();
                    BvhNode::Leaf { object, bbox }
                }
                None => BvhNode::Empty,
            };
        }

        let (left_objects, right_objects) = match strategy {
            SplitStrategy::LongestAxis => median_split(objects),
            SplitStrategy::SurfaceArea => sah_split(objects),
        };

        let left = Self::build(left_objects, strategy);
        let right = Self::build(right_objects, strategy);
        let bbox = Aabb::surrounding(&left.bounding_box(), &right.bounding_box());

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox,
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl From<HittableList> for BvhNode {
    fn from(list: HittableList) -> Self {
        Self::new(list.into_objects())
    }
}

fn union_box(objects: &[Box<dyn Hittable>]) -> Aabb {
    objects
        .iter()
        .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()))
}

/// Sort by box minimum on the longest axis of the union box and halve.
fn median_split(
    mut objects: Vec<Box<dyn Hittable>>,
) -> (Vec<Box<dyn Hittable>>, Vec<Box<dyn Hittable>>) {
    let axis = union_box(&objects).longest_axis();

    objects.sort_by(|a, b| {
        let a_min = a.bounding_box().axis_interval(axis).min;
        let b_min = b.bounding_box().axis_interval(axis).min;
        a_min.partial_cmp(&b_min).unwrap_or(Ordering::Equal)
    });

    let mid = objects.len() / 2;
    let right = objects.split_off(mid);
    (objects, right)
}

#[derive(Clone, Copy)]
struct Bucket {
    count: usize,
    bbox: Aabb,
}

/// Binned SAH on the longest axis of the centroid bounds.
fn sah_split(
    objects: Vec<Box<dyn Hittable>>,
) -> (Vec<Box<dyn Hittable>>, Vec<Box<dyn Hittable>>) {
    if objects.len() <= 2 {
        return median_split(objects);
    }

    let centroid_bounds = objects.iter().fold(Aabb::EMPTY, |acc, obj| {
        let c = obj.bounding_box().centroid();
        Aabb::surrounding(&acc, &Aabb::from_points(c, c))
    });
    let axis = centroid_bounds.longest_axis();
    let extent = centroid_bounds.axis_interval(axis);
    if extent.size() <= 0.0 {
        return median_split(objects);
    }

    let bucket_of = |obj: &Box<dyn Hittable>| -> usize {
        let c = obj.bounding_box().centroid()[axis];
        let offset = (c - extent.min) / extent.size();
        ((offset * SAH_BUCKETS as f64) as usize).min(SAH_BUCKETS - 1)
    };

    let mut buckets = [Bucket {
        count: 0,
        bbox: Aabb::EMPTY,
    }; SAH_BUCKETS];
    for obj in &objects {
        let b = &mut buckets[bucket_of(obj)];
        b.count += 1;
        b.bbox = Aabb::surrounding(&b.bbox, &obj.bounding_box());
    }

    // Cost of splitting after bucket i (left = 0..=i).
    let mut best: Option<(usize, f64)> = None;
    for split in 0..SAH_BUCKETS - 1 {
        let (left, right) = buckets.split_at(split + 1);
        let side = |range: &[Bucket]| {
            range.iter().fold((0, Aabb::EMPTY), |(n, bbox), b| {
                (n + b.count, Aabb::surrounding(&bbox, &b.bbox))
            })
        };
        let (n_left, box_left) = side(left);
        let (n_right, box_right) = side(right);
        if n_left == 0 || n_right == 0 {
            continue;
        }

        let cost =
            n_left as f64 * box_left.surface_area() + n_right as f64 * box_right.surface_area();
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((split, cost));
        }
    }

    let Some((split, _)) = best else {
        return median_split(objects);
    };

    let (left, right): (Vec<_>, Vec<_>) =
        objects.into_iter().partition(|obj| bucket_of(obj) <= split);
    (left, right)
}

impl Hittable for BvhNode {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'a>> {
        match self {
            BvhNode::Empty => None,

            BvhNode::Leaf { object, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                object.hit(ray, ray_t, rng)
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = left.hit(ray, ray_t, rng);

                // Only check right up to closest hit
                let right_max = hit_left.as_ref().map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rng);

                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{gen_range, random_unit_vector, random_vec3};
    use crate::{Lambertian, Quad, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use umbra_math::{Color, Vec3};

    fn random_scene(rng: &mut StdRng, n: usize) -> Vec<Box<dyn Hittable>> {
        (0..n)
            .map(|i| {
                let p = random_vec3(rng, -10.0, 10.0);
                if i % 3 == 0 {
                    let u = random_vec3(rng, -2.0, 2.0);
                    let v = random_vec3(rng, -2.0, 2.0);
                    Box::new(Quad::new(p, u, v, Lambertian::new(Color::ONE))) as Box<dyn Hittable>
                } else {
                    let r = gen_range(rng, 0.1, 1.5);
                    Box::new(Sphere::new(p, r, Lambertian::new(Color::ONE)))
                }
            })
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BvhNode::new(vec![]);
        assert!(matches!(bvh, BvhNode::Empty));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Z);
        assert!(bvh.hit(&ray, Interval::UNIVERSE, &mut rng).is_none());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let sphere = Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Lambertian::new(Color::new(0.5, 0.5, 0.5)),
        );
        let bvh = BvhNode::new(vec![Box::new(sphere)]);

        // Should create a leaf
        assert!(matches!(bvh, BvhNode::Leaf { .. }));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng);
        assert!(rec.is_some());
    }

    #[test]
    fn test_bvh_two_objects_become_two_leaves() {
        let objects: Vec<Box<dyn Hittable>> = (0..2)
            .map(|i| {
                Box::new(Sphere::new(
                    Vec3::new(i as f64 * 3.0, 0.0, -5.0),
                    0.5,
                    Lambertian::new(Color::ONE),
                )) as Box<dyn Hittable>
            })
            .collect();
        let bvh = BvhNode::new(objects);

        match &bvh {
            BvhNode::Branch { left, right, .. } => {
                assert!(matches!(**left, BvhNode::Leaf { .. }));
                assert!(matches!(**right, BvhNode::Leaf { .. }));
            }
            _ => panic!("expected branch"),
        }
        assert_eq!(bvh.node_count(), 3);
        assert_eq!(bvh.depth(), 2);
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let spheres: Vec<Box<dyn Hittable>> = (0..10)
            .map(|i| {
                let sphere = Sphere::new(
                    Vec3::new(i as f64, 0.0, -5.0),
                    0.5,
                    Lambertian::new(Color::new(0.5, 0.5, 0.5)),
                );
                Box::new(sphere) as Box<dyn Hittable>
            })
            .collect();

        let bvh = BvhNode::new(spheres);
        let mut rng = StdRng::seed_from_u64(0);

        // Test ray that hits sphere at x=5
        let ray = Ray::new_simple(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh
            .hit(&ray, Interval::new(0.001, f64::INFINITY), &mut rng)
            .unwrap();

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(42);

        for strategy in [SplitStrategy::LongestAxis, SplitStrategy::SurfaceArea] {
            for scene in 0..20 {
                let n = 1 + scene * 7;
                // Build the same geometry twice: once flat, once as a tree.
                let seed = 1000 + scene as u64;
                let list = HittableList::from(random_scene(&mut StdRng::seed_from_u64(seed), n));
                let bvh = BvhNode::with_strategy(
                    random_scene(&mut StdRng::seed_from_u64(seed), n),
                    strategy,
                );

                let bvh_box = bvh.bounding_box();
                let list_box = list.bounding_box();
                assert!((bvh_box.min() - list_box.min()).length() < 1e-9);
                assert!((bvh_box.max() - list_box.max()).length() < 1e-9);

                for _ in 0..200 {
                    let origin = random_vec3(&mut rng, -15.0, 15.0);
                    let target = random_vec3(&mut rng, -10.0, 10.0);
                    let direction = if rng.next_u32() % 8 == 0 {
                        random_unit_vector(&mut rng)
                    } else {
                        target - origin
                    };
                    let ray = Ray::new_simple(origin, direction);
                    let interval = Interval::new(0.001, f64::INFINITY);

                    let expected = list.hit(&ray, interval, &mut rng).map(|r| r.t);
                    let actual = bvh.hit(&ray, interval, &mut rng).map(|r| r.t);
                    match (expected, actual) {
                        (None, None) => {}
                        (Some(e), Some(a)) => assert!(
                            (e - a).abs() < 1e-9,
                            "{strategy:?}: linear {e} vs bvh {a}"
                        ),
                        other => panic!("{strategy:?}: hit mismatch {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_sah_separates_clusters() {
        let mut objects: Vec<Box<dyn Hittable>> = Vec::new();
        for i in 0..8 {
            let x = if i < 4 { i as f64 * 0.1 } else { 100.0 + i as f64 * 0.1 };
            objects.push(Box::new(Sphere::new(
                Vec3::new(x, 0.0, 0.0),
                0.05,
                Lambertian::new(Color::ONE),
            )));
        }
        let bvh = BvhNode::with_strategy(objects, SplitStrategy::SurfaceArea);

        match &bvh {
            BvhNode::Branch { left, right, .. } => {
                assert!(left.bounding_box().x.max < 1.0);
                assert!(right.bounding_box().x.min > 99.0);
            }
            _ => panic!("expected branch"),
        }
    }

    #[test]
    fn test_sah_coincident_centroids_fall_back() {
        let objects: Vec<Box<dyn Hittable>> = (0..5)
            .map(|i| {
                Box::new(Sphere::new(
                    Vec3::ZERO,
                    1.0 + i as f64,
                    Lambertian::new(Color::ONE),
                )) as Box<dyn Hittable>
            })
            .collect();
        let bvh = BvhNode::with_strategy(objects, SplitStrategy::SurfaceArea);
        assert_eq!(bvh.node_count(), 9);
    }
}
