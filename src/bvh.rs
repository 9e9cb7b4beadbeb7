use crate::aabb::Aabb;
use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::math::Ray;
use std::cmp::Ordering;
use std::sync::Arc;

/// Number of fixed-count index bins per axis in the SAH sweep.
const SAH_BUCKETS: usize = 12;
/// Estimated cost of one traversal step relative to one intersection.
const SAH_TRAVERSAL_COST: f64 = 2.0;
const SAH_INTERSECTION_COST: f64 = 1.0;

/// How a node's primitive range is partitioned during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMethod {
    /// Median split along the longest axis. Balanced tree, indifferent to
    /// primitive areas.
    Middle,
    /// Bucket-binned surface-area heuristic with a median fallback.
    /// Buckets are filled by sorted index, not centroid position, so the
    /// build cost is independent of the spatial distribution.
    #[default]
    Sah,
}

// ─── Bounding Volume Hierarchy ──────────────────────────────────────────────

/// A binary BVH node. Interior nodes own their children; leaves own a
/// small list of primitive references (≤ `max_leaf_size`).
///
/// Every node records its depth (root = 0) and its path from the root as
/// a bit string (`'0'` left, `'1'` right); leaves stamp both into the hit
/// record for the visualisation materials. The tree is immutable once
/// built.
pub enum BvhNode {
    Leaf {
        objects: Vec<Arc<dyn Hittable>>,
        bbox: Aabb,
        depth: u32,
        path: String,
    },
    Interior {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
        depth: u32,
        path: String,
    },
}

impl BvhNode {
    /// Builds a tree over `objects`, partitioning the slice in place.
    /// An empty slice yields a single non-hitting leaf.
    pub fn build(
        objects: &mut [Arc<dyn Hittable>],
        max_leaf_size: usize,
        split_method: SplitMethod,
    ) -> Self {
        let max_leaf_size = max_leaf_size.max(1);
        Self::build_range(objects, max_leaf_size, split_method, 0, String::new())
    }

    fn build_range(
        objects: &mut [Arc<dyn Hittable>],
        max_leaf_size: usize,
        split_method: SplitMethod,
        depth: u32,
        path: String,
    ) -> Self {
        let bbox = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::merge(&acc, &o.bounding_box()));

        if objects.len() <= max_leaf_size {
            return BvhNode::Leaf {
                objects: objects.to_vec(),
                bbox,
                depth,
                path,
            };
        }

        let split = match split_method {
            SplitMethod::Middle => Self::split_middle(objects, &bbox),
            SplitMethod::Sah => Self::split_sah(objects, &bbox)
                .unwrap_or_else(|| Self::split_middle(objects, &bbox)),
        };

        let (left_objects, right_objects) = objects.split_at_mut(split);
        let left = Box::new(Self::build_range(
            left_objects,
            max_leaf_size,
            split_method,
            depth + 1,
            format!("{path}0"),
        ));
        let right = Box::new(Self::build_range(
            right_objects,
            max_leaf_size,
            split_method,
            depth + 1,
            format!("{path}1"),
        ));

        BvhNode::Interior {
            left,
            right,
            bbox,
            depth,
            path,
        }
    }

    fn sort_by_axis_min(objects: &mut [Arc<dyn Hittable>], axis: usize) {
        objects.sort_by(|a, b| {
            let a_min = a.bounding_box().axis(axis).min;
            let b_min = b.bounding_box().axis(axis).min;
            a_min.partial_cmp(&b_min).unwrap_or(Ordering::Equal)
        });
    }

    /// Median split along the longest axis of the node's box. Always
    /// produces two non-empty halves for ranges of two or more.
    fn split_middle(objects: &mut [Arc<dyn Hittable>], bbox: &Aabb) -> usize {
        let axis = bbox.longest_axis();
        Self::sort_by_axis_min(objects, axis);
        objects.len() / 2
    }

    /// Bucket-binned SAH sweep. For each axis the range is sorted by box
    /// minimum and binned into `SAH_BUCKETS` fixed-count buckets; each of
    /// the inter-bucket positions is costed as
    /// `C_trav + (n_L·A_L + n_R·A_R) / (A_parent + 1e-8) · C_isect`.
    /// The cheapest split with both sides non-empty wins (first
    /// encountered on ties); the slice is left sorted by the winning
    /// axis and the left count is returned. `None` when no valid split
    /// exists.
    fn split_sah(objects: &mut [Arc<dyn Hittable>], bbox: &Aabb) -> Option<usize> {
        let n = objects.len();
        let bucket_size = n / SAH_BUCKETS + 1;
        let parent_area = bbox.surface_area();

        let mut best: Option<(usize, usize)> = None;
        let mut best_cost = f64::INFINITY;

        for axis in 0..3 {
            Self::sort_by_axis_min(objects, axis);

            let mut counts = [0usize; SAH_BUCKETS];
            let mut boxes = [Aabb::EMPTY; SAH_BUCKETS];
            for (i, object) in objects.iter().enumerate() {
                let b = i / bucket_size;
                counts[b] += 1;
                boxes[b] = Aabb::merge(&boxes[b], &object.bounding_box());
            }

            // Suffix merge so each sweep step sees its right-side box.
            let mut right_boxes = [Aabb::EMPTY; SAH_BUCKETS];
            right_boxes[SAH_BUCKETS - 1] = boxes[SAH_BUCKETS - 1];
            for i in (0..SAH_BUCKETS - 1).rev() {
                right_boxes[i] = Aabb::merge(&boxes[i], &right_boxes[i + 1]);
            }

            let mut left_box = Aabb::EMPTY;
            let mut left_count = 0usize;
            for split in 0..SAH_BUCKETS - 1 {
                left_box = Aabb::merge(&left_box, &boxes[split]);
                left_count += counts[split];
                let right_count = n - left_count;
                if left_count == 0 || right_count == 0 {
                    continue;
                }
                let cost = SAH_TRAVERSAL_COST
                    + (left_count as f64 * left_box.surface_area()
                        + right_count as f64 * right_boxes[split + 1].surface_area())
                        / (parent_area + 1e-8)
                        * SAH_INTERSECTION_COST;
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((axis, left_count));
                }
            }
        }

        let (axis, left_count) = best?;
        // The range is currently ordered by the last axis swept.
        Self::sort_by_axis_min(objects, axis);
        Some(left_count)
    }

    // ─── Introspection ──────────────────────────────────────────────────

    pub fn depth(&self) -> u32 {
        match self {
            BvhNode::Leaf { depth, .. } | BvhNode::Interior { depth, .. } => *depth,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            BvhNode::Leaf { path, .. } | BvhNode::Interior { path, .. } => path,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Interior { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    pub fn primitive_count(&self) -> usize {
        match self {
            BvhNode::Leaf { objects, .. } => objects.len(),
            BvhNode::Interior { left, right, .. } => {
                left.primitive_count() + right.primitive_count()
            }
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            BvhNode::Leaf { .. } => 0,
            BvhNode::Interior { left, right, .. } => 1 + left.height().max(right.height()),
        }
    }

    /// Calls `visit` on every leaf with its primitives, path, and depth,
    /// left to right.
    pub fn visit_leaves<'a>(
        &'a self,
        visit: &mut dyn FnMut(&'a [Arc<dyn Hittable>], &'a str, u32),
    ) {
        match self {
            BvhNode::Leaf {
                objects,
                path,
                depth,
                ..
            } => visit(objects, path, *depth),
            BvhNode::Interior { left, right, .. } => {
                left.visit_leaves(visit);
                right.visit_leaves(visit);
            }
        }
    }
}

impl Hittable for BvhNode {
    /// Ordered recursive hit. The left child is always visited first and
    /// a left hit tightens the right child's query interval; anything
    /// fancier would change the reproducibility of the recorded paths.
    /// Allocation-free and stack-bounded by the tree height.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            BvhNode::Leaf {
                objects,
                bbox,
                depth,
                path,
            } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                let mut closest = ray_t.max;
                let mut best = None;
                for object in objects {
                    if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, closest)) {
                        closest = rec.t;
                        best = Some(rec);
                    }
                }
                best.map(|mut rec| {
                    rec.bvh_depth = *depth;
                    rec.bvh_path = path;
                    rec
                })
            }
            BvhNode::Interior {
                left, right, bbox, ..
            } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                let hit_left = left.hit(ray, ray_t);
                let right_max = hit_left.as_ref().map_or(ray_t.max, |rec| rec.t);
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max));
                hit_right.or(hit_left)
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bbox, .. } | BvhNode::Interior { bbox, .. } => *bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::math::{Color, Point3, Vec3};
    use crate::sphere::Sphere;

    fn sphere_at(x: f64, y: f64, z: f64, r: f64) -> Arc<dyn Hittable> {
        Arc::new(Sphere::new(
            Point3::new(x, y, z),
            r,
            Arc::new(Lambertian::new(Color::ones())),
        ))
    }

    fn sphere_row(n: usize) -> Vec<Arc<dyn Hittable>> {
        (0..n)
            .map(|i| sphere_at(i as f64 * 3.0, 0.0, 0.0, 1.0))
            .collect()
    }

    #[test]
    fn empty_input_builds_a_non_hitting_leaf() {
        let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
        let bvh = BvhNode::build(&mut objects, 4, SplitMethod::Sah);
        assert!(bvh.is_leaf());
        assert_eq!(bvh.primitive_count(), 0);
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn single_primitive_is_a_one_leaf_root() {
        let mut objects = vec![sphere_at(0.0, 0.0, 0.0, 1.0)];
        let bvh = BvhNode::build(&mut objects, 4, SplitMethod::Sah);
        assert!(bvh.is_leaf());
        assert_eq!(bvh.depth(), 0);
        assert_eq!(bvh.path(), "");
        let ray = Ray::new(Point3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert_eq!(rec.bvh_depth, 0);
        assert_eq!(rec.bvh_path, "");
    }

    #[test]
    fn leaf_sizes_respect_the_limit() {
        for &method in &[SplitMethod::Middle, SplitMethod::Sah] {
            let mut objects = sphere_row(33);
            let bvh = BvhNode::build(&mut objects, 4, method);
            bvh.visit_leaves(&mut |objects, _, _| {
                assert!(objects.len() <= 4);
                assert!(!objects.is_empty());
            });
            assert_eq!(bvh.primitive_count(), 33);
        }
    }

    #[test]
    fn child_paths_extend_parent_paths() {
        let mut objects = sphere_row(16);
        let bvh = BvhNode::build(&mut objects, 2, SplitMethod::Sah);
        let mut paths = Vec::new();
        bvh.visit_leaves(&mut |_, path, depth| {
            assert_eq!(path.len() as u32, depth);
            paths.push(path.to_string());
        });
        // Leaf paths are prefix-free and visited left to right, so they
        // sort strictly lexicographically.
        for pair in paths.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn traversal_finds_the_closest_of_stacked_spheres() {
        let mut objects = vec![
            sphere_at(0.0, 0.0, -10.0, 1.0),
            sphere_at(0.0, 0.0, -4.0, 1.0),
            sphere_at(0.0, 0.0, -20.0, 1.0),
        ];
        let bvh = BvhNode::build(&mut objects, 1, SplitMethod::Sah);
        let ray = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 3.0).abs() < 1e-9);
    }

    #[test]
    fn coincident_primitives_hit_deterministically() {
        let mut objects = vec![
            sphere_at(0.0, 0.0, 0.0, 1.0),
            sphere_at(0.0, 0.0, 0.0, 1.0),
        ];
        let bvh = BvhNode::build(&mut objects, 1, SplitMethod::Sah);
        let ray = Ray::new(Point3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let first = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        for _ in 0..8 {
            let rec = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
            assert_eq!(rec.t, first.t);
            assert_eq!(rec.bvh_path, first.bvh_path);
        }
    }

    #[test]
    fn sah_and_middle_agree_on_hits() {
        let mut a = sphere_row(40);
        let mut b = a.clone();
        let sah = BvhNode::build(&mut a, 3, SplitMethod::Sah);
        let middle = BvhNode::build(&mut b, 3, SplitMethod::Middle);
        for i in 0..40 {
            let ray = Ray::new(
                Point3::new(i as f64 * 3.0, 0.0, 5.0),
                Vec3::new(0.0, 0.0, -1.0),
            );
            let ta = sah.hit(&ray, Interval::new(0.001, f64::INFINITY)).map(|r| r.t);
            let tb = middle
                .hit(&ray, Interval::new(0.001, f64::INFINITY))
                .map(|r| r.t);
            assert_eq!(ta, tb);
        }
    }

    #[test]
    fn root_box_encloses_every_primitive_box() {
        let mut objects = sphere_row(25);
        let snapshot = objects.clone();
        let bvh = BvhNode::build(&mut objects, 4, SplitMethod::Sah);
        let root = bvh.bounding_box();
        for object in &snapshot {
            let b = object.bounding_box();
            for axis in 0..3 {
                assert!(root.axis(axis).min <= b.axis(axis).min);
                assert!(root.axis(axis).max >= b.axis(axis).max);
            }
        }
    }
}
