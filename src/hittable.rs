use crate::aabb::Aabb;
use crate::bvh::{BvhNode, SplitMethod};
use crate::interval::Interval;
use crate::material::Material;
use crate::math::{Point3, Ray, Vec3};
use std::sync::Arc;

// ─── Hit Record ─────────────────────────────────────────────────────────────

/// The result of a ray-primitive intersection. Short-lived, one per ray.
///
/// `normal` always opposes the incident ray; `front_face` records whether
/// that meant keeping the geometric outward normal. `bvh_depth` and
/// `bvh_path` are diagnostic fields stamped by the BVH leaf that produced
/// the hit (`'0'` = left child, `'1'` = right child, from the root).
pub struct HitRecord<'a> {
    pub point: Point3,
    pub normal: Vec3,
    pub t: f64,
    pub front_face: bool,
    pub u: f64,
    pub v: f64,
    pub material: &'a dyn Material,
    pub bvh_depth: u32,
    pub bvh_path: &'a str,
}

impl<'a> HitRecord<'a> {
    pub fn new(point: Point3, t: f64, material: &'a dyn Material) -> Self {
        Self {
            point,
            normal: Vec3::zero(),
            t,
            front_face: true,
            u: 0.0,
            v: 0.0,
            material,
            bvh_depth: 0,
            bvh_path: "",
        }
    }

    /// Orients the stored normal against the incident ray. `outward_normal`
    /// must be the geometric outward normal of the surface.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

// ─── Hittable Trait ─────────────────────────────────────────────────────────

pub trait Hittable: Send + Sync {
    /// The closest intersection with `ray` inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;

    /// The primitive's immutable, ε-padded bounding box.
    fn bounding_box(&self) -> Aabb;
}

// ─── Scene ──────────────────────────────────────────────────────────────────

/// The primitive list plus its acceleration structure.
///
/// Lifecycle: append all primitives, then [`Scene::build_bvh`] once, then
/// render. Hitting a scene whose tree was never built is a programmer
/// error and panics; appending after the build is equally unsupported.
pub struct Scene {
    objects: Vec<Arc<dyn Hittable>>,
    bvh: Option<BvhNode>,
    bbox: Aabb,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bvh: None,
            bbox: Aabb::EMPTY,
        }
    }

    pub fn from_objects(objects: Vec<Arc<dyn Hittable>>) -> Self {
        let mut scene = Self::new();
        for object in objects {
            scene.add(object);
        }
        scene
    }

    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        debug_assert!(self.bvh.is_none(), "appending to a scene after build_bvh");
        self.bbox = Aabb::merge(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Builds the acceleration structure over every primitive added so
    /// far. The scene is immutable afterwards.
    pub fn build_bvh(&mut self, max_leaf_size: usize, split_method: SplitMethod) {
        let start = std::time::Instant::now();
        let bvh = BvhNode::build(&mut self.objects, max_leaf_size, split_method);
        tracing::info!(
            primitives = self.objects.len(),
            nodes = bvh.node_count(),
            height = bvh.height(),
            ?split_method,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "BVH built"
        );
        self.bvh = Some(bvh);
    }

    pub fn bvh(&self) -> Option<&BvhNode> {
        self.bvh.as_ref()
    }

    /// Brute-force minimum-`t` scan over the primitive list, bypassing the
    /// BVH. Reference semantics for the traversal; also usable before
    /// `build_bvh`.
    pub fn hit_linear(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest = ray_t.max;
        let mut best = None;
        for object in &self.objects {
            if let Some(rec) = object.hit(ray, Interval::new(ray_t.min, closest)) {
                closest = rec.t;
                best = Some(rec);
            }
        }
        best
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        self.bvh
            .as_ref()
            .expect("Scene::hit called before build_bvh")
            .hit(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
