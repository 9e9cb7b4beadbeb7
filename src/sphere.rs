use crate::aabb::Aabb;
use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::material::Material;
use crate::math::{Point3, Ray, Vec3};
use std::sync::Arc;

const BBOX_PAD: f64 = 1e-8;

/// An analytic sphere. UV is left at `(0, 0)`; patterned spheres use the
/// point-evaluated checkerboard material instead.
pub struct Sphere {
    center: Point3,
    radius: f64,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Point3, radius: f64, material: Arc<dyn Material>) -> Self {
        let radius = radius.max(0.0);
        let r = Vec3::new(radius, radius, radius);
        let bbox = Aabb::from_points(center - r, center + r).pad(BBOX_PAD);
        Self {
            center,
            radius,
            material,
            bbox,
        }
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Prefer the nearer root; fall back to the farther one.
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let outward_normal = (point - self.center) / self.radius;
        let mut rec = HitRecord::new(point, root, self.material.as_ref());
        rec.set_face_normal(ray, outward_normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::math::{Color, Ray};

    fn unit_sphere() -> Sphere {
        Sphere::new(
            Point3::zero(),
            1.0,
            Arc::new(Lambertian::new(Color::ones())),
        )
    }

    #[test]
    fn hits_nearer_surface_first() {
        let s = unit_sphere();
        let r = Ray::new(Point3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let rec = s.hit(&r, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-12);
        assert!(rec.front_face);
        assert!((rec.normal - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn falls_back_to_far_root_from_inside() {
        let s = unit_sphere();
        let r = Ray::new(Point3::zero(), Vec3::new(0.0, 0.0, -1.0));
        let rec = s.hit(&r, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 1.0).abs() < 1e-12);
        // Inside hits face the ray: the stored normal is flipped inward.
        assert!(!rec.front_face);
        assert!((rec.normal - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn misses_offset_ray() {
        let s = unit_sphere();
        let r = Ray::new(Point3::new(0.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(s.hit(&r, Interval::new(0.001, f64::INFINITY)).is_none());
    }

    #[test]
    fn bounding_box_encloses_sphere() {
        let s = Sphere::new(
            Point3::new(1.0, 2.0, 3.0),
            0.5,
            Arc::new(Lambertian::new(Color::ones())),
        );
        let b = s.bounding_box();
        assert!(b.x.contains(0.5) && b.x.contains(1.5));
        assert!(b.y.contains(1.5) && b.y.contains(2.5));
        assert!(b.z.contains(2.5) && b.z.contains(3.5));
    }
}
