use crate::interval::Interval;
use crate::math::{Point3, Ray};

/// An axis-aligned bounding box, stored as one [`Interval`] per axis.
///
/// Primitives pad every axis by a small ε when they build their box, so
/// axis-aligned geometry never produces a zero-width slab and the ray test
/// below stays finite even for degenerate direction components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// The non-hitting box; identity under [`Aabb::merge`].
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };

    #[inline(always)]
    pub const fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// The box spanned by two opposite corner points.
    pub fn from_points(a: Point3, b: Point3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Component-wise interval merge of two boxes.
    #[inline(always)]
    pub fn merge(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::merge(a.x, b.x),
            y: Interval::merge(a.y, b.y),
            z: Interval::merge(a.z, b.z),
        }
    }

    #[inline(always)]
    pub fn axis(&self, i: usize) -> Interval {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Widens every axis by `s`.
    pub fn pad(&self, s: f64) -> Self {
        Self {
            x: self.x.pad(s),
            y: self.y.pad(s),
            z: self.z.pad(s),
        }
    }

    /// Index of the widest axis; ties break toward x, then y.
    pub fn longest_axis(&self) -> usize {
        let dx = self.x.size();
        let dy = self.y.size();
        let dz = self.z.size();
        if dx >= dy && dx >= dz {
            0
        } else if dy >= dz {
            1
        } else {
            2
        }
    }

    /// Surface area `2·(dx·dy + dx·dz + dy·dz)`, or 0 when any axis is
    /// empty. Drives the SAH cost model.
    pub fn surface_area(&self) -> f64 {
        if self.x.is_empty() || self.y.is_empty() || self.z.is_empty() {
            return 0.0;
        }
        let dx = self.x.size();
        let dy = self.y.size();
        let dz = self.z.size();
        2.0 * (dx * dy + dx * dz + dy * dz)
    }

    /// Slab-method ray test: intersects the ray with each pair of parallel
    /// planes and tightens a shared `t` interval. A zero direction
    /// component yields ±∞ plane parameters; the ordered swap keeps the
    /// arithmetic consistent.
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> bool {
        for axis in 0..3 {
            let slab = self.axis(axis);
            let inv_d = 1.0 / ray.direction[axis];
            let mut t0 = (slab.min - ray.origin[axis]) * inv_d;
            let mut t1 = (slab.max - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::zero(), Vec3::ones())
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let b = unit_box();
        assert_eq!(Aabb::merge(&b, &Aabb::EMPTY), b);
        assert_eq!(Aabb::merge(&Aabb::EMPTY, &b), b);
    }

    #[test]
    fn surface_area_of_unit_cube() {
        assert_eq!(unit_box().surface_area(), 6.0);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn longest_axis_breaks_ties_x_then_y() {
        let cube = unit_box();
        assert_eq!(cube.longest_axis(), 0);
        let tall = Aabb::from_points(Vec3::zero(), Vec3::new(1.0, 3.0, 3.0));
        assert_eq!(tall.longest_axis(), 1);
        let deep = Aabb::from_points(Vec3::zero(), Vec3::new(1.0, 1.0, 5.0));
        assert_eq!(deep.longest_axis(), 2);
    }

    #[test]
    fn slab_test_hits_through_center() {
        let b = unit_box();
        let r = Ray::new(Vec3::new(0.5, 0.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(b.hit(&r, Interval::new(0.001, f64::INFINITY)));
    }

    #[test]
    fn slab_test_respects_query_interval() {
        let b = unit_box();
        let r = Ray::new(Vec3::new(0.5, 0.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        // Box lies at t ∈ [2, 3]; a query capped at t = 1 must miss.
        assert!(!b.hit(&r, Interval::new(0.001, 1.0)));
    }

    #[test]
    fn slab_test_misses_parallel_offset_ray() {
        let b = unit_box();
        let r = Ray::new(Vec3::new(2.0, 0.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!b.hit(&r, Interval::new(0.001, f64::INFINITY)));
    }

    #[test]
    fn slab_test_handles_zero_direction_component() {
        // Direction has a zero x component; the padded box keeps the
        // division finite and the test meaningful.
        let b = unit_box().pad(1e-8);
        let inside = Ray::new(Vec3::new(0.5, 0.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        let outside = Ray::new(Vec3::new(5.0, 0.5, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(b.hit(&inside, Interval::new(0.001, f64::INFINITY)));
        assert!(!b.hit(&outside, Interval::new(0.001, f64::INFINITY)));
    }

    #[test]
    fn sentinel_boxes() {
        let r = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        assert!(!Aabb::EMPTY.hit(&r, Interval::new(0.001, f64::INFINITY)));
        assert!(Aabb::UNIVERSE.hit(&r, Interval::new(0.001, f64::INFINITY)));
    }
}
