use crate::aabb::Aabb;
use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::material::Material;
use crate::math::{Point3, Ray, Vec3};
use std::sync::Arc;

const BBOX_PAD: f64 = 1e-8;

/// Rays closer than this to parallel with the triangle plane are rejected.
const PARALLEL_EPS: f64 = 1e-16;

/// A mesh vertex: position, texture coordinates, and an optional shading
/// normal supplied by the model file.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3,
    pub u: f64,
    pub v: f64,
    pub normal: Option<Vec3>,
}

impl Vertex {
    pub const fn new(position: Point3) -> Self {
        Self {
            position,
            u: 0.0,
            v: 0.0,
            normal: None,
        }
    }

    pub const fn with_uv(position: Point3, u: f64, v: f64) -> Self {
        Self {
            position,
            u,
            v,
            normal: None,
        }
    }
}

/// A triangle with per-vertex attributes. The face normal is computed from
/// the vertex positions at construction, so meshes that transform their
/// vertices simply rebuild their triangles.
pub struct Triangle {
    vertices: [Vertex; 3],
    face_normal: Vec3,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material: Arc<dyn Material>) -> Self {
        let vertices = [v0, v1, v2];
        // A collinear triangle has no plane; give it an arbitrary normal
        // and let the hit path reject it.
        let cross = (v1.position - v0.position).cross(v2.position - v0.position);
        let len = cross.length();
        let face_normal = if len > 0.0 {
            cross / len
        } else {
            Vec3::unit_y()
        };
        let bbox = Self::compute_bbox(&vertices);
        Self {
            vertices,
            face_normal,
            material,
            bbox,
        }
    }

    pub fn from_points(p0: Point3, p1: Point3, p2: Point3, material: Arc<dyn Material>) -> Self {
        Self::new(
            Vertex::new(p0),
            Vertex::new(p1),
            Vertex::new(p2),
            material,
        )
    }

    fn compute_bbox(vertices: &[Vertex; 3]) -> Aabb {
        let [a, b, c] = vertices.map(|v| v.position);
        Aabb::new(
            Interval::new(
                a.x.min(b.x).min(c.x),
                a.x.max(b.x).max(c.x),
            ),
            Interval::new(
                a.y.min(b.y).min(c.y),
                a.y.max(b.y).max(c.y),
            ),
            Interval::new(
                a.z.min(b.z).min(c.z),
                a.z.max(b.z).max(c.z),
            ),
        )
        .pad(BBOX_PAD)
    }

    /// Barycentric coordinates of `p` via the `d00/d01/d11/d20/d21`
    /// projection. `None` when the triangle is degenerate.
    fn barycentric(&self, p: Point3) -> Option<(f64, f64, f64)> {
        let p0 = self.vertices[0].position;
        let v0 = self.vertices[1].position - p0;
        let v1 = self.vertices[2].position - p0;
        let v2 = p - p0;

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom == 0.0 {
            return None;
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Some((1.0 - v - w, v, w))
    }

    /// Edge cross products compared against the face normal; all three
    /// must agree in sign, which is robust to the normal's orientation.
    fn contains(&self, p: Point3) -> bool {
        let [p0, p1, p2] = self.vertices.map(|v| v.position);
        let c0 = (p - p0).cross(p1 - p0).dot(self.face_normal);
        let c1 = (p - p1).cross(p2 - p1).dot(self.face_normal);
        let c2 = (p - p2).cross(p0 - p2).dot(self.face_normal);
        (c0 >= 0.0 && c1 >= 0.0 && c2 >= 0.0) || (c0 <= 0.0 && c1 <= 0.0 && c2 <= 0.0)
    }
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let denom = self.face_normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPS {
            return None;
        }

        let p0 = self.vertices[0].position;
        let t = self.face_normal.dot(p0 - ray.origin) / denom;
        if !ray_t.contains(t) {
            return None;
        }

        let point = ray.at(t);
        if !self.contains(point) {
            return None;
        }

        let (bu, bv, bw) = self.barycentric(point)?;

        let mut rec = HitRecord::new(point, t, self.material.as_ref());
        rec.u = bu * self.vertices[0].u + bv * self.vertices[1].u + bw * self.vertices[2].u;
        rec.v = bu * self.vertices[0].v + bv * self.vertices[1].v + bw * self.vertices[2].v;

        // Interpolate shading normals when the model supplies all three;
        // otherwise shade with the face normal.
        let outward = match (
            self.vertices[0].normal,
            self.vertices[1].normal,
            self.vertices[2].normal,
        ) {
            (Some(n0), Some(n1), Some(n2)) => {
                let n = n0 * bu + n1 * bv + n2 * bw;
                if n.near_zero() {
                    self.face_normal
                } else {
                    n.normalized()
                }
            }
            _ => self.face_normal,
        };
        rec.set_face_normal(ray, outward);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
