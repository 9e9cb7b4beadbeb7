use crate::hittable::Hittable;
use crate::material::{Lambertian, Material};
use crate::math::{Color, Point3, Vec3};
use crate::texture::ImageTexture;
use crate::triangle::{Triangle, Vertex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to load OBJ: {0}")]
    Load(#[from] tobj::LoadError),
}

/// Albedo used when a face has no MTL material.
const DEFAULT_ALBEDO: Color = Color::new(0.73, 0.73, 0.73);

#[derive(Debug, Clone, Copy)]
enum TransformOp {
    Translate(Vec3),
    Scale(Vec3),
    Rotate { axis: Vec3, degrees: f64 },
}

/// Rodrigues rotation of `v` about the unit axis `k`:
/// `v·cosθ + (k × v)·sinθ + k·(k·v)·(1 − cosθ)`.
fn rotate_about_axis(v: Vec3, axis: Vec3, degrees: f64) -> Vec3 {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}

struct RawTriangle {
    positions: [Point3; 3],
    uvs: [(f64, f64); 3],
    normals: Option<[Vec3; 3]>,
    material_id: Option<usize>,
}

/// A loaded triangle mesh plus a pending transform pipeline.
///
/// Transforms accumulate in call order and are applied to vertex positions
/// when the primitives are built; face normals are always recomputed from
/// the transformed positions, and vertex shading normals are rotated and
/// inverse-scaled (never translated).
pub struct Mesh {
    triangles: Vec<RawTriangle>,
    materials: Vec<Arc<dyn Material>>,
    ops: Vec<TransformOp>,
}

impl Mesh {
    /// Loads an OBJ file, resolving its MTL materials: `map_Kd` becomes an
    /// image-textured Lambertian (magenta when the image is missing),
    /// a bare `Kd` a solid one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let start = std::time::Instant::now();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let base_dir = path.parent().map(PathBuf::from).unwrap_or_default();
        let materials = match materials {
            Ok(mtls) => mtls
                .iter()
                .map(|m| Self::convert_material(m, &base_dir))
                .collect(),
            Err(err) => {
                tracing::warn!(%err, "no usable MTL; falling back to default material");
                Vec::new()
            }
        };

        let mut triangles = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            for chunk in mesh.indices.chunks_exact(3) {
                let face: [u32; 3] = [chunk[0], chunk[1], chunk[2]];
                let positions = face.map(|idx| {
                    let i = idx as usize * 3;
                    Point3::new(
                        mesh.positions[i] as f64,
                        mesh.positions[i + 1] as f64,
                        mesh.positions[i + 2] as f64,
                    )
                });
                let uvs = face.map(|idx| {
                    let i = idx as usize * 2;
                    if mesh.texcoords.is_empty() {
                        (0.0, 0.0)
                    } else {
                        (mesh.texcoords[i] as f64, mesh.texcoords[i + 1] as f64)
                    }
                });
                let normals = if mesh.normals.is_empty() {
                    None
                } else {
                    Some(face.map(|idx| {
                        let i = idx as usize * 3;
                        Vec3::new(
                            mesh.normals[i] as f64,
                            mesh.normals[i + 1] as f64,
                            mesh.normals[i + 2] as f64,
                        )
                    }))
                };
                triangles.push(RawTriangle {
                    positions,
                    uvs,
                    normals,
                    material_id: mesh.material_id,
                });
            }
        }

        tracing::info!(
            path = %path.display(),
            triangles = triangles.len(),
            materials = materials.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mesh loaded"
        );

        Ok(Self {
            triangles,
            materials,
            ops: Vec::new(),
        })
    }

    fn convert_material(mtl: &tobj::Material, base_dir: &Path) -> Arc<dyn Material> {
        if let Some(texture) = &mtl.diffuse_texture {
            let texture = ImageTexture::open(base_dir.join(texture));
            return Arc::new(Lambertian::textured(Arc::new(texture)));
        }
        let albedo = mtl
            .diffuse
            .map(|[r, g, b]| Color::new(r as f64, g as f64, b as f64))
            .unwrap_or(DEFAULT_ALBEDO);
        Arc::new(Lambertian::new(albedo))
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn translate(&mut self, offset: Vec3) -> &mut Self {
        self.ops.push(TransformOp::Translate(offset));
        self
    }

    pub fn scale(&mut self, factors: Vec3) -> &mut Self {
        self.ops.push(TransformOp::Scale(factors));
        self
    }

    pub fn scale_uniform(&mut self, factor: f64) -> &mut Self {
        self.scale(Vec3::new(factor, factor, factor))
    }

    pub fn rotate(&mut self, degrees: f64, axis: Vec3) -> &mut Self {
        self.ops.push(TransformOp::Rotate {
            axis: axis.normalized(),
            degrees,
        });
        self
    }

    fn apply_to_point(&self, mut p: Point3) -> Point3 {
        for op in &self.ops {
            p = match *op {
                TransformOp::Translate(v) => p + v,
                TransformOp::Scale(s) => Point3::new(p.x * s.x, p.y * s.y, p.z * s.z),
                TransformOp::Rotate { axis, degrees } => rotate_about_axis(p, axis, degrees),
            };
        }
        p
    }

    fn apply_to_normal(&self, mut n: Vec3) -> Vec3 {
        for op in &self.ops {
            n = match *op {
                TransformOp::Translate(_) => n,
                // Inverse-transpose of an axis-aligned scale.
                TransformOp::Scale(s) => Vec3::new(n.x / s.x, n.y / s.y, n.z / s.z),
                TransformOp::Rotate { axis, degrees } => rotate_about_axis(n, axis, degrees),
            };
        }
        if n.near_zero() {
            n
        } else {
            n.normalized()
        }
    }

    /// Builds renderable triangles from the transformed mesh. When
    /// `override_material` is set every face uses it — the hook the BVH
    /// visualisation materials rely on.
    pub fn build_objects(
        &self,
        override_material: Option<Arc<dyn Material>>,
    ) -> Vec<Arc<dyn Hittable>> {
        let default: Arc<dyn Material> = Arc::new(Lambertian::new(DEFAULT_ALBEDO));
        self.triangles
            .iter()
            .map(|tri| {
                let material = override_material.clone().unwrap_or_else(|| {
                    tri.material_id
                        .and_then(|id| self.materials.get(id).cloned())
                        .unwrap_or_else(|| default.clone())
                });
                let vertices: [Vertex; 3] = std::array::from_fn(|i| {
                    let (u, v) = tri.uvs[i];
                    Vertex {
                        position: self.apply_to_point(tri.positions[i]),
                        u,
                        v,
                        normal: tri.normals.map(|ns| self.apply_to_normal(ns[i])),
                    }
                });
                let [v0, v1, v2] = vertices;
                Arc::new(Triangle::new(v0, v1, v2, material)) as Arc<dyn Hittable>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::math::Ray;
    use std::io::Write;

    const QUAD_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    fn write_quad() -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU32, Ordering};
        static NEXT: AtomicU32 = AtomicU32::new(0);
        let path = std::env::temp_dir().join(format!(
            "lumen_mesh_test_{}_{}.obj",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(QUAD_OBJ.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_triangulates_a_quad() {
        let path = write_quad();
        let mesh = Mesh::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(mesh.triangle_count(), 2);

        let objects = mesh.build_objects(None);
        let ray = Ray::new(Point3::new(0.5, 0.5, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = objects
            .iter()
            .filter_map(|o| o.hit(&ray, Interval::new(0.001, f64::INFINITY)))
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap());
        let hit = hit.unwrap();
        assert!((hit.t - 1.0).abs() < 1e-9);
        assert!((hit.u - 0.5).abs() < 1e-9);
        assert!((hit.v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transforms_compose_in_call_order() {
        let path = write_quad();
        let mut mesh = Mesh::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Scale, then rotate the XY quad into the XZ plane, then lift it.
        mesh.scale_uniform(2.0)
            .rotate(90.0, Vec3::new(1.0, 0.0, 0.0))
            .translate(Vec3::new(0.0, 5.0, 0.0));
        let objects = mesh.build_objects(None);

        let ray = Ray::new(Point3::new(1.0, 8.0, 1.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = objects
            .iter()
            .filter_map(|o| o.hit(&ray, Interval::new(0.001, f64::INFINITY)))
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap());
        assert!(hit.is_some(), "transformed quad should lie in the y=5 plane");
        assert!((hit.unwrap().t - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_preserves_lengths() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let r = rotate_about_axis(v, Vec3::unit_y(), 37.0);
        assert!((r.length() - v.length()).abs() < 1e-12);
        // A full turn is the identity.
        let full = rotate_about_axis(v, Vec3::unit_y(), 360.0);
        assert!((full - v).length() < 1e-9);
    }

    #[test]
    fn override_material_applies_to_every_face() {
        let path = write_quad();
        let mesh = Mesh::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let light: Arc<dyn Material> =
            Arc::new(crate::material::DiffuseLight::new(Color::ones(), 3.0));
        let objects = mesh.build_objects(Some(light));
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        for object in &objects {
            if let Some(hit) = object.hit(&ray, Interval::new(0.001, f64::INFINITY)) {
                let emitted = hit.material.emitted(&ray, &hit);
                assert_eq!(emitted, Some(Color::new(3.0, 3.0, 3.0)));
            }
        }
    }
}
