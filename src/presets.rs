use crate::camera::CameraConfig;
use crate::hittable::Hittable;
use crate::material::{Checkerboard, Dielectric, DiffuseLight, Lambertian, Material, Metal};
use crate::math::{Color, Point3, Vec3};
use crate::mesh::{Mesh, MeshError};
use crate::renderer::SkyModel;
use crate::sphere::Sphere;
use crate::triangle::{Triangle, Vertex};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;

/// A complete scene: geometry, viewpoint, and sky, ready for BVH
/// construction and rendering.
pub struct SceneDescription {
    pub name: &'static str,
    pub objects: Vec<Arc<dyn Hittable>>,
    pub camera_config: CameraConfig,
    pub sky: SkyModel,
}

/// Knobs shared by the preset builders.
pub struct PresetOptions {
    /// OBJ file for the mesh preset.
    pub obj_path: Option<PathBuf>,
    /// Rotation applied to the loaded mesh, degrees about +y.
    pub rotate_degrees: f64,
    /// Replaces every material in the mesh and stress presets — the hook
    /// for the BVH visualisation materials.
    pub override_material: Option<Arc<dyn Material>>,
    /// Seed for randomized object placement.
    pub seed: u64,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            obj_path: None,
            rotate_degrees: 0.0,
            override_material: None,
            seed: 42,
        }
    }
}

/// Available built-in scene presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenePreset {
    /// The classic random-spheres arrangement on a checkerboard ground.
    Showcase,
    /// A Cornell box built from triangle quads with an area light.
    Cornell,
    /// A handful of spheres — quick previews and benchmarks.
    Minimal,
    /// A glass quad of two triangles in front of an emissive sphere.
    Quad,
    /// A Wavefront OBJ mesh viewer (requires `--obj`).
    Mesh,
    /// Hundreds of random spheres to exercise the BVH.
    Stress,
}

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("the mesh preset needs an OBJ file; pass --obj <path>")]
    MissingObjPath,
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl ScenePreset {
    pub fn build(self, opts: &PresetOptions) -> Result<SceneDescription, PresetError> {
        match self {
            ScenePreset::Showcase => Ok(build_showcase(opts)),
            ScenePreset::Cornell => Ok(build_cornell()),
            ScenePreset::Minimal => Ok(build_minimal()),
            ScenePreset::Quad => Ok(build_quad()),
            ScenePreset::Mesh => build_mesh(opts),
            ScenePreset::Stress => Ok(build_stress(opts)),
        }
    }
}

/// Appends a parallelogram `q + s·u + t·v` as two triangles with the usual
/// [0,1]² texture coordinates.
fn push_quad(
    objects: &mut Vec<Arc<dyn Hittable>>,
    q: Point3,
    u: Vec3,
    v: Vec3,
    material: Arc<dyn Material>,
) {
    let corners = [
        Vertex::with_uv(q, 0.0, 0.0),
        Vertex::with_uv(q + u, 1.0, 0.0),
        Vertex::with_uv(q + u + v, 1.0, 1.0),
        Vertex::with_uv(q + v, 0.0, 1.0),
    ];
    objects.push(Arc::new(Triangle::new(
        corners[0],
        corners[1],
        corners[2],
        material.clone(),
    )));
    objects.push(Arc::new(Triangle::new(
        corners[0],
        corners[2],
        corners[3],
        material,
    )));
}

fn build_showcase(opts: &PresetOptions) -> SceneDescription {
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);

    // Ground
    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Checkerboard::new(
            Color::new(0.05, 0.05, 0.05),
            Color::new(0.95, 0.95, 0.95),
            10.0,
        )),
    )));

    // Hero spheres: hollow glass, diffuse, metal.
    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, 1.0, 0.0),
        1.0,
        Arc::new(Dielectric::new(1.5)),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Lambertian::new(Color::new(0.7, 0.15, 0.15))),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.85, 0.85, 0.9), 0.0)),
    )));

    for a in -8..8 {
        for b in -8..8 {
            let center = Point3::new(
                a as f64 + 0.9 * rng.gen::<f64>(),
                0.2,
                b as f64 + 0.9 * rng.gen::<f64>(),
            );
            let too_close = [-4.0, 0.0, 4.0]
                .iter()
                .any(|&x| (center - Point3::new(x, 0.2, 0.0)).length() < 0.9);
            if too_close {
                continue;
            }

            let choose: f64 = rng.gen();
            let material: Arc<dyn Material> = if choose < 0.7 {
                Arc::new(Lambertian::new(Color::new(
                    rng.gen::<f64>() * rng.gen::<f64>(),
                    rng.gen::<f64>() * rng.gen::<f64>(),
                    rng.gen::<f64>() * rng.gen::<f64>(),
                )))
            } else if choose < 0.9 {
                Arc::new(Metal::new(
                    Color::new(
                        rng.gen_range(0.5..1.0),
                        rng.gen_range(0.5..1.0),
                        rng.gen_range(0.5..1.0),
                    ),
                    rng.gen_range(0.0..0.3),
                ))
            } else {
                Arc::new(Dielectric::new(1.5))
            };
            objects.push(Arc::new(Sphere::new(center, 0.2, material)));
        }
    }

    SceneDescription {
        name: "Showcase",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(13.0, 2.0, 3.0),
            look_at: Point3::new(0.0, 0.5, 0.0),
            vfov_degrees: 20.0,
            focus_dist: 10.0,
            defocus_angle_degrees: 0.6,
            ..Default::default()
        },
        sky: SkyModel::Gradient {
            horizon: Color::ones(),
            zenith: Color::new(0.5, 0.7, 1.0),
        },
    }
}

fn build_cornell() -> SceneDescription {
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();

    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.73, 0.73, 0.73)));
    let red: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));

    // Floor, ceiling, back wall, then the colored sides.
    push_quad(
        &mut objects,
        Point3::new(-2.0, 0.0, -4.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 4.0),
        white.clone(),
    );
    push_quad(
        &mut objects,
        Point3::new(-2.0, 4.0, -4.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 4.0),
        white.clone(),
    );
    push_quad(
        &mut objects,
        Point3::new(-2.0, 0.0, -4.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(0.0, 4.0, 0.0),
        white,
    );
    push_quad(
        &mut objects,
        Point3::new(-2.0, 0.0, -4.0),
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::new(0.0, 4.0, 0.0),
        red,
    );
    push_quad(
        &mut objects,
        Point3::new(2.0, 0.0, -4.0),
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::new(0.0, 4.0, 0.0),
        green,
    );

    // Ceiling area light.
    push_quad(
        &mut objects,
        Point3::new(-0.5, 3.99, -2.5),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Arc::new(DiffuseLight::new(Color::new(1.0, 0.95, 0.85), 18.0)),
    );

    objects.push(Arc::new(Sphere::new(
        Point3::new(-0.7, 0.6, -2.2),
        0.6,
        Arc::new(Metal::new(Color::new(0.9, 0.9, 0.95), 0.02)),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(0.7, 0.45, -1.5),
        0.45,
        Arc::new(Dielectric::new(1.5)),
    )));

    SceneDescription {
        name: "Cornell Box",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(0.0, 2.0, 3.5),
            look_at: Point3::new(0.0, 1.5, -2.0),
            vfov_degrees: 50.0,
            focus_dist: 5.0,
            ..Default::default()
        },
        sky: SkyModel::Black,
    }
}

fn build_minimal() -> SceneDescription {
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();

    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, -100.5, -1.0),
        100.0,
        Arc::new(Checkerboard::new(
            Color::new(0.1, 0.1, 0.1),
            Color::new(0.9, 0.9, 0.9),
            15.0,
        )),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, 0.5, -1.0),
        0.5,
        Arc::new(Metal::new(Color::new(0.95, 0.95, 0.97), 0.0)),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(-1.2, 0.25, -0.5),
        0.25,
        Arc::new(Lambertian::new(Color::new(0.9, 0.2, 0.1))),
    )));
    objects.push(Arc::new(Sphere::new(
        Point3::new(1.0, 0.3, -0.8),
        0.3,
        Arc::new(Dielectric::new(1.5)),
    )));

    SceneDescription {
        name: "Minimal",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(0.0, 1.5, 2.0),
            look_at: Point3::new(0.0, 0.3, -1.0),
            vfov_degrees: 40.0,
            focus_dist: 3.0,
            ..Default::default()
        },
        sky: SkyModel::Gradient {
            horizon: Color::ones(),
            zenith: Color::new(0.3, 0.5, 1.0),
        },
    }
}

fn build_quad() -> SceneDescription {
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();

    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::new(Color::new(0.4, 0.4, 0.45))),
    )));

    // A glass pane between the camera and the light.
    push_quad(
        &mut objects,
        Point3::new(-1.5, 0.0, 0.0),
        Vec3::new(3.0, 0.0, 0.0),
        Vec3::new(0.0, 3.0, 0.0),
        Arc::new(Dielectric::new(1.5)),
    );

    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, 1.5, -3.0),
        0.8,
        Arc::new(DiffuseLight::new(Color::new(1.0, 0.9, 0.7), 4.0)),
    )));

    SceneDescription {
        name: "Glass Quad",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(0.0, 1.5, 4.0),
            look_at: Point3::new(0.0, 1.5, 0.0),
            vfov_degrees: 45.0,
            focus_dist: 4.0,
            ..Default::default()
        },
        sky: SkyModel::Solid(Color::new(0.05, 0.05, 0.08)),
    }
}

fn build_mesh(opts: &PresetOptions) -> Result<SceneDescription, PresetError> {
    let path = opts.obj_path.as_ref().ok_or(PresetError::MissingObjPath)?;

    let mut mesh = Mesh::load(path)?;
    if opts.rotate_degrees != 0.0 {
        mesh.rotate(opts.rotate_degrees, Vec3::unit_y());
    }
    let objects = mesh.build_objects(opts.override_material.clone());

    Ok(SceneDescription {
        name: "Mesh",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(7.0, 6.0, 5.0),
            look_at: Point3::new(-1.0, 0.5, -0.5),
            vfov_degrees: 20.0,
            focus_dist: 10.0,
            ..Default::default()
        },
        sky: SkyModel::Solid(Color::ones()),
    })
}

fn build_stress(opts: &PresetOptions) -> SceneDescription {
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);

    let ground: Arc<dyn Material> = opts
        .override_material
        .clone()
        .unwrap_or_else(|| Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5))));
    objects.push(Arc::new(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        ground,
    )));

    for _ in 0..500 {
        let center = Point3::new(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(0.1..0.4),
            rng.gen_range(-15.0..15.0),
        );
        let radius = rng.gen_range(0.08..0.35);
        let material: Arc<dyn Material> = opts.override_material.clone().unwrap_or_else(|| {
            Arc::new(Lambertian::new(Color::new(rng.gen(), rng.gen(), rng.gen())))
        });
        objects.push(Arc::new(Sphere::new(center, radius, material)));
    }

    SceneDescription {
        name: "Stress Test (500 spheres)",
        objects,
        camera_config: CameraConfig {
            look_from: Point3::new(10.0, 4.0, 10.0),
            look_at: Point3::zero(),
            vfov_degrees: 30.0,
            focus_dist: 14.0,
            ..Default::default()
        },
        sky: SkyModel::Gradient {
            horizon: Color::new(1.0, 0.95, 0.88),
            zenith: Color::new(0.4, 0.6, 1.0),
        },
    }
}
