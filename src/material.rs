use crate::hittable::HitRecord;
use crate::math::{Color, Ray, Vec3};
use crate::texture::{SolidColor, Texture};
use rand::Rng;
use std::sync::Arc;

// ─── Material Trait (dyn-compatible via &mut dyn RngCore) ───────────────────

/// The surface response protocol. All three capabilities are optional:
///
/// - [`scatter`](Material::scatter) produces an outgoing ray plus a
///   multiplicative RGB attenuation; `None` absorbs the path.
/// - [`emitted`](Material::emitted) returns self-emission; a `Some` hit
///   terminates the path immediately with that radiance.
/// - [`sample_rate`](Material::sample_rate) hints how many of the global
///   samples-per-pixel a pixel whose primary ray lands here deserves.
pub trait Material: Send + Sync {
    fn scatter(
        &self,
        _ray: &Ray,
        _hit: &HitRecord,
        _rng: &mut dyn rand::RngCore,
    ) -> Option<(Ray, Color)> {
        None
    }

    fn emitted(&self, _ray: &Ray, _hit: &HitRecord) -> Option<Color> {
        None
    }

    fn sample_rate(&self, samples_per_pixel: u32) -> u32 {
        samples_per_pixel
    }
}

// ─── Lambertian (Diffuse) ───────────────────────────────────────────────────

pub struct Lambertian {
    pub albedo: Arc<dyn Texture>,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo: Arc::new(SolidColor::new(albedo)),
        }
    }

    pub fn textured(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        _ray: &Ray,
        hit: &HitRecord,
        rng: &mut dyn rand::RngCore,
    ) -> Option<(Ray, Color)> {
        let mut scatter_dir = hit.normal + Vec3::random_unit_vector(rng);
        if scatter_dir.near_zero() {
            scatter_dir = hit.normal;
        }
        let attenuation = self.albedo.value(hit.u, hit.v);
        Some((Ray::new(hit.point, scatter_dir), attenuation))
    }

    /// Diffuse surfaces converge slowly but tolerate noise well; a fifth of
    /// the global budget is enough.
    fn sample_rate(&self, samples_per_pixel: u32) -> u32 {
        ((samples_per_pixel as f64 * 0.2) as u32).max(1)
    }
}

// ─── Metal (Specular) ───────────────────────────────────────────────────────

pub struct Metal {
    pub albedo: Arc<dyn Texture>,
    pub fuzz: f64,
}

impl Metal {
    pub fn new(albedo: Color, fuzz: f64) -> Self {
        Self {
            albedo: Arc::new(SolidColor::new(albedo)),
            fuzz: fuzz.min(1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        rng: &mut dyn rand::RngCore,
    ) -> Option<(Ray, Color)> {
        let reflected =
            ray.direction.reflect(hit.normal).normalized() + Vec3::random_unit_vector(rng) * self.fuzz;
        // Fuzzing can push the direction below the surface; absorb there.
        if reflected.dot(hit.normal) <= 0.0 {
            return None;
        }
        let attenuation = self.albedo.value(hit.u, hit.v);
        Some((Ray::new(hit.point, reflected), attenuation))
    }

    fn sample_rate(&self, samples_per_pixel: u32) -> u32 {
        ((samples_per_pixel as f64 * 0.5) as u32).max(1)
    }
}

// ─── Dielectric (Glass) ─────────────────────────────────────────────────────

pub struct Dielectric {
    pub refraction_index: f64,
}

impl Dielectric {
    pub const fn new(refraction_index: f64) -> Self {
        Self { refraction_index }
    }

    /// Schlick's approximation: `R₀ + (1 − R₀)·(1 − cosθ)⁵` with
    /// `R₀ = ((1 − η)/(1 + η))²`.
    pub fn reflectance(cosine: f64, eta: f64) -> f64 {
        let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        rng: &mut dyn rand::RngCore,
    ) -> Option<(Ray, Color)> {
        let eta_ratio = if hit.front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };
        let unit_dir = ray.direction.normalized();
        let cos_theta = (-unit_dir).dot(hit.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let cannot_refract = eta_ratio * sin_theta > 1.0;
        let direction =
            if cannot_refract || Self::reflectance(cos_theta, eta_ratio) > rng.gen::<f64>() {
                unit_dir.reflect(hit.normal)
            } else {
                unit_dir
                    .refract(hit.normal, eta_ratio)
                    .unwrap_or_else(|| unit_dir.reflect(hit.normal))
            };

        Some((Ray::new(hit.point, direction), Color::ones()))
    }
}

// ─── Diffuse Light ──────────────────────────────────────────────────────────

pub struct DiffuseLight {
    pub color: Color,
    pub intensity: f64,
}

impl DiffuseLight {
    pub const fn new(color: Color, intensity: f64) -> Self {
        Self { color, intensity }
    }
}

impl Material for DiffuseLight {
    fn emitted(&self, _ray: &Ray, _hit: &HitRecord) -> Option<Color> {
        Some(self.color * self.intensity)
    }
}

// ─── Checkerboard ───────────────────────────────────────────────────────────

/// A diffuse material with a 3-D sine checkerboard, evaluated at the hit
/// point rather than through UV — so it works on spheres, whose UV is
/// undefined.
pub struct Checkerboard {
    pub color_a: Color,
    pub color_b: Color,
    pub scale: f64,
}

impl Checkerboard {
    pub const fn new(color_a: Color, color_b: Color, scale: f64) -> Self {
        Self {
            color_a,
            color_b,
            scale,
        }
    }

    fn pattern_at(&self, point: Vec3) -> Color {
        let sines = (self.scale * point.x).sin()
            * (self.scale * point.y).sin()
            * (self.scale * point.z).sin();
        if sines < 0.0 {
            self.color_a
        } else {
            self.color_b
        }
    }
}

impl Material for Checkerboard {
    fn scatter(
        &self,
        _ray: &Ray,
        hit: &HitRecord,
        rng: &mut dyn rand::RngCore,
    ) -> Option<(Ray, Color)> {
        let mut scatter_dir = hit.normal + Vec3::random_unit_vector(rng);
        if scatter_dir.near_zero() {
            scatter_dir = hit.normal;
        }
        Some((Ray::new(hit.point, scatter_dir), self.pattern_at(hit.point)))
    }

    fn sample_rate(&self, samples_per_pixel: u32) -> u32 {
        ((samples_per_pixel as f64 * 0.2) as u32).max(1)
    }
}

// ─── BVH Visualisation Materials ────────────────────────────────────────────

/// Maps `t ∈ [0, 1]` through the four-segment
/// blue → cyan → green → yellow → red ramp.
pub fn heat_ramp(t: f64) -> Color {
    let t = t.clamp(0.0, 1.0) * 4.0;
    let blue = Color::new(0.0, 0.0, 1.0);
    let cyan = Color::new(0.0, 1.0, 1.0);
    let green = Color::new(0.0, 1.0, 0.0);
    let yellow = Color::new(1.0, 1.0, 0.0);
    let red = Color::new(1.0, 0.0, 0.0);
    if t < 1.0 {
        blue.lerp(cyan, t)
    } else if t < 2.0 {
        cyan.lerp(green, t - 1.0)
    } else if t < 3.0 {
        green.lerp(yellow, t - 2.0)
    } else {
        yellow.lerp(red, t - 3.0)
    }
}

/// Emits a ramp color for the depth of the BVH leaf that produced the hit,
/// normalized by an expected maximum depth. Visualisation only.
pub struct BvhDepthVisual {
    pub max_depth: u32,
}

impl BvhDepthVisual {
    pub const fn new(max_depth: u32) -> Self {
        Self {
            max_depth: if max_depth == 0 { 1 } else { max_depth },
        }
    }
}

impl Material for BvhDepthVisual {
    fn emitted(&self, _ray: &Ray, hit: &HitRecord) -> Option<Color> {
        Some(heat_ramp(hit.bvh_depth as f64 / self.max_depth as f64))
    }
}

/// Colors hits by the BVH subtree they landed in, relative to a root path
/// prefix: the `depth` path bits following the prefix are read as a binary
/// fraction and mapped through the ramp. Hits outside the prefixed subtree
/// render dark grey. Visualisation only.
pub struct BvhGroupVisual {
    pub root_path: String,
    pub depth: u32,
}

impl BvhGroupVisual {
    pub fn new(root_path: impl Into<String>, depth: u32) -> Self {
        Self {
            root_path: root_path.into(),
            depth: if depth == 0 { 1 } else { depth },
        }
    }
}

impl Material for BvhGroupVisual {
    fn emitted(&self, _ray: &Ray, hit: &HitRecord) -> Option<Color> {
        let Some(subpath) = hit.bvh_path.strip_prefix(self.root_path.as_str()) else {
            return Some(Color::new(0.12, 0.12, 0.12));
        };
        let bits = subpath.len().min(self.depth as usize);
        let mut group = 0u64;
        for c in subpath[..bits].chars() {
            group = (group << 1) | u64::from(c == '1');
        }
        let span = (1u64 << bits) as f64;
        Some(heat_ramp((group as f64 + 0.5) / span))
    }
}
