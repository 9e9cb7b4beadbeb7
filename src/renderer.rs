use crate::camera::Camera;
use crate::hittable::Hittable;
use crate::interval::Interval;
use crate::math::{Color, Ray};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Self-intersection guard: the minimum ray parameter for every scene
/// query, preventing shadow acne at scatter origins.
const T_MIN: f64 = 1e-3;

// ─── Render Configuration ───────────────────────────────────────────────────

pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    /// Base seed for the per-scanline random streams.
    pub seed: u64,
    /// Worker thread count; 0 uses the rayon default.
    pub threads: usize,
    /// When set, the first hit of a probe ray asks the material for its
    /// per-pixel sample-count hint instead of using the global count.
    pub adaptive_sampling: bool,
    pub gamma: bool,
    pub tone_map: ToneMapOp,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 60,
            samples_per_pixel: 32,
            max_depth: 12,
            seed: 42,
            threads: 0,
            adaptive_sampling: false,
            gamma: true,
            tone_map: ToneMapOp::None,
        }
    }
}

// ─── Tone Mapping Operators ─────────────────────────────────────────────────

/// Optional HDR compression applied at output time only; the frame buffer
/// itself always holds linear radiance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapOp {
    /// Clamp to [0,1] during quantisation, nothing else.
    #[default]
    None,
    /// Reinhard global operator: `L / (1 + L)` per channel.
    Reinhard,
    /// ACES filmic curve (Narkowicz 2015 approximation).
    Aces,
}

impl ToneMapOp {
    pub fn apply(self, color: Color) -> Color {
        match self {
            ToneMapOp::None => color,
            ToneMapOp::Reinhard => Color::new(
                color.x / (1.0 + color.x),
                color.y / (1.0 + color.y),
                color.z / (1.0 + color.z),
            ),
            ToneMapOp::Aces => {
                fn aces_channel(x: f64) -> f64 {
                    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
                    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
                }
                Color::new(
                    aces_channel(color.x),
                    aces_channel(color.y),
                    aces_channel(color.z),
                )
            }
        }
    }
}

// ─── Sky Models ─────────────────────────────────────────────────────────────

/// Radiance returned for rays that escape the scene.
#[derive(Debug, Clone, Copy)]
pub enum SkyModel {
    /// Vertical blend between a horizon and a zenith color.
    Gradient { horizon: Color, zenith: Color },
    /// A constant background color.
    Solid(Color),
    Black,
}

impl SkyModel {
    pub fn sample(&self, ray: &Ray) -> Color {
        match self {
            SkyModel::Gradient { horizon, zenith } => {
                let unit_dir = ray.direction.normalized();
                let t = 0.5 * (unit_dir.y + 1.0);
                horizon.lerp(*zenith, t)
            }
            SkyModel::Solid(color) => *color,
            SkyModel::Black => Color::zero(),
        }
    }
}

// ─── Framebuffer ────────────────────────────────────────────────────────────

/// A row-major grid of linear RGB radiance. Quantisation (gamma, clamp,
/// 8-bit truncation) happens only in the `to_*` accessors.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zero(); (width * height) as usize],
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Tone map, gamma (γ ≈ 2 as per-channel sqrt), clamp to [0, 0.999],
    /// scale to [0, 256) and truncate.
    pub fn quantize(&self, color: Color, config: &RenderConfig) -> [u8; 3] {
        let mut c = config.tone_map.apply(color);
        if config.gamma {
            c = Color::new(
                c.x.max(0.0).sqrt(),
                c.y.max(0.0).sqrt(),
                c.z.max(0.0).sqrt(),
            );
        }
        let intensity = Interval::new(0.0, 0.999);
        [
            (256.0 * intensity.clamp(c.x)) as u8,
            (256.0 * intensity.clamp(c.y)) as u8,
            (256.0 * intensity.clamp(c.z)) as u8,
        ]
    }

    /// Row-major RGB bytes, quantised.
    pub fn to_rgb8(&self, config: &RenderConfig) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&c| self.quantize(c, config))
            .collect()
    }

    /// Row-major BGR bytes, quantised — the byte order of the original
    /// screen buffer this renderer grew out of.
    pub fn to_bgr8(&self, config: &RenderConfig) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&c| {
                let [r, g, b] = self.quantize(c, config);
                [b, g, r]
            })
            .collect()
    }
}

// ─── Render Statistics ──────────────────────────────────────────────────────

/// Aggregate counters from one rendering pass.
pub struct RenderStats {
    pub primary_rays: u64,
    pub elapsed_secs: f64,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
}

impl RenderStats {
    pub fn mrays_per_sec(&self) -> f64 {
        self.primary_rays as f64 / self.elapsed_secs / 1e6
    }

    pub fn print_summary(&self) {
        let fill = "━".repeat(30);
        eprintln!("  {fill}");
        eprintln!("  Time:     {:.2}s", self.elapsed_secs);
        eprintln!(
            "  Rays:     {:.2}M primary",
            self.primary_rays as f64 / 1e6
        );
        eprintln!("  Speed:    {:.2} Mrays/s", self.mrays_per_sec());
        eprintln!(
            "  Image:    {}×{} @ {} spp",
            self.width, self.height, self.samples_per_pixel
        );
        eprintln!("  {fill}");
    }
}

// ─── Progress Reporter ──────────────────────────────────────────────────────

/// Scanline-granular progress bar on stderr, safe to tick from workers.
struct RowProgress {
    total: u32,
    done: AtomicU32,
    start: Instant,
}

impl RowProgress {
    fn new(total: u32) -> Self {
        Self {
            total,
            done: AtomicU32::new(0),
            start: Instant::now(),
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let pct = done * 100 / self.total;
        let prev_pct = (done - 1) * 100 / self.total;
        if pct != prev_pct {
            let elapsed = self.start.elapsed().as_secs_f64();
            let rate = done as f64 / elapsed;
            let remaining = (self.total - done) as f64 / rate;
            let bar_width = 24;
            let filled = (pct as usize * bar_width) / 100;
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(bar_width - filled));
            eprint!("\r  Rendering: │{bar}│ {pct:3}%  ETA {remaining:.0}s   ");
        }
    }

    fn finish(&self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let bar = "█".repeat(24);
        eprintln!("\r  Rendering: │{bar}│ 100%  {elapsed:.2}s       ");
    }
}

// ─── Path Tracer ────────────────────────────────────────────────────────────

/// Monte Carlo estimator of the rendering equation, importance-sampling
/// each material's scattering lobe and accumulating per pixel.
pub struct PathTracer<'a> {
    pub scene: &'a dyn Hittable,
    pub camera: &'a Camera,
    pub config: &'a RenderConfig,
    pub sky: SkyModel,
}

impl PathTracer<'_> {
    /// One radiance sample. Emission terminates the path outright; `depth`
    /// gates only further scattering, so a final bounce still sees the
    /// background.
    fn ray_color(&self, ray: &Ray, depth: u32, rng: &mut dyn rand::RngCore) -> Color {
        let Some(hit) = self.scene.hit(ray, Interval::new(T_MIN, f64::INFINITY)) else {
            return self.sky.sample(ray);
        };

        if let Some(emitted) = hit.material.emitted(ray, &hit) {
            return emitted;
        }

        if depth == 0 {
            return Color::zero();
        }

        if let Some((scattered, attenuation)) = hit.material.scatter(ray, &hit, rng) {
            attenuation.hadamard(self.ray_color(&scattered, depth - 1, rng))
        } else {
            Color::zero()
        }
    }

    /// Averages this pixel's samples. With adaptive sampling on, a probe
    /// ray decides how many samples the pixel deserves: its material's
    /// hint on a hit, a single sample on a miss.
    fn pixel_color(&self, i: u32, j: u32, rng: &mut ChaCha8Rng) -> (Color, u64) {
        let spp = self.config.samples_per_pixel;
        let samples = if self.config.adaptive_sampling {
            let probe = self.camera.get_ray(i, j, rng);
            match self.scene.hit(&probe, Interval::new(T_MIN, f64::INFINITY)) {
                Some(hit) => hit.material.sample_rate(spp).max(1),
                None => 1,
            }
        } else {
            spp
        };

        let mut acc = Color::zero();
        for _ in 0..samples {
            let ray = self.camera.get_ray(i, j, rng);
            acc += self.ray_color(&ray, self.config.max_depth, rng);
        }
        (acc / samples as f64, samples as u64)
    }

    fn render_row(&self, j: u32) -> (Vec<Color>, u64) {
        // One deterministic stream per scanline: identical output for any
        // worker count, not just a fixed one.
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.config
                .seed
                .wrapping_add((j as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );
        let mut row = Vec::with_capacity(self.config.width as usize);
        let mut rays = 0;
        for i in 0..self.config.width {
            let (color, samples) = self.pixel_color(i, j, &mut rng);
            row.push(color);
            rays += samples;
        }
        (row, rays)
    }

    /// Renders the full image, scanline-parallel. Rows are write-disjoint
    /// and the scene is immutable, so workers share nothing mutable.
    pub fn render(&self) -> (Framebuffer, RenderStats) {
        let (w, h) = (self.config.width, self.config.height);
        let progress = RowProgress::new(h);
        let start = Instant::now();

        let trace_rows = || {
            (0..h)
                .into_par_iter()
                .map(|j| {
                    let row = self.render_row(j);
                    progress.tick();
                    row
                })
                .collect::<Vec<_>>()
        };

        let rows = if self.config.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .expect("failed to build render thread pool")
                .install(trace_rows)
        } else {
            trace_rows()
        };
        progress.finish();

        let mut fb = Framebuffer::new(w, h);
        let mut primary_rays = 0;
        for (j, (row, rays)) in rows.into_iter().enumerate() {
            primary_rays += rays;
            for (i, color) in row.into_iter().enumerate() {
                fb.set(i as u32, j as u32, color);
            }
        }

        let elapsed_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            width = w,
            height = h,
            primary_rays,
            elapsed_secs,
            "render pass complete"
        );

        let stats = RenderStats {
            primary_rays,
            elapsed_secs,
            width: w,
            height: h,
            samples_per_pixel: self.config.samples_per_pixel,
        };
        (fb, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn quantize_applies_gamma_and_clamp() {
        let fb = Framebuffer::new(1, 1);
        let config = RenderConfig::default();
        // sqrt(0.25) = 0.5 → 128.
        assert_eq!(fb.quantize(Color::new(0.25, 0.25, 0.25), &config), [128; 3]);
        // Overbright values clamp to the top code.
        assert_eq!(fb.quantize(Color::new(9.0, 9.0, 9.0), &config), [255; 3]);
        // Negative radiance quantises to zero rather than NaN.
        assert_eq!(fb.quantize(Color::new(-1.0, -1.0, -1.0), &config), [0; 3]);
    }

    #[test]
    fn bgr_accessor_swaps_channels() {
        let mut fb = Framebuffer::new(1, 1);
        fb.set(0, 0, Color::new(1.0, 0.0, 0.0));
        let config = RenderConfig {
            gamma: false,
            ..Default::default()
        };
        assert_eq!(fb.to_rgb8(&config), vec![255, 0, 0]);
        assert_eq!(fb.to_bgr8(&config), vec![0, 0, 255]);
    }

    #[test]
    fn reinhard_compresses_highlights() {
        let c = ToneMapOp::Reinhard.apply(Color::new(3.0, 1.0, 0.0));
        assert!((c.x - 0.75).abs() < 1e-12);
        assert!((c.y - 0.5).abs() < 1e-12);
        assert_eq!(c.z, 0.0);
    }

    #[test]
    fn gradient_sky_blends_with_elevation() {
        let sky = SkyModel::Gradient {
            horizon: Color::ones(),
            zenith: Color::zero(),
        };
        let up = Ray::new(Vec3::zero(), Vec3::unit_y());
        let down = Ray::new(Vec3::zero(), -Vec3::unit_y());
        assert!((sky.sample(&up) - Color::zero()).length() < 1e-12);
        assert!((sky.sample(&down) - Color::ones()).length() < 1e-12);
    }
}
