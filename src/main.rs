use anyhow::Context;
use clap::Parser;
use lumen::bvh::SplitMethod;
use lumen::camera::Camera;
use lumen::display::{self, OutputMode};
use lumen::hittable::Scene;
use lumen::material::{BvhDepthVisual, BvhGroupVisual, Material};
use lumen::math::Point3;
use lumen::presets::{PresetOptions, SceneDescription, ScenePreset};
use lumen::renderer::{PathTracer, RenderConfig, ToneMapOp};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// lumen-cli — path trace scenes in your terminal or to PNG
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lumen-cli",
    version,
    about = "An offline path tracer with a SAH BVH core 🦀",
    long_about = "Renders physically-based scenes with Monte Carlo path tracing over a \
                  surface-area-heuristic BVH. Scenes come from built-in presets or a \
                  Wavefront OBJ file; output goes to the terminal, PPM, or PNG.",
    after_help = "EXAMPLES:\n  \
                  lumen-cli --scene showcase --mode halfblock\n  \
                  lumen-cli --scene cornell --spp 200 --bounces 20\n  \
                  lumen-cli --scene mesh --obj model/room.obj --rotate 30 -o room.png\n  \
                  lumen-cli --scene stress --bvh-depth-vis 20 --spp 1 --bounces 1\n  \
                  lumen-cli --scene stress --interactive"
)]
struct Cli {
    /// Scene preset to render
    #[arg(short, long, value_enum, default_value_t = ScenePreset::Showcase)]
    scene: ScenePreset,

    /// Image width in pixels
    #[arg(short = 'W', long, default_value_t = 120)]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'H', long, default_value_t = 60)]
    height: u32,

    /// Samples per pixel — higher values reduce noise at the cost of
    /// render time
    #[arg(long, default_value_t = 32)]
    spp: u32,

    /// Maximum ray bounce depth. Glass and deep interreflections need
    /// more; 8–16 is typically sufficient
    #[arg(long, default_value_t = 12)]
    bounces: u32,

    /// Base seed for all stochastic sampling and scene placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Worker thread count (0 = one per core)
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,

    /// Maximum primitives per BVH leaf
    #[arg(long, default_value_t = 5)]
    leaf_size: usize,

    /// BVH partitioning strategy
    #[arg(long, value_enum, default_value_t = CliSplitMethod::Sah)]
    split: CliSplitMethod,

    /// Disable the per-material sample-count hints and always trace the
    /// full sample budget
    #[arg(long)]
    no_sample_hints: bool,

    /// Color each hit by its BVH leaf depth, normalized by this expected
    /// tree height (mesh and stress scenes)
    #[arg(long, value_name = "HEIGHT")]
    bvh_depth_vis: Option<u32>,

    /// Color each hit by its BVH subtree below this root path, e.g. "010"
    /// ("." for the root)
    #[arg(long, value_name = "PATH")]
    bvh_path_vis: Option<String>,

    /// How many path bits below the root distinguish subtree colors
    #[arg(long, default_value_t = 4, value_name = "BITS")]
    bvh_path_vis_depth: u32,

    /// Wavefront OBJ file for the mesh scene
    #[arg(long, value_name = "FILE")]
    obj: Option<PathBuf>,

    /// Rotate the loaded mesh about +y, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate: f64,

    /// Override the camera position
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    look_from: Option<Vec<f64>>,

    /// Override the camera target
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    look_at: Option<Vec<f64>>,

    /// Override the vertical field of view, in degrees
    #[arg(long)]
    vfov: Option<f64>,

    /// Terminal output encoding mode
    #[arg(short, long, value_enum, default_value_t = CliOutputMode::Halfblock)]
    mode: CliOutputMode,

    /// Tone mapping operator applied at output time
    #[arg(long, value_enum, default_value_t = CliToneMap::None)]
    tone_map: CliToneMap,

    /// Disable gamma correction (emit linear radiance)
    #[arg(long)]
    no_gamma: bool,

    /// Skip the terminal display (useful with --output in scripts)
    #[arg(long)]
    no_display: bool,

    /// Also write the frame to this file (.png or .ppm)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// After the first frame, read new options from stdin and re-render
    /// until EOF or "quit"
    #[arg(long)]
    interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliSplitMethod {
    /// Surface-area heuristic with a median fallback
    Sah,
    /// Median split along the longest axis
    Middle,
}

impl From<CliSplitMethod> for SplitMethod {
    fn from(m: CliSplitMethod) -> Self {
        match m {
            CliSplitMethod::Sah => SplitMethod::Sah,
            CliSplitMethod::Middle => SplitMethod::Middle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputMode {
    /// Unicode braille patterns — highest effective resolution (2×4 subpixel)
    Braille,
    /// Full-block characters with 24-bit true color
    Truecolor,
    /// Half-block characters (▀) — 2 vertical pixels per cell
    Halfblock,
    /// ASCII grayscale density ramp
    Ascii,
}

impl From<CliOutputMode> for OutputMode {
    fn from(m: CliOutputMode) -> Self {
        match m {
            CliOutputMode::Braille => OutputMode::Braille,
            CliOutputMode::Truecolor => OutputMode::TrueColor,
            CliOutputMode::Halfblock => OutputMode::HalfBlock,
            CliOutputMode::Ascii => OutputMode::Ascii,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliToneMap {
    None,
    Reinhard,
    Aces,
}

impl From<CliToneMap> for ToneMapOp {
    fn from(m: CliToneMap) -> Self {
        match m {
            CliToneMap::None => ToneMapOp::None,
            CliToneMap::Reinhard => ToneMapOp::Reinhard,
            CliToneMap::Aces => ToneMapOp::Aces,
        }
    }
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            height: self.height,
            samples_per_pixel: self.spp,
            max_depth: self.bounces,
            seed: self.seed,
            threads: self.threads,
            adaptive_sampling: !self.no_sample_hints,
            gamma: !self.no_gamma,
            tone_map: self.tone_map.into(),
        }
    }

    fn diagnostic_material(&self) -> Option<Arc<dyn Material>> {
        if let Some(height) = self.bvh_depth_vis {
            return Some(Arc::new(BvhDepthVisual::new(height)));
        }
        if let Some(path) = &self.bvh_path_vis {
            let root = if path == "." { "" } else { path.as_str() };
            return Some(Arc::new(BvhGroupVisual::new(root, self.bvh_path_vis_depth)));
        }
        None
    }

    fn preset_options(&self) -> PresetOptions {
        PresetOptions {
            obj_path: self.obj.clone(),
            rotate_degrees: self.rotate,
            override_material: self.diagnostic_material(),
            seed: self.seed,
        }
    }

    /// Everything that forces a scene + BVH rebuild when it changes.
    #[allow(clippy::type_complexity)]
    fn scene_signature(
        &self,
    ) -> (
        ScenePreset,
        Option<PathBuf>,
        u64,
        usize,
        CliSplitMethod,
        u64,
        Option<u32>,
        Option<String>,
        u32,
    ) {
        (
            self.scene,
            self.obj.clone(),
            self.rotate.to_bits(),
            self.leaf_size,
            self.split,
            self.seed,
            self.bvh_depth_vis,
            self.bvh_path_vis.clone(),
            self.bvh_path_vis_depth,
        )
    }
}

fn print_header(scene_name: &str, cli: &Cli) {
    eprintln!();
    eprintln!("  ╔═══════════════════════════════════════════════╗");
    eprintln!("  ║  lumen-cli ✦  Offline Path Tracer             ║");
    eprintln!("  ╚═══════════════════════════════════════════════╝");
    eprintln!();
    eprintln!("  Scene:    {scene_name}");
    eprintln!("  Size:     {}×{} px", cli.width, cli.height);
    eprintln!("  Samples:  {} spp", cli.spp);
    eprintln!("  Bounces:  {}", cli.bounces);
    eprintln!("  BVH:      {:?}, leaf ≤ {}", cli.split, cli.leaf_size);
    eprintln!();
}

/// Builds the scene described by the CLI and its acceleration structure.
fn build_scene(cli: &Cli) -> anyhow::Result<(SceneDescription, Scene)> {
    let load_start = Instant::now();
    let mut desc = cli
        .scene
        .build(&cli.preset_options())
        .context("building scene")?;

    if let Some(v) = &cli.look_from {
        desc.camera_config.look_from = Point3::new(v[0], v[1], v[2]);
    }
    if let Some(v) = &cli.look_at {
        desc.camera_config.look_at = Point3::new(v[0], v[1], v[2]);
    }
    if let Some(vfov) = cli.vfov {
        desc.camera_config.vfov_degrees = vfov;
    }
    tracing::info!(
        scene = desc.name,
        objects = desc.objects.len(),
        elapsed_ms = load_start.elapsed().as_millis() as u64,
        "scene built"
    );

    let mut scene = Scene::from_objects(desc.objects.clone());
    scene.build_bvh(cli.leaf_size, cli.split.into());
    Ok((desc, scene))
}

fn render_once(cli: &Cli, desc: &SceneDescription, scene: &Scene) -> anyhow::Result<()> {
    let config = cli.render_config();
    let camera = Camera::new(&desc.camera_config, config.width, config.height);

    print_header(desc.name, cli);

    let tracer = PathTracer {
        scene,
        camera: &camera,
        config: &config,
        sky: desc.sky,
    };
    let (framebuffer, stats) = tracer.render();
    stats.print_summary();
    eprintln!();

    if !cli.no_display {
        display::display_framebuffer(&framebuffer, &config, cli.mode.into());
    }
    if let Some(path) = &cli.output {
        display::save_image(&framebuffer, &config, path)?;
    }
    Ok(())
}

/// Reads option lines from stdin and re-renders after each one, keeping
/// unmentioned options as they were. Geometry is rebuilt only when a
/// scene-affecting option changed.
fn interactive_loop(mut cli: Cli, mut desc: SceneDescription, mut scene: Scene) -> anyhow::Result<()> {
    let stdin = io::stdin();
    loop {
        eprint!("lumen> ");
        io::stderr().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "q" | "quit" | "exit") {
            return Ok(());
        }

        let before = cli.scene_signature();
        let args = std::iter::once("lumen-cli").chain(line.split_whitespace());
        if let Err(err) = cli.try_update_from(args) {
            eprintln!("{err}");
            continue;
        }

        if cli.scene_signature() != before {
            match build_scene(&cli) {
                Ok((new_desc, new_scene)) => {
                    desc = new_desc;
                    scene = new_scene;
                }
                Err(err) => {
                    eprintln!("E: {err:#}");
                    continue;
                }
            }
        } else {
            // Camera overrides apply without a rebuild.
            if let Some(v) = &cli.look_from {
                desc.camera_config.look_from = Point3::new(v[0], v[1], v[2]);
            }
            if let Some(v) = &cli.look_at {
                desc.camera_config.look_at = Point3::new(v[0], v[1], v[2]);
            }
            if let Some(vfov) = cli.vfov {
                desc.camera_config.vfov_degrees = vfov;
            }
        }

        if let Err(err) = render_once(&cli, &desc, &scene) {
            eprintln!("E: {err:#}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (desc, scene) = build_scene(&cli)?;
    render_once(&cli, &desc, &scene)?;

    if cli.interactive {
        interactive_loop(cli, desc, scene)?;
    }
    Ok(())
}
