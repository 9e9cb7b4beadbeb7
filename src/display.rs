use crate::math::Color;
use crate::renderer::{Framebuffer, RenderConfig};
use crossterm::style::{self, Stylize};
use std::io::{self, Write};
use std::path::Path;

/// How a finished frame reaches the user's terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Unicode braille patterns (2×4 dots per cell) with ANSI true-color.
    Braille,
    /// ANSI 24-bit true-color using full-block characters.
    TrueColor,
    /// Half-block rendering with separate fg/bg colors — 2 vertical pixels
    /// per cell.
    HalfBlock,
    /// ASCII grayscale density ramp.
    Ascii,
}

fn luminance(c: Color) -> f64 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

fn rgb8(fb: &Framebuffer, config: &RenderConfig, x: u32, y: u32) -> style::Color {
    let [r, g, b] = fb.quantize(fb.get(x, y), config);
    style::Color::Rgb { r, g, b }
}

pub fn display_framebuffer(fb: &Framebuffer, config: &RenderConfig, mode: OutputMode) {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    match mode {
        OutputMode::TrueColor => display_truecolor(&mut out, fb, config),
        OutputMode::HalfBlock => display_halfblock(&mut out, fb, config),
        OutputMode::Ascii => display_ascii(&mut out, fb, config),
        OutputMode::Braille => display_braille(&mut out, fb, config),
    }
    let _ = out.flush();
}

fn display_truecolor(out: &mut impl Write, fb: &Framebuffer, config: &RenderConfig) {
    for y in 0..fb.height {
        for x in 0..fb.width {
            let _ = write!(out, "{}", "█".with(rgb8(fb, config, x, y)));
        }
        let _ = writeln!(out);
    }
}

fn display_halfblock(out: &mut impl Write, fb: &Framebuffer, config: &RenderConfig) {
    for row in 0..fb.height / 2 {
        for x in 0..fb.width {
            let top = rgb8(fb, config, x, row * 2);
            let bottom = rgb8(fb, config, x, row * 2 + 1);
            let _ = write!(out, "{}", "▀".with(top).on(bottom));
        }
        let _ = writeln!(out);
    }
}

fn display_ascii(out: &mut impl Write, fb: &Framebuffer, config: &RenderConfig) {
    const RAMP: &[u8] = b" .:-=+*#%@";
    for y in 0..fb.height {
        for x in 0..fb.width {
            let c = config.tone_map.apply(fb.get(x, y));
            let idx = (luminance(c).clamp(0.0, 0.999) * RAMP.len() as f64) as usize;
            let _ = write!(out, "{}", RAMP[idx] as char);
        }
        let _ = writeln!(out);
    }
}

/// Braille rendering — each cell (U+2800..U+28FF) encodes a 2×4 dot
/// matrix, so a character covers 2×4 framebuffer pixels. Dots brighter
/// than a threshold are lit; the cell is colored by their average.
fn display_braille(out: &mut impl Write, fb: &Framebuffer, config: &RenderConfig) {
    // Unicode braille dot-to-bit layout per 2×4 cell:
    //   (0,0)→0  (1,0)→3
    //   (0,1)→1  (1,1)→4
    //   (0,2)→2  (1,2)→5
    //   (0,3)→6  (1,3)→7
    const OFFSETS: [(u32, u32, u8); 8] = [
        (0, 0, 0),
        (0, 1, 1),
        (0, 2, 2),
        (1, 0, 3),
        (1, 1, 4),
        (1, 2, 5),
        (0, 3, 6),
        (1, 3, 7),
    ];

    for row in 0..fb.height / 4 {
        for col in 0..fb.width / 2 {
            let mut pattern: u8 = 0;
            let mut avg_color = Color::zero();
            let mut lit = 0u32;

            for &(dx, dy, bit) in &OFFSETS {
                let (px, py) = (col * 2 + dx, row * 4 + dy);
                if px < fb.width && py < fb.height {
                    let c = fb.get(px, py);
                    if luminance(c) > 0.15 {
                        pattern |= 1 << bit;
                        avg_color += c;
                        lit += 1;
                    }
                }
            }
            if lit > 0 {
                avg_color /= lit as f64;
            }

            let ch = char::from_u32(0x2800 + pattern as u32).unwrap_or(' ');
            let [r, g, b] = fb.quantize(avg_color, config);
            let _ = write!(
                out,
                "{}",
                ch.to_string().with(style::Color::Rgb { r, g, b })
            );
        }
        let _ = writeln!(out);
    }
}

// ─── File Export ────────────────────────────────────────────────────────────

/// Writes the frame as binary PPM (P6): RGB triplets, one byte per
/// channel, no compression.
pub fn write_ppm(fb: &Framebuffer, config: &RenderConfig, path: impl AsRef<Path>) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write!(file, "P6\n{} {}\n255\n", fb.width, fb.height)?;
    file.write_all(&fb.to_rgb8(config))?;
    file.flush()
}

/// Encodes the frame as PNG.
pub fn write_png(
    fb: &Framebuffer,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> image::ImageResult<()> {
    let image =
        image::RgbImage::from_raw(fb.width, fb.height, fb.to_rgb8(config)).expect("sized buffer");
    image.save(path)
}

/// Dispatches on the file extension: `.ppm` gets the raw P6 writer,
/// everything else goes through the PNG/image encoder.
pub fn save_image(fb: &Framebuffer, config: &RenderConfig, path: &Path) -> anyhow::Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ppm") => write_ppm(fb, config, path)?,
        _ => write_png(fb, config, path)?,
    }
    tracing::info!(path = %path.display(), "image written");
    Ok(())
}
