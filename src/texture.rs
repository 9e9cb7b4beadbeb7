use crate::interval::Interval;
use crate::math::Color;
use std::path::Path;

/// A surface color evaluated at texture coordinates `(u, v)`.
///
/// Evaluators must be pure and safe for concurrent reads. Callers are
/// expected to deliver `u, v` already in `[0,1]`; out-of-range inputs are
/// clamped defensively rather than wrapped.
pub trait Texture: Send + Sync {
    fn value(&self, u: f64, v: f64) -> Color;
}

// ─── Solid Color ────────────────────────────────────────────────────────────

pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub const fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f64, _v: f64) -> Color {
        self.albedo
    }
}

// ─── Image Texture ──────────────────────────────────────────────────────────

/// Loud fallback for missing or undecodable texture data — failures should
/// be visible in the render, not silent.
const FALLBACK_MAGENTA: Color = Color::new(1.0, 0.0, 1.0);

/// An image-backed texture. V is flipped so that `v = 0` addresses the
/// bottom image row; lookups clamp to the image bounds.
pub struct ImageTexture {
    image: Option<image::RgbImage>,
}

impl ImageTexture {
    /// Decodes the image at `path`. A missing or unreadable file is not an
    /// error: the texture renders magenta so the failure is obvious.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let image = match image::open(path) {
            Ok(img) => Some(img.into_rgb8()),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to load texture");
                None
            }
        };
        Self { image }
    }

    pub fn from_image(image: image::RgbImage) -> Self {
        Self { image: Some(image) }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f64, v: f64) -> Color {
        let Some(image) = &self.image else {
            return FALLBACK_MAGENTA;
        };

        let unit = Interval::new(0.0, 1.0);
        let u = unit.clamp(u);
        let v = 1.0 - unit.clamp(v); // image rows grow downward

        let i = ((u * image.width() as f64) as u32).min(image.width() - 1);
        let j = ((v * image.height() as f64) as u32).min(image.height() - 1);
        let pixel = image.get_pixel(i, j);
        Color::new(
            pixel[0] as f64 / 255.0,
            pixel[1] as f64 / 255.0,
            pixel[2] as f64 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn solid_color_ignores_uv() {
        let t = SolidColor::new(Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(t.value(0.0, 0.0), t.value(0.9, -3.0));
    }

    #[test]
    fn missing_image_is_magenta() {
        let t = ImageTexture { image: None };
        assert_eq!(t.value(0.5, 0.5), FALLBACK_MAGENTA);
    }

    #[test]
    fn image_lookup_flips_v() {
        // 1×2 image: bottom row black, top row white.
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 255, 255]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 0]));
        let t = ImageTexture::from_image(img);
        assert_eq!(t.value(0.5, 0.01), Vec3::zero());
        assert_eq!(t.value(0.5, 0.99), Vec3::ones());
    }

    #[test]
    fn out_of_range_uv_is_clamped() {
        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        let t = ImageTexture::from_image(img);
        assert_eq!(t.value(7.0, 5.0), t.value(1.0, 1.0));
    }
}
