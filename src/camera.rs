use crate::math::{Point3, Ray, Vec3};
use rand::Rng;

/// Look-at description of the viewpoint. `defocus_angle_degrees = 0` gives
/// a pinhole camera; anything larger samples ray origins from a thin-lens
/// disk of radius `focus_dist · tan(defocus_angle / 2)`.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
    pub vfov_degrees: f64,
    pub defocus_angle_degrees: f64,
    pub focus_dist: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_from: Point3::new(0.0, 1.0, 3.0),
            look_at: Point3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            defocus_angle_degrees: 0.0,
            focus_dist: 10.0,
        }
    }
}

/// Generates primary rays for a pixel grid. The viewport is placed at the
/// focus distance along the view direction; pixel (0, 0) is the top-left
/// pixel center and rays are jittered uniformly within `[−0.5, 0.5]²` of
/// the pixel center.
pub struct Camera {
    center: Point3,
    pixel00: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    defocus_angle_degrees: f64,
}

impl Camera {
    /// Builds the camera basis:
    ///   `w = normalize(look_from − look_at)` (backward),
    ///   `u = normalize(vup × w)` (right), `v = w × u` (up).
    /// A coincident `look_from`/`look_at` pair is a programmer error.
    pub fn new(config: &CameraConfig, image_width: u32, image_height: u32) -> Self {
        assert!(
            (config.look_from - config.look_at).length_squared() > 0.0,
            "degenerate camera basis: look_from equals look_at"
        );

        let theta = config.vfov_degrees.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * config.focus_dist;
        let viewport_width = viewport_height * (image_width as f64 / image_height as f64);

        let w = (config.look_from - config.look_at).normalized();
        let u = config.vup.cross(w).normalized();
        let v = w.cross(u);

        let viewport_u = u * viewport_width;
        let viewport_v = -v * viewport_height; // rows grow downward
        let pixel_delta_u = viewport_u / image_width as f64;
        let pixel_delta_v = viewport_v / image_height as f64;

        let center = config.look_from;
        let viewport_upper_left =
            center - w * config.focus_dist - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00 = viewport_upper_left + (pixel_delta_u + pixel_delta_v) * 0.5;

        let defocus_radius =
            config.focus_dist * (config.defocus_angle_degrees / 2.0).to_radians().tan();

        Self {
            center,
            pixel00,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            defocus_angle_degrees: config.defocus_angle_degrees,
        }
    }

    /// A unit-length primary ray through a jittered sample of pixel
    /// `(i, j)` (column, row).
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn rand::RngCore) -> Ray {
        let (dx, dy) = (rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5);
        let pixel_sample = self.pixel00
            + self.pixel_delta_u * (i as f64 + dx)
            + self.pixel_delta_v * (j as f64 + dy);

        let origin = if self.defocus_angle_degrees <= 0.0 {
            self.center
        } else {
            let p = Vec3::random_in_unit_disk(rng);
            self.center + self.defocus_disk_u * p.x + self.defocus_disk_v * p.y
        };

        Ray::new(origin, (pixel_sample - origin).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn test_camera() -> Camera {
        let config = CameraConfig {
            look_from: Point3::new(0.0, 0.0, 3.0),
            look_at: Point3::zero(),
            vfov_degrees: 90.0,
            focus_dist: 3.0,
            ..Default::default()
        };
        Camera::new(&config, 8, 8)
    }

    #[test]
    fn rays_are_unit_length_and_start_at_the_center() {
        let cam = test_camera();
        let mut rng = SmallRng::seed_from_u64(1);
        for j in 0..8 {
            for i in 0..8 {
                let ray = cam.get_ray(i, j, &mut rng);
                assert_eq!(ray.origin, Point3::new(0.0, 0.0, 3.0));
                assert!((ray.direction.length() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn central_rays_point_at_the_look_target() {
        let cam = test_camera();
        let mut rng = SmallRng::seed_from_u64(1);
        // Average of the four central pixels points down the view axis.
        let mut mean = Vec3::zero();
        for _ in 0..200 {
            for (i, j) in [(3, 3), (3, 4), (4, 3), (4, 4)] {
                mean += cam.get_ray(i, j, &mut rng).direction;
            }
        }
        let mean = mean.normalized();
        assert!((mean - Vec3::new(0.0, 0.0, -1.0)).length() < 0.05);
    }

    #[test]
    fn defocus_jitters_the_origin_within_the_lens_radius() {
        let config = CameraConfig {
            look_from: Point3::new(0.0, 0.0, 3.0),
            look_at: Point3::zero(),
            defocus_angle_degrees: 10.0,
            focus_dist: 3.0,
            ..Default::default()
        };
        let cam = Camera::new(&config, 8, 8);
        let radius = 3.0 * (5.0f64).to_radians().tan();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut moved = false;
        for _ in 0..100 {
            let ray = cam.get_ray(4, 4, &mut rng);
            let offset = (ray.origin - Point3::new(0.0, 0.0, 3.0)).length();
            assert!(offset <= radius + 1e-9);
            moved |= offset > 0.0;
        }
        assert!(moved);
    }

    #[test]
    #[should_panic(expected = "degenerate camera basis")]
    fn coincident_look_points_are_rejected() {
        let config = CameraConfig {
            look_from: Point3::zero(),
            look_at: Point3::zero(),
            ..Default::default()
        };
        Camera::new(&config, 8, 8);
    }
}
