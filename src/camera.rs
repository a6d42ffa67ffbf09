use crate::error::{ Error, Result };
use crate::ray::Ray;
use crate::tuple::Vec3;

/// A pinhole camera looking down `+z`.
///
/// The image plane sits `near_plane` units in front of `origin`. It spans
/// `[-1, 1]` vertically and `[-aspect, aspect]` horizontally around
/// `image_plane_center`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub origin: Vec3,

    /// The center of the image plane, in world space.
    pub image_plane_center: Vec3,

    /// Width over height of the rendered image.
    pub aspect_ratio: f64,
}

impl Camera {
    /// Creates a camera at `origin` with the image plane `near_plane` units
    /// ahead of it.
    ///
    /// A zero or negative near plane puts the image plane on or behind the
    /// pinhole, so it is rejected along with a degenerate aspect ratio.
    pub fn new(origin: Vec3, near_plane: f64, aspect_ratio: f64) -> Result<Camera> {
        let valid = near_plane > 0.0 && near_plane.is_finite()
            && aspect_ratio > 0.0 && aspect_ratio.is_finite();
        if !valid {
            return Err(Error::DegenerateCamera { near_plane, aspect: aspect_ratio });
        }

        Ok(Camera {
            origin,
            image_plane_center: origin + Vec3::new(0.0, 0.0, near_plane),
            aspect_ratio,
        })
    }

    /// Creates a camera whose aspect ratio matches a `width` by `height`
    /// image.
    pub fn for_viewport(origin: Vec3, near_plane: f64, width: usize,
        height: usize) -> Result<Camera> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyViewport);
        }

        Camera::new(origin, near_plane, width as f64 / height as f64)
    }

    /// Unit vector from the pinhole through the image plane center.
    pub fn forward(&self) -> Vec3 {
        (self.image_plane_center - self.origin)
            .normalize_or(Vec3::new(0.0, 0.0, 1.0))
    }

    /// Creates the ray through the center of pixel `(px, py)`.
    ///
    /// Image rows grow downward while world `y` grows upward, so the
    /// vertical axis is flipped.
    pub fn make_ray(&self, px: usize, py: usize, width: usize, height: usize) -> Ray {
        let w = width as f64;
        let h = height as f64;

        // Map to [-1, 1], centered around zero
        let canvas_x = (px as f64 / w * 2.0 - 1.0) * self.aspect_ratio;
        let canvas_y = -(py as f64 / h * 2.0 - 1.0);

        // Half a pixel toward the pixel's center
        let dx = 2.0 * self.aspect_ratio / w;
        let dy = 2.0 / h;

        let canvas = Vec3::new(canvas_x + dx * 0.5, canvas_y - dy * 0.5, 0.0)
            + self.image_plane_center;
        let direction = (canvas - self.origin).normalize_or(self.forward());

        Ray { origin: self.origin, direction }
    }
}

#[test]
fn ray_through_corner_pixel() {
    let c = Camera::new(Vec3::zero(), 1.0, 2.0).unwrap();
    let r = c.make_ray(0, 0, 4, 2);

    assert_eq!(r.origin, Vec3::zero());
    assert_eq!(r.direction, Vec3::new(-1.5, 0.5, 1.0).normalize());
}

#[test]
fn rays_are_unit_length() {
    let (w, h) = (17, 9);
    let c = Camera::for_viewport(Vec3::new(0.5, -1.0, 0.0), 1.0, w, h).unwrap();

    for y in 0..h {
        for x in 0..w {
            let r = c.make_ray(x, y, w, h);
            assert!(crate::feq(r.direction.length(), 1.0));
        }
    }
}

#[test]
fn rays_are_mirrored_around_center() {
    let (w, h) = (8, 6);
    let c = Camera::for_viewport(Vec3::zero(), 1.0, w, h).unwrap();

    for y in 0..h {
        for x in 0..w {
            let a = c.make_ray(x, y, w, h).direction;
            let b = c.make_ray(w - 1 - x, h - 1 - y, w, h).direction;
            assert!(crate::feq(a.x, -b.x));
            assert!(crate::feq(a.y, -b.y));
            assert!(crate::feq(a.z, b.z));
        }
    }
}

#[test]
fn top_rows_point_up() {
    let c = Camera::for_viewport(Vec3::zero(), 1.0, 10, 10).unwrap();

    assert!(c.make_ray(5, 0, 10, 10).direction.y > 0.0);
    assert!(c.make_ray(5, 9, 10, 10).direction.y < 0.0);
}

#[test]
fn degenerate_camera_is_rejected() {
    assert!(matches!(Camera::new(Vec3::zero(), 0.0, 1.0),
        Err(Error::DegenerateCamera { .. })));
    assert!(Camera::new(Vec3::zero(), -1.0, 1.0).is_err());
    assert!(Camera::new(Vec3::zero(), 1.0, 0.0).is_err());
    assert!(Camera::new(Vec3::zero(), f64::NAN, 1.0).is_err());
    assert!(matches!(Camera::for_viewport(Vec3::zero(), 1.0, 0, 10),
        Err(Error::EmptyViewport)));
}

#[test]
fn coincident_canvas_point_falls_back_to_forward() {
    // Built by hand; `Camera::new` refuses a zero near plane
    let c = Camera {
        origin: Vec3::zero(),
        image_plane_center: Vec3::zero(),
        aspect_ratio: 1.0,
    };
    let r = c.make_ray(0, 0, 1, 1);

    assert_eq!(r.direction, Vec3::new(0.0, 0.0, 1.0));
}
