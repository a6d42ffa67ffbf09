use crate::clamp01;
use crate::matrix::Matrix3D;
use crate::tuple::{ Vec3, Vec4 };

/// An 8-bit RGBA pixel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Pixel {
        Pixel { r, g, b, a }
    }

    /// Quantizes a floating point color and alpha.
    ///
    /// Components are clamped to `[0, 1]` first, so accumulated values that
    /// went out of range saturate instead of wrapping.
    pub fn from_vec4(c: Vec4) -> Pixel {
        Pixel {
            r: byte_from_float(c.x),
            g: byte_from_float(c.y),
            b: byte_from_float(c.z),
            a: byte_from_float(c.w),
        }
    }

    /// Quantizes an opaque color.
    pub fn from_vec3(c: Vec3) -> Pixel {
        Pixel::from_vec4(Vec4::from_vec3(c, 1.0))
    }
}

/// Maps `[0, 1]` to `[0, 255]`, truncating. NaN maps to 0.
pub fn byte_from_float(f: f64) -> u8 {
    (clamp01(f) * 255.0) as u8
}

/// The image a frame is rendered into.
///
/// Pixels are stored row-major. A render pass overwrites every pixel; nothing
/// carries over from the previous frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTarget {
    /// The width of the image, in pixels.
    pub width: usize,

    /// The height of the image, in pixels.
    pub height: usize,

    pixels: Vec<Pixel>,
}

impl ImageTarget {
    /// Creates a `width` by `height` image filled with `fill`.
    pub fn new(width: usize, height: usize, fill: Pixel) -> ImageTarget {
        ImageTarget {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Mutable access to the pixel storage, for dispatching rows to workers.
    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Writes a pixel at column `x`, row `y`.
    ///
    /// Out-of-bounds pixels are ignored.
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: Pixel) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = pixel;
    }

    /// Reads the pixel at column `x`, row `y`, or `None` if out of bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// The image as tightly packed RGBA8 bytes, `width * height * 4` long.
    pub fn as_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.copy_rgba_bytes(&mut out);
        out
    }

    /// Copies the image into `out` as tightly packed RGBA8 bytes, ready to be
    /// uploaded to a display texture.
    ///
    /// `out` is reused between frames to avoid reallocating.
    pub fn copy_rgba_bytes(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.pixels.len() * 4);
        for p in self.pixels.iter() {
            out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
    }

    /// Fraction of pixels with non-zero alpha.
    pub fn coverage(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }

        let covered = self.pixels.iter().filter(|p| p.a > 0).count();
        covered as f64 / self.pixels.len() as f64
    }

    /// Draws the z-slice `z` of a noise lattice as grayscale.
    ///
    /// The lattice wraps, so images larger than the lattice show it tiled.
    pub fn write_lattice_slice(&mut self, lattice: &Matrix3D<f64>, z: i64) {
        let width = self.width;
        for (y, row) in self.pixels.chunks_mut(width.max(1)).enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                let value = lattice.get(x as i64, y as i64, z);
                *pixel = Pixel::from_vec3(Vec3::fill(value));
            }
        }
    }
}

#[test]
fn quantize_clamps_out_of_range() {
    let p = Pixel::from_vec4(Vec4::new(1.7, -0.3, 0.5, 2.0));

    assert_eq!(p, Pixel::rgba(255, 0, 127, 255));
}

#[test]
fn quantize_nan_is_zero() {
    assert_eq!(byte_from_float(f64::NAN), 0);
    assert_eq!(byte_from_float(1.0), 255);
    assert_eq!(byte_from_float(0.0), 0);
}

#[test]
fn write_and_read_pixel() {
    let purple = Pixel::rgba(255, 0, 255, 255);
    let mut image = ImageTarget::new(8, 8, Pixel::default());

    image.write_pixel(4, 2, purple);
    assert_eq!(image.read_pixel(4, 2), Some(purple));
    assert_eq!(image.pixels()[2 * 8 + 4], purple);
}

#[test]
fn out_of_bounds_pixels_are_ignored() {
    let mut image = ImageTarget::new(2, 2, Pixel::default());

    image.write_pixel(2, 0, Pixel::rgba(1, 2, 3, 4));
    assert_eq!(image.read_pixel(2, 0), None);
    assert!(image.pixels().iter().all(|p| *p == Pixel::default()));
}

#[test]
fn rgba_bytes_are_packed() {
    let mut image = ImageTarget::new(2, 1, Pixel::rgba(20, 20, 20, 255));
    image.write_pixel(1, 0, Pixel::rgba(1, 2, 3, 4));

    let mut bytes = vec![9; 100];
    image.copy_rgba_bytes(&mut bytes);
    assert_eq!(bytes, vec![20, 20, 20, 255, 1, 2, 3, 4]);
    assert_eq!(image.as_rgba_bytes(), bytes);
}

#[test]
fn coverage_counts_alpha() {
    let mut image = ImageTarget::new(2, 2, Pixel::default());
    assert_eq!(image.coverage(), 0.0);

    image.write_pixel(0, 0, Pixel::rgba(0, 0, 0, 1));
    assert_eq!(image.coverage(), 0.25);
}

#[test]
fn lattice_slice_is_tiled_grayscale() {
    let mut lattice: Matrix3D<f64> = Matrix3D::new(2, 2, 3);
    lattice.set(1.0, 1, 0, 2);

    let mut image = ImageTarget::new(4, 2, Pixel::default());
    image.write_lattice_slice(&lattice, 2);

    let white = Pixel::rgba(255, 255, 255, 255);
    let black = Pixel::rgba(0, 0, 0, 255);
    assert_eq!(image.read_pixel(1, 0), Some(white));
    assert_eq!(image.read_pixel(3, 0), Some(white));
    assert_eq!(image.read_pixel(0, 0), Some(black));
    assert_eq!(image.read_pixel(1, 1), Some(black));

    // Slice z = -1 wraps to z = 2
    image.write_lattice_slice(&lattice, -1);
    assert_eq!(image.read_pixel(1, 0), Some(white));
}
