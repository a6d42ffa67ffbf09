use std::ops::{ Add, Sub, Neg, Mul };

use crate::feq;

/// A three-component vector, used for points, directions and colors.
///
/// All operations are pure and return new values.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Partial equality on two vectors.
///
/// Components are compared with a tolerance, accounting for floating point
/// error accumulated while marching.
impl PartialEq for Vec3 {
    fn eq(&self, other: &Vec3) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

/// Conversion from a vector of floats, as found in scene descriptions.
///
/// Missing trailing components default to zero.
impl From<&Vec<f64>> for Vec3 {
    fn from(v: &Vec<f64>) -> Vec3 {
        match v.len() {
            0 => Default::default(),
            1 => Vec3 { x: v[0], ..Default::default() },
            2 => Vec3 { x: v[0], y: v[1], ..Default::default() },
            _ => Vec3 { x: v[0], y: v[1], z: v[2] }
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Vec3 {
        Vec3 { x: v[0], y: v[1], z: v[2] }
    }
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3 { x, y, z }
    }

    /// A vector with every component set to `v`.
    pub fn fill(v: f64) -> Vec3 {
        Vec3 { x: v, y: v, z: v }
    }

    pub fn zero() -> Vec3 {
        Vec3::fill(0.0)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn scale(&self, s: f64) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Returns the unit vector pointing the same way.
    ///
    /// A zero-length (or non-finite) vector has no direction; the zero vector
    /// is returned instead of NaNs.
    pub fn normalize(&self) -> Vec3 {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Vec3::zero();
        }

        self.scale(1.0 / len)
    }

    /// Like `normalize`, but substitutes `fallback` for a degenerate vector.
    pub fn normalize_or(&self, fallback: Vec3) -> Vec3 {
        let n = self.normalize();
        if n.length_squared() == 0.0 {
            fallback
        } else {
            n
        }
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Component-wise product, used to tint colors.
    pub fn hadamard(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    /// Rotates this vector around a unit `axis` by `rad` radians.
    ///
    /// Uses Rodrigues' rotation formula:
    /// `v cos θ + (k × v) sin θ + k (k · v)(1 − cos θ)`.
    ///
    /// ```
    /// # use cloud_marcher::tuple::Vec3;
    /// let v = Vec3::new(1.0, 0.0, 0.0);
    /// let up = Vec3::new(0.0, 1.0, 0.0);
    /// let r = v.rotate(&up, std::f64::consts::FRAC_PI_2);
    /// assert_eq!(r, Vec3::new(0.0, 0.0, -1.0));
    /// ```
    pub fn rotate(&self, axis: &Vec3, rad: f64) -> Vec3 {
        let (sin, cos) = rad.sin_cos();

        let term1 = self.scale(cos);
        let term2 = axis.cross(self).scale(sin);
        let term3 = axis.scale(axis.dot(self) * (1.0 - cos));

        term1 + term2 + term3
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        self.scale(other)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, other: Vec3) -> Vec3 {
        other.scale(self)
    }
}

/// A four-component vector; the integrator uses it for RGB plus alpha.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl PartialEq for Vec4 {
    fn eq(&self, other: &Vec4) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Vec4 {
        Vec4 { x, y, z, w }
    }

    pub fn fill(v: f64) -> Vec4 {
        Vec4 { x: v, y: v, z: v, w: v }
    }

    /// Extends a `Vec3` with a fourth component.
    pub fn from_vec3(v: Vec3, w: f64) -> Vec4 {
        Vec4 { x: v.x, y: v.y, z: v.z, w }
    }

    /// The first three components.
    pub fn xyz(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn scale(&self, s: f64) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }
}

impl Add for Vec4 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vec4 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Mul<f64> for Vec4 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        self.scale(other)
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a = Vec3::new(3.0, -2.0, 5.0);
    let b = Vec3::new(-2.0, 3.0, 1.0);

    assert_eq!(a + b, Vec3::new(1.0, 1.0, 6.0));
}

#[test]
fn sub_vectors() {
    let a = Vec3::new(3.0, 2.0, 1.0);
    let b = Vec3::new(5.0, 6.0, 7.0);

    assert_eq!(a - b, Vec3::new(-2.0, -4.0, -6.0));
}

#[test]
fn neg_vector() {
    assert_eq!(-Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 2.0, -3.0));
}

#[test]
fn mul_scalar() {
    let a = Vec3::new(1.0, -2.0, 3.0);

    assert_eq!(a * 3.5, Vec3::new(3.5, -7.0, 10.5));
    assert_eq!(0.5 * a, Vec3::new(0.5, -1.0, 1.5));
}

#[test]
fn length_of_vector() {
    assert_eq!(Vec3::new(1.0, 2.0, 3.0).length(), f64::sqrt(14.0));
    assert_eq!(Vec3::new(-1.0, -2.0, -3.0).length(), f64::sqrt(14.0));
}

#[test]
fn normalize_clean() {
    assert_eq!(Vec3::new(4.0, 0.0, 0.0).normalize(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn normalize_dirty() {
    let v = Vec3::new(1.0, 2.0, 3.0);
    let e = Vec3::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v.normalize(), e);
    assert!(crate::feq(v.normalize().length(), 1.0));
}

#[test]
fn normalize_zero_is_zero() {
    let n = Vec3::zero().normalize();

    assert!(!n.x.is_nan());
    assert_eq!(n, Vec3::zero());
    assert_eq!(Vec3::zero().normalize_or(Vec3::new(0.0, 0.0, 1.0)),
        Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn dot_vectors() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn cross_vectors() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Vec3::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vec3::new(1.0, -2.0, 1.0));
}

#[test]
fn rotate_preserves_length() {
    let v = Vec3::new(-2.5, 1.5, 0.0);
    let axis = Vec3::new(0.0, 1.0, 0.0);

    for i in 0..8 {
        let r = v.rotate(&axis, i as f64 * 0.7);
        assert!(crate::feq(r.length(), v.length()));
        assert!(crate::feq(r.y, v.y));
    }
}

#[test]
fn rotate_full_turn_is_identity() {
    let v = Vec3::new(1.0, 2.0, 3.0);
    let axis = Vec3::new(1.0, 1.0, 0.0).normalize();

    assert_eq!(v.rotate(&axis, 2.0 * std::f64::consts::PI), v);
}

#[test]
fn from_float_vec_pads_with_zero() {
    assert_eq!(Vec3::from(&vec![1.0, 2.0]), Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(Vec3::from(&vec![1.0, 2.0, 3.0, 4.0]), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn vec4_add_and_scale() {
    let a = Vec4::new(0.1, 0.2, 0.3, 0.5);
    let b = Vec4::from_vec3(Vec3::fill(0.5), 0.75);

    assert_eq!(a + b, Vec4::new(0.6, 0.7, 0.8, 1.25));
    assert_eq!((a + b) - b, a);
    assert_eq!(a * 2.0, Vec4::new(0.2, 0.4, 0.6, 1.0));
    assert_eq!(b.xyz(), Vec3::fill(0.5));
}
