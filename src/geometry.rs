use crate::error::{ Error, Result };
use crate::tuple::Vec3;

/// Signed distance from a point to a sphere centered at the origin.
///
/// Negative inside, zero on the surface, positive outside. The magnitude is
/// the exact Euclidean distance to the surface, which makes it a safe sphere
/// tracing step.
pub fn sdf_sphere(p: Vec3, radius: f64) -> f64 {
    p.length() - radius
}

/// A sphere-shaped volume.
///
/// Only translation is supported; there is no rotation or scaling, so
/// directions are the same in world and sphere-local space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Result<Sphere> {
        if radius <= 0.0 || !radius.is_finite() {
            return Err(Error::DegenerateSphere { radius });
        }

        Ok(Sphere { center, radius })
    }

    /// Translates a world point into sphere-local space.
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        p - self.center
    }

    /// Signed distance from a world point to this sphere's surface.
    pub fn sdf(&self, p: Vec3) -> f64 {
        sdf_sphere(self.to_local(p), self.radius)
    }

    /// Outward surface normal at the sphere-local point `local`.
    pub fn normal_at(&self, local: Vec3) -> Vec3 {
        local.normalize()
    }
}

#[test]
fn sdf_at_center_is_negative_radius() {
    let s = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 1.5).unwrap();

    assert!(crate::feq(s.sdf(s.center), -1.5));
    assert!(crate::feq(sdf_sphere(Vec3::zero(), 2.0), -2.0));
}

#[test]
fn sdf_on_surface_is_zero() {
    let s = Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap();

    assert!(crate::feq(s.sdf(Vec3::new(0.0, 0.0, 1.0)), 0.0));
    assert!(crate::feq(s.sdf(Vec3::new(0.0, 1.0, 2.0)), 0.0));
    let diag = Vec3::new(1.0, 1.0, 1.0).normalize();
    assert!(crate::feq(s.sdf(s.center + diag), 0.0));
}

#[test]
fn sdf_increases_outward_along_ray() {
    let s = Sphere::new(Vec3::zero(), 1.0).unwrap();
    let dir = Vec3::new(0.3, -0.4, 0.5).normalize();

    let mut prev = s.sdf(dir * 1.0);
    for i in 1..50 {
        let d = s.sdf(dir * (1.0 + i as f64 * 0.25));
        assert!(d > prev);
        prev = d;
    }
}

#[test]
fn degenerate_sphere_is_rejected() {
    assert!(matches!(Sphere::new(Vec3::zero(), 0.0),
        Err(Error::DegenerateSphere { .. })));
    assert!(Sphere::new(Vec3::zero(), -1.0).is_err());
    assert!(Sphere::new(Vec3::zero(), f64::NAN).is_err());
    assert!(Sphere::new(Vec3::zero(), f64::INFINITY).is_err());
}

#[test]
fn normal_points_outward() {
    let s = Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap();
    let local = s.to_local(Vec3::new(0.0, 0.5, 2.0));

    assert_eq!(s.normal_at(local), Vec3::new(0.0, 1.0, 0.0));
}
