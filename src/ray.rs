use crate::tuple::Vec3;

/// A ray with a unit-length direction.
///
/// The camera creates one per pixel. Marching works on a copy that is
/// advanced along `direction`; the caller's ray is never touched.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Ray {
        Ray { origin, direction: direction.normalize() }
    }

    pub fn position(&self, t: f64) -> Vec3 {
        self.origin + (t * self.direction)
    }

    /// Moves the origin `t` units along the direction.
    pub fn advance(&mut self, t: f64) {
        self.origin = self.position(t);
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(Vec3::new(2.0, 3.0, 4.0), Vec3::new(1.0, 0.0, 0.0));

    assert_eq!(r.position(0.0), Vec3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vec3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vec3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vec3::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_direction_is_normalized() {
    let r = Ray::new(Vec3::zero(), Vec3::new(0.0, 3.0, 4.0));

    assert_eq!(r.direction, Vec3::new(0.0, 0.6, 0.8));
}

#[test]
fn ray_advance_moves_copy_only() {
    let r = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
    let mut marching = r;
    marching.advance(1.5);

    assert_eq!(marching.origin, Vec3::new(0.0, 0.0, 1.5));
    assert_eq!(r.origin, Vec3::zero());
}
