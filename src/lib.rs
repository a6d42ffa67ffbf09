pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;
pub mod light;

pub mod geometry;
pub mod density;
pub mod volume;
pub mod world;
pub mod camera;

pub mod canvas;
pub mod parallel;

pub mod scene;
pub mod update;

use consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}

/// Clamps a value to the range `[0, 1]`.
///
/// NaN is mapped to `0.0`, so a bad sample degrades to background instead of
/// propagating through the image.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }

    value.clamp(0.0, 1.0)
}

/// Linear blend between `a` and `b`; `t == 0` yields `a`.
pub fn mix(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Cubic ease-in curve on `[0, 1]`.
pub fn ease_in_cubic(x: f64) -> f64 {
    x * x * x
}

#[test]
fn clamp01_limits() {
    assert_eq!(clamp01(-0.5), 0.0);
    assert_eq!(clamp01(0.25), 0.25);
    assert_eq!(clamp01(7.0), 1.0);
    assert_eq!(clamp01(f64::NAN), 0.0);
    assert_eq!(clamp01(f64::INFINITY), 1.0);
}

#[test]
fn mix_endpoints() {
    assert!(feq(mix(2.0, 4.0, 0.0), 2.0));
    assert!(feq(mix(2.0, 4.0, 1.0), 4.0));
    assert!(feq(mix(2.0, 4.0, 0.5), 3.0));
}

#[test]
fn ease_in_cubic_is_flat_near_zero() {
    assert_eq!(ease_in_cubic(0.0), 0.0);
    assert_eq!(ease_in_cubic(1.0), 1.0);
    assert!(ease_in_cubic(0.5) < 0.5);
}
