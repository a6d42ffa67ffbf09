use std::fmt;
use std::str::FromStr;

use serde::{ Serialize, Deserialize };

use crate::tuple::Vec3;
use crate::volume::VolumeMarch;

/// A point light.
///
/// Light is emitted from `origin` with `color`. The `dir` field describes the
/// same light as a directional one; point-light shading ignores it, but the
/// solid debug march uses it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub origin: Vec3,
    pub dir: Vec3,
    pub color: Vec3,
}

impl PointLight {
    /// Creates a point light; `dir` is normalized.
    pub fn new(origin: Vec3, dir: Vec3, color: Vec3) -> PointLight {
        PointLight { origin, dir: dir.normalize(), color }
    }

    /// Unit vector from `point` toward the light.
    pub fn direction_from(&self, point: Vec3) -> Vec3 {
        (self.origin - point).normalize()
    }
}

/// Beer-Lambert transmittance through a medium.
///
/// Returns the fraction of light that survives travelling `distance` through
/// a medium of optical `density`: `exp(-distance * density)`.
///
/// ```
/// # use cloud_marcher::light::beers_law;
/// assert_eq!(beers_law(0.0, 3.0), 1.0);
/// assert!(beers_law(2.0, 3.0) < beers_law(1.0, 3.0));
/// ```
pub fn beers_law(distance: f64, density: f64) -> f64 {
    (-distance * density).exp()
}

/// How light is applied while integrating through a volume.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingType {
    /// Flat cloud color; opacity comes from absorption alone.
    NoLight,
    /// Cloud color modulated by the angle between normal and light.
    NaiveLight,
    /// A secondary march toward the light measures how much light reaches
    /// every sample.
    RayMarchedLight,
}

impl Default for ShadingType {
    fn default() -> ShadingType {
        ShadingType::RayMarchedLight
    }
}

impl fmt::Display for ShadingType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ShadingType::NoLight => "no-light",
            ShadingType::NaiveLight => "naive-light",
            ShadingType::RayMarchedLight => "ray-marched-light",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ShadingType {
    type Err = String;

    fn from_str(s: &str) -> Result<ShadingType, String> {
        match s {
            "no-light" | "none" => Ok(ShadingType::NoLight),
            "naive-light" | "naive" => Ok(ShadingType::NaiveLight),
            "ray-marched-light" | "ray-marched" => Ok(ShadingType::RayMarchedLight),
            _ => Err(format!("unknown shading type '{}'", s)),
        }
    }
}

/// Per-step light contribution at a sample inside the volume.
///
/// `local` is the sample in sphere-local space, `point` the same sample in
/// world space. The integrator averages the returned values over a segment
/// and tints the cloud color with the result.
pub type Shader = fn(march: &VolumeMarch<'_>, local: Vec3, point: Vec3) -> Vec3;

impl ShadingType {
    /// Resolves the policy to a shading function, once per render pass.
    pub fn shader(self) -> Shader {
        match self {
            ShadingType::NoLight => shade_unlit,
            ShadingType::NaiveLight => shade_naive,
            ShadingType::RayMarchedLight => shade_ray_marched,
        }
    }
}

fn shade_unlit(_: &VolumeMarch, _: Vec3, _: Vec3) -> Vec3 {
    Vec3::fill(1.0)
}

fn shade_naive(m: &VolumeMarch, local: Vec3, point: Vec3) -> Vec3 {
    let light = &m.world.light;

    // Translation-only scene: directions are the same in local and world
    let normal = m.world.sphere.normal_at(local);
    let factor = normal.dot(&light.direction_from(point)).max(0.0);
    light.color * factor
}

fn shade_ray_marched(m: &VolumeMarch, _: Vec3, point: Vec3) -> Vec3 {
    let (density, distance) = m.march_light(point);
    m.world.light.color * beers_law(distance, density)
}

#[test]
fn beers_law_is_one_without_medium() {
    assert_eq!(beers_law(0.0, 5.0), 1.0);
    assert_eq!(beers_law(5.0, 0.0), 1.0);
}

#[test]
fn beers_law_decreases_in_both_arguments() {
    let mut prev = 1.0;
    for i in 1..20 {
        let t = beers_law(i as f64 * 0.5, 0.3);
        assert!(t < prev);
        prev = t;
    }

    let mut prev = 1.0;
    for i in 1..20 {
        let t = beers_law(0.3, i as f64 * 0.5);
        assert!(t < prev);
        prev = t;
    }
}

#[test]
fn beers_law_approaches_zero() {
    assert!(beers_law(100.0, 1.0) < 1e-40);
    assert!(beers_law(1.0, 1e6) >= 0.0);
    assert!(beers_law(1.0, 1e6) < 1e-9);
}

#[test]
fn shading_type_parses_names() {
    assert_eq!("no-light".parse::<ShadingType>(), Ok(ShadingType::NoLight));
    assert_eq!("naive".parse::<ShadingType>(), Ok(ShadingType::NaiveLight));
    assert_eq!(ShadingType::RayMarchedLight.to_string().parse::<ShadingType>(),
        Ok(ShadingType::RayMarchedLight));
    assert!("phong".parse::<ShadingType>().is_err());
}

#[test]
fn light_direction_is_unit() {
    let light = PointLight::new(
        Vec3::new(-2.5, 1.5, 2.0),
        Vec3::new(-1.5, 1.5, 0.75),
        Vec3::fill(1.0),
    );

    assert!(crate::feq(light.dir.length(), 1.0));
    assert!(crate::feq(light.direction_from(Vec3::zero()).length(), 1.0));
    assert_eq!(light.direction_from(Vec3::new(-2.5, 0.0, 2.0)),
        Vec3::new(0.0, 1.0, 0.0));
}
