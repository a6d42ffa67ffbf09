use crate::density::DensityField;
use crate::geometry::Sphere;
use crate::light::PointLight;

/// The scene being rendered: a single cloud volume and the light on it.
///
/// During a render pass the world is only read, so worker threads share it
/// by reference through a `VolumeMarch`, which computes the color along each
/// ray. The main thread may change the sphere or light between passes.
pub struct World {
    pub sphere: Sphere,
    pub light: PointLight,
    pub density: DensityField,
}

impl World {
    pub fn new(sphere: Sphere, light: PointLight, density: DensityField) -> World {
        World { sphere, light, density }
    }
}
