use std::convert::TryFrom;
use std::fs;
use std::path::{ Path, PathBuf };

use serde::{ Serialize, Deserialize };
use tracing::info;

use crate::camera::Camera;
use crate::consts::*;
use crate::density::{ DensityField, DensityType };
use crate::error::{ Error, Result };
use crate::geometry::Sphere;
use crate::light::{ PointLight, ShadingType };
use crate::tuple::{ Vec3, Vec4 };
use crate::world::World;

/// How the step size inside the volume is chosen.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum StepMode {
    /// `radius / steps`, so every sphere gets the same number of samples
    /// along its radius.
    ScaleToObject { steps: usize },
    /// A fixed world-space step.
    Fixed { resolution: f64 },
}

impl StepMode {
    /// The step size for a sphere of `radius`.
    ///
    /// ```
    /// # use cloud_marcher::scene::StepMode;
    /// assert_eq!(StepMode::ScaleToObject { steps: 10 }.step_size(2.0), 0.2);
    /// assert_eq!(StepMode::Fixed { resolution: 0.1 }.step_size(2.0), 0.1);
    /// ```
    pub fn step_size(&self, radius: f64) -> f64 {
        match *self {
            StepMode::ScaleToObject { steps } => radius / steps.max(1) as f64,
            StepMode::Fixed { resolution } if resolution > 0.0 && resolution.is_finite()
                => resolution,
            StepMode::Fixed { .. } => VOLUME_RESOLUTION,
        }
    }
}

impl Default for StepMode {
    fn default() -> StepMode {
        StepMode::ScaleToObject { steps: NUM_STEPS_OBJECT_SCALING }
    }
}

/// Knobs that control a render pass.
///
/// Read-only while a frame renders; live controls change it between frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub shading: ShadingType,
    pub density: DensityType,

    /// Sphere-tracing jumps plus volume steps allowed per ray.
    pub max_jumps: usize,
    pub step: StepMode,

    /// Step used by the march toward the light. Defaults to the primary step.
    pub light_step: Option<f64>,

    pub ease_in_edges: bool,
    pub ease_in_inside: bool,

    pub cloud_color: Vec3,
    pub background: Vec4,

    /// Weight of the texture octave; zero disables it.
    pub texture_weight: f64,

    pub animate_light: bool,

    /// Render the sphere as an opaque surface instead of a volume.
    pub solid: bool,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            shading: ShadingType::default(),
            density: DensityType::default(),
            max_jumps: MAX_JUMPS,
            step: StepMode::default(),
            light_step: None,
            ease_in_edges: true,
            ease_in_inside: true,
            cloud_color: CLOUD_COLOR.into(),
            background: Vec4::default(),
            texture_weight: TEXTURE_WEIGHT,
            animate_light: false,
            solid: false,
        }
    }
}

/// Everything needed to render frames: the camera, what it looks at, and how.
pub struct Scene {
    pub camera: Camera,
    pub world: World,
    pub config: RenderConfig,
    pub width: usize,
    pub height: usize,

    /// The light as loaded; animation orbits this, not the current light.
    pub light_anchor: PointLight,
}

impl Scene {
    /// Reads and builds a scene from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let text = fs::read_to_string(path.as_ref())?;
        let scene_json: SceneJson = serde_json::from_str(&text)?;
        info!(path = %path.as_ref().display(), "loaded scene");

        Scene::try_from(scene_json)
    }

    /// Changes the viewport, keeping the camera position and near plane.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let near_plane = (self.camera.image_plane_center - self.camera.origin).length();
        self.camera = Camera::for_viewport(self.camera.origin, near_plane, width, height)?;
        self.width = width;
        self.height = height;

        Ok(())
    }

    /// Replaces the density field's texture with the image at `path`.
    pub fn load_texture<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.world.density.load_texture_file(path)
    }
}

impl TryFrom<SceneJson> for Scene {
    type Error = Error;

    fn try_from(scene_json: SceneJson) -> Result<Scene> {
        let camera = Camera::for_viewport(
            (&scene_json.camera_origin).into(),
            scene_json.near_plane,
            scene_json.width,
            scene_json.height,
        )?;

        let sphere = Sphere::new((&scene_json.sphere_center).into(),
            scene_json.sphere_radius)?;
        let light = PointLight::new(
            (&scene_json.light_origin).into(),
            (&scene_json.light_dir).into(),
            (&scene_json.light_color).into(),
        );

        let mut density = DensityField::new(scene_json.seed, scene_json.lattice_dim)?;
        if let Some(path) = &scene_json.texture {
            density = density.with_texture_file(path)?;
        }

        let config = RenderConfig {
            shading: scene_json.shading,
            density: scene_json.density,
            max_jumps: scene_json.max_jumps,
            step: scene_json.step,
            light_step: scene_json.light_step,
            ease_in_edges: scene_json.ease_in_edges,
            ease_in_inside: scene_json.ease_in_inside,
            cloud_color: (&scene_json.cloud_color).into(),
            background: vec4_from(&scene_json.background),
            texture_weight: scene_json.texture_weight,
            animate_light: scene_json.animate_light,
            solid: scene_json.solid,
        };

        Ok(Scene {
            camera,
            world: World::new(sphere, light, density),
            config,
            width: scene_json.width,
            height: scene_json.height,
            light_anchor: light,
        })
    }
}

/// Scene description as stored on disk. Omitted fields take their defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneJson {
    pub width: usize,
    pub height: usize,

    pub camera_origin: Vec<f64>,
    pub near_plane: f64,

    pub sphere_center: Vec<f64>,
    pub sphere_radius: f64,

    pub light_origin: Vec<f64>,
    pub light_dir: Vec<f64>,
    pub light_color: Vec<f64>,

    pub seed: u32,
    pub lattice_dim: usize,
    pub texture: Option<PathBuf>,

    pub shading: ShadingType,
    pub density: DensityType,
    pub max_jumps: usize,
    pub step: StepMode,
    pub light_step: Option<f64>,
    pub ease_in_edges: bool,
    pub ease_in_inside: bool,
    pub cloud_color: Vec<f64>,
    pub background: Vec<f64>,
    pub texture_weight: f64,
    pub animate_light: bool,
    pub solid: bool,
}

impl Default for SceneJson {
    fn default() -> SceneJson {
        let config = RenderConfig::default();

        SceneJson {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            camera_origin: CAMERA_ORIGIN.to_vec(),
            near_plane: NEAR_PLANE,
            sphere_center: SPHERE_CENTER.to_vec(),
            sphere_radius: SPHERE_RADIUS,
            light_origin: LIGHT_ORIGIN.to_vec(),
            light_dir: LIGHT_DIR.to_vec(),
            light_color: LIGHT_COLOR.to_vec(),
            seed: NOISE_SEED,
            lattice_dim: LATTICE_DIM,
            texture: None,
            shading: config.shading,
            density: config.density,
            max_jumps: config.max_jumps,
            step: config.step,
            light_step: config.light_step,
            ease_in_edges: config.ease_in_edges,
            ease_in_inside: config.ease_in_inside,
            cloud_color: CLOUD_COLOR.to_vec(),
            background: vec![0.0; 4],
            texture_weight: config.texture_weight,
            animate_light: config.animate_light,
            solid: config.solid,
        }
    }
}

/// Missing components are zero.
fn vec4_from(v: &[f64]) -> Vec4 {
    let get = |i: usize| v.get(i).copied().unwrap_or(0.0);
    Vec4::new(get(0), get(1), get(2), get(3))
}

#[test]
fn empty_json_uses_defaults() {
    let scene_json: SceneJson = serde_json::from_str("{}").unwrap();
    let scene = Scene::try_from(scene_json).unwrap();

    assert_eq!(scene.width, VIEWPORT_WIDTH);
    assert_eq!(scene.height, VIEWPORT_HEIGHT);
    assert_eq!(scene.world.sphere.center, Vec3::new(0.0, 0.0, 2.0));
    assert_eq!(scene.world.sphere.radius, SPHERE_RADIUS);
    assert_eq!(scene.world.light.origin, Vec3::from(LIGHT_ORIGIN));
    assert_eq!(scene.light_anchor, scene.world.light);
    assert_eq!(scene.config, RenderConfig::default());
    assert!(crate::feq(scene.camera.aspect_ratio, 320.0 / 240.0));
    assert!(!scene.world.density.has_texture());
}

#[test]
fn json_overrides_defaults() {
    let text = r#"{
        "width": 64,
        "height": 32,
        "sphere_radius": 0.5,
        "light_color": [1.0, 0.5],
        "shading": "naive-light",
        "density": "uniform",
        "step": { "mode": "fixed", "resolution": 0.05 },
        "background": [0.1, 0.2, 0.3, 1.0],
        "lattice_dim": 4
    }"#;
    let scene_json: SceneJson = serde_json::from_str(text).unwrap();
    let scene = Scene::try_from(scene_json).unwrap();

    assert_eq!(scene.width, 64);
    assert!(crate::feq(scene.camera.aspect_ratio, 2.0));
    assert_eq!(scene.world.sphere.radius, 0.5);
    assert_eq!(scene.world.light.color, Vec3::new(1.0, 0.5, 0.0));
    assert_eq!(scene.config.shading, ShadingType::NaiveLight);
    assert_eq!(scene.config.density, DensityType::Uniform);
    assert_eq!(scene.config.step, StepMode::Fixed { resolution: 0.05 });
    assert_eq!(scene.config.background, Vec4::new(0.1, 0.2, 0.3, 1.0));
    assert_eq!(scene.config.max_jumps, MAX_JUMPS);
}

#[test]
fn bad_scene_values_are_rejected() {
    let radius = SceneJson { sphere_radius: 0.0, lattice_dim: 2, ..Default::default() };
    assert!(matches!(Scene::try_from(radius), Err(Error::DegenerateSphere { .. })));

    let viewport = SceneJson { height: 0, lattice_dim: 2, ..Default::default() };
    assert!(matches!(Scene::try_from(viewport), Err(Error::EmptyViewport)));

    let near = SceneJson { near_plane: -1.0, lattice_dim: 2, ..Default::default() };
    assert!(matches!(Scene::try_from(near), Err(Error::DegenerateCamera { .. })));

    let lattice = SceneJson { lattice_dim: 0, ..Default::default() };
    assert!(matches!(Scene::try_from(lattice), Err(Error::InvalidLattice)));

    let malformed = serde_json::from_str::<SceneJson>("{\"width\": \"wide\"}");
    assert!(malformed.is_err());
}

#[test]
fn missing_scene_file_is_io_error() {
    let result = Scene::load("/nonexistent/cloud-scene.json");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn resize_keeps_near_plane() {
    let scene_json = SceneJson { near_plane: 2.0, lattice_dim: 2, ..Default::default() };
    let mut scene = Scene::try_from(scene_json).unwrap();

    scene.resize(100, 50).unwrap();
    assert_eq!((scene.width, scene.height), (100, 50));
    assert!(crate::feq(scene.camera.aspect_ratio, 2.0));
    assert_eq!(scene.camera.image_plane_center, Vec3::new(0.0, 0.0, 2.0));
    assert!(scene.resize(0, 50).is_err());
}

#[test]
fn step_mode_guards_bad_values() {
    assert_eq!(StepMode::ScaleToObject { steps: 0 }.step_size(1.0), 1.0);
    assert_eq!(StepMode::Fixed { resolution: -1.0 }.step_size(1.0), VOLUME_RESOLUTION);
    assert_eq!(StepMode::default().step_size(1.0), 0.1);
}
