use crate::consts::LIGHT_ORBIT_SPEED;
use crate::density::DensityType;
use crate::light::{ PointLight, ShadingType };
use crate::scene::{ RenderConfig, Scene };
use crate::tuple::Vec3;

/// A live control, applied between frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Control {
    Density(DensityType),
    Shading(ShadingType),
    ToggleLightAnimation,
    /// Moves the lattice preview by this many slices.
    PreviewLayer(i64),
    Quit,
}

impl Control {
    /// Maps a key to its control, if it has one.
    pub fn from_key(key: char) -> Option<Control> {
        let control = match key {
            '1' => Control::Density(DensityType::PerlinRuntime),
            '2' => Control::Density(DensityType::PerlinPreCalc),
            '3' => Control::Density(DensityType::Uniform),
            '4' => Control::Shading(ShadingType::NoLight),
            '5' => Control::Shading(ShadingType::NaiveLight),
            '6' => Control::Shading(ShadingType::RayMarchedLight),
            'a' | 'A' => Control::ToggleLightAnimation,
            '+' | '=' => Control::PreviewLayer(1),
            '-' | '_' => Control::PreviewLayer(-1),
            'q' | 'Q' => Control::Quit,
            _ => return None,
        };

        Some(control)
    }
}

impl RenderConfig {
    /// Applies a control to the configuration. Controls that don't concern
    /// rendering are ignored.
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Density(density) => self.density = density,
            Control::Shading(shading) => self.shading = shading,
            Control::ToggleLightAnimation => self.animate_light = !self.animate_light,
            Control::PreviewLayer(_) | Control::Quit => {},
        }
    }
}

/// State the frame loop keeps between frames, outside the render config.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameState {
    /// The lattice slice being previewed, if previewing.
    pub preview_layer: Option<i64>,
    pub quit: bool,
}

impl FrameState {
    pub fn new(preview_layer: Option<i64>) -> FrameState {
        FrameState { preview_layer, quit: false }
    }

    /// Applies a control to this state and to the scene's render config.
    pub fn apply(&mut self, scene: &mut Scene, control: Control) {
        match control {
            Control::PreviewLayer(delta) => {
                if let Some(layer) = self.preview_layer.as_mut() {
                    *layer += delta;
                }
            },
            Control::Quit => self.quit = true,
            _ => scene.config.apply(control),
        }
    }
}

/// Orbits `anchor` around the vertical axis through `pivot`.
///
/// The light's direction turns with it, so the solid view stays lit from the
/// same side of the light.
pub fn animate_light(anchor: &PointLight, pivot: Vec3, time: f64) -> PointLight {
    let up = Vec3::new(0.0, 1.0, 0.0);
    let angle = time * LIGHT_ORBIT_SPEED;

    PointLight {
        origin: pivot + (anchor.origin - pivot).rotate(&up, angle),
        dir: anchor.dir.rotate(&up, angle),
        color: anchor.color,
    }
}

/// Advances the scene to `time`, before the frame at that time is rendered.
pub fn update(scene: &mut Scene, time: f64) {
    if scene.config.animate_light {
        scene.world.light = animate_light(&scene.light_anchor,
            scene.world.sphere.center, time);
    }
}

#[test]
fn keys_map_to_controls() {
    assert_eq!(Control::from_key('1'), Some(Control::Density(DensityType::PerlinRuntime)));
    assert_eq!(Control::from_key('3'), Some(Control::Density(DensityType::Uniform)));
    assert_eq!(Control::from_key('5'), Some(Control::Shading(ShadingType::NaiveLight)));
    assert_eq!(Control::from_key('6'), Some(Control::Shading(ShadingType::RayMarchedLight)));
    assert_eq!(Control::from_key('a'), Some(Control::ToggleLightAnimation));
    assert_eq!(Control::from_key('+'), Some(Control::PreviewLayer(1)));
    assert_eq!(Control::from_key('-'), Some(Control::PreviewLayer(-1)));
    assert_eq!(Control::from_key('q'), Some(Control::Quit));
    assert_eq!(Control::from_key('x'), None);
    assert_eq!(Control::from_key('7'), None);
}

#[test]
fn controls_change_config() {
    let mut config = RenderConfig::default();

    config.apply(Control::Density(DensityType::Uniform));
    config.apply(Control::Shading(ShadingType::NoLight));
    config.apply(Control::ToggleLightAnimation);
    assert_eq!(config.density, DensityType::Uniform);
    assert_eq!(config.shading, ShadingType::NoLight);
    assert!(config.animate_light);

    let before = config;
    config.apply(Control::Quit);
    config.apply(Control::PreviewLayer(1));
    assert_eq!(config, before);
}

#[test]
fn frame_state_tracks_preview_and_quit() {
    use std::convert::TryFrom;
    use crate::scene::SceneJson;

    let scene_json = SceneJson { lattice_dim: 2, ..Default::default() };
    let mut scene = Scene::try_from(scene_json).unwrap();

    let mut state = FrameState::new(Some(0));
    state.apply(&mut scene, Control::PreviewLayer(1));
    state.apply(&mut scene, Control::PreviewLayer(1));
    state.apply(&mut scene, Control::PreviewLayer(-1));
    assert_eq!(state.preview_layer, Some(1));

    let mut plain = FrameState::default();
    plain.apply(&mut scene, Control::PreviewLayer(1));
    assert_eq!(plain.preview_layer, None);

    state.apply(&mut scene, Control::Shading(ShadingType::NaiveLight));
    assert_eq!(scene.config.shading, ShadingType::NaiveLight);
    assert!(!state.quit);
    state.apply(&mut scene, Control::Quit);
    assert!(state.quit);
}

#[test]
fn light_orbits_at_constant_distance() {
    let pivot = Vec3::new(0.0, 0.0, 2.0);
    let anchor = PointLight::new(Vec3::new(-2.5, 1.5, 2.0), Vec3::new(-1.0, 1.0, -1.0),
        Vec3::fill(1.0));

    let start = animate_light(&anchor, pivot, 0.0);
    assert_eq!(start, anchor);

    let moved = animate_light(&anchor, pivot, 2.0);
    assert!(crate::feq((moved.origin - pivot).length(), (anchor.origin - pivot).length()));
    assert!(crate::feq(moved.origin.y, anchor.origin.y));
    assert!(moved.origin != anchor.origin);
    assert!(crate::feq(moved.dir.length(), 1.0));
}

#[test]
fn update_only_moves_animated_light() {
    use std::convert::TryFrom;
    use crate::scene::SceneJson;

    let scene_json = SceneJson { lattice_dim: 2, ..Default::default() };
    let mut scene = Scene::try_from(scene_json).unwrap();
    let anchor = scene.light_anchor;

    update(&mut scene, 3.0);
    assert_eq!(scene.world.light, anchor);

    scene.config.animate_light = true;
    update(&mut scene, 3.0);
    assert!(scene.world.light.origin != anchor.origin);

    // Always measured from the anchor, so the orbit doesn't drift
    update(&mut scene, 0.0);
    assert_eq!(scene.world.light, anchor);
}
