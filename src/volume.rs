use crate::{ clamp01, ease_in_cubic };
use crate::consts::{ SURFACE_EPSILON, EDGE_EASE_DEPTH, INSIDE_EASE_DEPTH,
    MAX_SOLID_STEPS, SOLID_HIT_DISTANCE, SOLID_GIVE_UP_DISTANCE };
use crate::density::DensitySampler;
use crate::geometry::{ Sphere, sdf_sphere };
use crate::light::{ PointLight, Shader, beers_law };
use crate::ray::Ray;
use crate::scene::RenderConfig;
use crate::tuple::{ Vec3, Vec4 };
use crate::world::World;

/// Sphere-traces `ray` toward `sphere` until it reaches the surface.
///
/// Every iteration advances the ray by exactly the signed distance and counts
/// one jump against `max_jumps`. Returns `true` once the ray is on or inside
/// the surface. Returns `false` when the distance starts growing, meaning the
/// ray is moving away from the sphere, or when the budget runs out.
pub fn march_outside_volume(ray: &mut Ray, sphere: &Sphere, max_jumps: usize,
    jumps: &mut usize) -> bool {
    let mut prev_sdf = f64::MAX;

    while *jumps < max_jumps {
        *jumps += 1;

        let sdf = sphere.sdf(ray.origin);
        if sdf <= SURFACE_EPSILON {
            return true;
        }

        if sdf > prev_sdf {
            return false;
        }

        prev_sdf = sdf;
        ray.advance(sdf);
    }

    false
}

/// Traces a solid, opaque sphere and shades it with the directional light.
///
/// This is a debugging view of the scene geometry. It is not a volume.
pub fn march_solid(ray: &Ray, sphere: &Sphere, light: &PointLight,
    background: Vec4) -> Vec4 {
    let mut ray = *ray;

    for _ in 0..=MAX_SOLID_STEPS {
        let local = sphere.to_local(ray.origin);
        let sdf = sdf_sphere(local, sphere.radius);

        if sdf < SOLID_HIT_DISTANCE {
            let amount = clamp01(sphere.normal_at(local).dot(&light.dir));
            return Vec4::from_vec3(light.color * amount, 1.0);
        }

        if sdf >= SOLID_GIVE_UP_DISTANCE {
            break;
        }

        ray.advance(sdf);
    }

    background
}

/// Accumulators for one pass through the volume.
#[derive(Copy, Clone, Debug, Default)]
struct Segment {
    density: f64,
    distance: f64,
    abs_sdf: f64,
    light: Vec3,
    steps: usize,
}

/// The per-pass state of the volume integrator.
///
/// The lighting policy and density variant are resolved to function pointers
/// when this is created, once per render pass, so the per-step loop doesn't
/// branch on them. It only holds shared references, which lets every worker
/// thread use the same instance.
pub struct VolumeMarch<'a> {
    pub world: &'a World,
    pub config: &'a RenderConfig,
    pub time: f64,
    shader: Shader,
    density: DensitySampler,
    ds: f64,
    light_ds: f64,
}

impl<'a> VolumeMarch<'a> {
    pub fn new(world: &'a World, config: &'a RenderConfig, time: f64)
        -> VolumeMarch<'a> {
        let ds = config.step.step_size(world.sphere.radius);
        let light_ds = config.light_step
            .filter(|s| *s > 0.0 && s.is_finite())
            .unwrap_or(ds);

        VolumeMarch {
            world,
            config,
            time,
            shader: config.shading.shader(),
            density: config.density.sampler(),
            ds,
            light_ds,
        }
    }

    /// Computes the color and opacity seen along `ray`.
    pub fn color_at(&self, ray: &Ray) -> Vec4 {
        if self.config.solid {
            return march_solid(ray, &self.world.sphere, &self.world.light,
                self.config.background);
        }

        self.march_volume(ray)
    }

    /// Alternates between searching for the volume and integrating through
    /// it, until the ray leaves for good or the jump budget is spent.
    ///
    /// Every entry adds its own color and alpha to the result. Entries are
    /// summed, not blended, so the sum may leave `[0, 1]`; it is clamped when
    /// the pixel is quantized. A ray that never enters returns the background.
    pub fn march_volume(&self, ray: &Ray) -> Vec4 {
        let mut ray = *ray;
        let mut jumps = 0;
        let mut entered = false;
        let mut acc = Vec4::default();

        while jumps < self.config.max_jumps {
            if !self.march_outside_volume(&mut ray, &mut jumps) {
                break;
            }

            // Reaching the surface on the last jump leaves nothing to sample
            if let Some(color) = self.march_through_volume(&mut ray, &mut jumps) {
                entered = true;
                acc = acc + color;
            }
        }

        if entered {
            acc
        } else {
            self.config.background
        }
    }

    pub fn march_outside_volume(&self, ray: &mut Ray, jumps: &mut usize) -> bool {
        march_outside_volume(ray, &self.world.sphere, self.config.max_jumps, jumps)
    }

    /// Integrates from the entry point with a fixed step until the ray exits.
    ///
    /// Each step counts against the jump budget. On exit the ray has
    /// overshot the surface by the current signed distance, which is taken
    /// back off the travelled distance. Returns `None` if the budget ran out
    /// before a single sample was taken.
    pub fn march_through_volume(&self, ray: &mut Ray, jumps: &mut usize)
        -> Option<Vec4> {
        let sphere = &self.world.sphere;
        let mut segment = Segment::default();

        loop {
            let local = sphere.to_local(ray.origin);
            let sdf = sdf_sphere(local, sphere.radius);

            if sdf > SURFACE_EPSILON {
                segment.distance = (segment.distance - sdf).max(0.0);
                break;
            }

            if *jumps >= self.config.max_jumps {
                break;
            }
            *jumps += 1;

            segment.density += self.sample_medium(ray.origin, sdf);
            segment.abs_sdf += sdf.abs();
            segment.light = segment.light + (self.shader)(self, local, ray.origin);
            segment.steps += 1;

            ray.advance(self.ds);
            segment.distance += self.ds;
        }

        if segment.steps == 0 {
            return None;
        }

        Some(self.resolve(&segment))
    }

    /// Marches from `point` toward the light and returns the accumulated
    /// density and distance spent inside the volume.
    ///
    /// This runs for every primary sample under `RayMarchedLight`, which makes
    /// it the most expensive part of a frame. Its step size is set on its own
    /// through `RenderConfig::light_step`.
    pub fn march_light(&self, point: Vec3) -> (f64, f64) {
        let sphere = &self.world.sphere;
        let to_light = self.world.light.origin - point;
        let light_distance = to_light.length();
        if light_distance == 0.0 {
            return (0.0, 0.0);
        }

        let mut ray = Ray { origin: point, direction: to_light.normalize() };
        let max_steps = (2.0 * sphere.radius / self.light_ds).ceil() as usize + 2;

        let mut density = 0.0;
        let mut distance = 0.0;
        for _ in 0..max_steps {
            let sdf = sphere.sdf(ray.origin);
            if sdf > SURFACE_EPSILON {
                distance = (distance - sdf).max(0.0);
                break;
            }

            if distance >= light_distance {
                distance = light_distance;
                break;
            }

            density += self.sample_medium(ray.origin, sdf);
            ray.advance(self.light_ds);
            distance += self.light_ds;
        }

        (density, distance)
    }

    /// Density at `point`, blended with the texture octave if configured.
    pub fn sample_density(&self, point: Vec3) -> f64 {
        self.world.density.sample_density(self.density, point, self.time,
            self.config.texture_weight)
    }

    /// Density of a sample `sdf` units from the surface.
    ///
    /// With `ease_in_inside`, samples fade in over a thin shell beneath the
    /// surface.
    fn sample_medium(&self, point: Vec3, sdf: f64) -> f64 {
        let density = self.sample_density(point);
        if !self.config.ease_in_inside {
            return density;
        }

        let depth = -sdf / (self.world.sphere.radius * INSIDE_EASE_DEPTH);
        density * clamp01(depth)
    }

    /// Turns a segment's accumulators into a color and opacity.
    fn resolve(&self, segment: &Segment) -> Vec4 {
        let n = segment.steps as f64;

        let transmittance = beers_law(segment.distance, segment.density);
        let mut alpha = 1.0 - transmittance;

        // Soften rays that only clip the edge of the volume
        if self.config.ease_in_edges {
            let depth = (segment.abs_sdf / n)
                / (self.world.sphere.radius * EDGE_EASE_DEPTH);
            alpha *= ease_in_cubic(clamp01(depth));
        }

        let diffuse = self.config.cloud_color.hadamard(&(segment.light * (1.0 / n)));
        Vec4::from_vec3(diffuse, alpha)
    }
}

#[cfg(test)]
fn test_world() -> World {
    use crate::density::DensityField;

    World::new(
        Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap(),
        PointLight::new(Vec3::new(-2.5, 1.5, 2.0), Vec3::new(-1.0, 1.0, -1.0),
            Vec3::fill(1.0)),
        DensityField::new(1234, 8).unwrap(),
    )
}

#[cfg(test)]
fn uniform_config(shading: crate::light::ShadingType) -> RenderConfig {
    RenderConfig {
        shading,
        density: crate::density::DensityType::Uniform,
        ..Default::default()
    }
}

#[test]
fn outside_march_finds_sphere_ahead() {
    let sphere = Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0).unwrap();
    let mut ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
    let mut jumps = 0;

    assert!(march_outside_volume(&mut ray, &sphere, 40, &mut jumps));
    // 4 units away with radius 1: a handful of jumps at most
    assert!(jumps <= 4);
    assert!(sphere.sdf(ray.origin) <= SURFACE_EPSILON);
}

#[test]
fn outside_march_finds_sphere_off_axis() {
    let sphere = Sphere::new(Vec3::new(1.0, -0.5, 6.0), 0.5).unwrap();
    let origin = Vec3::new(0.0, 0.0, 0.0);
    let mut ray = Ray::new(origin, sphere.center - origin);
    let mut jumps = 0;

    assert!(march_outside_volume(&mut ray, &sphere, 40, &mut jumps));
    assert!(jumps <= 13);
}

#[test]
fn outside_march_terminates_moving_away() {
    let sphere = Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap();
    let mut ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
    let mut jumps = 0;

    assert!(!march_outside_volume(&mut ray, &sphere, 1000, &mut jumps));
    assert!(jumps <= 2);
}

#[test]
fn outside_march_respects_budget() {
    let sphere = Sphere::new(Vec3::new(0.0, 0.0, 100.0), 1.0).unwrap();
    let mut ray = Ray::new(Vec3::new(0.0, 0.999, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let mut jumps = 0;

    let found = march_outside_volume(&mut ray, &sphere, 3, &mut jumps);
    assert!(!found);
    assert_eq!(jumps, 3);
}

#[test]
fn ray_through_center_is_opaque_without_light() {
    use crate::light::ShadingType;

    let world = test_world();
    let config = uniform_config(ShadingType::NoLight);
    let march = VolumeMarch::new(&world, &config, 0.0);
    let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

    let color = march.color_at(&ray);
    assert!(color.w > 0.0);
    assert_eq!(color.xyz(), config.cloud_color);
}

#[test]
fn ray_missing_sphere_is_background() {
    use crate::light::ShadingType;

    let world = test_world();
    for shading in [ShadingType::NoLight, ShadingType::NaiveLight,
        ShadingType::RayMarchedLight] {
        let config = uniform_config(shading);
        let march = VolumeMarch::new(&world, &config, 0.0);

        // Parallel to the view axis, offset past the radius
        let ray = Ray::new(Vec3::new(0.0, 1.0 + 1e-3, 0.0), Vec3::new(0.0, 0.0, 1.0));
        let color = march.color_at(&ray);
        assert_eq!(color.w, 0.0);
        assert_eq!(color, config.background);
    }
}

#[test]
fn grazing_ray_is_thinner_than_center_ray() {
    use crate::light::ShadingType;

    let world = test_world();
    let config = uniform_config(ShadingType::NoLight);
    let march = VolumeMarch::new(&world, &config, 0.0);

    let center = march.color_at(&Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0)));
    let edge = march.color_at(&Ray::new(Vec3::new(0.0, 0.9, 0.0),
        Vec3::new(0.0, 0.0, 1.0)));

    assert!(edge.w < center.w);
}

#[test]
fn edge_easing_only_lowers_alpha() {
    use crate::light::ShadingType;

    let world = test_world();
    let eased = uniform_config(ShadingType::NoLight);
    let plain = RenderConfig { ease_in_edges: false, ..eased };
    let ray = Ray::new(Vec3::new(0.0, 0.7, 0.0), Vec3::new(0.0, 0.0, 1.0));

    let a = VolumeMarch::new(&world, &eased, 0.0).color_at(&ray);
    let b = VolumeMarch::new(&world, &plain, 0.0).color_at(&ray);
    assert!(a.w <= b.w);
    assert!(b.w > 0.0);
}

#[test]
fn alpha_matches_beers_law_without_easing() {
    use crate::light::ShadingType;

    let world = test_world();
    let config = RenderConfig {
        ease_in_edges: false,
        ease_in_inside: false,
        ..uniform_config(ShadingType::NoLight)
    };
    let march = VolumeMarch::new(&world, &config, 0.0);
    let mut ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0));
    let mut jumps = 0;

    let color = march.march_through_volume(&mut ray, &mut jumps).unwrap();

    // Chord of length 2 in steps of radius / 10
    let steps = jumps as f64;
    let density = steps * crate::consts::UNIFORM_DENSITY;
    let distance = 2.0;
    assert!(crate::feq(color.w, 1.0 - beers_law(distance, density)));
}

#[test]
fn light_march_is_shorter_near_the_light() {
    let world = test_world();
    let config = uniform_config(crate::light::ShadingType::RayMarchedLight);
    let march = VolumeMarch::new(&world, &config, 0.0);

    let toward = world.light.direction_from(world.sphere.center);
    let near = world.sphere.center + toward * 0.8;
    let far = world.sphere.center - toward * 0.8;

    let (near_density, near_distance) = march.march_light(near);
    let (far_density, far_distance) = march.march_light(far);
    assert!(near_distance < far_distance);
    assert!(near_density < far_density);
    let ds = config.step.step_size(world.sphere.radius);
    assert!(far_distance <= 2.0 * world.sphere.radius + ds);
}

#[test]
fn ray_marched_light_is_dimmer_than_unlit() {
    use crate::light::ShadingType;

    let world = test_world();
    let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

    let unlit = uniform_config(ShadingType::NoLight);
    let lit = uniform_config(ShadingType::RayMarchedLight);
    let a = VolumeMarch::new(&world, &unlit, 0.0).color_at(&ray);
    let b = VolumeMarch::new(&world, &lit, 0.0).color_at(&ray);

    assert!(b.x < a.x);
    assert!(b.x > 0.0);
    assert!(crate::feq(a.w, b.w));
}

#[test]
fn naive_light_faces_the_light() {
    use crate::light::ShadingType;

    let world = test_world();
    let config = uniform_config(ShadingType::NaiveLight);
    let march = VolumeMarch::new(&world, &config, 0.0);

    // Upper half of the sphere faces the light, which sits above it
    let top = march.color_at(&Ray::new(Vec3::new(0.0, 0.5, 0.0),
        Vec3::new(0.0, 0.0, 1.0)));
    let bottom = march.color_at(&Ray::new(Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(0.0, 0.0, 1.0)));

    assert!(top.x > bottom.x);
}

#[test]
fn solid_march_hits_and_misses() {
    let world = test_world();
    let background = Vec4::new(0.1, 0.2, 0.3, 1.0);

    let hit = march_solid(&Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0)),
        &world.sphere, &world.light, background);
    let miss = march_solid(&Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0)),
        &world.sphere, &world.light, background);

    assert_eq!(hit.w, 1.0);
    assert_eq!(miss, background);
}

#[test]
fn surface_reached_on_last_jump_is_background() {
    use crate::density::DensityField;

    // Two jumps: one to reach the surface, none left to sample
    let world = World::new(
        Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0).unwrap(),
        PointLight::new(Vec3::new(-2.5, 1.5, 10.0), Vec3::new(-1.0, 1.0, -1.0),
            Vec3::fill(1.0)),
        DensityField::new(1234, 4).unwrap(),
    );
    let config = RenderConfig {
        max_jumps: 2,
        background: Vec4::new(0.2, 0.4, 0.8, 1.0),
        ease_in_edges: false,
        ease_in_inside: false,
        ..uniform_config(crate::light::ShadingType::NoLight)
    };
    let march = VolumeMarch::new(&world, &config, 0.0);
    let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

    assert_eq!(march.color_at(&ray), config.background);

    // With room for one more step the ray samples the volume
    let config = RenderConfig { max_jumps: 3, ..config };
    let march = VolumeMarch::new(&world, &config, 0.0);
    let color = march.color_at(&ray);
    assert!(color.w > 0.0);
    assert!(color != config.background);
}

#[test]
fn coarse_light_step_takes_fewer_samples() {
    let world = test_world();
    let fine = uniform_config(crate::light::ShadingType::RayMarchedLight);
    let coarse = RenderConfig { light_step: Some(0.5), ..fine };

    let (fine_density, fine_distance) =
        VolumeMarch::new(&world, &fine, 0.0).march_light(world.sphere.center);
    let (coarse_density, coarse_distance) =
        VolumeMarch::new(&world, &coarse, 0.0).march_light(world.sphere.center);

    // From the center, the light march leaves after one radius either way
    assert!(crate::feq(fine_distance, world.sphere.radius));
    assert!(crate::feq(coarse_distance, world.sphere.radius));
    assert!(coarse_density < fine_density);
    assert!(coarse_density > 0.0);
}

#[test]
fn invalid_light_step_falls_back_to_primary_step() {
    let world = test_world();
    let config = uniform_config(crate::light::ShadingType::RayMarchedLight);
    let point = world.sphere.center + Vec3::new(0.1, -0.3, 0.2);
    let expected = VolumeMarch::new(&world, &config, 0.0).march_light(point);

    for light_step in [Some(0.0), Some(-0.5), Some(f64::NAN), Some(f64::INFINITY)] {
        let config = RenderConfig { light_step, ..config };
        let (density, distance) = VolumeMarch::new(&world, &config, 0.0).march_light(point);

        assert!(crate::feq(density, expected.0));
        assert!(crate::feq(distance, expected.1));
    }
}

#[test]
fn inside_easing_thins_grazing_rays() {
    use crate::light::ShadingType;

    let world = test_world();
    let eased = RenderConfig {
        ease_in_edges: false,
        ..uniform_config(ShadingType::NoLight)
    };
    let plain = RenderConfig { ease_in_inside: false, ..eased };

    // Never deeper than 0.1 below the surface
    let ray = Ray::new(Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.0, 0.0, 1.0));
    let a = VolumeMarch::new(&world, &eased, 0.0).color_at(&ray);
    let b = VolumeMarch::new(&world, &plain, 0.0).color_at(&ray);

    assert!(a.w > 0.0);
    assert!(a.w < b.w);
}
