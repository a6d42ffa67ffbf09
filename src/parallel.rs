use std::thread;

use tracing::trace;

use crate::camera::Camera;
use crate::canvas::{ ImageTarget, Pixel };
use crate::scene::RenderConfig;
use crate::volume::VolumeMarch;
use crate::world::World;

/// Everything a render pass reads.
///
/// All members are shared references. The image being written is passed
/// alongside as the only mutable piece, which is what lets workers share
/// these without locks.
#[derive(Copy, Clone)]
pub struct RenderParameters<'a> {
    pub camera: &'a Camera,
    pub world: &'a World,
    pub config: &'a RenderConfig,
    pub time: f64,
}

/// The number of hardware threads, or 1 if it can't be determined.
pub fn available_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Renders a full frame using one worker per hardware thread.
pub fn render(target: &mut ImageTarget, params: &RenderParameters) {
    render_with_threads(target, params, available_threads());
}

/// Renders a full frame, splitting the rows into `threads` contiguous chunks.
///
/// Each worker owns a disjoint slice of the pixel buffer, and the last chunk
/// absorbs the leftover rows. Workers are scoped threads, so this returns
/// only after all of them have finished and the image is complete.
pub fn render_with_threads(target: &mut ImageTarget, params: &RenderParameters,
    threads: usize) {
    let width = target.width;
    let height = target.height;
    if width == 0 || height == 0 {
        return;
    }

    let threads = threads.clamp(1, height);
    let chunk_rows = height / threads;
    let march = VolumeMarch::new(params.world, params.config, params.time);
    trace!(threads, chunk_rows, width, height, "dispatching frame");

    let pixels = target.pixels_mut();
    thread::scope(|s| {
        let mut rest = pixels;
        let mut first_row = 0;

        for i in 0..threads {
            let rows = if i + 1 == threads { height - first_row } else { chunk_rows };
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(rows * width);
            rest = tail;

            let march = &march;
            let camera = params.camera;
            s.spawn(move || {
                render_rows(chunk, first_row, width, height, camera, march);
            });

            first_row += rows;
        }
    });
}

/// Renders a full frame on the calling thread.
///
/// Produces exactly the same pixels as the parallel renderer.
pub fn render_sequential(target: &mut ImageTarget, params: &RenderParameters) {
    let width = target.width;
    let height = target.height;
    if width == 0 || height == 0 {
        return;
    }

    let march = VolumeMarch::new(params.world, params.config, params.time);
    render_rows(target.pixels_mut(), 0, width, height, params.camera, &march);
}

/// Renders the rows held in `chunk`, the first of which is image row
/// `first_row`.
fn render_rows(chunk: &mut [Pixel], first_row: usize, width: usize,
    height: usize, camera: &Camera, march: &VolumeMarch) {
    for (i, row) in chunk.chunks_mut(width).enumerate() {
        let y = first_row + i;
        for (x, pixel) in row.iter_mut().enumerate() {
            let ray = camera.make_ray(x, y, width, height);
            *pixel = Pixel::from_vec4(march.color_at(&ray));
        }
    }
}

#[cfg(test)]
fn test_scene() -> (Camera, World) {
    use crate::density::DensityField;
    use crate::geometry::Sphere;
    use crate::light::PointLight;
    use crate::tuple::Vec3;

    let camera = Camera::for_viewport(Vec3::zero(), 1.0, 24, 17).unwrap();
    let world = World::new(
        Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap(),
        PointLight::new(Vec3::new(-2.5, 1.5, 2.0), Vec3::new(-1.0, 1.0, -1.0),
            Vec3::fill(1.0)),
        DensityField::new(1234, 16).unwrap(),
    );

    (camera, world)
}

#[test]
fn parallel_matches_sequential() {
    use crate::density::DensityType;
    use crate::light::ShadingType;

    let (camera, world) = test_scene();

    for &(shading, density) in &[
        (ShadingType::RayMarchedLight, DensityType::PerlinPreCalc),
        (ShadingType::NaiveLight, DensityType::PerlinRuntime),
        (ShadingType::NoLight, DensityType::Uniform),
    ] {
        let config = RenderConfig { shading, density, ..Default::default() };
        let params = RenderParameters { camera: &camera, world: &world,
            config: &config, time: 1.25 };

        let mut expected = ImageTarget::new(24, 17, Pixel::default());
        render_sequential(&mut expected, &params);

        for &threads in &[1, 2, 3, 5, 16, 17, 64] {
            let mut image = ImageTarget::new(24, 17, Pixel::rgba(9, 9, 9, 9));
            render_with_threads(&mut image, &params, threads);
            assert_eq!(image, expected, "{} threads differ", threads);
        }
    }
}

#[test]
fn frame_shows_cloud_in_the_middle() {
    let (camera, world) = test_scene();
    let config = RenderConfig {
        density: crate::density::DensityType::Uniform,
        ..Default::default()
    };
    let params = RenderParameters { camera: &camera, world: &world,
        config: &config, time: 0.0 };

    let mut image = ImageTarget::new(24, 17, Pixel::rgba(20, 20, 20, 255));
    render(&mut image, &params);

    assert!(image.read_pixel(12, 8).unwrap().a > 0);
    assert_eq!(image.read_pixel(0, 0).unwrap(), Pixel::default());
    assert!(image.coverage() > 0.0 && image.coverage() < 1.0);
}

#[test]
fn empty_image_is_a_no_op() {
    let (camera, world) = test_scene();
    let config = RenderConfig::default();
    let params = RenderParameters { camera: &camera, world: &world,
        config: &config, time: 0.0 };

    let mut image = ImageTarget::new(0, 0, Pixel::default());
    render(&mut image, &params);
    assert!(image.pixels().is_empty());
}

#[test]
#[ignore]
fn more_threads_render_faster() {
    use std::time::Instant;

    use crate::density::DensityField;
    use crate::geometry::Sphere;
    use crate::light::PointLight;
    use crate::tuple::Vec3;

    let threads = available_threads();
    if threads < 2 {
        return;
    }

    let camera = Camera::for_viewport(Vec3::zero(), 1.0, 320, 240).unwrap();
    let world = World::new(
        Sphere::new(Vec3::new(0.0, 0.0, 2.0), 1.0).unwrap(),
        PointLight::new(Vec3::new(-2.5, 1.5, 2.0), Vec3::new(-1.0, 1.0, -1.0),
            Vec3::fill(1.0)),
        DensityField::new(1234, 64).unwrap(),
    );
    let config = RenderConfig::default();
    let params = RenderParameters { camera: &camera, world: &world,
        config: &config, time: 0.0 };
    let mut image = ImageTarget::new(320, 240, Pixel::default());

    let start = Instant::now();
    render_with_threads(&mut image, &params, 1);
    let single = start.elapsed();

    let start = Instant::now();
    render_with_threads(&mut image, &params, threads);
    let parallel = start.elapsed();

    println!("1 thread: {:?}, {} threads: {:?}", single, threads, parallel);
    assert!(parallel < single);
}
