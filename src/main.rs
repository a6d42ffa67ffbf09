use std::convert::TryFrom;
use std::io::{ self, BufRead };
use std::path::PathBuf;
use std::sync::mpsc::{ self, Receiver };
use std::thread;
use std::time::Instant;

use anyhow::{ Context, Result };
use clap::Parser;
use tracing::{ debug, info, warn };
use tracing_subscriber::EnvFilter;

use cloud_marcher::canvas::{ ImageTarget, Pixel };
use cloud_marcher::consts::FRAME_COUNT;
use cloud_marcher::density::DensityType;
use cloud_marcher::light::ShadingType;
use cloud_marcher::parallel::{ self, RenderParameters };
use cloud_marcher::scene::{ Scene, SceneJson };
use cloud_marcher::update::{ self, Control, FrameState };

/// Renders a volumetric cloud in real time.
///
/// While running, enter keys on stdin to change the render: 1-3 pick the
/// density, 4-6 pick the lighting, `a` toggles light animation, `+`/`-` move
/// the lattice preview and `q` quits.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description (JSON); built-in defaults are used without one
    #[clap(long)]
    scene: Option<PathBuf>,

    /// Grayscale image used as an extra density octave
    #[clap(long)]
    texture: Option<PathBuf>,

    /// Weight of the texture octave
    #[clap(long)]
    texture_weight: Option<f64>,

    #[clap(long)]
    width: Option<usize>,

    #[clap(long)]
    height: Option<usize>,

    /// Frames to render; 0 renders until quit
    #[clap(long, default_value_t = FRAME_COUNT)]
    frames: usize,

    /// Worker threads; defaults to the number of hardware threads
    #[clap(long)]
    threads: Option<usize>,

    /// no-light, naive-light or ray-marched-light
    #[clap(long)]
    shading: Option<ShadingType>,

    /// perlin-runtime, perlin-pre-calc or uniform
    #[clap(long)]
    density: Option<DensityType>,

    /// Show slices of the noise lattice instead of the cloud
    #[clap(long)]
    preview_lattice: bool,

    #[clap(long)]
    animate_light: bool,

    /// Render the sphere as a solid surface
    #[clap(long)]
    solid: bool,

    /// Save the last frame as a PNG
    #[clap(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut scene = load_scene(&args)?;

    let threads = args.threads.unwrap_or_else(parallel::available_threads);
    info!(width = scene.width, height = scene.height, threads,
        shading = %scene.config.shading, density = %scene.config.density,
        "starting render");

    let controls = spawn_control_reader();
    let mut state = FrameState::new(if args.preview_lattice { Some(0) } else { None });
    let mut target = ImageTarget::new(scene.width, scene.height, Pixel::default());
    let mut frame_bytes = Vec::new();

    let start = Instant::now();
    let mut frame = 0;
    while args.frames == 0 || frame < args.frames {
        for control in controls.try_iter() {
            debug!(?control, "applying control");
            state.apply(&mut scene, control);
        }
        if state.quit {
            break;
        }

        let time = start.elapsed().as_secs_f64();
        update::update(&mut scene, time);

        let frame_start = Instant::now();
        match state.preview_layer {
            Some(layer) => target.write_lattice_slice(scene.world.density.lattice(), layer),
            None => {
                let params = RenderParameters {
                    camera: &scene.camera,
                    world: &scene.world,
                    config: &scene.config,
                    time,
                };
                parallel::render_with_threads(&mut target, &params, threads);
            },
        }
        target.copy_rgba_bytes(&mut frame_bytes);

        let elapsed = frame_start.elapsed().as_secs_f64();
        info!(frame, ms = elapsed * 1000.0, fps = 1.0 / elapsed.max(1e-9), "rendered frame");
        debug!(coverage = target.coverage(), "frame coverage");
        frame += 1;
    }

    info!(frames = frame, elapsed = ?start.elapsed(), "done");

    if let Some(path) = &args.output {
        if frame == 0 {
            warn!("no frames rendered, nothing to save");
        } else {
            image::save_buffer(path, &frame_bytes, target.width as u32,
                target.height as u32, image::ExtendedColorType::Rgba8)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "saved last frame");
        }
    }

    Ok(())
}

/// Builds the scene from the scene file, if any, and applies command line
/// overrides on top.
fn load_scene(args: &Args) -> Result<Scene> {
    let mut scene = match &args.scene {
        Some(path) => Scene::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => Scene::try_from(SceneJson::default())?,
    };

    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(scene.width);
        let height = args.height.unwrap_or(scene.height);
        scene.resize(width, height)?;
    }

    if let Some(path) = &args.texture {
        scene.load_texture(path)?;
    }

    let config = &mut scene.config;
    if let Some(weight) = args.texture_weight {
        config.texture_weight = weight;
    }
    if let Some(shading) = args.shading {
        config.shading = shading;
    }
    if let Some(density) = args.density {
        config.density = density;
    }
    config.animate_light |= args.animate_light;
    config.solid |= args.solid;

    if scene.world.density.has_texture() && scene.config.texture_weight == 0.0 {
        warn!("texture loaded with zero weight, it won't affect the cloud");
    }

    Ok(scene)
}

/// Reads keys from stdin on a separate thread. The frame loop drains the
/// returned channel between frames.
fn spawn_control_reader() -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };

            for control in line.chars().filter_map(Control::from_key) {
                if tx.send(control).is_err() {
                    return;
                }
            }
        }
    });

    rx
}
