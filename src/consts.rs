// Viewport
pub const VIEWPORT_WIDTH: usize = 320;
pub const VIEWPORT_HEIGHT: usize = 240;
pub const FRAME_COUNT: usize = 120;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Distance at which sphere tracing counts as having reached the surface
pub const SURFACE_EPSILON: f64 = 1e-6;

// Marching budgets and step sizes
pub const MAX_JUMPS: usize = 40;
pub const NUM_STEPS_OBJECT_SCALING: usize = 10;
pub const VOLUME_RESOLUTION: f64 = 0.1;
pub const MAX_SOLID_STEPS: usize = 10;
pub const SOLID_HIT_DISTANCE: f64 = 0.02;
pub const SOLID_GIVE_UP_DISTANCE: f64 = 10.0;

// Edge easing, as fractions of the sphere radius
pub const EDGE_EASE_DEPTH: f64 = 0.5;
pub const INSIDE_EASE_DEPTH: f64 = 0.1;

// Density field
pub const NOISE_SEED: u32 = 1234;
pub const NOISE_OCTAVES: usize = 2;
pub const NOISE_LACUNARITY: f64 = 1.5;
pub const NOISE_PERSISTENCE: f64 = 1.0;
pub const LATTICE_DIM: usize = 64;
pub const UNIFORM_DENSITY: f64 = 0.05;
pub const RUNTIME_OCTAVE_MIX: f64 = 0.35;
pub const PRECALC_OCTAVE_MIX: f64 = 0.5;
pub const TEXTURE_WEIGHT: f64 = 0.0;
pub const TEXTURE_SCALE: f64 = 20.0;
pub const TEXTURE_PHASE_SPEED: f64 = 4.0;

// Scene defaults
pub const NEAR_PLANE: f64 = 1.0;
pub const CAMERA_ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];
pub const SPHERE_CENTER: [f64; 3] = [0.0, 0.0, 2.0];
pub const SPHERE_RADIUS: f64 = 1.0;
pub const LIGHT_ORIGIN: [f64; 3] = [-2.5, 1.5, 2.0];
pub const LIGHT_DIR: [f64; 3] = [-1.5, 1.5, -0.75];
pub const LIGHT_COLOR: [f64; 3] = [1.0, 1.0, 1.0];
pub const CLOUD_COLOR: [f64; 3] = [0.95, 0.95, 0.95];
pub const LIGHT_ORBIT_SPEED: f64 = 0.4;
