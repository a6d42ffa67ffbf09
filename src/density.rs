use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use noise::{ Fbm, MultiFractal, NoiseFn, Perlin };
use serde::{ Serialize, Deserialize };
use tracing::info;

use crate::{ clamp01, mix };
use crate::consts::{ NOISE_OCTAVES, NOISE_LACUNARITY, NOISE_PERSISTENCE,
    UNIFORM_DENSITY, RUNTIME_OCTAVE_MIX, PRECALC_OCTAVE_MIX, TEXTURE_SCALE,
    TEXTURE_PHASE_SPEED };
use crate::error::{ Error, Result };
use crate::matrix::{ Matrix2D, Matrix3D };
use crate::tuple::Vec3;

/// Shifts lattice lookups away from the unit-cube corners, where Perlin noise
/// is zero.
const LATTICE_OFFSET: Vec3 = Vec3 { x: 0.05, y: 0.1, z: 0.15 };

/// Which procedural source drives the cloud density.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DensityType {
    /// Evaluate Perlin noise at every sample.
    PerlinRuntime,
    /// Look the noise up in the precomputed lattice.
    PerlinPreCalc,
    /// A constant density everywhere inside the volume.
    Uniform,
}

impl Default for DensityType {
    fn default() -> DensityType {
        DensityType::PerlinPreCalc
    }
}

impl fmt::Display for DensityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DensityType::PerlinRuntime => "perlin-runtime",
            DensityType::PerlinPreCalc => "perlin-pre-calc",
            DensityType::Uniform => "uniform",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DensityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<DensityType, String> {
        match s {
            "perlin-runtime" | "runtime" => Ok(DensityType::PerlinRuntime),
            "perlin-pre-calc" | "pre-calc" | "lattice" => Ok(DensityType::PerlinPreCalc),
            "uniform" => Ok(DensityType::Uniform),
            _ => Err(format!("unknown density type '{}'", s)),
        }
    }
}

/// A density function resolved from a `DensityType`.
pub type DensitySampler = fn(field: &DensityField, point: Vec3, time: f64) -> f64;

impl DensityType {
    /// Resolves the variant to its sampling function, once per render pass.
    pub fn sampler(self) -> DensitySampler {
        match self {
            DensityType::PerlinRuntime => DensityField::sample_runtime_perlin,
            DensityType::PerlinPreCalc => DensityField::sample_pre_calc_perlin,
            DensityType::Uniform => DensityField::sample_uniform,
        }
    }
}

/// The procedural density of the cloud.
///
/// Combines a runtime noise generator, a lattice of noise values precomputed
/// from it, and an optional tiled texture. Nothing changes after
/// construction, so worker threads share it by reference.
pub struct DensityField {
    generator: Fbm<Perlin>,
    lattice: Matrix3D<f64>,
    texture: Option<Matrix2D<f64>>,
}

impl DensityField {
    /// Seeds the noise generator and precomputes a `dim`³ lattice from it.
    pub fn new(seed: u32, dim: usize) -> Result<DensityField> {
        if dim == 0 {
            return Err(Error::InvalidLattice);
        }

        let generator = Fbm::<Perlin>::new(seed)
            .set_octaves(NOISE_OCTAVES)
            .set_lacunarity(NOISE_LACUNARITY)
            .set_persistence(NOISE_PERSISTENCE);

        let start = Instant::now();
        let lattice = precompute_lattice(&generator, dim);
        info!(seed, dim, elapsed = ?start.elapsed(), "precomputed noise lattice");

        Ok(DensityField { generator, lattice, texture: None })
    }

    /// Attaches a texture whose values are already in `[0, 1]`.
    pub fn with_texture(mut self, texture: Matrix2D<f64>) -> DensityField {
        self.texture = Some(texture);
        self
    }

    /// Loads a density texture from an image file.
    ///
    /// The image is converted to 8-bit luma and every pixel is read as a
    /// density in `[0, 1]`.
    pub fn with_texture_file<P: AsRef<Path>>(mut self, path: P) -> Result<DensityField> {
        self.load_texture_file(path)?;
        Ok(self)
    }

    /// Replaces the texture with the image at `path`. On failure the current
    /// texture is kept.
    pub fn load_texture_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let texture = load_texture(path)?;
        info!(path = %path.display(), width = texture.width,
            height = texture.height, "loaded density texture");

        self.texture = Some(texture);
        Ok(())
    }

    pub fn lattice(&self) -> &Matrix3D<f64> {
        &self.lattice
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Evaluates the runtime noise generator at a point.
    pub fn noise(&self, p: Vec3) -> f64 {
        self.generator.get([p.x, p.y, p.z])
    }

    /// Samples density at `point` and `time` with a sampler resolved from a
    /// `DensityType`.
    ///
    /// If a texture is attached and `texture_weight` is positive, a texture
    /// octave is blended in. The result is always within `[0, 1]`.
    pub fn sample_density(&self, sampler: DensitySampler, point: Vec3, time: f64,
        texture_weight: f64) -> f64 {
        let base = sampler(self, point, time);
        self.blend_texture(base, point, time, texture_weight)
    }

    /// Mixes a texture octave into an already sampled density.
    pub fn blend_texture(&self, base: f64, point: Vec3, time: f64,
        weight: f64) -> f64 {
        if weight <= 0.0 {
            return base;
        }

        match self.sample_texture(point, time) {
            Some(t) => mix(base, t, clamp01(weight)),
            None => base,
        }
    }

    /// Two octaves of runtime noise. The second octave uses `|z|`, which keeps
    /// it symmetric around the xy plane.
    pub fn sample_runtime_perlin(&self, point: Vec3, time: f64) -> f64 {
        let p1 = {
            let scale = 2.0;
            let phase = time * 0.5;
            let coords = point * scale + Vec3::new(phase, 0.0, phase * 2.0);
            clamp01(self.noise(coords))
        };

        let p2 = {
            let scale = 7.0;
            let phase = time;
            let coords = Vec3::new(
                point.x * scale + phase,
                point.y * scale,
                point.z.abs() * scale + phase,
            );
            clamp01(self.noise(coords))
        };

        mix(p1, p2, RUNTIME_OCTAVE_MIX)
    }

    /// Two octaves looked up in the precomputed lattice.
    pub fn sample_pre_calc_perlin(&self, point: Vec3, time: f64) -> f64 {
        let phase = time * 0.08;
        let drift = Vec3::new(phase, 0.0, phase * 2.0);

        let p1 = self.sample_lattice(point * 0.4 + drift + LATTICE_OFFSET);
        let p2 = self.sample_lattice(point * 1.0 + drift + LATTICE_OFFSET);

        mix(p1, p2, PRECALC_OCTAVE_MIX)
    }

    pub fn sample_uniform(&self, _: Vec3, _: f64) -> f64 {
        UNIFORM_DENSITY
    }

    fn sample_lattice(&self, coords: Vec3) -> f64 {
        clamp01(self.lattice.get_from_floats_wrap(coords.x, coords.y, coords.z))
    }

    /// A tiled lookup into the texture, scrolling with time.
    pub fn sample_texture(&self, point: Vec3, time: f64) -> Option<f64> {
        let texture = self.texture.as_ref()?;
        let phase = time * TEXTURE_PHASE_SPEED;
        let x = (point.x * TEXTURE_SCALE + phase).abs() as i64;
        let y = (point.y * TEXTURE_SCALE + phase).abs() as i64;

        Some(clamp01(texture.get_wrap(x, y)))
    }
}

/// Evaluates `generator` at `dim`³ evenly spaced points of the unit cube.
fn precompute_lattice(generator: &Fbm<Perlin>, dim: usize) -> Matrix3D<f64> {
    let mut lattice = Matrix3D::new(dim, dim, dim);
    let step = 1.0 / dim as f64;

    for y in 0..dim {
        for x in 0..dim {
            for z in 0..dim {
                let value = generator.get([
                    x as f64 * step,
                    y as f64 * step,
                    z as f64 * step,
                ]);
                lattice.set(value, x as i64, y as i64, z as i64);
            }
        }
    }

    lattice
}

fn load_texture(path: &Path) -> Result<Matrix2D<f64>> {
    let luma = image::open(path)
        .map_err(|source| Error::Asset { path: path.to_path_buf(), source })?
        .to_luma8();

    let (width, height) = luma.dimensions();
    let values = luma.into_raw()
        .into_iter()
        .map(|v| v as f64 / 255.0)
        .collect();

    Matrix2D::from_values(width as usize, height as usize, values)
        .ok_or_else(|| Error::Asset {
            path: path.to_path_buf(),
            source: image::ImageError::Limits(
                image::error::LimitError::from_kind(
                    image::error::LimitErrorKind::DimensionError)),
        })
}

#[cfg(test)]
fn test_field() -> DensityField {
    DensityField::new(1234, 16).unwrap()
}

#[test]
fn zero_lattice_is_rejected() {
    assert!(matches!(DensityField::new(1, 0), Err(Error::InvalidLattice)));
}

#[test]
fn lattice_matches_generator() {
    let field = test_field();
    let lattice = field.lattice();

    assert_eq!(lattice.width, 16);
    for &(x, y, z) in &[(0, 0, 0), (3, 7, 11), (15, 15, 15)] {
        let expected = field.noise(Vec3::new(
            x as f64 / 16.0, y as f64 / 16.0, z as f64 / 16.0));
        assert_eq!(lattice.get(x, y, z), expected);
    }
}

#[test]
fn density_is_deterministic() {
    let a = test_field();
    let b = test_field();

    let points = [
        Vec3::new(0.1, 0.2, 2.3),
        Vec3::new(-0.7, 0.4, 1.1),
        Vec3::new(0.0, 0.0, 2.0),
    ];

    for variant in [DensityType::PerlinRuntime, DensityType::PerlinPreCalc,
        DensityType::Uniform] {
        for p in points.iter() {
            for &t in &[0.0, 1.5, 42.0] {
                let d1 = a.sample_density(variant.sampler(), *p, t, 0.0);
                let d2 = a.sample_density(variant.sampler(), *p, t, 0.0);
                let d3 = b.sample_density(variant.sampler(), *p, t, 0.0);
                assert_eq!(d1.to_bits(), d2.to_bits());
                assert_eq!(d1.to_bits(), d3.to_bits());
            }
        }
    }
}

#[test]
fn density_is_bounded() {
    let field = test_field()
        .with_texture(Matrix2D::from_values(2, 2, vec![0.0, 1.0, 0.5, 0.25]).unwrap());

    for variant in [DensityType::PerlinRuntime, DensityType::PerlinPreCalc,
        DensityType::Uniform] {
        for i in 0..200 {
            let f = i as f64;
            let p = Vec3::new((f * 0.37).sin() * 2.0, (f * 0.11).cos(), f * 0.05 - 5.0);
            let d = field.sample_density(variant.sampler(), p, f * 0.1, 0.3);
            assert!((0.0..=1.0).contains(&d), "{} out of range for {}", d, variant);
        }
    }
}

#[test]
fn uniform_density_is_constant() {
    let field = test_field();

    assert_eq!(field.sample_density(DensityType::Uniform.sampler(),
        Vec3::new(5.0, 1.0, -3.0), 10.0, 0.0), UNIFORM_DENSITY);
}

#[test]
fn texture_blend_requires_texture_and_weight() {
    let field = test_field();
    let p = Vec3::new(0.25, 0.5, 2.0);

    assert_eq!(field.sample_texture(p, 0.0), None);
    assert_eq!(field.blend_texture(0.4, p, 0.0, 1.0), 0.4);

    let field = field.with_texture(Matrix2D::from_values(1, 1, vec![1.0]).unwrap());
    assert!(field.has_texture());
    assert_eq!(field.blend_texture(0.4, p, 0.0, 0.0), 0.4);
    assert!(crate::feq(field.blend_texture(0.4, p, 0.0, 0.5), 0.7));
    assert!(crate::feq(field.blend_texture(0.4, p, 0.0, 1.0), 1.0));
}

#[test]
fn texture_file_is_read_as_luma() {
    let path = std::env::temp_dir().join("cloud_marcher_luma_texture.png");
    image::save_buffer(&path, &[0, 51, 102, 255], 2, 2, image::ExtendedColorType::L8)
        .unwrap();

    let field = test_field().with_texture_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(field.has_texture());

    // Each texel covers 1/20 of a unit; rows come from y
    let texel = |x: f64, y: f64| field.sample_texture(Vec3::new(x, y, 0.0), 0.0).unwrap();
    assert!(crate::feq(texel(0.01, 0.01), 0.0));
    assert!(crate::feq(texel(0.06, 0.01), 0.2));
    assert!(crate::feq(texel(0.01, 0.06), 0.4));
    assert!(crate::feq(texel(0.06, 0.06), 1.0));

    // Wraps past the edge of the image
    assert!(crate::feq(texel(0.11, 0.01), 0.0));
}

#[test]
fn missing_texture_file_is_asset_error() {
    let result = test_field().with_texture_file("does/not/exist.png");

    assert!(matches!(result, Err(Error::Asset { .. })));
}

#[test]
fn density_type_parses_names() {
    assert_eq!("uniform".parse::<DensityType>(), Ok(DensityType::Uniform));
    assert_eq!("lattice".parse::<DensityType>(), Ok(DensityType::PerlinPreCalc));
    assert_eq!(DensityType::PerlinRuntime.to_string().parse::<DensityType>(),
        Ok(DensityType::PerlinRuntime));
    assert!("worley".parse::<DensityType>().is_err());
}
