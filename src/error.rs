use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while setting up a render.
///
/// These are all startup failures. Once a frame is running, rendering never
/// fails; out-of-range values are clamped at pixel quantization instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("camera is degenerate (near plane {near_plane}, aspect {aspect})")]
    DegenerateCamera { near_plane: f64, aspect: f64 },

    #[error("sphere radius must be positive and finite, got {radius}")]
    DegenerateSphere { radius: f64 },

    #[error("viewport must be at least 1x1 pixels")]
    EmptyViewport,

    #[error("noise lattice dimension must be positive")]
    InvalidLattice,

    #[error("failed to load texture asset {path:?}")]
    Asset {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed scene description: {0}")]
    SceneJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
