use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name of the vertex stage inside the shader directory.
pub const VERTEX_FILE: &str = "vertex.wgsl";

/// File name of the fragment stage inside the shader directory.
pub const FRAGMENT_FILE: &str = "fragment.wgsl";

/// Either shader source could not be read.
///
/// The underlying I/O error is intentionally not carried.
#[derive(Debug, Error)]
#[error("unable to read shaders from `{}`", .dir.display())]
pub struct ShaderLoadError {
    dir: PathBuf,
}

impl ShaderLoadError {
    /// Directory the shaders were read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Raw WGSL text for the vertex and fragment stages.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    vertex: String,
    fragment: String,
}

impl ShaderSources {
    /// Reads `vertex.wgsl` and `fragment.wgsl` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ShaderLoadError> {
        let dir = dir.as_ref();
        let read = |file: &str| {
            fs::read_to_string(dir.join(file)).map_err(|_| ShaderLoadError {
                dir: dir.to_path_buf(),
            })
        };

        let sources = Self {
            vertex: read(VERTEX_FILE)?,
            fragment: read(FRAGMENT_FILE)?,
        };
        log::debug!("loaded shader sources from {}", dir.display());
        Ok(sources)
    }

    pub fn from_strings(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}
