pub mod shader_gen;

// this module only has tests for the built-in shaders
#[cfg(test)]
mod shaders;

use crate::assets::{ContentHash, ContentHasher};
use crate::error::*;
use snafu::ensure;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const fn tag(self) -> u8 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
        }
    }

    pub const fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Source text for a shader program, one string per stage.
///
/// With `inject_fragment` set, the fragment string is not a complete module
/// but a snippet that is placed into the default fragment template at
/// [`shader_gen::FRAGMENT_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    pub inject_fragment: bool,
}

/// A single stage ready to be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSource {
    pub stage: ShaderStage,
    pub code: String,
}

impl StageSource {
    /// The stage tag is part of the hash, so a vertex and a fragment module with the
    /// same text are different cache entries.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        hasher.write_u8(self.stage.tag()).write_str(&self.code);
        hasher.finish()
    }
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        ShaderSource {
            name: name.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            inject_fragment: false,
        }
    }

    /// The default vertex stage with `snippet` injected into the default fragment template.
    pub fn injected(name: impl Into<String>, snippet: impl Into<String>) -> Self {
        ShaderSource {
            name: name.into(),
            vertex: shader_gen::default_vertex(),
            fragment: snippet.into(),
            inject_fragment: true,
        }
    }

    pub fn default_program() -> Self {
        ShaderSource::new(
            "Default Program",
            shader_gen::default_vertex(),
            shader_gen::default_fragment(),
        )
    }

    pub fn flat_color() -> Self {
        ShaderSource::new(
            "Flat Color Program",
            shader_gen::default_vertex(),
            shader_gen::flat_color_fragment(),
        )
    }

    /// Produces the final text for both stages.
    pub fn resolve(&self) -> Result<(StageSource, StageSource)> {
        ensure!(
            !self.vertex.trim().is_empty(),
            MissingShaderSourceErr {
                stage: ShaderStage::Vertex
            }
        );
        ensure!(
            !self.fragment.trim().is_empty(),
            MissingShaderSourceErr {
                stage: ShaderStage::Fragment
            }
        );

        let fragment = if self.inject_fragment {
            shader_gen::inject_fragment(&self.fragment)
        } else {
            self.fragment.clone()
        };

        Ok((
            StageSource {
                stage: ShaderStage::Vertex,
                code: self.vertex.clone(),
            },
            StageSource {
                stage: ShaderStage::Fragment,
                code: fragment,
            },
        ))
    }
}
