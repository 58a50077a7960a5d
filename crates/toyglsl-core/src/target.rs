//! GLSL dialect vocabulary.
//!
//! `ShaderTarget` is the closed set of output dialects. Everything that differs between them
//! lives in a static `TargetDescriptor` so that passes dispatch on data instead of matching on
//! the enum in several places.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ToyglslError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderTarget {
    /// OpenGL ES 2.0 / GLSL ES 1.00.
    WebGL1,
    /// OpenGL ES 3.0 / GLSL ES 3.00.
    WebGL2,
    /// OpenGL 3.3 core.
    Desktop330,
    /// OpenGL 4.2+ core.
    Desktop420,
}

impl ShaderTarget {
    pub const ALL: [ShaderTarget; 4] = [
        ShaderTarget::WebGL1,
        ShaderTarget::WebGL2,
        ShaderTarget::Desktop330,
        ShaderTarget::Desktop420,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderTarget::WebGL1 => "webgl1",
            ShaderTarget::WebGL2 => "webgl2",
            ShaderTarget::Desktop330 => "desktop330",
            ShaderTarget::Desktop420 => "desktop420",
        }
    }

    pub fn descriptor(self) -> &'static TargetDescriptor {
        match self {
            ShaderTarget::WebGL1 => &WEBGL1,
            ShaderTarget::WebGL2 => &WEBGL2,
            ShaderTarget::Desktop330 => &DESKTOP330,
            ShaderTarget::Desktop420 => &DESKTOP420,
        }
    }
}

impl fmt::Display for ShaderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the canonical lowercase names plus a few common aliases.
impl FromStr for ShaderTarget {
    type Err = ToyglslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webgl1" | "webgl" | "gles2" | "es100" => Ok(ShaderTarget::WebGL1),
            "webgl2" | "gles3" | "es300" => Ok(ShaderTarget::WebGL2),
            "desktop330" | "gl330" | "330" => Ok(ShaderTarget::Desktop330),
            "desktop420" | "gl420" | "420" => Ok(ShaderTarget::Desktop420),
            _ => Err(ToyglslError::UnknownTarget(s.to_string())),
        }
    }
}

/// GLSL ES precision qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Lowp,
    Mediump,
    Highp,
}

impl Precision {
    pub fn keyword(self) -> &'static str {
        match self {
            Precision::Lowp => "lowp",
            Precision::Mediump => "mediump",
            Precision::Highp => "highp",
        }
    }
}

/// Per-dialect syntax table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub target: ShaderTarget,
    /// `#version` line including the trailing newline; empty when the dialect has none.
    pub version_directive: &'static str,
    pub is_es: bool,
    /// Fragment stages must declare a default float precision.
    pub needs_precision: bool,
    /// Qualifier for fragment stage inputs.
    pub varying_in: &'static str,
    /// Qualifier for vertex stage attribute inputs.
    pub vertex_attribute: &'static str,
    /// Qualifier for vertex stage outputs.
    pub vertex_out: &'static str,
    /// Name of the 2D texture sampling builtin.
    pub sample_fn: &'static str,
    /// Where the final color is written.
    pub frag_output: &'static str,
    /// Suffix used for generated header constants (`fragmentShader300`).
    pub header_suffix: &'static str,
    pub label: &'static str,
}

impl TargetDescriptor {
    /// `true` when the fragment stage declares its own `out vec4` instead of `gl_FragColor`.
    pub fn declares_frag_output(&self) -> bool {
        self.frag_output != "gl_FragColor"
    }
}

static WEBGL1: TargetDescriptor = TargetDescriptor {
    target: ShaderTarget::WebGL1,
    version_directive: "",
    is_es: true,
    needs_precision: true,
    varying_in: "varying",
    vertex_attribute: "attribute",
    vertex_out: "varying",
    sample_fn: "texture2D",
    frag_output: "gl_FragColor",
    header_suffix: "200",
    label: "WebGL1 shaders (OpenGL ES 2.0)",
};

static WEBGL2: TargetDescriptor = TargetDescriptor {
    target: ShaderTarget::WebGL2,
    version_directive: "#version 300 es\n",
    is_es: true,
    needs_precision: true,
    varying_in: "in",
    vertex_attribute: "layout (location = 0) in",
    vertex_out: "out",
    sample_fn: "texture",
    frag_output: "fragColor",
    header_suffix: "300",
    label: "WebGL2 shaders (OpenGL ES 3.0)",
};

static DESKTOP330: TargetDescriptor = TargetDescriptor {
    target: ShaderTarget::Desktop330,
    version_directive: "#version 330 core\n",
    is_es: false,
    needs_precision: false,
    varying_in: "in",
    vertex_attribute: "layout (location = 0) in",
    vertex_out: "out",
    sample_fn: "texture",
    frag_output: "fragColor",
    header_suffix: "330",
    label: "Desktop OpenGL 3.3 shaders",
};

static DESKTOP420: TargetDescriptor = TargetDescriptor {
    target: ShaderTarget::Desktop420,
    version_directive: "#version 420 core\n",
    is_es: false,
    needs_precision: false,
    varying_in: "in",
    vertex_attribute: "layout (location = 0) in",
    vertex_out: "out",
    sample_fn: "texture",
    frag_output: "fragColor",
    header_suffix: "420",
    label: "Desktop OpenGL 4.2+ shaders",
};
