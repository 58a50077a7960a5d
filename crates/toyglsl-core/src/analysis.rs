use std::collections::BTreeSet;

use serde::Serialize;

use crate::ShaderTarget;

/// Static observations about one ShaderToy source.
///
/// Produced once by the analyzer and never mutated afterwards. Sets are ordered so that
/// anything generated from them is deterministic (`iChannel0` before `iChannel2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShaderAnalysis {
    pub has_complex_math: bool,
    pub has_multi_declarations: bool,
    pub has_non_standard_params: bool,
    pub has_advanced_glsl: bool,
    pub has_texture_channels: bool,
    pub has_custom_functions: bool,
    pub has_loops: bool,
    pub has_conditionals: bool,
    /// `dFdx`/`dFdy`/`fwidth`; WebGL1 needs `GL_OES_standard_derivatives`.
    pub has_derivatives: bool,
    /// `textureLod`/`textureGrad`; WebGL1 needs `GL_EXT_shader_texture_lod`.
    pub has_texture_lod: bool,

    pub used_functions: BTreeSet<String>,
    pub texture_channels: BTreeSet<String>,
    pub custom_functions: BTreeSet<String>,

    /// Advisory only; never blocks conversion.
    pub warnings: Vec<String>,
}

impl ShaderAnalysis {
    /// Channel indices in ascending order (`iChannel2` -> 2).
    pub fn channel_indices(&self) -> Vec<u32> {
        self.texture_channels
            .iter()
            .filter_map(|c| c.strip_prefix("iChannel"))
            .filter_map(|n| n.parse().ok())
            .collect()
    }
}

/// Output of one `(source, target)` conversion.
///
/// When `success` is false both shader strings are empty; partial output is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShaderConversionResult {
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub success: bool,
    pub error_message: String,
    pub analysis: ShaderAnalysis,
    /// `None` only when the requested target name could not be resolved.
    pub target_used: Option<ShaderTarget>,
}

impl ShaderConversionResult {
    pub fn ok(
        target: ShaderTarget,
        vertex_shader: String,
        fragment_shader: String,
        analysis: ShaderAnalysis,
    ) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            success: true,
            error_message: String::new(),
            analysis,
            target_used: Some(target),
        }
    }

    pub fn failed(
        target: Option<ShaderTarget>,
        error: impl std::fmt::Display,
        analysis: ShaderAnalysis,
    ) -> Self {
        Self {
            vertex_shader: String::new(),
            fragment_shader: String::new(),
            success: false,
            error_message: format!("Conversion failed: {error}"),
            analysis,
            target_used: target,
        }
    }
}
