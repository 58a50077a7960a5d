//! Static analysis of raw ShaderToy sources.
//!
//! The analyzer never fails and never touches its input. Every detector is a separate method so
//! each one can be tested on its own.

use regex::Regex;
use toyglsl_core::{ShaderAnalysis, ToyglslError};

use crate::scan;
use crate::{compile, DECL_START, ENTRY_POINT};

/// Complex-math builtins, in the order they are reported.
pub const COMPLEX_MATH_FUNCTIONS: [&str; 8] =
    ["pow", "exp", "log", "sqrt", "sin", "cos", "atan", "length"];

#[derive(Debug)]
pub struct Analyzer {
    channel: Regex,
    complex_math: Regex,
    multi_decl: Regex,
    decl_start: Regex,
    entry_point: Regex,
    custom_fn: Regex,
    loops: Regex,
    conditionals: Regex,
    matrix_ctor: Regex,
    empty_for: Regex,
    derivatives: Regex,
    texture_lod: Regex,
}

impl Analyzer {
    pub fn new() -> Result<Self, ToyglslError> {
        Ok(Self {
            channel: compile("analyze_channels", r"\biChannel[0-9]\b")?,
            complex_math: compile(
                "analyze_complex_math",
                r"\b(pow|exp|log|sqrt|sin|cos|atan|length)\(",
            )?,
            multi_decl: compile(
                "analyze_multi_declarations",
                r"\b(?:float|int|bool|[biu]?vec[234]|mat[234])\s+\w+\s*=\s*[^;,]+,\s*\w+\s*=",
            )?,
            decl_start: compile("analyze_multi_declarations", DECL_START)?,
            entry_point: compile("analyze_entry_point", ENTRY_POINT)?,
            custom_fn: compile(
                "analyze_custom_functions",
                r"\b(?:float|int|bool|[biu]?vec[234]|mat[234])\s+(\w+)\s*\([^)]*\)\s*\{",
            )?,
            loops: compile("analyze_loops", r"\b(?:for|while)\s*\(")?,
            conditionals: compile("analyze_conditionals", r"\bif\s*\(")?,
            matrix_ctor: compile("analyze_advanced", r"\bmat[234]\s*\(")?,
            empty_for: compile("analyze_advanced", r"\bfor\s*\(\s*;")?,
            derivatives: compile("analyze_derivatives", r"\b(?:dFdx|dFdy|fwidth)\s*\(")?,
            texture_lod: compile(
                "analyze_texture_lod",
                r"\b(?:textureLod|textureGrad|texture2DLodEXT|texture2DGradEXT)\s*\(",
            )?,
        })
    }

    pub fn analyze(&self, code: &str) -> ShaderAnalysis {
        let mut a = ShaderAnalysis::default();

        self.detect_texture_channels(code, &mut a);
        self.detect_complex_math(code, &mut a);
        self.detect_multi_declarations(code, &mut a);
        self.detect_entry_point_params(code, &mut a);
        self.detect_custom_functions(code, &mut a);
        self.detect_advanced_glsl(code, &mut a);
        self.detect_control_flow(code, &mut a);

        a.has_derivatives = self.derivatives.is_match(code);
        a.has_texture_lod = self.texture_lod.is_match(code);

        tracing::debug!(
            channels = a.texture_channels.len(),
            custom_functions = a.custom_functions.len(),
            warnings = a.warnings.len(),
            "analyzed shader source"
        );
        a
    }

    pub fn detect_texture_channels(&self, code: &str, a: &mut ShaderAnalysis) {
        for m in self.channel.find_iter(code) {
            a.texture_channels.insert(m.as_str().to_string());
        }
        a.has_texture_channels = !a.texture_channels.is_empty();
        if a.has_texture_channels {
            let list: Vec<&str> = a.texture_channels.iter().map(String::as_str).collect();
            a.warnings.push(format!(
                "ShaderToy texture channels detected ({}) - host must bind sampler uniforms",
                list.join(", ")
            ));
        }
    }

    pub fn detect_complex_math(&self, code: &str, a: &mut ShaderAnalysis) {
        for caps in self.complex_math.captures_iter(code) {
            a.used_functions.insert(caps[1].to_string());
        }
        a.has_complex_math = !a.used_functions.is_empty();
        if a.has_complex_math {
            let list: Vec<&str> = COMPLEX_MATH_FUNCTIONS
                .iter()
                .copied()
                .filter(|f| a.used_functions.contains(*f))
                .collect();
            a.warnings.push(format!(
                "Complex mathematical functions detected: {}",
                list.join(", ")
            ));
        }
    }

    pub fn detect_multi_declarations(&self, code: &str, a: &mut ShaderAnalysis) {
        a.has_multi_declarations = self.multi_decl.is_match(code)
            || !scan::find_multi_declarations(code, &self.decl_start).is_empty();
        if a.has_multi_declarations {
            a.warnings
                .push("Multiple variable declarations on single line detected".to_string());
        }
    }

    pub fn detect_entry_point_params(&self, code: &str, a: &mut ShaderAnalysis) {
        let Some(caps) = scan::captures_outside_comments(&self.entry_point, code) else {
            return;
        };
        let color = &caps[1];
        let coord = &caps[2];
        if color != "fragColor" || coord != "fragCoord" {
            a.has_non_standard_params = true;
            a.warnings.push(format!(
                "Non-standard parameter names: {color}, {coord} (should be fragColor, fragCoord)"
            ));
        }
    }

    pub fn detect_custom_functions(&self, code: &str, a: &mut ShaderAnalysis) {
        for caps in self.custom_fn.captures_iter(code) {
            let name = &caps[1];
            if name != "mainImage" && name != "main" {
                a.custom_functions.insert(name.to_string());
            }
        }
        a.has_custom_functions = !a.custom_functions.is_empty();
        if a.has_custom_functions {
            a.warnings.push(
                "Custom function definitions detected - verify parameter conversions".to_string(),
            );
        }
    }

    pub fn detect_advanced_glsl(&self, code: &str, a: &mut ShaderAnalysis) {
        if self.matrix_ctor.is_match(code) {
            a.has_advanced_glsl = true;
            a.warnings
                .push("Matrix constructors detected - verify compatibility".to_string());
        }
        if self.empty_for.is_match(code) {
            a.has_advanced_glsl = true;
            a.warnings
                .push("Empty for-loop initialization detected".to_string());
        }
        if code.contains(" += ") && code.contains(" = -") {
            a.has_advanced_glsl = true;
            a.warnings
                .push("Complex chained assignments detected (e.g., g += d = -...)".to_string());
        }
    }

    pub fn detect_control_flow(&self, code: &str, a: &mut ShaderAnalysis) {
        a.has_loops = self.loops.is_match(code);
        a.has_conditionals = self.conditionals.is_match(code);
        if a.has_loops {
            a.warnings
                .push("Loops detected - WebGL1 requires constant loop bounds".to_string());
        }
        if a.has_conditionals {
            a.warnings.push("Conditional branches detected".to_string());
        }
    }
}
