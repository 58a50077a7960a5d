//! Fragment and vertex source synthesis.
//!
//! The generator emits everything that wraps the author's code (version line, extensions,
//! precision, uniforms, stage I/O, `main()`) and performs the builtin substitutions. It never
//! rewrites the body of `mainImage`.

use std::collections::BTreeSet;

use regex::Regex;
use toyglsl_core::{ShaderAnalysis, ShaderTarget, ToyglslError, TranspilerConfig};

use crate::scan;
use crate::{compile, ENTRY_POINT};

/// Optional ShaderToy uniforms, emitted only when the source mentions them.
const OPTIONAL_UNIFORMS: [(&str, &str); 3] =
    [("iMouse", "vec4"), ("iFrame", "int"), ("iDate", "vec4")];

/// Pixel coordinate reconstructed from the normalized varying on WebGL1.
const WEBGL1_FRAG_COORD: &str = "vFragCoord * iResolution.xy";

/// Fullscreen-quad vertex stage that pairs with every generated fragment stage.
pub fn vertex_shader(target: ShaderTarget) -> String {
    let desc = target.descriptor();
    let mut out = String::from(desc.version_directive);
    if desc.needs_precision {
        out.push_str("precision highp float;\n");
    }
    out.push_str(&format!(
        "{} vec2 pos;\n\
         {} vec2 vFragCoord;\n\
         void main() {{\n    vFragCoord = pos * 0.5 + 0.5;\n    gl_Position = vec4(pos, 0.0, 1.0);\n}}\n",
        desc.vertex_attribute, desc.vertex_out
    ));
    out
}

/// `#version` line for `target` (empty for WebGL1).
pub fn header(target: ShaderTarget) -> &'static str {
    target.descriptor().version_directive
}

/// A generated fragment split at the point where compatibility fixes start to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFragment {
    /// Version, extensions, precision, uniforms and stage I/O.
    pub preamble: String,
    /// The author's code after builtin substitution, followed by the synthesized `main()`.
    pub body: String,
}

impl GeneratedFragment {
    pub fn into_source(self) -> String {
        let mut s = self.preamble;
        s.push_str(&self.body);
        s
    }
}

#[derive(Debug)]
pub struct Generator {
    float_precision: &'static str,
    int_precision: &'static str,
    entry_point: Regex,
    main_fn: Regex,
    declared_uniform: Regex,
    frag_coord_xy: Regex,
    frag_coord: Regex,
    texture_call: Regex,
}

impl Generator {
    pub fn new(config: &TranspilerConfig) -> Result<Self, ToyglslError> {
        Ok(Self {
            float_precision: config.float_precision.keyword(),
            int_precision: config.int_precision.keyword(),
            entry_point: compile("entry_point", ENTRY_POINT)?,
            main_fn: compile("entry_point", r"\bvoid\s+main\s*\(")?,
            declared_uniform: compile(
                "uniforms",
                r"\buniform\s+(?:(?:lowp|mediump|highp)\s+)?\w+\s+(\w+)",
            )?,
            frag_coord_xy: compile("builtins", r"\bgl_FragCoord\.xy\b")?,
            frag_coord: compile("builtins", r"\bgl_FragCoord\b")?,
            texture_call: compile("builtins", r"\btexture\s*\(")?,
        })
    }

    /// `#extension` directives WebGL1 needs for features the source uses.
    pub fn extensions(&self, target: ShaderTarget, analysis: &ShaderAnalysis) -> String {
        let mut out = String::new();
        if target != ShaderTarget::WebGL1 {
            return out;
        }
        if analysis.has_derivatives {
            out.push_str("#extension GL_OES_standard_derivatives : enable\n");
        }
        if analysis.has_texture_lod {
            out.push_str("#extension GL_EXT_shader_texture_lod : enable\n");
        }
        out
    }

    fn declared_uniforms<'a>(&self, code: &'a str) -> BTreeSet<&'a str> {
        self.declared_uniform
            .captures_iter(code)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// Precision lines, ShaderToy uniforms and stage I/O, in a fixed order.
    pub fn uniforms(&self, code: &str, target: ShaderTarget, analysis: &ShaderAnalysis) -> String {
        let desc = target.descriptor();
        let declared = self.declared_uniforms(code);
        let mut out = String::new();
        let uniform = |ty: &str, name: &str, out: &mut String| {
            if !declared.contains(name) {
                out.push_str(&format!("uniform {ty} {name};\n"));
            }
        };

        if desc.needs_precision {
            out.push_str(&format!("precision {} float;\n", self.float_precision));
            out.push_str(&format!("precision {} int;\n", self.int_precision));
            out.push('\n');
        }

        uniform("float", "iTime", &mut out);
        uniform("float", "iTimeDelta", &mut out);
        uniform("vec3", "iResolution", &mut out);

        for (name, ty) in OPTIONAL_UNIFORMS {
            if code.contains(name) {
                uniform(ty, name, &mut out);
            }
        }

        for channel in &analysis.texture_channels {
            uniform("sampler2D", channel, &mut out);
        }
        if desc.is_es && !analysis.texture_channels.is_empty() {
            let sized = format!("iChannelResolution[{}]", analysis.texture_channels.len());
            if !declared.contains("iChannelResolution") {
                uniform("vec3", &sized, &mut out);
            }
        }

        out.push('\n');
        out.push_str(&format!("{} vec2 vFragCoord;\n", desc.varying_in));
        if desc.declares_frag_output() {
            out.push_str(&format!("out vec4 {};\n", desc.frag_output));
        }
        out.push('\n');
        out
    }

    /// Replace ShaderToy/desktop builtins that do not exist on `target`.
    pub fn builtins(&self, code: &str, target: ShaderTarget) -> String {
        let desc = target.descriptor();
        let mut out = code.to_string();
        if target == ShaderTarget::WebGL1 {
            out = self
                .frag_coord_xy
                .replace_all(&out, format!("({WEBGL1_FRAG_COORD})").as_str())
                .into_owned();
            out = self
                .frag_coord
                .replace_all(&out, format!("vec4({WEBGL1_FRAG_COORD}, 0.0, 1.0)").as_str())
                .into_owned();
        }
        if desc.sample_fn != "texture" {
            out = self
                .texture_call
                .replace_all(&out, format!("{}(", desc.sample_fn).as_str())
                .into_owned();
        }
        out
    }

    /// Append a `main()` that forwards to the untouched `mainImage`.
    pub fn main_wrapper(&self, code: &str, target: ShaderTarget) -> Result<String, ToyglslError> {
        if scan::find_outside_comments(&self.entry_point, code).is_none() {
            return Err(ToyglslError::MissingEntryPoint);
        }
        if scan::find_outside_comments(&self.main_fn, code).is_some() {
            return Err(ToyglslError::EntryPointConflict);
        }

        let mut out = String::with_capacity(code.len() + 128);
        out.push_str(code);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');

        let desc = target.descriptor();
        if desc.declares_frag_output() {
            out.push_str(&format!(
                "void main() {{\n    mainImage({}, gl_FragCoord.xy);\n}}\n",
                desc.frag_output
            ));
        } else {
            out.push_str(&format!(
                "void main() {{\n    vec4 color;\n    mainImage(color, {WEBGL1_FRAG_COORD});\n    {} = color;\n}}\n",
                desc.frag_output
            ));
        }
        Ok(out)
    }

    pub fn generate_parts(
        &self,
        code: &str,
        target: ShaderTarget,
        analysis: &ShaderAnalysis,
    ) -> Result<GeneratedFragment, ToyglslError> {
        let mut preamble = String::from(header(target));
        preamble.push_str(&self.extensions(target, analysis));
        preamble.push_str(&self.uniforms(code, target, analysis));

        let body = self.builtins(code, target);
        let body = self.main_wrapper(&body, target)?;
        Ok(GeneratedFragment { preamble, body })
    }

    /// Full fragment source before compatibility fixing.
    pub fn generate(
        &self,
        code: &str,
        target: ShaderTarget,
        analysis: &ShaderAnalysis,
    ) -> Result<String, ToyglslError> {
        Ok(self.generate_parts(code, target, analysis)?.into_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use pretty_assertions::assert_eq;

    fn generator() -> Generator {
        Generator::new(&TranspilerConfig::default()).unwrap()
    }

    fn analysis(code: &str) -> ShaderAnalysis {
        Analyzer::new().unwrap().analyze(code)
    }

    #[test]
    fn headers_per_dialect() {
        assert_eq!(header(ShaderTarget::WebGL1), "");
        assert_eq!(header(ShaderTarget::WebGL2), "#version 300 es\n");
        assert_eq!(header(ShaderTarget::Desktop330), "#version 330 core\n");
        assert_eq!(header(ShaderTarget::Desktop420), "#version 420 core\n");
    }

    #[test]
    fn webgl1_uniform_block_is_fixed_order() {
        let code = "void mainImage(out vec4 c, in vec2 f){ c = texture(iChannel1, f) * float(iFrame); }";
        let u = generator().uniforms(code, ShaderTarget::WebGL1, &analysis(code));
        assert_eq!(
            u,
            "precision mediump float;\n\
             precision mediump int;\n\
             \n\
             uniform float iTime;\n\
             uniform float iTimeDelta;\n\
             uniform vec3 iResolution;\n\
             uniform int iFrame;\n\
             uniform sampler2D iChannel1;\n\
             uniform vec3 iChannelResolution[1];\n\
             \n\
             varying vec2 vFragCoord;\n\
             \n"
        );
    }

    #[test]
    fn desktop_uniforms_have_no_precision_or_channel_resolution() {
        let code = "void mainImage(out vec4 c, in vec2 f){ c = texture(iChannel0, f) + iMouse; }";
        let u = generator().uniforms(code, ShaderTarget::Desktop330, &analysis(code));
        assert!(!u.contains("precision"));
        assert!(!u.contains("iChannelResolution"));
        assert!(u.contains("uniform vec4 iMouse;\n"));
        assert!(u.contains("uniform sampler2D iChannel0;\n"));
        assert!(u.ends_with("in vec2 vFragCoord;\nout vec4 fragColor;\n\n"));
        assert!(!u.contains("iDate"));
    }

    #[test]
    fn uniforms_already_declared_by_the_source_are_skipped() {
        let code = "uniform float iTime;\nvoid mainImage(out vec4 c, in vec2 f){ c = vec4(iTime); }";
        let u = generator().uniforms(code, ShaderTarget::WebGL2, &analysis(code));
        assert!(!u.contains("uniform float iTime;"));
        assert!(u.contains("uniform float iTimeDelta;"));
    }

    #[test]
    fn webgl1_builtins() {
        let g = generator();
        let out = g.builtins(
            "vec2 p = gl_FragCoord.xy / 2.0; float z = gl_FragCoord.z; vec4 c = texture(iChannel0, p); vec4 d = textureLod(iChannel0, p, 1.);",
            ShaderTarget::WebGL1,
        );
        assert_eq!(
            out,
            "vec2 p = (vFragCoord * iResolution.xy) / 2.0; float z = vec4(vFragCoord * iResolution.xy, 0.0, 1.0).z; vec4 c = texture2D(iChannel0, p); vec4 d = textureLod(iChannel0, p, 1.);"
        );
    }

    #[test]
    fn other_targets_keep_builtins() {
        let code = "vec4 c = texture(iChannel0, gl_FragCoord.xy);";
        for t in [ShaderTarget::WebGL2, ShaderTarget::Desktop330, ShaderTarget::Desktop420] {
            assert_eq!(generator().builtins(code, t), code);
        }
    }

    #[test]
    fn main_wrapper_appends_and_preserves_entry_point() {
        let code = "void mainImage(out vec4 O, vec2 I) { O = vec4(I, 0, 1); }";
        let g = generator();

        let out = g.main_wrapper(code, ShaderTarget::Desktop330).unwrap();
        assert!(out.starts_with(code));
        assert!(out.ends_with("void main() {\n    mainImage(fragColor, gl_FragCoord.xy);\n}\n"));

        let out = g.main_wrapper(code, ShaderTarget::WebGL1).unwrap();
        assert!(out.starts_with(code));
        assert!(out.contains("mainImage(color, vFragCoord * iResolution.xy);"));
        assert!(out.contains("gl_FragColor = color;"));
    }

    #[test]
    fn main_wrapper_rejects_missing_or_conflicting_entry_points() {
        let g = generator();
        let err = g
            .main_wrapper("void main() { gl_FragColor = vec4(1); }", ShaderTarget::WebGL2)
            .unwrap_err();
        assert!(matches!(err, ToyglslError::MissingEntryPoint));

        let err = g
            .main_wrapper(
                "void mainImage(out vec4 c, in vec2 f) {}\nvoid main() {}",
                ShaderTarget::WebGL2,
            )
            .unwrap_err();
        assert!(matches!(err, ToyglslError::EntryPointConflict));
    }

    #[test]
    fn main_wrapper_ignores_commented_signatures() {
        let g = generator();
        let code = "// host wraps this in void main() automatically\nvoid mainImage(out vec4 c, in vec2 p){ c = vec4(1.0); }";
        let out = g.main_wrapper(code, ShaderTarget::WebGL2).unwrap();
        assert!(out.starts_with(code));

        let err = g
            .main_wrapper(
                "/* void mainImage(out vec4 c, in vec2 p) {} */ float f() { return 1.; }",
                ShaderTarget::WebGL2,
            )
            .unwrap_err();
        assert!(matches!(err, ToyglslError::MissingEntryPoint));
    }

    #[test]
    fn generate_is_preamble_then_wrapped_body() {
        let code = "void mainImage(out vec4 c, in vec2 f){ c = texture(iChannel0, f); }";
        let a = analysis(code);
        let g = generator();

        let full = g.generate(code, ShaderTarget::WebGL1, &a).unwrap();
        let parts = g.generate_parts(code, ShaderTarget::WebGL1, &a).unwrap();
        assert!(full.starts_with(&parts.preamble));
        assert!(full.ends_with(&parts.body));
        assert_eq!(full, parts.into_source());
        assert!(full.contains("uniform sampler2D iChannel0;\n"));
        assert!(full.contains("c = texture2D(iChannel0, f);"));

        let err = g
            .generate("float f() { return 1.; }", ShaderTarget::Desktop330, &a)
            .unwrap_err();
        assert!(matches!(err, ToyglslError::MissingEntryPoint));
    }

    #[test]
    fn webgl1_extensions_follow_analysis() {
        let code = "void mainImage(out vec4 c, in vec2 f){ c = vec4(dFdx(f), 0, 1); }";
        let a = analysis(code);
        let g = generator();
        assert_eq!(
            g.extensions(ShaderTarget::WebGL1, &a),
            "#extension GL_OES_standard_derivatives : enable\n"
        );
        assert_eq!(g.extensions(ShaderTarget::WebGL2, &a), "");
    }

    #[test]
    fn vertex_stage_writes_the_varying_the_fragment_reads() {
        assert_eq!(
            vertex_shader(ShaderTarget::WebGL2),
            "#version 300 es\n\
             precision highp float;\n\
             layout (location = 0) in vec2 pos;\n\
             out vec2 vFragCoord;\n\
             void main() {\n    vFragCoord = pos * 0.5 + 0.5;\n    gl_Position = vec4(pos, 0.0, 1.0);\n}\n"
        );
        assert!(!vertex_shader(ShaderTarget::Desktop420).contains("precision"));
        for t in ShaderTarget::ALL {
            let v = vertex_shader(t);
            assert!(v.starts_with(header(t)));
            assert!(v.contains(&format!("{} vec2 vFragCoord;", t.descriptor().vertex_out)));
            assert!(v.contains(&format!("{} vec2 pos;", t.descriptor().vertex_attribute)));
        }
    }
}
