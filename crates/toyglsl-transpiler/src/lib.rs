#![forbid(unsafe_code)]

//! ShaderToy → GLSL dialect transpiler.
//!
//! Pipeline per `(source, target)`: analyze → generate (header, uniforms, builtins, `main()`)
//! → compatibility fixes → result. The `Transpiler` compiles every pattern eagerly in its
//! constructor and holds no mutable state afterwards, so one instance can be shared between
//! threads.
//!
//! This crate does not compile shaders; drivers/hosts consume the returned source.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod analyzer;
pub mod fixer;
pub mod generator;
pub mod header_file;
pub mod scan;

use regex::Regex;

pub use analyzer::Analyzer;
pub use fixer::{default_replacement_table, CompatFixer, CompatRule, FunctionReplacementTable};
pub use generator::{header, vertex_shader, GeneratedFragment, Generator};
pub use toyglsl_core::{
    Precision, ShaderAnalysis, ShaderConversionResult, ShaderTarget, TargetDescriptor,
    ToyglslError, TranspilerConfig,
};

/// `void mainImage(out vec4 <color>, [in] vec2 <coord>)`.
pub(crate) const ENTRY_POINT: &str =
    r"void\s+mainImage\s*\(\s*out\s+vec4\s+(\w+)\s*,\s*(?:in\s+)?vec2\s+(\w+)\s*\)";

/// A declaration whose type keyword starts a line; `ty` captures the qualified type.
pub(crate) const DECL_START: &str = r"(?m)^[ \t]*(?P<ty>(?:const[ \t]+)?(?:(?:lowp|mediump|highp)[ \t]+)?(?:float|int|bool|[biu]?vec[234]|mat[234]))[ \t]+";

pub(crate) fn compile(rule: &'static str, pattern: &str) -> Result<Regex, ToyglslError> {
    Regex::new(pattern).map_err(|e| ToyglslError::rule(rule, e.to_string()))
}

#[derive(Debug)]
pub struct Transpiler {
    config: TranspilerConfig,
    analyzer: Analyzer,
    generator: Generator,
    fixer: CompatFixer,
}

impl Transpiler {
    pub fn new() -> Result<Self, ToyglslError> {
        Self::with_config(TranspilerConfig::default())
    }

    pub fn with_config(config: TranspilerConfig) -> Result<Self, ToyglslError> {
        Ok(Self {
            analyzer: Analyzer::new()?,
            generator: Generator::new(&config)?,
            fixer: CompatFixer::new()?.with_output_limit(
                config
                    .max_source_bytes
                    .saturating_mul(fixer::OUTPUT_GROWTH_FACTOR),
            ),
            config,
        })
    }

    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    pub fn fixer(&self) -> &CompatFixer {
        &self.fixer
    }

    pub fn analyze(&self, code: &str) -> ShaderAnalysis {
        self.analyzer.analyze(code)
    }

    /// Fixed vertex stage for `target`; needs no analysis.
    pub fn vertex_shader(target: ShaderTarget) -> String {
        generator::vertex_shader(target)
    }

    /// Convert one ShaderToy source. Never panics on bad input; failures come back as
    /// `success == false` with an empty vertex/fragment pair.
    pub fn convert(&self, code: &str, target: ShaderTarget) -> ShaderConversionResult {
        if code.len() > self.config.max_source_bytes {
            let err = ToyglslError::SourceTooLarge {
                len: code.len(),
                max: self.config.max_source_bytes,
            };
            tracing::warn!(dialect = %target, error = %err, "shader conversion failed");
            return ShaderConversionResult::failed(Some(target), err, ShaderAnalysis::default());
        }

        let analysis = self.analyze(code);
        match self.try_convert(code, target, &analysis) {
            Ok(fragment) => {
                tracing::debug!(dialect = %target, bytes = fragment.len(), "shader converted");
                ShaderConversionResult::ok(
                    target,
                    Self::vertex_shader(target),
                    fragment,
                    analysis,
                )
            }
            Err(err) => {
                tracing::warn!(dialect = %target, error = %err, "shader conversion failed");
                ShaderConversionResult::failed(Some(target), err, analysis)
            }
        }
    }

    /// Like [`Transpiler::convert`], with the target given by name (`"webgl2"`, `"gl330"`, ...).
    /// An unknown name is reported as a failed conversion.
    pub fn convert_named(&self, code: &str, target: &str) -> ShaderConversionResult {
        match target.parse::<ShaderTarget>() {
            Ok(t) => self.convert(code, t),
            Err(err) => {
                tracing::warn!(name = target, error = %err, "shader conversion failed");
                ShaderConversionResult::failed(None, err, self.analyze(code))
            }
        }
    }

    fn try_convert(
        &self,
        code: &str,
        target: ShaderTarget,
        analysis: &ShaderAnalysis,
    ) -> Result<String, ToyglslError> {
        let GeneratedFragment { preamble, body } =
            self.generator.generate_parts(code, target, analysis)?;

        let body = self.fixer.fix(&body, target)?;
        let body = self.fixer.apply_analysis_fixes(&body, target, analysis)?;
        let body = self.fixer.annotate(&body, target, &self.config);

        let mut fragment = preamble;
        fragment.push_str(&body);
        Ok(fragment)
    }

    /// Header blob with one vertex/fragment constant pair per target.
    pub fn generate_header_file(
        &self,
        code: &str,
        shader_name: &str,
        targets: &[ShaderTarget],
    ) -> String {
        header_file::render(shader_name, targets, |t| self.convert(code, t))
    }

    /// [`Transpiler::generate_header_file`] over the configured `header_targets`.
    pub fn generate_header_file_default(&self, code: &str, shader_name: &str) -> String {
        self.generate_header_file(code, shader_name, &self.config.header_targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED: &str =
        "void mainImage(out vec4 o, in vec2 f){ o = texture(iChannel0, f/iResolution.xy); }";

    fn transpiler() -> Transpiler {
        Transpiler::new().unwrap()
    }

    #[test]
    fn webgl2_end_to_end() {
        let r = transpiler().convert(TEXTURED, ShaderTarget::WebGL2);
        assert!(r.success, "{}", r.error_message);
        assert_eq!(r.target_used, Some(ShaderTarget::WebGL2));
        let f = &r.fragment_shader;
        assert!(f.starts_with("#version 300 es\n"));
        assert!(f.contains("uniform sampler2D iChannel0;"));
        assert!(f.contains("in vec2 vFragCoord;"));
        assert!(f.contains("out vec4 fragColor;"));
        assert!(f.contains("mainImage(fragColor, gl_FragCoord.xy);"));
        assert!(f.contains(TEXTURED));
        assert_eq!(r.vertex_shader, Transpiler::vertex_shader(ShaderTarget::WebGL2));
    }

    #[test]
    fn webgl1_renames_texture_and_uses_gl_frag_color() {
        let r = transpiler().convert(TEXTURED, ShaderTarget::WebGL1);
        assert!(r.success, "{}", r.error_message);
        let f = &r.fragment_shader;
        assert!(f.contains("texture2D(iChannel0"));
        assert!(!f.contains("texture(iChannel0"));
        assert!(f.contains("gl_FragColor = color;"));
        assert!(!f.contains("#version"));
        assert!(f.starts_with("precision mediump float;\n"));
    }

    #[test]
    fn webgl1_mod_rewrite() {
        let code = "void mainImage(out vec4 c, in vec2 p){ float x = p.x, y = 3.0; c = vec4(mod(x, y)); }";
        let r = transpiler().convert(code, ShaderTarget::WebGL1);
        assert!(r.success, "{}", r.error_message);
        assert!(r.fragment_shader.contains("floor("));
        assert!(!r.fragment_shader.contains("mod(x, y)"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let t = transpiler();
        for target in ShaderTarget::ALL {
            let a = t.convert(TEXTURED, target);
            let b = t.convert(TEXTURED, target);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn failures_are_contained() {
        let t = transpiler();

        let r = t.convert_named(TEXTURED, "webgl3");
        assert!(!r.success);
        assert!(r.error_message.starts_with("Conversion failed: "));
        assert!(r.error_message.contains("webgl3"));
        assert_eq!(r.target_used, None);
        assert!(r.vertex_shader.is_empty() && r.fragment_shader.is_empty());

        let r = t.convert("float f(float x) { return x; }", ShaderTarget::Desktop330);
        assert!(!r.success);
        assert!(r.error_message.contains("mainImage"));
        assert!(r.fragment_shader.is_empty());

        let r = t.convert(
            "void mainImage(out vec4 c, in vec2 p){ c = vec4(mod(p.x, 2.0; }",
            ShaderTarget::WebGL1,
        );
        assert!(!r.success);
        assert!(r.error_message.contains("mod_expansion"), "{}", r.error_message);
        assert!(r.fragment_shader.is_empty());
    }

    #[test]
    fn oversized_sources_are_rejected() {
        let cfg = TranspilerConfig {
            max_source_bytes: 16,
            ..TranspilerConfig::default()
        };
        let r = Transpiler::with_config(cfg)
            .unwrap()
            .convert(TEXTURED, ShaderTarget::WebGL2);
        assert!(!r.success);
        assert!(r.error_message.contains("limit is 16"));
    }

    #[test]
    fn commented_main_is_not_a_conflict() {
        let code = "// host wraps this in void main() automatically\nvoid mainImage(out vec4 c, in vec2 p){ c = vec4(1.0); }";
        for target in ShaderTarget::ALL {
            let r = transpiler().convert(code, target);
            assert!(r.success, "{target}: {}", r.error_message);
            assert!(r.fragment_shader.contains(code));
        }

        let r = transpiler().convert(
            "/* void mainImage(out vec4 c, in vec2 p) {} */\nvoid main() {}",
            ShaderTarget::WebGL2,
        );
        assert!(!r.success);
        assert!(r.error_message.contains("mainImage"), "{}", r.error_message);
    }

    #[test]
    fn nested_rewrites_fail_cleanly() {
        let cfg = TranspilerConfig {
            max_source_bytes: 1024,
            ..TranspilerConfig::default()
        };
        let t = Transpiler::with_config(cfg).unwrap();
        assert_eq!(t.fixer().output_limit(), 4096);

        let levels = 20;
        let code = format!(
            "void mainImage(out vec4 c, in vec2 p){{ c = vec4({}p.x{}); }}",
            "mod(".repeat(levels),
            ", 2.0)".repeat(levels)
        );
        let r = t.convert(&code, ShaderTarget::WebGL1);
        assert!(!r.success);
        assert!(r.error_message.contains("exceeds 4096 bytes"), "{}", r.error_message);
        assert!(r.fragment_shader.is_empty());

        let levels = 6_000;
        let code = format!(
            "void mainImage(out vec4 c, in vec2 p){{ c = vec4({}p.x{}); }}",
            "mod(".repeat(levels),
            ", 2.0)".repeat(levels)
        );
        let r = transpiler().convert(&code, ShaderTarget::WebGL1);
        assert!(!r.success);
        assert!(r.error_message.contains("nested deeper than"), "{}", r.error_message);
    }

    #[test]
    fn precision_comes_from_config() {
        let cfg = TranspilerConfig {
            float_precision: Precision::Highp,
            ..TranspilerConfig::default()
        };
        let r = Transpiler::with_config(cfg)
            .unwrap()
            .convert(TEXTURED, ShaderTarget::WebGL2);
        assert!(r.fragment_shader.contains("precision highp float;\n"));
        assert!(r.fragment_shader.contains("precision mediump int;\n"));
    }

    #[test]
    fn shared_between_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Transpiler>();

        let t = transpiler();
        let expected = t.convert(TEXTURED, ShaderTarget::WebGL1);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| t.convert(TEXTURED, ShaderTarget::WebGL1)))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
