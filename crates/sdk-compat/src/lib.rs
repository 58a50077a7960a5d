//! Compile-only compatibility crate.
//!
//! This crate exists to ensure the public transpiler surface remains usable by third-party
//! consumers. It is not shipped or run; it must only build.

use toyglsl_core::{
    load_typed_json, Precision, ShaderAnalysis, ShaderConversionResult, ShaderTarget,
    TargetDescriptor, ToyglslError, TranspilerConfig,
};
use toyglsl_transpiler::{default_replacement_table, CompatFixer, Transpiler};

#[allow(dead_code)]
pub fn _compile_witness() -> Result<(), ToyglslError> {
    // Config is constructible with explicit fields and loadable from JSON.
    let cfg = TranspilerConfig {
        float_precision: Precision::Highp,
        header_targets: vec![ShaderTarget::WebGL2],
        ..TranspilerConfig::default()
    };
    let _from_str = TranspilerConfig::from_json_str("{}", "inline")?;
    let _loader: fn(&str) -> Result<TranspilerConfig, ToyglslError> = |p| load_typed_json(p);

    // Target data stays plain and static.
    let desc: &'static TargetDescriptor = ShaderTarget::WebGL1.descriptor();
    let _ = (desc.header_suffix, desc.label, desc.sample_fn);

    // The pipeline entry points are callable using only public APIs.
    let t = Transpiler::with_config(cfg)?;
    let analysis: ShaderAnalysis = t.analyze("void mainImage(out vec4 c, in vec2 p) {}");
    let result: ShaderConversionResult = t.convert("", ShaderTarget::Desktop420);
    let _named = t.convert_named("", "webgl1");
    let _header = t.generate_header_file("", "witness", &ShaderTarget::ALL);
    let _vs: String = Transpiler::vertex_shader(ShaderTarget::WebGL2);
    let _ = (analysis.channel_indices(), result.success);

    // Replacement tables can be customized before the fixer is built.
    let mut table = default_replacement_table();
    table
        .entry(ShaderTarget::Desktop330)
        .or_default()
        .insert("texture2D", "texture");
    let _fixer = CompatFixer::with_table(table)?;
    Ok(())
}
