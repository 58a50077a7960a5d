//! C/C++ header blobs embedding converted shaders as raw string constants.

use std::fmt::Write as _;

use toyglsl_core::{ShaderConversionResult, ShaderTarget};

/// Include-guard stem: upper-cased, `[A-Z0-9_]` only, never starting with a digit.
pub fn guard_name(shader_name: &str) -> String {
    let mut out: String = shader_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Render one header. `convert` runs once per target, in the order given; a failed target
/// leaves an error comment and the remaining targets are still emitted.
pub fn render<F>(shader_name: &str, targets: &[ShaderTarget], mut convert: F) -> String
where
    F: FnMut(ShaderTarget) -> ShaderConversionResult,
{
    let guard = guard_name(shader_name);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(out, "#ifndef {guard}_H\n#define {guard}_H\n\n");

    for &target in targets {
        let desc = target.descriptor();
        let result = convert(target);

        if !result.success {
            tracing::debug!(dialect = %target, "header target skipped");
            let _ = writeln!(
                out,
                "// Error converting for {}: {}\n",
                desc.label, result.error_message
            );
            continue;
        }

        let _ = writeln!(out, "// {}", desc.label);
        let _ = writeln!(
            out,
            "const char* vertexShader{} = R\"glsl({})glsl\";\n",
            desc.header_suffix, result.vertex_shader
        );
        let _ = writeln!(
            out,
            "const char* fragmentShader{} = R\"glsl({})glsl\";\n",
            desc.header_suffix, result.fragment_shader
        );
    }

    let _ = writeln!(out, "#endif // {guard}_H");
    out
}
