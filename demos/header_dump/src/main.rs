#![forbid(unsafe_code)]

//! Converts ShaderToy sources and prints one header blob per shader to stdout.
//!
//! Usage: `header_dump [--config <file.json>] [shader.glsl ...]`
//! With no shader paths the bundled fixture shaders are used. Logs go to stderr
//! (`RUST_LOG=toyglsl_transpiler=debug` for per-target detail).

use std::path::Path;

use anyhow::{bail, Context};
use toyglsl_transpiler::{Transpiler, TranspilerConfig};
use tracing_subscriber::EnvFilter;

const BUNDLED: [(&str, &str); 3] = [
    (
        "tunnel",
        include_str!("../../../crates/toyglsl-contract-tests/fixtures/tunnel.glsl"),
    ),
    (
        "singularity",
        include_str!("../../../crates/toyglsl-contract-tests/fixtures/singularity.glsl"),
    ),
    (
        "textured",
        include_str!("../../../crates/toyglsl-contract-tests/fixtures/textured.glsl"),
    ),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("[toyglsl header_dump] error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut config = TranspilerConfig::default();
    let mut shaders = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let Some(path) = args.next() else {
                bail!("--config needs a path");
            };
            config = TranspilerConfig::load(&path)?;
        } else {
            let code = std::fs::read_to_string(&arg)
                .with_context(|| format!("reading shader {arg}"))?;
            let name = Path::new(&arg)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("shader")
                .to_string();
            shaders.push((name, code));
        }
    }

    if shaders.is_empty() {
        shaders = BUNDLED
            .iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect();
    }

    let transpiler = Transpiler::with_config(config)?;
    tracing::info!(
        shaders = shaders.len(),
        targets = transpiler.config().header_targets.len(),
        "generating headers"
    );

    for (name, code) in &shaders {
        let analysis = transpiler.analyze(code);
        for warning in &analysis.warnings {
            tracing::info!(shader = %name, "{warning}");
        }
        println!("{}", transpiler.generate_header_file_default(code, name));
    }
    Ok(())
}
