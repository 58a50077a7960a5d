use std::path::PathBuf;

use thiserror::Error;

/// Errors shared by every toyglsl crate.
///
/// Contract rule: this type lives in `toyglsl-core` and is re-exported by the transpiler.
/// Only the orchestrator turns it into a failed `ShaderConversionResult`.
#[derive(Debug, Error)]
pub enum ToyglslError {
    // ---- Config (SDK-level) ----
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json parse error at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config at {}: {msg}", path.display())]
    InvalidConfig { path: PathBuf, msg: String },

    // ---- Conversion ----
    #[error("unknown shader target '{0}'")]
    UnknownTarget(String),

    #[error("no mainImage(out vec4, in vec2) entry point found")]
    MissingEntryPoint,

    #[error("source already defines main(); mainImage sources must not")]
    EntryPointConflict,

    #[error("source is {len} bytes, limit is {max}")]
    SourceTooLarge { len: usize, max: usize },

    #[error("rule '{rule}' failed: {msg}")]
    Rule { rule: &'static str, msg: String },
}

impl ToyglslError {
    pub fn rule<T: Into<String>>(rule: &'static str, msg: T) -> Self {
        ToyglslError::Rule {
            rule,
            msg: msg.into(),
        }
    }
}
