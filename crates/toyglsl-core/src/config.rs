//! Transpiler configuration and JSON loading helpers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Precision, ShaderTarget, ToyglslError};

/// Tunables for a `Transpiler` instance. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranspilerConfig {
    pub float_precision: Precision,
    pub int_precision: Precision,
    /// Inputs longer than this fail with `SourceTooLarge`.
    pub max_source_bytes: usize,
    /// WebGL1 bodies longer than this get a performance advisory.
    pub complexity_warning_bytes: usize,
    /// Emit `// Note:` advisory comments into generated fragments.
    pub annotate: bool,
    /// Targets used by `generate_header_file_default`.
    pub header_targets: Vec<ShaderTarget>,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            float_precision: Precision::Mediump,
            int_precision: Precision::Mediump,
            max_source_bytes: 256 * 1024,
            complexity_warning_bytes: 20_000,
            annotate: true,
            header_targets: vec![
                ShaderTarget::WebGL1,
                ShaderTarget::WebGL2,
                ShaderTarget::Desktop330,
            ],
        }
    }
}

impl TranspilerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToyglslError> {
        let path = path.as_ref();
        let cfg: TranspilerConfig = load_typed_json(path)?;
        cfg.validate(path)?;
        Ok(cfg)
    }

    /// Parse from an in-memory JSON string. `origin` is only used in error messages.
    pub fn from_json_str(json: &str, origin: impl Into<PathBuf>) -> Result<Self, ToyglslError> {
        let path = origin.into();
        let cfg: TranspilerConfig =
            serde_json::from_str(json).map_err(|source| ToyglslError::Json {
                path: path.clone(),
                source,
            })?;
        cfg.validate(&path)?;
        Ok(cfg)
    }

    fn validate(&self, path: &Path) -> Result<(), ToyglslError> {
        if self.max_source_bytes == 0 {
            return Err(ToyglslError::InvalidConfig {
                path: path.to_path_buf(),
                msg: "max_source_bytes must be greater than zero".into(),
            });
        }
        if self.header_targets.is_empty() {
            return Err(ToyglslError::InvalidConfig {
                path: path.to_path_buf(),
                msg: "header_targets must list at least one target".into(),
            });
        }
        Ok(())
    }
}

/// Read and deserialize a JSON file, attaching the path to any failure.
pub fn load_typed_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ToyglslError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ToyglslError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ToyglslError::Json {
        path: path.to_path_buf(),
        source,
    })
}
