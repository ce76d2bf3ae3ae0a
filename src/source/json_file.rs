use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{DataSource, Payload, SourceError, SourceRequest};

/// Reads an envelope or a bare payload from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonFileSource {
    fn fetch(&self, _request: &SourceRequest) -> Result<Payload, SourceError> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let payload = Payload::from_json_str(&text)?;
        info!(target: "source", "Loaded {} rows from {}", payload.rows.len(), self.path.display());
        Ok(payload)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
