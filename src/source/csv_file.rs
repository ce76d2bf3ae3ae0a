use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{DataSource, Payload, SourceError, SourceRequest};
use crate::data::datatable::{DataRow, DataValue};
use crate::data::field::Field;

/// Reads a CSV file: the header row names the fields, cells are typed by
/// inspection
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvFileSource {
    fn fetch(&self, _request: &SourceRequest) -> Result<Payload, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let fields: Vec<Field> = reader
            .headers()?
            .iter()
            .map(|h| Field::new(h.trim()))
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(DataValue::infer).collect::<DataRow>());
        }

        info!(target: "source", "Loaded {} rows x {} fields from {}", rows.len(), fields.len(), self.path.display());
        Ok(Payload::new(fields, rows))
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}
