use crate::models::{ColumnNames, StudentRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, warn};

/// Table-level failures. Problems inside individual cells never end up here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' not found in header")]
    MissingColumn(String),
}

pub struct TableLoader {
    columns: ColumnNames,
}

struct ColumnIndex {
    name: usize,
    guardian_name: usize,
    date_of_birth: usize,
    bform: usize,
    roll_number: usize,
    class_label: usize,
    percentage: usize,
}

impl TableLoader {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }

    pub fn load_file(&self, file_path: &str) -> Result<Vec<StudentRecord>, LoadError> {
        let file = File::open(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_string(),
            source,
        })?;
        self.load_from_reader(file)
    }

    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Vec<StudentRecord>, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.byte_headers()?.iter().map(decode_cell).collect();
        let index = self.locate_columns(&headers)?;
        let required = [
            index.name,
            index.guardian_name,
            index.date_of_birth,
            index.bform,
            index.roll_number,
            index.class_label,
            index.percentage,
        ];

        let mut records = Vec::new();
        for (position, result) in csv_reader.byte_records().enumerate() {
            let row = result?;
            let line = position + 1;

            if row.iter().all(|cell| cell.is_empty()) {
                debug!("Skipping blank row {}", line);
                continue;
            }
            if std::str::from_utf8(row.as_slice()).is_err() {
                warn!("Row {} is not valid UTF-8, undecodable characters replaced", line);
            }

            let cell = |i: usize| row.get(i).map(decode_cell).unwrap_or_default();
            let scores: BTreeMap<String, String> = headers
                .iter()
                .enumerate()
                .filter(|(i, _)| !required.contains(i))
                .map(|(i, header)| (header.clone(), cell(i)))
                .collect();

            records.push(StudentRecord {
                row: line,
                name: cell(index.name),
                guardian_name: cell(index.guardian_name),
                date_of_birth: cell(index.date_of_birth),
                bform: cell(index.bform),
                roll_number: cell(index.roll_number),
                class_label: cell(index.class_label),
                percentage: cell(index.percentage),
                scores,
            });
        }

        debug!("Loaded {} student rows", records.len());
        Ok(records)
    }

    fn locate_columns(&self, headers: &[String]) -> Result<ColumnIndex, LoadError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| LoadError::MissingColumn(column.to_string()))
        };

        Ok(ColumnIndex {
            name: find(&self.columns.name)?,
            guardian_name: find(&self.columns.guardian_name)?,
            date_of_birth: find(&self.columns.date_of_birth)?,
            bform: find(&self.columns.bform)?,
            roll_number: find(&self.columns.roll_number)?,
            class_label: find(&self.columns.class_label)?,
            percentage: find(&self.columns.percentage)?,
        })
    }
}

// Exports from older spreadsheets are often Windows-1252; such cells decode lossily.
fn decode_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
