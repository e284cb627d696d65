use crate::grading::{Grade, Highlight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_file: String,
    pub output_directory: Option<String>,
    pub output_formats: Vec<OutputFormat>,
    /// Read ambiguous numeric dates such as 03/05/2012 as day-month-year
    pub day_first: bool,
    pub log_level: Option<String>,
    #[serde(default)]
    pub columns: ColumnNames,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "json")]
    Json,
}

/// Header names of the required spreadsheet columns. Every other column is
/// treated as a potential subject score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub guardian_name: String,
    pub date_of_birth: String,
    pub bform: String,
    pub roll_number: String,
    pub class_label: String,
    pub percentage: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "NAME".to_string(),
            guardian_name: "FATHER / GUARDIAN".to_string(),
            date_of_birth: "DOB".to_string(),
            bform: "FORM-B".to_string(),
            roll_number: "ENRL #".to_string(),
            class_label: "CLASS".to_string(),
            percentage: "Percentage".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: "students.csv".to_string(),
            output_directory: Some("output".to_string()),
            output_formats: vec![OutputFormat::Csv, OutputFormat::Json],
            // Pakistani school sheets write the day first (05/03/2012 is 5 March)
            day_first: true,
            log_level: Some("info".to_string()),
            columns: ColumnNames::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// One spreadsheet row as loaded, every cell kept as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    pub row: usize,
    pub name: String,
    pub guardian_name: String,
    pub date_of_birth: String,
    pub bform: String,
    pub roll_number: String,
    pub class_label: String,
    pub percentage: String,
    /// Every non-required column, keyed by header
    pub scores: BTreeMap<String, String>,
}

impl StudentRecord {
    /// Cell for a subject column, `None` when the column is absent or blank.
    pub fn score_cell(&self, subject: &str) -> Option<&str> {
        self.scores
            .get(subject)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Class level parsed from a label such as "7-B" or "Nursery".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassLevel {
    Numbered(u32),
    Nursery,
    Unknown,
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLevel::Numbered(n) => write!(f, "{}", n),
            ClassLevel::Nursery => write!(f, "Nursery"),
            ClassLevel::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: String,
    pub max_marks: u32,
    /// Cell text as given in the sheet
    pub obtained: String,
    pub obtained_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCard {
    pub row: usize,
    pub name: String,
    pub guardian_name: String,
    pub roll_number: String,
    pub bform: String,
    pub date_of_birth: String,
    pub date_of_birth_words: String,
    pub class_label: String,
    pub class_level: ClassLevel,
    pub class_text: String,
    pub section: String,
    pub subjects: Vec<SubjectMark>,
    pub obtained_total: f64,
    pub full_marks: u32,
    pub percentage_raw: String,
    pub percentage: Option<f64>,
    pub grade: Grade,
    pub position: Option<u32>,
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub row: usize,
    pub student: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingSubject { subject: String, class: String },
    UnparseableScore { subject: String, raw: String },
    UnparseableDate { raw: String },
    UnparseablePercentage { raw: String },
    UnknownClass { raw: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingSubject { subject, class } => {
                write!(f, "'{}' not found in student data for class {}", subject, class)
            }
            DiagnosticKind::UnparseableScore { subject, raw } => {
                write!(f, "score '{}' for {} is not a number", raw, subject)
            }
            DiagnosticKind::UnparseableDate { raw } => {
                write!(f, "date of birth '{}' could not be parsed", raw)
            }
            DiagnosticKind::UnparseablePercentage { raw } => {
                write!(f, "percentage '{}' is not a number", raw)
            }
            DiagnosticKind::UnknownClass { raw } => write!(f, "class '{}' is not recognised", raw),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.row, self.student, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_default_columns() {
        let config: Config = toml::from_str(
            r#"
input_file = "class7.csv"
output_formats = ["json"]
day_first = false
"#,
        )
        .unwrap();

        assert_eq!(config.input_file, "class7.csv");
        assert_eq!(config.output_formats, vec![OutputFormat::Json]);
        assert!(config.output_directory.is_none());
        assert_eq!(config.columns.bform, "FORM-B");
    }

    #[test]
    fn test_column_override() {
        let config: Config = toml::from_str(
            r#"
input_file = "students.csv"
output_formats = ["csv"]
day_first = true

[columns]
percentage = "Percent"
"#,
        )
        .unwrap();

        assert_eq!(config.columns.percentage, "Percent");
        assert_eq!(config.columns.name, "NAME");
    }

    #[test]
    fn test_default_config_reads_day_first() {
        let config = Config::default();
        assert!(config.day_first);
        assert_eq!(
            crate::formatting::normalize_date("05/03/2012", config.day_first),
            "05-03-2012 (5th March 2012)"
        );
    }

    #[test]
    fn test_blank_score_cell_is_missing() {
        let mut record = StudentRecord::default();
        record.scores.insert("English".to_string(), "  ".to_string());
        record.scores.insert("Urdu".to_string(), " 71 ".to_string());

        assert_eq!(record.score_cell("English"), None);
        assert_eq!(record.score_cell("Urdu"), Some("71"));
        assert_eq!(record.score_cell("Science"), None);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            row: 4,
            student: "Ali".to_string(),
            kind: DiagnosticKind::MissingSubject {
                subject: "Computer".to_string(),
                class: "7".to_string(),
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "row 4 (Ali): 'Computer' not found in student data for class 7"
        );
    }
}
