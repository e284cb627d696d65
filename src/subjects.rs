use crate::models::{ClassLevel, DiagnosticKind, StudentRecord, SubjectMark};

const MIDDLE_SUBJECTS: &[&str] = &[
    "English",
    "Urdu",
    "Mathematics",
    "Science",
    "His. Geo",
    "Islamiat",
    "Tarjama Tul Quran",
    "Computer",
    "Ethics",
];

const UPPER_PRIMARY_SUBJECTS: &[&str] = &[
    "English",
    "Urdu",
    "Mathematics",
    "Science",
    "Social Studies",
    "Islamiat + Nazra / Ethics",
];

const LOWER_PRIMARY_SUBJECTS: &[&str] = &[
    "English",
    "Urdu",
    "Mathematics",
    "General Knowledge",
    "Islamiat / Ethics",
];

const NURSERY_SUBJECTS: &[&str] = &["English", "Urdu", "Mathematics", "General Knowledge"];

/// Ordered subject list for a class level. Levels outside the table have none.
pub fn subjects_for_class(level: ClassLevel) -> &'static [&'static str] {
    match level {
        ClassLevel::Numbered(6..=8) => MIDDLE_SUBJECTS,
        ClassLevel::Numbered(4..=5) => UPPER_PRIMARY_SUBJECTS,
        ClassLevel::Numbered(1..=3) => LOWER_PRIMARY_SUBJECTS,
        ClassLevel::Nursery => NURSERY_SUBJECTS,
        _ => &[],
    }
}

/// Maximum marks for a subject, the same in every class.
pub fn max_marks(subject: &str) -> u32 {
    match subject {
        "Tarjama Tul Quran" => 50,
        "Ethics" | "Islamiat + Nazra / Ethics" => 150,
        _ => 100,
    }
}

/// Subjects of the record's class that the record actually carries.
///
/// Subjects absent from the record (missing column or blank cell) are left
/// out and reported. Non-numeric cells are kept as text but reported, and
/// contribute nothing to totals.
pub fn select_subjects(
    level: ClassLevel,
    record: &StudentRecord,
) -> (Vec<SubjectMark>, Vec<DiagnosticKind>) {
    let mut marks = Vec::new();
    let mut problems = Vec::new();

    for &subject in subjects_for_class(level) {
        let Some(cell) = record.score_cell(subject) else {
            problems.push(DiagnosticKind::MissingSubject {
                subject: subject.to_string(),
                class: level.to_string(),
            });
            continue;
        };

        let obtained_value = cell.parse::<f64>().ok().filter(|v| v.is_finite());
        if obtained_value.is_none() {
            problems.push(DiagnosticKind::UnparseableScore {
                subject: subject.to_string(),
                raw: cell.to_string(),
            });
        }

        marks.push(SubjectMark {
            subject: subject.to_string(),
            max_marks: max_marks(subject),
            obtained: cell.to_string(),
            obtained_value,
        });
    }

    (marks, problems)
}
