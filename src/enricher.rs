use crate::formatting::{
    date_to_words, format_bform, format_class_section, normalize_date, parse_class_level, parse_date,
};
use crate::grading::{assign_grade, full_marks, parse_percentage, rank_positions, Highlight};
use crate::models::{ClassLevel, Diagnostic, DiagnosticKind, ReportCard, StudentRecord};
use crate::subjects::select_subjects;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub cards: Vec<ReportCard>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ReportCardEnricher {
    pub day_first: bool,
}

impl ReportCardEnricher {
    pub fn new(day_first: bool) -> Self {
        Self { day_first }
    }

    /// Enrich every record of the table.
    ///
    /// Positions are computed over the whole table first, so the input order
    /// is preserved in the output. A problem in one field never stops the
    /// rest of the record or the rest of the table.
    pub fn enrich_table(&self, records: &[StudentRecord]) -> EnrichmentOutcome {
        let percentages: Vec<Option<f64>> = records
            .iter()
            .map(|record| parse_percentage(&record.percentage))
            .collect();
        let positions = rank_positions(&percentages);

        let mut outcome = EnrichmentOutcome::default();
        for (record, position) in records.iter().zip(positions) {
            let (card, diagnostics) = self.enrich_record(record, position);
            outcome.cards.push(card);
            outcome.diagnostics.extend(diagnostics);
        }

        debug!(
            "Enriched {} records with {} diagnostics",
            outcome.cards.len(),
            outcome.diagnostics.len()
        );
        outcome
    }

    /// Enrich a single record given its already computed position.
    pub fn enrich_record(
        &self,
        record: &StudentRecord,
        position: Option<u32>,
    ) -> (ReportCard, Vec<Diagnostic>) {
        let mut problems = Vec::new();

        let raw_dob = record.date_of_birth.trim();
        if !raw_dob.is_empty() && parse_date(raw_dob, self.day_first).is_none() {
            problems.push(DiagnosticKind::UnparseableDate {
                raw: record.date_of_birth.clone(),
            });
        }

        let class_level = parse_class_level(&record.class_label);
        if class_level == ClassLevel::Unknown {
            problems.push(DiagnosticKind::UnknownClass {
                raw: record.class_label.clone(),
            });
        }
        let (class_text, section) = format_class_section(&record.class_label);

        let (subjects, subject_problems) = select_subjects(class_level, record);
        problems.extend(subject_problems);
        let obtained_total: f64 = subjects.iter().filter_map(|mark| mark.obtained_value).sum();

        let percentage = parse_percentage(&record.percentage);
        if percentage.is_none() {
            problems.push(DiagnosticKind::UnparseablePercentage {
                raw: record.percentage.clone(),
            });
        }
        let grade = assign_grade(&record.percentage);

        let card = ReportCard {
            row: record.row,
            name: record.name.clone(),
            guardian_name: record.guardian_name.clone(),
            roll_number: record.roll_number.clone(),
            bform: format_bform(&record.bform),
            date_of_birth: normalize_date(&record.date_of_birth, self.day_first),
            date_of_birth_words: date_to_words(&record.date_of_birth, self.day_first),
            class_label: record.class_label.clone(),
            class_level,
            class_text,
            section,
            subjects,
            obtained_total,
            full_marks: full_marks(class_level),
            percentage_raw: record.percentage.clone(),
            percentage,
            grade,
            position,
            highlight: Highlight::for_position(position),
        };

        let diagnostics = problems
            .into_iter()
            .map(|kind| Diagnostic {
                row: record.row,
                student: record.name.clone(),
                kind,
            })
            .collect();

        (card, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;

    fn student(row: usize, name: &str, class: &str, percentage: &str, scores: &[(&str, &str)]) -> StudentRecord {
        StudentRecord {
            row,
            name: name.to_string(),
            guardian_name: format!("{} Sr.", name),
            date_of_birth: "2012-03-05".to_string(),
            bform: "35202-1234567-1".to_string(),
            roll_number: row.to_string(),
            class_label: class.to_string(),
            percentage: percentage.to_string(),
            scores: scores
                .iter()
                .map(|(subject, score)| (subject.to_string(), score.to_string()))
                .collect(),
        }
    }

    fn primary_scores() -> Vec<(&'static str, &'static str)> {
        vec![
            ("English", "90"),
            ("Urdu", "85"),
            ("Mathematics", "99"),
            ("General Knowledge", "70"),
            ("Islamiat / Ethics", "80"),
        ]
    }

    #[test]
    fn test_enrich_record_fields() {
        let enricher = ReportCardEnricher::new(true);
        let record = student(1, "Ayesha", "2-A", "84.8%", &primary_scores());

        let (card, diagnostics) = enricher.enrich_record(&record, Some(2));

        assert!(diagnostics.is_empty());
        assert_eq!(card.bform, "35202-1234567-1");
        assert_eq!(card.date_of_birth, "05-03-2012 (5th March 2012)");
        assert_eq!(card.date_of_birth_words, "Five March Two thousand and twelve");
        assert_eq!(card.class_level, ClassLevel::Numbered(2));
        assert_eq!(card.class_text, "2nd");
        assert_eq!(card.section, "A");
        assert_eq!(card.subjects.len(), 5);
        assert_eq!(card.obtained_total, 424.0);
        assert_eq!(card.full_marks, 550);
        assert_eq!(card.percentage, Some(84.8));
        assert_eq!(card.grade, Grade::A);
        assert_eq!(card.position, Some(2));
        assert_eq!(card.highlight, Some(Highlight::Second));
    }

    #[test]
    fn test_enrich_table_ranks_by_percentage() {
        let enricher = ReportCardEnricher::new(true);
        let records = vec![
            student(1, "A", "1", "95", &primary_scores()),
            student(2, "B", "1", "95%", &primary_scores()),
            student(3, "C", "1", "80", &primary_scores()),
        ];

        let outcome = enricher.enrich_table(&records);

        let positions: Vec<Option<u32>> = outcome.cards.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![Some(1), Some(1), Some(3)]);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_subject_does_not_halt_table() {
        let enricher = ReportCardEnricher::new(true);
        let mut partial = primary_scores();
        partial.retain(|(subject, _)| *subject != "Urdu");
        let records = vec![
            student(1, "Bilal", "3-C", "72", &partial),
            student(2, "Hina", "3-C", "88", &primary_scores()),
        ];

        let outcome = enricher.enrich_table(&records);

        assert_eq!(outcome.cards.len(), 2);
        assert_eq!(outcome.cards[0].subjects.len(), 4);
        assert_eq!(outcome.cards[1].subjects.len(), 5);
        assert_eq!(outcome.cards[0].grade, Grade::B);
        assert_eq!(outcome.cards[1].position, Some(1));
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic {
                row: 1,
                student: "Bilal".to_string(),
                kind: DiagnosticKind::MissingSubject {
                    subject: "Urdu".to_string(),
                    class: "3".to_string(),
                },
            }]
        );
    }

    #[test]
    fn test_bad_fields_degrade_to_raw_values() {
        let enricher = ReportCardEnricher::new(true);
        let mut record = student(5, "Usman", "Prep", "absent", &[]);
        record.date_of_birth = "unknown".to_string();
        record.bform = "12-345".to_string();

        let (card, diagnostics) = enricher.enrich_record(&record, None);

        assert_eq!(card.date_of_birth, "unknown");
        assert_eq!(card.date_of_birth_words, "unknown");
        assert_eq!(card.bform, "12345");
        assert_eq!(card.class_text, "Prep");
        assert_eq!(card.section, "");
        assert!(card.subjects.is_empty());
        assert_eq!(card.full_marks, 175);
        assert_eq!(card.grade, Grade::Invalid);
        assert_eq!(card.position, None);
        assert_eq!(card.highlight, None);

        let kinds: Vec<DiagnosticKind> = diagnostics.into_iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UnparseableDate { raw: "unknown".to_string() },
                DiagnosticKind::UnknownClass { raw: "Prep".to_string() },
                DiagnosticKind::UnparseablePercentage { raw: "absent".to_string() },
            ]
        );
    }

    #[test]
    fn test_unparseable_percentage_is_unranked() {
        let enricher = ReportCardEnricher::new(true);
        let records = vec![
            student(1, "A", "Nursery", "-", &[]),
            student(2, "B", "Nursery", "61", &[]),
        ];

        let outcome = enricher.enrich_table(&records);

        assert_eq!(outcome.cards[0].position, None);
        assert_eq!(outcome.cards[1].position, Some(1));
        assert_eq!(outcome.cards[1].grade, Grade::C);
        // four missing subjects each, plus the bad percentage
        assert_eq!(outcome.diagnostics.len(), 9);
    }
}
