use crate::enricher::EnrichmentOutcome;
use crate::grading::Grade;
use crate::models::{Diagnostic, ReportCard, SubjectMark};
use anyhow::{Context, Result};
use csv::Writer;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

pub const CARDS_CSV: &str = "report_cards.csv";
pub const CARDS_JSON: &str = "report_cards.json";
pub const DIAGNOSTICS_CSV: &str = "diagnostics.csv";
pub const CLASS_SUMMARY: &str = "class_summary.txt";

/// Whole numbers print without decimals, everything else with two.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn format_percentage(card: &ReportCard) -> String {
    match card.percentage {
        Some(p) => format!("{:.2}%", p),
        None => card.percentage_raw.clone(),
    }
}

fn format_position(position: Option<u32>) -> String {
    position.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_subjects(subjects: &[SubjectMark]) -> String {
    subjects
        .iter()
        .map(|mark| format!("{} {}/{}", mark.subject, mark.obtained, mark.max_marks))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn write_cards_csv(cards: &[ReportCard], output_dir: &str) -> Result<()> {
    let csv_path = Path::new(output_dir).join(CARDS_CSV);
    let mut writer = Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    writer.write_record([
        "Row",
        "Name",
        "Father / Guardian",
        "Roll No",
        "B-Form",
        "Date of Birth",
        "Date of Birth (Words)",
        "Class",
        "Section",
        "Subjects",
        "Obtained Marks",
        "Total Marks",
        "Percentage",
        "Grade",
        "Position",
        "Highlight",
    ])?;

    for card in cards {
        writer.write_record([
            card.row.to_string(),
            card.name.clone(),
            card.guardian_name.clone(),
            card.roll_number.clone(),
            card.bform.clone(),
            card.date_of_birth.clone(),
            card.date_of_birth_words.clone(),
            card.class_text.clone(),
            card.section.clone(),
            format_subjects(&card.subjects),
            format_number(card.obtained_total),
            card.full_marks.to_string(),
            format_percentage(card),
            card.grade.to_string(),
            format_position(card.position),
            card.highlight.map(|h| h.as_str()).unwrap_or_default().to_string(),
        ])?;
    }

    writer.flush()?;
    info!("Wrote {} cards to {}", cards.len(), csv_path.display());
    Ok(())
}

pub fn write_cards_json(cards: &[ReportCard], output_dir: &str) -> Result<()> {
    let json_path = Path::new(output_dir).join(CARDS_JSON);
    let content = serde_json::to_string_pretty(cards)?;
    fs::write(&json_path, content)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!("Wrote {} cards to {}", cards.len(), json_path.display());
    Ok(())
}

pub fn write_diagnostics_csv(diagnostics: &[Diagnostic], output_dir: &str) -> Result<()> {
    let csv_path = Path::new(output_dir).join(DIAGNOSTICS_CSV);
    let mut writer = Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;

    writer.write_record(["Row", "Student", "Message"])?;
    for diagnostic in diagnostics {
        writer.write_record([
            diagnostic.row.to_string(),
            diagnostic.student.clone(),
            diagnostic.kind.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn grade_distribution(cards: &[ReportCard]) -> Vec<(Grade, usize)> {
    let mut counts: HashMap<Grade, usize> = HashMap::new();
    for card in cards {
        *counts.entry(card.grade).or_insert(0) += 1;
    }
    Grade::ALL
        .iter()
        .filter_map(|grade| counts.get(grade).map(|&count| (*grade, count)))
        .collect()
}

/// Cards ordered by position, unranked cards last in input order.
fn by_position(cards: &[ReportCard]) -> Vec<&ReportCard> {
    let mut ordered: Vec<&ReportCard> = cards.iter().collect();
    ordered.sort_by_key(|card| (card.position.is_none(), card.position, card.row));
    ordered
}

pub fn render_class_summary(outcome: &EnrichmentOutcome) -> String {
    let mut content = String::new();
    content.push_str("Class Positions\n");
    content.push_str("===============\n\n");

    for card in by_position(&outcome.cards) {
        content.push_str(&format!(
            "{:>4}  {:<28} {:<6} {:>5}/{:<5} {:>8}  {}\n",
            format_position(card.position),
            card.name,
            card.class_label,
            format_number(card.obtained_total),
            card.full_marks,
            format_percentage(card),
            card.grade
        ));
    }

    content.push_str("\nGrade Distribution\n");
    content.push_str("==================\n\n");
    for (grade, count) in grade_distribution(&outcome.cards) {
        content.push_str(&format!("{:<8} {}\n", grade.as_str(), count));
    }

    content.push_str(&format!(
        "\nStudents: {}\nWarnings: {}\n",
        outcome.cards.len(),
        outcome.diagnostics.len()
    ));
    content
}

pub fn write_class_summary(outcome: &EnrichmentOutcome, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join(CLASS_SUMMARY);
    fs::write(&path, render_class_summary(outcome))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn print_summary(outcome: &EnrichmentOutcome) {
    println!("\n📊 SUMMARY");
    println!("==========\n");

    println!("🏆 Top positions:");
    for card in by_position(&outcome.cards)
        .into_iter()
        .take_while(|card| card.highlight.is_some())
    {
        println!(
            "   {}. {} ({}) - {} {}",
            format_position(card.position),
            card.name,
            card.class_label,
            format_percentage(card),
            card.grade
        );
    }

    println!("\n📈 Grade distribution:");
    for (grade, count) in grade_distribution(&outcome.cards) {
        println!("   {}: {}", grade, count);
    }

    if outcome.diagnostics.is_empty() {
        println!("\n✅ No warnings");
    } else {
        println!("\n⚠️  {} warnings (see {})", outcome.diagnostics.len(), DIAGNOSTICS_CSV);
    }
}

/// Remove files left over from a previous run.
pub fn clean_output_directory(output_dir: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    if !output_path.exists() {
        return Ok(());
    }

    for item in [CARDS_CSV, CARDS_JSON, DIAGNOSTICS_CSV, CLASS_SUMMARY] {
        let item_path = output_path.join(item);
        if item_path.is_file() {
            fs::remove_file(&item_path)?;
            info!("Removed previous {}", item);
        }
    }

    Ok(())
}
