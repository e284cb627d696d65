use crate::models::ClassLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
    Invalid,
}

impl Grade {
    pub const ALL: [Grade; 8] = [
        Grade::APlus,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::E,
        Grade::F,
        Grade::Invalid,
    ];

    /// Thresholds are inclusive lower bounds.
    pub fn from_percentage(percentage: f64) -> Self {
        if !percentage.is_finite() {
            return Grade::Invalid;
        }
        match percentage {
            p if p >= 90.0 => Grade::APlus,
            p if p >= 80.0 => Grade::A,
            p if p >= 70.0 => Grade::B,
            p if p >= 60.0 => Grade::C,
            p if p >= 50.0 => Grade::D,
            p if p >= 40.0 => Grade::E,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a percentage cell such as "85.5" or "85.5%".
pub fn parse_percentage(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

pub fn assign_grade(raw: &str) -> Grade {
    parse_percentage(raw).map_or(Grade::Invalid, Grade::from_percentage)
}

/// Position of each value among all present values, highest first.
///
/// Tied values share the best position and the next distinct value skips
/// ahead, so [95, 95, 80] ranks as [1, 1, 3]. Missing values get no position.
pub fn rank_positions(values: &[Option<f64>]) -> Vec<Option<u32>> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    values
        .iter()
        .map(|value| {
            value.map(|v| {
                let higher = sorted.partition_point(|&other| other > v);
                higher as u32 + 1
            })
        })
        .collect()
}

/// Printed total for a class tier. This is a fixed table, not the sum of the
/// subject maxima.
pub fn full_marks(level: ClassLevel) -> u32 {
    match level {
        ClassLevel::Numbered(6..=8) => 750,
        ClassLevel::Numbered(4..=5) => 650,
        ClassLevel::Numbered(1..=3) => 550,
        _ => 175,
    }
}

/// Styling hint for the top three positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    #[serde(rename = "top-1")]
    First,
    #[serde(rename = "top-2")]
    Second,
    #[serde(rename = "top-3")]
    Third,
}

impl Highlight {
    pub fn for_position(position: Option<u32>) -> Option<Self> {
        match position? {
            1 => Some(Highlight::First),
            2 => Some(Highlight::Second),
            3 => Some(Highlight::Third),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Highlight::First => "top-1",
            Highlight::Second => "top-2",
            Highlight::Third => "top-3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries_are_inclusive() {
        assert_eq!(Grade::from_percentage(90.0), Grade::APlus);
        assert_eq!(Grade::from_percentage(89.99), Grade::A);
        assert_eq!(Grade::from_percentage(80.0), Grade::A);
        assert_eq!(Grade::from_percentage(70.0), Grade::B);
        assert_eq!(Grade::from_percentage(60.0), Grade::C);
        assert_eq!(Grade::from_percentage(50.0), Grade::D);
        assert_eq!(Grade::from_percentage(40.0), Grade::E);
        assert_eq!(Grade::from_percentage(39.99), Grade::F);
        assert_eq!(Grade::from_percentage(0.0), Grade::F);
        assert_eq!(Grade::from_percentage(100.0), Grade::APlus);
    }

    #[test]
    fn test_assign_grade_from_raw_cell() {
        assert_eq!(assign_grade("92.5%"), Grade::APlus);
        assert_eq!(assign_grade(" 55 "), Grade::D);
        assert_eq!(assign_grade("absent"), Grade::Invalid);
        assert_eq!(assign_grade(""), Grade::Invalid);
        assert_eq!(assign_grade("NaN"), Grade::Invalid);
        assert_eq!(Grade::Invalid.to_string(), "Invalid");
        assert_eq!(Grade::APlus.to_string(), "A+");
    }

    #[test]
    fn test_rank_ties_share_minimum() {
        let ranks = rank_positions(&[Some(95.0), Some(95.0), Some(80.0)]);
        assert_eq!(ranks, vec![Some(1), Some(1), Some(3)]);
    }

    #[test]
    fn test_rank_ignores_missing_values() {
        let ranks = rank_positions(&[Some(70.0), None, Some(88.0), Some(70.0), Some(65.5)]);
        assert_eq!(ranks, vec![Some(2), None, Some(1), Some(2), Some(4)]);
        assert!(rank_positions(&[]).is_empty());
    }

    #[test]
    fn test_full_marks_by_tier() {
        assert_eq!(full_marks(ClassLevel::Numbered(7)), 750);
        assert_eq!(full_marks(ClassLevel::Numbered(4)), 650);
        assert_eq!(full_marks(ClassLevel::Numbered(1)), 550);
        assert_eq!(full_marks(ClassLevel::Numbered(9)), 175);
        assert_eq!(full_marks(ClassLevel::Nursery), 175);
        assert_eq!(full_marks(ClassLevel::Unknown), 175);
    }

    #[test]
    fn test_highlight_for_top_three() {
        assert_eq!(Highlight::for_position(Some(1)), Some(Highlight::First));
        assert_eq!(Highlight::for_position(Some(3)).map(|h| h.as_str()), Some("top-3"));
        assert_eq!(Highlight::for_position(Some(4)), None);
        assert_eq!(Highlight::for_position(None), None);
    }
}
