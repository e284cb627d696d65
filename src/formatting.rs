//! Best-effort normalization of irregular spreadsheet fields.
//!
//! Every function here degrades instead of failing: input that cannot be
//! understood comes back unchanged.

use crate::models::ClassLevel;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:-?\s*([A-Za-z]))?").expect("class label pattern is valid")
});

static NURSERY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*nursery(?:\s*-?\s*([A-Za-z]))?\s*$").expect("nursery label pattern is valid")
});

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%y", "%d/%m/%y"];
const MONTH_FIRST_FORMATS: &[&str] = &["%m-%d-%Y", "%m/%d/%Y", "%m.%d.%Y", "%m-%d-%y", "%m/%d/%y"];
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %B %Y", "%d %b %Y", "%d-%b-%Y", "%d-%B-%Y", "%B %d, %Y", "%b %d, %Y", "%B %d %Y", "%b %d %Y",
];

/// Spreadsheet day zero; serial 1 is 1899-12-31 once the 1900 leap-year bug is folded in.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Serials below this land in 1900 and are almost always a stray number, not a date.
const MIN_SERIAL: i64 = 367;
const MAX_SERIAL: i64 = 2_958_465;

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const SCALES: [&str; 7] = ["", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion"];

/// Format a B-Form number as 5-7-1 digit groups.
///
/// Non-digit characters are stripped first. Anything other than exactly 13
/// digits is returned as the stripped digit string.
pub fn format_bform(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 13 {
        format!("{}-{}-{}", &digits[..5], &digits[5..12], &digits[12..])
    } else {
        digits
    }
}

/// Parse a loosely formatted date of birth.
///
/// `day_first` picks the reading of ambiguous numeric dates; the other order
/// is still tried when the preferred one cannot produce a valid date.
pub fn parse_date(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_serial_date(value) {
        return Some(date);
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return plausible(datetime.date());
        }
    }

    let (preferred, fallback) = if day_first {
        (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS)
    } else {
        (MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS)
    };

    ISO_FORMATS
        .iter()
        .chain(preferred)
        .chain(fallback)
        .chain(NAMED_MONTH_FORMATS)
        .filter_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .find_map(plausible)
}

fn parse_serial_date(value: &str) -> Option<NaiveDate> {
    if !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if value.len() == 8 && !value.contains('.') {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok().and_then(plausible);
    }

    // A bare year such as "2012" carries no day or month.
    if value.len() == 4 && value.parse::<i32>().is_ok_and(|year| (1900..=2100).contains(&year)) {
        return None;
    }

    let serial = value.parse::<f64>().ok()?.trunc() as i64;
    if !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)?
        .checked_add_signed(Duration::days(serial))
        .and_then(plausible)
}

// Two-digit years parse as years 0-99 under %Y; reject those so %y gets a turn.
fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (1900..=2100).contains(&date.year()).then_some(date)
}

/// `DD-MM-YYYY (Dth Month YYYY)`, or the input unchanged when it is not a date.
pub fn normalize_date(raw: &str, day_first: bool) -> String {
    match parse_date(raw, day_first) {
        Some(date) => format!(
            "{:02}-{:02}-{} ({}{} {} {})",
            date.day(),
            date.month(),
            date.year(),
            date.day(),
            ordinal_suffix(date.day()),
            date.format("%B"),
            date.year()
        ),
        None => raw.to_string(),
    }
}

/// Date of birth in words, e.g. "Five March Two thousand and twelve".
pub fn date_to_words(raw: &str, day_first: bool) -> String {
    match parse_date(raw, day_first) {
        Some(date) => format!(
            "{} {} {}",
            capitalize(&number_to_words(u64::from(date.day()))),
            date.format("%B"),
            capitalize(&number_to_words(date.year().unsigned_abs().into()))
        ),
        None => raw.to_string(),
    }
}

/// English cardinal words: 2012 -> "two thousand and twelve",
/// 1999 -> "one thousand, nine hundred and ninety-nine".
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        let group = rest % 1000;
        if group > 0 {
            groups.push((group, scale));
        }
        rest /= 1000;
        scale += 1;
    }
    groups.reverse();

    let mut words = String::new();
    let count = groups.len();
    for (index, (group, scale)) in groups.into_iter().enumerate() {
        if index > 0 {
            let is_trailing_small = index == count - 1 && scale == 0 && group < 100;
            words.push_str(if is_trailing_small { " and " } else { ", " });
        }
        words.push_str(&under_thousand(group));
        if scale > 0 {
            words.push(' ');
            words.push_str(SCALES[scale]);
        }
    }
    words
}

fn under_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, _) => under_hundred(rest),
        (_, 0) => format!("{} hundred", ONES[hundreds as usize]),
        _ => format!("{} hundred and {}", ONES[hundreds as usize], under_hundred(rest)),
    }
}

fn under_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{}-{}", TENS[n / 10], ONES[n % 10])
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn ordinal_suffix(n: u32) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Split a class label such as "7-B" into ("7th", "B").
///
/// "Nursery-A" splits into ("Nursery", "A"). Other labels without a leading
/// number come back unchanged with an empty section.
pub fn format_class_section(label: &str) -> (String, String) {
    if let Some(caps) = NURSERY_PATTERN.captures(label) {
        let section = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        return ("Nursery".to_string(), section);
    }
    let Some(caps) = CLASS_PATTERN.captures(label) else {
        return (label.to_string(), String::new());
    };
    let Some(class_num) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
        return (label.to_string(), String::new());
    };

    let section = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    (format!("{}{}", class_num, ordinal_suffix(class_num)), section)
}

pub fn parse_class_level(label: &str) -> ClassLevel {
    if let Some(n) = CLASS_PATTERN
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        return ClassLevel::Numbered(n);
    }
    if NURSERY_PATTERN.is_match(label) {
        ClassLevel::Nursery
    } else {
        ClassLevel::Unknown
    }
}
