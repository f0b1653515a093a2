//! `dd/mm/yyyy` formatting shared by prompts and validation.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

const DATE_FORMAT: &str = "%d/%m/%Y";

static FORMATTED_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").unwrap());

/// Format a calendar date as `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `dd/mm/yyyy` string back into a date.
pub fn parse_formatted_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// All valid `dd/mm/yyyy` dates mentioned in `text`, in order of appearance.
pub fn find_formatted_dates(text: &str) -> Vec<NaiveDate> {
    FORMATTED_DATE_RE
        .find_iter(text)
        .filter_map(|m| parse_formatted_date(m.as_str()))
        .collect()
}
