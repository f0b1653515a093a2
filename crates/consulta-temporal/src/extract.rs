//! Date-reference extraction from Spanish free text.
//!
//! Rules are evaluated in a fixed priority order and the first rule whose
//! pattern matches decides the target date, regardless of where in the query
//! the match occurs.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use consulta_core::Clock;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::context::{DatePattern, TemporalContext};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

static BARE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:en|del|para|durante)\s+(\d{4})\b").unwrap());
static NUMERIC_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:a|el)\s+(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:del\s+)?({})\s+(?:del?\s+)?(\d{{4}})\b",
        MONTHS.join("|")
    ))
    .unwrap()
});
static LAST_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:el\s+año\s+pasado|año\s+anterior)\b").unwrap());
static YEARS_AGO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhace\s+(?:(\d+)\s+)?años?\b").unwrap());

static DEFAULT_EXTRACTOR: Lazy<TemporalExtractor> = Lazy::new(TemporalExtractor::new);

/// Turns captures into a target date. `None` rejects the match.
type Resolver = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

struct DateRule {
    pattern: DatePattern,
    regex: &'static Regex,
    resolve: Resolver,
}

/// Ordered set of date rules; first match wins.
pub struct TemporalExtractor {
    rules: Vec<DateRule>,
}

impl TemporalExtractor {
    pub fn new() -> Self {
        Self {
            rules: vec![
                DateRule {
                    pattern: DatePattern::BareYear,
                    regex: &BARE_YEAR_RE,
                    resolve: resolve_bare_year,
                },
                DateRule {
                    pattern: DatePattern::NumericDate,
                    regex: &NUMERIC_DATE_RE,
                    resolve: resolve_numeric_date,
                },
                DateRule {
                    pattern: DatePattern::MonthYear,
                    regex: &MONTH_YEAR_RE,
                    resolve: resolve_month_year,
                },
                DateRule {
                    pattern: DatePattern::LastYear,
                    regex: &LAST_YEAR_RE,
                    resolve: resolve_last_year,
                },
                DateRule {
                    pattern: DatePattern::YearsAgo,
                    regex: &YEARS_AGO_RE,
                    resolve: resolve_years_ago,
                },
            ],
        }
    }

    /// Find the target date referenced by `query`, relative to `today`.
    ///
    /// Only the highest-priority matching rule is consulted. If its captured
    /// components do not form a real calendar date the query is treated as
    /// having no date reference at all.
    pub fn detect(&self, query: &str, today: NaiveDate) -> Option<(DatePattern, NaiveDate)> {
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(query) else {
                continue;
            };
            let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

            return match (rule.resolve)(&caps, today) {
                Some(date) => {
                    debug!(
                        "Resolved '{}' via {} to {}",
                        matched,
                        rule.pattern.label(),
                        date
                    );
                    Some((rule.pattern, date))
                }
                None => {
                    debug!(
                        "Rejected out-of-range date '{}' ({}); treating query as undated",
                        matched,
                        rule.pattern.label()
                    );
                    None
                }
            };
        }
        None
    }

    /// Build the full temporal context of `query` evaluated at `now`.
    pub fn extract(
        &self,
        query: &str,
        now: DateTime<FixedOffset>,
        timezone: &str,
    ) -> TemporalContext {
        let resolved = self.detect(query, now.date_naive());
        TemporalContext::classify(resolved, now, timezone)
    }
}

impl Default for TemporalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the temporal context of `query` using the clock's current instant.
pub fn extract_temporal_context(query: &str, clock: &dyn Clock, timezone: &str) -> TemporalContext {
    DEFAULT_EXTRACTOR.extract(query, clock.now(), timezone)
}

fn capture<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn resolve_bare_year(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(capture(caps, 1)?, 1, 1)
}

fn resolve_numeric_date(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    let day: u32 = capture(caps, 1)?;
    let month: u32 = capture(caps, 2)?;
    let year: i32 = capture(caps, 3)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn resolve_month_year(caps: &Captures<'_>, _today: NaiveDate) -> Option<NaiveDate> {
    let name = caps.get(1)?.as_str().to_lowercase();
    let month = MONTHS.iter().position(|m| *m == name)? as u32 + 1;
    NaiveDate::from_ymd_opt(capture(caps, 2)?, month, 1)
}

fn resolve_last_year(_caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(today.year().checked_sub(1)?, 1, 1)
}

fn resolve_years_ago(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let years: i32 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(today.year().checked_sub(years)?, 1, 1)
}
