//! The resolved temporal context of a query.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::format::format_date;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Which date expression resolved the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePattern {
    /// `en 2023`, `del 2023`, `para 2026`, `durante 2020`
    BareYear,
    /// `a 15/03/2023`, `el 1/2/2024` (day first)
    NumericDate,
    /// `enero 2024`, `del marzo de 2022`
    MonthYear,
    /// `el año pasado`, `año anterior`
    LastYear,
    /// `hace 3 años`, `hace años`
    YearsAgo,
}

impl DatePattern {
    pub fn label(&self) -> &'static str {
        match self {
            DatePattern::BareYear => "bare_year",
            DatePattern::NumericDate => "numeric_date",
            DatePattern::MonthYear => "month_year",
            DatePattern::LastYear => "last_year",
            DatePattern::YearsAgo => "years_ago",
        }
    }
}

/// Temporal classification of a single query.
///
/// The three flags are computed independently and may overlap: an explicit
/// date equal to today resolves to local midnight, which is both before the
/// evaluation instant (`is_historical`) and less than a day away from it
/// (`is_current_data`). Callers that branch on the flags check
/// `is_historical`, then `is_future`, and treat everything else as current.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalContext {
    target_date: NaiveDate,
    current_date: NaiveDate,
    #[serde(rename = "evaluatedAt")]
    current: DateTime<FixedOffset>,
    timezone: String,
    is_historical: bool,
    is_future: bool,
    is_current_data: bool,
    detected: Option<DatePattern>,
}

impl TemporalContext {
    /// Classify a resolved target against the evaluation instant `now`.
    ///
    /// `resolved` is `None` when no date expression was recognized; the
    /// target then defaults to the current date and the query counts as
    /// current data.
    pub fn classify(
        resolved: Option<(DatePattern, NaiveDate)>,
        now: DateTime<FixedOffset>,
        timezone: impl Into<String>,
    ) -> Self {
        let current_date = now.date_naive();

        let resolved = resolved.and_then(|(pattern, date)| {
            local_midnight(date, now.offset()).map(|instant| (pattern, date, instant))
        });

        let (detected, target_date, target_instant) = match resolved {
            Some((pattern, date, instant)) => (Some(pattern), date, instant),
            None => (None, current_date, now),
        };

        let distance = (target_instant - now).num_seconds().abs();

        Self {
            target_date,
            current_date,
            current: now,
            timezone: timezone.into(),
            is_historical: target_instant < now,
            is_future: target_instant > now,
            is_current_data: detected.is_none() || distance < SECONDS_PER_DAY,
            detected,
        }
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// The evaluation instant in the civil timezone.
    pub fn current(&self) -> DateTime<FixedOffset> {
        self.current
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn is_historical(&self) -> bool {
        self.is_historical
    }

    pub fn is_future(&self) -> bool {
        self.is_future
    }

    pub fn is_current_data(&self) -> bool {
        self.is_current_data
    }

    pub fn detected(&self) -> Option<DatePattern> {
        self.detected
    }

    /// Target date as `dd/mm/yyyy`.
    pub fn formatted_target(&self) -> String {
        format_date(self.target_date)
    }

    /// Current date as `dd/mm/yyyy`.
    pub fn formatted_current(&self) -> String {
        format_date(self.current_date)
    }
}

fn local_midnight(date: NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(*offset)
        .single()
}
