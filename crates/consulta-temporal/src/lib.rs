//! Temporal context for chat queries.
//!
//! Scans free-text Spanish queries for date expressions (`en 2023`,
//! `el 15/03/2023`, `enero de 2024`, `el año pasado`, `hace 3 años`),
//! resolves them to a target date and classifies the query as historical,
//! current or future relative to an injected clock.

pub mod context;
pub mod extract;
pub mod format;

pub use context::{DatePattern, TemporalContext};
pub use extract::{extract_temporal_context, TemporalExtractor};
pub use format::{find_formatted_dates, format_date, parse_formatted_date};
