use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{error, info};

/// Date-only layouts, tried in order. Month-first layouts precede day-first ones so an
/// ambiguous value such as `03-04-2026` reads as March 4.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%d %B %Y",
];

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %I:%M %p"];

/// Parses the configured run date. Anything that matches none of the supported layouts is
/// treated as absent.
pub fn parse_run_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|dt| dt.date())
        });

    match parsed {
        Some(date) => info!(raw = trimmed, %date, "parsed configured run date"),
        None => error!(raw = trimmed, "unsupported format for configured run date"),
    }
    parsed
}

/// Why the gate refused to let the run proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    RunDateMissing,
    NotScheduledToday { scheduled: NaiveDate },
}

impl GateDecision {
    pub fn evaluate(configured: Option<NaiveDate>, today: NaiveDate) -> Self {
        match configured {
            None => Self::RunDateMissing,
            Some(date) if date == today => Self::Proceed,
            Some(scheduled) => Self::NotScheduledToday { scheduled },
        }
    }

    pub fn proceeds(self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// True only when a run date is configured and equals today's calendar date.
pub fn should_run(configured: Option<NaiveDate>, today: NaiveDate) -> bool {
    GateDecision::evaluate(configured, today).proceeds()
}
