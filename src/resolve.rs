//! Turning a recognized timestamp into an instant, and that instant into
//! output text.
//!
//! Timestamps without a year get the year of "now". If the result lands in
//! the future the year is decremented once: a `Dec 21` line read in early
//! January belongs to last year. The same happens when the date does not
//! exist in the current year (`Feb 29`). Staler timestamps are not corrected.

use std::fmt;
use std::ops::Range;

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
};
use thiserror::Error;

use crate::format::{FormatError, TimeFormat};
use crate::relative::describe_elapsed;
use crate::templates::TemplateSet;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ResolveError {
    #[error("no timestamp template matched")]
    PatternMismatch,
    #[error("timestamp {span:?} does not parse as {format:?}")]
    ParseFailure { span: String, format: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolved {
    pub span: Range<usize>,
    pub instant: DateTime<FixedOffset>,
    /// Description of the template that matched.
    pub template: &'static str,
}

/// How a resolved timestamp is presented.
#[derive(Clone, Debug)]
pub enum Presentation {
    Relative { precision: usize },
    Format(TimeFormat),
}

impl Presentation {
    pub fn render<Tz>(&self, resolved: &DateTime<FixedOffset>, now: &DateTime<Tz>) -> Result<String, FormatError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Presentation::Relative { precision } => {
                Ok(describe_elapsed(now.timestamp() - resolved.timestamp(), *precision))
            }
            Presentation::Format(format) => format.render(resolved),
        }
    }
}

/// Find the first timestamp in `line` and resolve it against `now`.
pub fn resolve_in_line<Tz: TimeZone>(
    templates: &TemplateSet,
    line: &[u8],
    now: &DateTime<Tz>,
) -> Result<Resolved, ResolveError> {
    let found = templates.match_timestamp(line).ok_or(ResolveError::PatternMismatch)?;
    let span_bytes = &line[found.span.clone()];
    let span = std::str::from_utf8(span_bytes).map_err(|_| ResolveError::ParseFailure {
        span: String::from_utf8_lossy(span_bytes).into_owned(),
        format: found.parse_format.to_string(),
    })?;
    let instant = resolve(span, found.parse_format, now)?;
    Ok(Resolved {
        span: found.span,
        instant,
        template: found.description,
    })
}

/// Parse `span` with `parse_format` and settle on an instant no later than
/// `now` where the year had to be guessed.
///
/// Text after the parsed fields (fractional seconds, a trailing `Z`) is
/// ignored. Fields carrying an explicit UTC offset are read in that offset,
/// anything else in the timezone of `now`.
pub fn resolve<Tz: TimeZone>(
    span: &str,
    parse_format: &str,
    now: &DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ResolveError> {
    let failure = || ResolveError::ParseFailure {
        span: span.to_string(),
        format: parse_format.to_string(),
    };

    let mut parsed = Parsed::new();
    format::parse_and_remainder(&mut parsed, span, StrftimeItems::new(parse_format)).map_err(|_| failure())?;

    let mut fields = CalendarFields::from_parsed(&parsed, now.year()).ok_or_else(failure)?;
    let timezone = now.timezone();
    match fields.instant(&timezone) {
        Some(instant) if instant.timestamp() <= now.timestamp() => Ok(instant),
        None if !fields.year_inferred => Err(failure()),
        _ => {
            fields.year -= 1;
            fields.instant(&timezone).ok_or_else(failure)
        }
    }
}

struct CalendarFields {
    year: i32,
    year_inferred: bool,
    month: u32,
    day: u32,
    time: NaiveTime,
    offset: Option<FixedOffset>,
}

impl CalendarFields {
    fn from_parsed(parsed: &Parsed, current_year: i32) -> Option<Self> {
        let year_inferred = parsed.year().is_none() && parsed.year_mod_100().is_none();
        let year = match (parsed.year(), parsed.year_mod_100()) {
            (Some(year), _) => year,
            (None, Some(short)) if short >= 69 => 1900 + short,
            (None, Some(short)) => 2000 + short,
            (None, None) => current_year,
        };
        let hour = parsed.hour_div_12().unwrap_or(0) * 12 + parsed.hour_mod_12().unwrap_or(0);
        let time = NaiveTime::from_hms_opt(hour, parsed.minute().unwrap_or(0), parsed.second().unwrap_or(0))?;
        let offset = match parsed.offset() {
            Some(seconds) => Some(FixedOffset::east_opt(seconds)?),
            None => None,
        };

        Some(Self {
            year,
            year_inferred,
            month: parsed.month().unwrap_or(1),
            day: parsed.day().unwrap_or(1),
            time,
            offset,
        })
    }

    fn instant<Tz: TimeZone>(&self, timezone: &Tz) -> Option<DateTime<FixedOffset>> {
        let local = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_time(self.time);
        match self.offset {
            Some(offset) => offset.from_local_datetime(&local).single(),
            None => {
                let instant = localize(timezone, local)?;
                let offset = instant.offset().fix();
                Some(instant.with_timezone(&offset))
            }
        }
    }
}

/// Ambiguous local times take the earlier instant; times skipped by a DST
/// jump are moved forward an hour.
fn localize<Tz: TimeZone>(timezone: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => timezone
            .from_local_datetime(&(local + chrono::Duration::hours(1)))
            .earliest(),
    }
}
