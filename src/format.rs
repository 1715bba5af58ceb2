//! User-supplied strftime-style formats.
//!
//! On top of chrono's specifiers, `%.S`, `%.s` and `%.T` print the usual
//! field followed by six fractional digits (microseconds).

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "%b %d %H:%M:%S";
pub const DEFAULT_ELAPSED_FORMAT: &str = "%H:%M:%S";

/// Hard cap on a single rendered timestamp.
pub const MAX_RENDER_BYTES: usize = 4096;

const MICROSECOND_SPECIFIERS: [char; 3] = ['S', 's', 'T'];

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid time format {0:?}")]
    Invalid(String),
    #[error("time format {format:?} renders more than {MAX_RENDER_BYTES} bytes")]
    Overflow { format: String },
}

/// What to do with the microsecond placeholders.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Placeholders {
    /// Keep the sub-second digits (stamping the current time).
    Expand,
    /// Drop them (rendering parsed timestamps, which have no sub-seconds).
    Collapse,
}

#[derive(Clone, Debug)]
pub struct TimeFormat {
    source: String,
    pattern: String,
    microsecond_specifiers: usize,
}

impl TimeFormat {
    /// Sanitize and validate `format`. Fails on unknown specifiers and on
    /// formats whose output does not fit [`MAX_RENDER_BYTES`].
    pub fn new(format: &str, placeholders: Placeholders) -> Result<Self, FormatError> {
        let (pattern, microsecond_specifiers) = sanitize(format, placeholders);
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::Invalid(format.to_string()));
        }

        let time_format = Self {
            source: format.to_string(),
            pattern,
            microsecond_specifiers,
        };
        // Empty output is fine, only the size matters here.
        time_format.render(&DateTime::<chrono::Utc>::default())?;
        Ok(time_format)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_microseconds(&self) -> bool {
        self.microsecond_specifiers > 0
    }

    pub fn render<Tz>(&self, instant: &DateTime<Tz>) -> Result<String, FormatError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        write!(out, "{}", instant.format(&self.pattern)).map_err(|_| FormatError::Invalid(self.source.clone()))?;
        if out.len() > MAX_RENDER_BYTES {
            return Err(FormatError::Overflow {
                format: self.source.clone(),
            });
        }
        Ok(out)
    }
}

/// Rewrite the microsecond placeholders into chrono syntax and count them.
fn sanitize(format: &str, placeholders: Placeholders) -> (String, usize) {
    let mut out = String::with_capacity(format.len());
    let mut count = 0;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push_str("%%");
            }
            Some('.') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                match lookahead.next() {
                    Some(spec) if MICROSECOND_SPECIFIERS.contains(&spec) => {
                        chars.next();
                        chars.next();
                        count += 1;
                        out.push('%');
                        out.push(spec);
                        if placeholders == Placeholders::Expand {
                            out.push_str("%.6f");
                        }
                    }
                    _ => out.push('%'),
                }
            }
            _ => out.push('%'),
        }
    }

    (out, count)
}
