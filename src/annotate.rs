//! Per-line output: a stamp in front of the line, or the line's embedded
//! timestamp turned into relative text.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::clock::{Stamp, Stamper};
use crate::config::{Config, Mode};
use crate::format::TimeFormat;
use crate::resolve::{Presentation, ResolveError, resolve_in_line};
use crate::templates::TemplateSet;

pub enum LineStyle {
    Stamp {
        format: TimeFormat,
        stamper: Stamper,
    },
    Relative {
        presentation: Presentation,
        templates: TemplateSet,
    },
}

pub struct Annotator {
    style: LineStyle,
    timezone: Tz,
}

impl Annotator {
    pub fn new(style: LineStyle, timezone: Tz) -> Self {
        Self { style, timezone }
    }

    pub fn from_config(config: &Config, templates: TemplateSet, start: DateTime<Utc>) -> Self {
        let style = match config.mode {
            Mode::Stamp(mode) => LineStyle::Stamp {
                format: config.format.clone(),
                stamper: Stamper::new(mode, config.high_resolution, start),
            },
            Mode::Relative => {
                let presentation = if config.user_format {
                    Presentation::Format(config.format.clone())
                } else {
                    Presentation::Relative {
                        precision: config.precision,
                    }
                };
                LineStyle::Relative {
                    presentation,
                    templates,
                }
            }
        };
        Self::new(style, config.timezone)
    }

    pub fn annotate(&mut self, now: DateTime<Utc>, line: &[u8]) -> Vec<u8> {
        let timezone = self.timezone;
        match &mut self.style {
            LineStyle::Stamp { format, stamper } => stamp_line(format, stamper.stamp(now), &timezone, line),
            LineStyle::Relative {
                presentation,
                templates,
            } => relative_line(presentation, templates, &now.with_timezone(&timezone), line),
        }
    }
}

fn stamp_line(format: &TimeFormat, stamp: Stamp, timezone: &Tz, line: &[u8]) -> Vec<u8> {
    // Elapsed times are rendered as an offset from the epoch, in UTC so the
    // zone offset does not leak into them.
    let rendered = match stamp {
        Stamp::At(instant) => format.render(&instant.with_timezone(timezone)),
        Stamp::Elapsed(elapsed) => format.render(&(DateTime::<Utc>::default() + elapsed)),
    };
    let text = rendered.unwrap_or_else(|error| {
        warn!(%error, "dropping timestamp");
        String::new()
    });

    let mut out = Vec::with_capacity(text.len() + 1 + line.len());
    out.extend_from_slice(text.as_bytes());
    out.push(b' ');
    out.extend_from_slice(line);
    out
}

fn relative_line(presentation: &Presentation, templates: &TemplateSet, now: &DateTime<Tz>, line: &[u8]) -> Vec<u8> {
    let resolved = match resolve_in_line(templates, line, now) {
        Ok(resolved) => resolved,
        Err(ResolveError::PatternMismatch) => return line.to_vec(),
        Err(error) => {
            debug!(%error, "passing line through");
            return line.to_vec();
        }
    };
    debug!(template = resolved.template, instant = %resolved.instant, "resolved timestamp");
    let text = presentation.render(&resolved.instant, now).unwrap_or_else(|error| {
        warn!(%error, "dropping relative timestamp");
        String::new()
    });

    // Everything up to the end of the timestamp is replaced.
    let mut out = Vec::with_capacity(text.len() + line.len() - resolved.span.end);
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(&line[resolved.span.end..]);
    out
}
