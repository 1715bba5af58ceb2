use std::env;

use chrono_tz::Tz;
use clap::Parser;
use thiserror::Error;

use crate::clock::{ClockKind, StampMode};
use crate::format::{DEFAULT_ELAPSED_FORMAT, DEFAULT_FORMAT, FormatError, Placeholders, TimeFormat};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(
    name = "ts",
    version,
    about = "Timestamp each line of standard input",
    after_help = "Examples:\n  tail -f app.log | ts\n  make 2>&1 | ts -i\n  ./run.sh | ts -s '%M:%.S'\n  ts -r < /var/log/syslog\n  kubectl logs pod --timestamps | ts -r -p 3\n  ts -r '%Y-%m-%d %H:%M:%S' < access.log\n\nEnvironment:\n  TZ      timezone for stamps and for timestamps without an offset (default UTC)\n  TS_LOG  diagnostics filter, e.g. debug (default warn)"
)]
pub struct Cli {
    #[arg(short = 'r', help = "Convert timestamps found in each line to relative times")]
    relative: bool,

    #[arg(
        short = 'i',
        conflicts_with_all = ["since_start", "relative"],
        help = "Stamp the time elapsed since the previous line"
    )]
    incremental: bool,

    #[arg(
        short = 's',
        conflicts_with = "relative",
        help = "Stamp the time elapsed since the program started"
    )]
    since_start: bool,

    #[arg(short = 'm', help = "Use the monotonic clock")]
    monotonic: bool,

    #[arg(
        short = 'p',
        value_name = "PRECISION",
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(1..=4),
        help = "Number of units kept in relative times (1-4)"
    )]
    precision: u8,

    #[arg(
        value_name = "FORMAT",
        help = "strftime format; %.S, %.s and %.T add microseconds"
    )]
    format: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown timezone {0:?} in TZ")]
    InvalidTimezone(String),
    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Stamp(StampMode),
    Relative,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: Mode,
    pub clock: ClockKind,
    pub precision: usize,
    pub format: TimeFormat,
    pub user_format: bool,
    pub high_resolution: bool,
    pub timezone: Tz,
    pub log_filter: String,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_parts(cli, env::var("TZ").ok(), env::var("TS_LOG").ok())
    }

    fn from_parts(cli: &Cli, tz: Option<String>, log_filter: Option<String>) -> Result<Self, ConfigError> {
        let mode = if cli.relative {
            Mode::Relative
        } else if cli.incremental {
            Mode::Stamp(StampMode::Incremental)
        } else if cli.since_start {
            Mode::Stamp(StampMode::SinceStart)
        } else {
            Mode::Stamp(StampMode::Absolute)
        };
        let clock = if cli.monotonic { ClockKind::Monotonic } else { ClockKind::Wall };

        let format = match cli.format.as_deref() {
            Some(format) => format,
            None if matches!(mode, Mode::Stamp(StampMode::Incremental | StampMode::SinceStart)) => {
                DEFAULT_ELAPSED_FORMAT
            }
            None => DEFAULT_FORMAT,
        };
        let placeholders = if mode == Mode::Relative {
            Placeholders::Collapse
        } else {
            Placeholders::Expand
        };
        let format = TimeFormat::new(format, placeholders)?;
        let high_resolution = format.has_microseconds() || clock == ClockKind::Monotonic;

        let log_filter = log_filter
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            mode,
            clock,
            precision: usize::from(cli.precision),
            format,
            user_format: cli.format.is_some(),
            high_resolution,
            timezone: parse_timezone(tz.as_deref())?,
            log_filter,
        })
    }
}

/// `TZ` names an IANA zone, optionally with a leading `:`. Unset or empty
/// means UTC.
fn parse_timezone(value: Option<&str>) -> Result<Tz, ConfigError> {
    match value.map(|value| value.trim_start_matches(':')).filter(|value| !value.is_empty()) {
        None => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(name.to_string())),
    }
}
