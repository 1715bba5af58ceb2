//! Clocks and the per-line stamping state.

use std::time::Instant;

use chrono::{DateTime, Duration, Timelike, Utc};

pub trait ClockSource {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClockKind {
    Wall,
    Monotonic,
}

impl ClockKind {
    pub fn source(self) -> Box<dyn ClockSource> {
        match self {
            ClockKind::Wall => Box::new(WallClock),
            ClockKind::Monotonic => Box::new(MonotonicClock::new()),
        }
    }
}

pub struct WallClock;

impl ClockSource for WallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Monotonic readings shifted onto the wall clock. The offset comes from a
/// single wall/monotonic pair taken at construction, so later wall clock
/// steps do not show up.
pub struct MonotonicClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self::anchored(Utc::now(), origin)
    }

    pub fn anchored(base: DateTime<Utc>, origin: Instant) -> Self {
        Self { base, origin }
    }
}

impl ClockSource for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.origin.elapsed()).unwrap_or(Duration::zero());
        self.base + elapsed
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StampMode {
    Absolute,
    /// Time since the previous line.
    Incremental,
    /// Time since the program started.
    SinceStart,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stamp {
    At(DateTime<Utc>),
    Elapsed(Duration),
}

/// Rolling state behind the per-line stamp.
pub struct Stamper {
    mode: StampMode,
    high_resolution: bool,
    last: DateTime<Utc>,
}

impl Stamper {
    pub fn new(mode: StampMode, high_resolution: bool, start: DateTime<Utc>) -> Self {
        let mut stamper = Self {
            mode,
            high_resolution,
            last: start,
        };
        stamper.last = stamper.truncate(start);
        stamper
    }

    pub fn stamp(&mut self, now: DateTime<Utc>) -> Stamp {
        let now = self.truncate(now);
        match self.mode {
            StampMode::Absolute => Stamp::At(now),
            StampMode::Incremental => {
                let elapsed = now - self.last;
                self.last = now;
                Stamp::Elapsed(elapsed.max(Duration::zero()))
            }
            StampMode::SinceStart => Stamp::Elapsed((now - self.last).max(Duration::zero())),
        }
    }

    fn truncate(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        if self.high_resolution {
            instant
        } else {
            instant.with_nanosecond(0).unwrap_or(instant)
        }
    }
}
