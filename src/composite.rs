//! Fixed-unit duration breakdown used for relative times.
//!
//! A [`CompositeTime`] splits a number of seconds into years, days, hours,
//! minutes and seconds. Months are left out on purpose: their length varies,
//! which would break the fixed-modulus conversion in both directions.

pub const UNIT_COUNT: usize = 5;

const DAYS_PER_YEAR: u64 = 365;
const HOURS_PER_DAY: u64 = 24;
const MINUTES_PER_HOUR: u64 = 60;
const SECONDS_PER_MINUTE: u64 = 60;

const SECONDS_PER_HOUR: u64 = MINUTES_PER_HOUR * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = HOURS_PER_DAY * SECONDS_PER_HOUR;
const SECONDS_PER_YEAR: u64 = DAYS_PER_YEAR * SECONDS_PER_DAY;

// Every pass zeroes a non-zero unit and only ever carries leftwards, so the
// fixed point is reached well within this many passes.
const MAX_PASSES: usize = UNIT_COUNT * UNIT_COUNT;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Year,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    /// Most significant first.
    pub const ALL: [Unit; UNIT_COUNT] = [Unit::Year, Unit::Day, Unit::Hour, Unit::Minute, Unit::Second];

    fn index(self) -> usize {
        self as usize
    }

    /// Exclusive upper bound of a normalized value; years are unbounded.
    pub fn max(self) -> Option<u64> {
        match self {
            Unit::Year => None,
            Unit::Day => Some(DAYS_PER_YEAR),
            Unit::Hour => Some(HOURS_PER_DAY),
            Unit::Minute => Some(MINUTES_PER_HOUR),
            Unit::Second => Some(SECONDS_PER_MINUTE),
        }
    }

    pub fn seconds(self) -> u64 {
        match self {
            Unit::Year => SECONDS_PER_YEAR,
            Unit::Day => SECONDS_PER_DAY,
            Unit::Hour => SECONDS_PER_HOUR,
            Unit::Minute => SECONDS_PER_MINUTE,
            Unit::Second => 1,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Unit::Year => 'y',
            Unit::Day => 'd',
            Unit::Hour => 'h',
            Unit::Minute => 'm',
            Unit::Second => 's',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompositeTime([u64; UNIT_COUNT]);

impl CompositeTime {
    pub const fn new(years: u64, days: u64, hours: u64, minutes: u64, seconds: u64) -> Self {
        Self([years, days, hours, minutes, seconds])
    }

    /// Truncating decomposition, most significant unit first.
    pub fn from_seconds(total: u64) -> Self {
        let mut units = [0; UNIT_COUNT];
        let mut remainder = total;
        for unit in Unit::ALL {
            units[unit.index()] = remainder / unit.seconds();
            remainder %= unit.seconds();
        }
        Self(units)
    }

    pub fn to_seconds(&self) -> u64 {
        Unit::ALL.iter().fold(0u64, |total, unit| {
            total.saturating_add(self.get(*unit).saturating_mul(unit.seconds()))
        })
    }

    pub fn get(&self, unit: Unit) -> u64 {
        self.0[unit.index()]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|value| *value == 0)
    }

    pub fn units(&self) -> impl Iterator<Item = (Unit, u64)> + '_ {
        Unit::ALL.into_iter().map(|unit| (unit, self.get(unit)))
    }

    /// Keep at most `precision` non-zero units below the year, rounding the
    /// last kept unit half-up, and carry any unit that reached its maximum.
    ///
    /// Years are never counted against `precision` and never reset; they only
    /// grow through carries. A precision of 0 collapses every other unit and
    /// a precision of [`UNIT_COUNT`] or more only corrects overflows.
    pub fn approximate(mut self, precision: usize) -> Self {
        for _ in 0..MAX_PASSES {
            if !self.approximate_pass(precision) {
                break;
            }
        }
        self
    }

    /// One top-down scan. Returns whether a unit was changed, in which case
    /// the scan has to start over.
    fn approximate_pass(&mut self, precision: usize) -> bool {
        let mut non_zero = 0;
        let mut overflowing = None;

        for unit in Unit::ALL {
            let index = unit.index();
            let value = self.0[index];
            if value == 0 {
                continue;
            }
            let Some(max) = unit.max() else {
                continue;
            };

            non_zero += 1;
            if non_zero > precision {
                if value >= max / 2 {
                    self.carry_into(index - 1);
                }
                self.0[index..].fill(0);
                return true;
            }
            if value >= max {
                overflowing = Some(index);
            }
        }

        match overflowing {
            Some(index) => {
                self.carry_into(index - 1);
                self.0[index] = 0;
                true
            }
            None => false,
        }
    }

    fn carry_into(&mut self, index: usize) {
        self.0[index] = self.0[index].saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approximate(ct: CompositeTime, precision: usize) -> CompositeTime {
        // Go through seconds first so inputs carry the raw-bounds invariant.
        CompositeTime::from_seconds(ct.to_seconds()).approximate(precision)
    }

    #[test]
    fn decomposes_seconds_most_significant_first() {
        assert_eq!(CompositeTime::from_seconds(95310), CompositeTime::new(0, 1, 2, 28, 30));
        assert_eq!(
            CompositeTime::from_seconds(SECONDS_PER_YEAR + 59),
            CompositeTime::new(1, 0, 0, 0, 59)
        );
        assert_eq!(CompositeTime::new(0, 1, 2, 28, 30).to_seconds(), 95310);
    }

    #[test]
    fn minutes_round_hours_up() {
        let ct = approximate(CompositeTime::new(0, 0, 1, 59, 30), 2);
        assert_eq!(ct, CompositeTime::new(0, 0, 2, 0, 0));

        let ct = approximate(CompositeTime::new(0, 0, 1, 59, 59), 2);
        assert_eq!(ct, CompositeTime::new(0, 0, 2, 0, 0));
    }

    #[test]
    fn keeps_units_within_precision() {
        let input = CompositeTime::new(0, 1, 2, 28, 30);
        assert_eq!(approximate(input, 1), CompositeTime::new(0, 1, 0, 0, 0));
        assert_eq!(approximate(input, 2), CompositeTime::new(0, 1, 2, 0, 0));
        assert_eq!(approximate(input, 3), CompositeTime::new(0, 1, 2, 29, 0));
        assert_eq!(approximate(input, 4), input);
    }

    #[test]
    fn cascading_carry_reaches_years() {
        let ct = approximate(CompositeTime::new(1, 364, 23, 59, 59), 2);
        assert_eq!(ct, CompositeTime::new(2, 0, 0, 0, 0));

        let ct = approximate(CompositeTime::new(0, 0, 23, 59, 59), 2);
        assert_eq!(ct, CompositeTime::new(0, 1, 0, 0, 0));

        let ct = approximate(CompositeTime::new(0, 0, 23, 59, 30), 2);
        assert_eq!(ct, CompositeTime::new(0, 1, 0, 0, 0));
    }

    #[test]
    fn years_do_not_count_against_precision() {
        let ct = approximate(CompositeTime::new(1, 2, 3, 45, 59), 3);
        assert_eq!(ct, CompositeTime::new(1, 2, 3, 46, 0));

        let ct = approximate(CompositeTime::new(1, 2, 3, 45, 59), 2);
        assert_eq!(ct, CompositeTime::new(1, 2, 4, 0, 0));

        let ct = approximate(CompositeTime::new(1, 0, 1, 0, 1), 2);
        assert_eq!(ct, CompositeTime::new(1, 0, 1, 0, 1));

        let ct = approximate(CompositeTime::new(1, 0, 0, 0, 5), 1);
        assert_eq!(ct, CompositeTime::new(1, 0, 0, 0, 5));
    }

    #[test]
    fn values_below_half_are_dropped() {
        let ct = approximate(CompositeTime::new(0, 0, 0, 1, 30), 1);
        assert_eq!(ct, CompositeTime::new(0, 0, 0, 2, 0));

        let ct = approximate(CompositeTime::new(0, 0, 0, 1, 29), 1);
        assert_eq!(ct, CompositeTime::new(0, 0, 0, 1, 0));
    }

    #[test]
    fn already_concise_values_are_untouched() {
        for (input, precision) in [
            (CompositeTime::new(0, 0, 0, 59, 59), 2),
            (CompositeTime::new(0, 0, 1, 59, 59), 3),
            (CompositeTime::new(0, 0, 23, 45, 0), 2),
            (CompositeTime::new(0, 364, 23, 0, 0), 2),
            (CompositeTime::new(0, 364, 23, 59, 59), 4),
            (CompositeTime::new(0, 0, 12, 30, 0), 3),
            (CompositeTime::new(0, 0, 0, 0, 1), 4),
            (CompositeTime::new(0, 0, 0, 0, 0), 2),
        ] {
            assert_eq!(approximate(input, precision), input, "precision {precision}");
        }
    }

    #[test]
    fn sixty_seconds_overflow_into_minutes() {
        let ct = CompositeTime::new(0, 0, 23, 59, 60).approximate(3);
        assert_eq!(ct, CompositeTime::new(0, 1, 0, 0, 0));

        let ct = CompositeTime::new(0, 0, 0, 0, 60).approximate(UNIT_COUNT);
        assert_eq!(ct, CompositeTime::new(0, 0, 0, 1, 0));
    }

    #[test]
    fn precision_zero_collapses_everything_below_years() {
        let ct = CompositeTime::new(3, 10, 5, 0, 0).approximate(0);
        assert_eq!(ct, CompositeTime::new(3, 0, 0, 0, 0));

        let ct = CompositeTime::new(0, 200, 0, 0, 0).approximate(0);
        assert_eq!(ct, CompositeTime::new(1, 0, 0, 0, 0));

        let ct = CompositeTime::new(0, 0, 0, 0, 10).approximate(0);
        assert!(ct.is_zero());
    }

    proptest! {
        #[test]
        fn seconds_round_trip(total in 0u64..(200 * SECONDS_PER_YEAR)) {
            prop_assert_eq!(CompositeTime::from_seconds(total).to_seconds(), total);
        }

        #[test]
        fn approximation_is_idempotent(total in 0u64..(50 * SECONDS_PER_YEAR), precision in 0usize..=6) {
            let once = CompositeTime::from_seconds(total).approximate(precision);
            prop_assert_eq!(once.approximate(precision), once);
        }

        #[test]
        fn precision_zero_leaves_only_years(total in 0u64..(50 * SECONDS_PER_YEAR)) {
            let ct = CompositeTime::from_seconds(total).approximate(0);
            for (unit, value) in ct.units().skip(1) {
                prop_assert_eq!(value, 0, "{:?}", unit);
            }
        }

        #[test]
        fn full_precision_keeps_raw_values(total in 0u64..(50 * SECONDS_PER_YEAR), precision in UNIT_COUNT..10) {
            let raw = CompositeTime::from_seconds(total);
            prop_assert_eq!(raw.approximate(precision), raw);
        }

        #[test]
        fn approximation_respects_unit_bounds(total in 0u64..(50 * SECONDS_PER_YEAR), precision in 0usize..=4) {
            let ct = CompositeTime::from_seconds(total).approximate(precision);
            let mut non_zero = 0;
            for (unit, value) in ct.units() {
                if let Some(max) = unit.max() {
                    prop_assert!(value < max);
                    if value != 0 {
                        non_zero += 1;
                    }
                }
            }
            prop_assert!(non_zero <= precision);
        }
    }
}
