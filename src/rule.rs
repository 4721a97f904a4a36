/*!
 # Rules

 A rule is an immutable closed interval `[start_time, stop_time]` on one
 day's millisecond timeline, with a color gradient from `start_color` to
 `stop_color` across it.
*/

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveTime;

use crate::day::{Day, MSEC_PER_DAY};
use crate::{Color, Error, Result};

/// Which end of a rule another rule's bound falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapRegion {
    /// The other rule's start lies inside this rule
    Head,
    /// The other rule's stop lies inside this rule
    Tail,
}

/// A time-bounded color transition on one day
///
/// Two rules are equal when every field is equal; the same fields feed
/// [`Rule::content_hash`]. Rules with identical fields are therefore
/// indistinguishable, which is fine as long as they are treated as values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    day: Day,
    start_time: u32,
    stop_time: u32,
    start_color: Color,
    stop_color: Color,
}

impl Rule {
    /// Creates a rule, validating `0 <= start < stop <= MSEC_PER_DAY`
    pub fn new(
        day: Day,
        start_time: u32,
        stop_time: u32,
        start_color: Color,
        stop_color: Color,
    ) -> Result<Self> {
        if start_time >= MSEC_PER_DAY {
            return Err(Error::ValueOutOfRange(
                start_time as i64,
                0,
                MSEC_PER_DAY as i64 - 1,
            ));
        }
        if stop_time == 0 || stop_time > MSEC_PER_DAY {
            return Err(Error::ValueOutOfRange(stop_time as i64, 1, MSEC_PER_DAY as i64));
        }
        if start_time >= stop_time {
            return Err(Error::InvalidTimeRange {
                start: start_time,
                stop: stop_time,
            });
        }

        Ok(Self {
            day,
            start_time,
            stop_time,
            start_color,
            stop_color,
        })
    }

    /// A rule spanning the whole day
    pub fn all_day(day: Day, start_color: Color, stop_color: Color) -> Self {
        Self {
            day,
            start_time: 0,
            stop_time: MSEC_PER_DAY,
            start_color,
            stop_color,
        }
    }

    /// A copy of this rule with new bounds, same day and colors
    pub fn with_bounds(&self, start_time: u32, stop_time: u32) -> Result<Self> {
        Self::new(
            self.day,
            start_time,
            stop_time,
            self.start_color,
            self.stop_color,
        )
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    pub fn stop_time(&self) -> u32 {
        self.stop_time
    }

    pub fn start_color(&self) -> Color {
        self.start_color
    }

    pub fn stop_color(&self) -> Color {
        self.stop_color
    }

    /// Whether `msec` lies inside the closed interval
    pub fn contains(&self, msec: u32) -> bool {
        self.start_time <= msec && msec <= self.stop_time
    }

    /// Whether this rule is fully contained in `other` (equal bounds count)
    pub fn within(&self, other: &Rule) -> bool {
        self.day == other.day
            && self.start_time >= other.start_time
            && self.stop_time <= other.stop_time
    }

    /// Whether `other` overlaps this rule
    ///
    /// With a region, only that kind of overlap is checked: `Head` when
    /// `other` starts strictly after this rule starts but no later than it
    /// stops, `Tail` when `other` stops no earlier than this rule starts but
    /// strictly before it stops. Without one, containment either way also
    /// counts.
    pub fn overlaps(&self, other: &Rule, region: Option<OverlapRegion>) -> bool {
        if self.day != other.day {
            return false;
        }

        let head = self.start_time < other.start_time && other.start_time <= self.stop_time;
        let tail = self.start_time <= other.stop_time && other.stop_time < self.stop_time;

        match region {
            Some(OverlapRegion::Head) => head,
            Some(OverlapRegion::Tail) => tail,
            None => self.within(other) || other.within(self) || head || tail,
        }
    }

    /// Renders the bounds on a 12-hour clock, e.g. `1:00:00 PM - 2:00:00 PM`
    pub fn time_interval(&self) -> String {
        format!(
            "{} - {}",
            clock_label(self.start_time),
            clock_label(self.stop_time)
        )
    }

    /// Deterministic hash over every field, used to address rules by value
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn clock_label(msec: u32) -> String {
    // The end of the day wraps around to midnight
    let msec = msec % MSEC_PER_DAY;
    NaiveTime::from_num_seconds_from_midnight_opt(msec / 1000, (msec % 1000) * 1_000_000)
        .map(|time| time.format("%-I:%M:%S %p").to_string())
        .unwrap_or_default()
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} -> {})",
            self.day,
            self.time_interval(),
            self.start_color,
            self.stop_color
        )
    }
}
