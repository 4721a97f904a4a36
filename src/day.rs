/*!
 # Days and instants

 This module provides the weekday tags that key the schedule, day-list
 parsing for user input, and the `(day, millisecond-of-day)` instant the
 scheduler is queried with.
*/

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::{Error, Result};

/// Milliseconds in a day; the exclusive upper bound of a rule's start and
/// the inclusive upper bound of its stop
pub const MSEC_PER_DAY: u32 = 86_400_000;

/// Represents days of the week for scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// All days in week order, starting on Monday
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Position in the week, Monday being 0
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit for this day (Monday 0x01 through Sunday 0x40)
    pub fn mask(self) -> u8 {
        1 << self.index()
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Day {
    fn from(weekday: chrono::Weekday) -> Self {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" => Ok(Day::Monday),
            "tue" | "tuesday" => Ok(Day::Tuesday),
            "wed" | "wednesday" => Ok(Day::Wednesday),
            "thu" | "thursday" => Ok(Day::Thursday),
            "fri" | "friday" => Ok(Day::Friday),
            "sat" | "saturday" => Ok(Day::Saturday),
            "sun" | "sunday" => Ok(Day::Sunday),
            _ => Err(Error::InvalidDay(s.to_string())),
        }
    }
}

const WEEK_DAYS_MASK: u8 = 0x01 | 0x02 | 0x04 | 0x08 | 0x10;
const WEEKEND_MASK: u8 = 0x20 | 0x40;
const ALL_MASK: u8 = WEEK_DAYS_MASK | WEEKEND_MASK;

/// Parse a days string into the days it names, in week order
///
/// Accepts a day name (`mon`, `monday`), `all`, `weekdays`, `weekend`, or a
/// comma-separated combination of those.
#[instrument]
pub fn parse_days(days: &str) -> Result<Vec<Day>> {
    let mut combined = 0u8;
    for part in days.split(',') {
        let part_mask = match part.trim().to_lowercase().as_str() {
            "all" => ALL_MASK,
            "weekdays" => WEEK_DAYS_MASK,
            "weekend" => WEEKEND_MASK,
            other => other.parse::<Day>()?.mask(),
        };
        trace!("  Day '{}' = {:#04x}", part, part_mask);
        combined |= part_mask;
    }

    debug!("Days '{}' parsed to bitmask: {:#04x}", days, combined);
    Ok(Day::ALL
        .into_iter()
        .filter(|day| combined & day.mask() != 0)
        .collect())
}

/// Milliseconds since midnight for a wall-clock time
pub fn msec_from_hms(hour: u32, minute: u32, second: u32) -> u32 {
    ((hour * 60 + minute) * 60 + second) * 1000
}

/// Parse `H:M` or `H:M:S` into milliseconds since midnight
///
/// `24:00` (and `24:00:00`) is accepted as the end of the day.
pub fn parse_time_of_day(s: &str) -> Result<u32> {
    let invalid = || Error::InvalidTime(s.to_string());

    let fields = s
        .trim()
        .split(':')
        .map(|field| field.trim().parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;

    let (hour, minute, second) = match fields.as_slice() {
        [hour, minute] => (*hour, *minute, 0),
        [hour, minute, second] => (*hour, *minute, *second),
        _ => return Err(invalid()),
    };

    if minute > 59 || second > 59 || hour > 24 || (hour == 24 && (minute, second) != (0, 0)) {
        return Err(invalid());
    }

    Ok(msec_from_hms(hour, minute, second))
}

/// An instant within the week: the day and the millisecond of that day
///
/// The scheduler never reads the clock itself; callers build one of these
/// from whatever time source they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfWeek {
    pub day: Day,
    pub msec: u32,
}

impl TimeOfWeek {
    pub fn new(day: Day, msec: u32) -> Self {
        Self { day, msec }
    }

    /// The current local wall-clock instant
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        let time = datetime.time();
        // Leap seconds show up as nanosecond values past one second
        let millis = (time.nanosecond() / 1_000_000).min(999);
        Self {
            day: datetime.weekday().into(),
            msec: time.num_seconds_from_midnight() * 1000 + millis,
        }
    }
}

impl fmt::Display for TimeOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.msec / 1000;
        write!(
            f,
            "{} {:02}:{:02}:{:02}.{:03}",
            self.day,
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60,
            self.msec % 1000
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn test_parse_day() {
        assert_eq!("mon".parse::<Day>().unwrap(), Day::Monday);
        assert_eq!("Sunday".parse::<Day>().unwrap(), Day::Sunday);
        assert_eq!(" THU ".parse::<Day>().unwrap(), Day::Thursday);
        assert!(matches!("noday".parse::<Day>(), Err(Error::InvalidDay(_))));
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days("wed").unwrap(), vec![Day::Wednesday]);
        assert_eq!(parse_days("weekend").unwrap(), vec![Day::Saturday, Day::Sunday]);
        assert_eq!(parse_days("all").unwrap(), Day::ALL.to_vec());
        assert_eq!(parse_days("weekdays").unwrap(), Day::ALL[..5].to_vec());
        assert_eq!(
            parse_days("sun,mon,sunday").unwrap(),
            vec![Day::Monday, Day::Sunday]
        );
        assert!(parse_days("mon,funday").is_err());
    }

    #[test]
    fn test_weekday_conversion() {
        assert_eq!(Day::from(chrono::Weekday::Mon), Day::Monday);
        assert_eq!(Day::from(chrono::Weekday::Sun), Day::Sunday);
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("0:0:5").unwrap(), 5_000);
        assert_eq!(parse_time_of_day("13:30").unwrap(), 48_600_000);
        assert_eq!(parse_time_of_day("24:00").unwrap(), MSEC_PER_DAY);
        assert!(parse_time_of_day("24:01").is_err());
        assert!(parse_time_of_day("12:60").is_err());
        assert!(parse_time_of_day("12").is_err());
        assert!(parse_time_of_day("ab:cd").is_err());
    }

    #[test]
    fn test_time_of_week_from_datetime() {
        // 2021-04-27 was a Tuesday
        let datetime = NaiveDate::from_ymd_opt(2021, 4, 27)
            .unwrap()
            .and_hms_milli_opt(1, 2, 3, 456)
            .unwrap()
            .and_local_timezone(FixedOffset::west_opt(5 * 3600).unwrap())
            .unwrap();

        let now = TimeOfWeek::from_datetime(&datetime);
        assert_eq!(now.day, Day::Tuesday);
        assert_eq!(now.msec, msec_from_hms(1, 2, 3) + 456);
        assert_eq!(now.to_string(), "Tuesday 01:02:03.456");
    }
}
