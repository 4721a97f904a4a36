/*!
 # Pi Light: weekly color schedules for an addressable light

 A Rust library that drives a single color output from a weekly schedule of
 time-bounded color transitions ("rules"). Every day of the week owns an
 ordered, non-overlapping set of rules; at any instant the active rule
 determines the displayed color by interpolating between its start and stop
 colors.

 ## Features

 * Overlap-resolving rule insertion (newer rules always win)
 * Removal by value or by content hash
 * "Current rule" / "next rule" queries against an injected instant
 * Color gradients with brightness
 * JSON seed files
 * A poll loop pushing colors to an output driver
 * A line protocol for editing the schedule while the loop runs

 ## Example

 ```rust
 use pi_light::*;

 fn main() -> Result<()> {
     let red = Color::new(255, 0, 0, 1.0)?;
     let blue = Color::new(0, 0, 255, 0.5)?;

     let mut scheduler = Scheduler::new();
     scheduler.add_rule(Rule::new(Day::Monday, 0, 3_600_000, red, blue)?);

     // Halfway through the rule
     let color = scheduler.current_color(Day::Monday, 1_800_000);
     assert_eq!(color.r(), 128);

     Ok(())
 }
 ```
*/

use thiserror::Error;

/// Custom error types for the pi light library
#[derive(Error, Debug)]
pub enum Error {
    /// Rule bounds are not strictly increasing
    #[error("Invalid time range: start {start} must be before stop {stop}")]
    InvalidTimeRange { start: u32, stop: u32 },

    /// Value out of range
    #[error("Value {0} out of range ({1}..={2})")]
    ValueOutOfRange(i64, i64, i64),

    /// Brightness out of range
    #[error("Brightness {0} out of range (0.0..=1.0)")]
    BrightnessOutOfRange(f32),

    /// Removal target is not in the schedule
    #[error("Rule does not exist")]
    RuleNotFound,

    /// Unknown day name
    #[error("Invalid day: {0}")]
    InvalidDay(String),

    /// Malformed color string
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Malformed time-of-day string
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// Malformed protocol command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Error from the output driver
    #[error("Output error: {0}")]
    Output(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error from serde_json
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// Import needed for Result type extension
pub type Result<T> = std::result::Result<T, Error>;

// Re-export modules
pub mod color;
pub mod command;
pub mod day;
pub mod light;
pub mod output;
pub mod rule;
pub mod scheduler;
pub mod seed;
pub mod settings;

// Re-export key types
pub use color::Color;
pub use command::{render_current, render_next, render_rules, Command};
pub use day::{msec_from_hms, parse_days, parse_time_of_day, Day, TimeOfWeek, MSEC_PER_DAY};
pub use light::{run, Light, Mode, SharedLight, State};
pub use output::{ConsoleOutput, Output, OutputKind};
pub use rule::{OverlapRegion, Rule};
pub use scheduler::Scheduler;
pub use seed::{load_rules, load_rules_from_str, load_rules_or_empty, rules_to_json, save_rules};
pub use settings::Settings;
