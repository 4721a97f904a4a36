/*!
 # Line protocol

 One command per line, `name` or `name:arguments`, used by the daemon to edit
 and inspect the schedule while the poll loop runs:

 ```text
 add:<days> <start> <stop> <start color> <stop color>
 remove:<rule hash>
 rules
 current
 next
 color
 mode:<default|rules|rainbow> [color]
 stop
 ```

 Days use the `parse_days` syntax (`mon`, `weekdays`, `sat,sun`), times are
 `H:M` or `H:M:S`, colors are `#rrggbb@brightness`, and rule hashes are the
 hexadecimal values printed by `rules`.
*/

use std::fmt::Write;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::{
    parse_days, parse_time_of_day, Color, Day, Error, Light, Mode, Result, Rule, Scheduler,
    State, TimeOfWeek,
};

/// A parsed protocol command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert one rule per listed day
    Add {
        days: Vec<Day>,
        start_time: u32,
        stop_time: u32,
        start_color: Color,
        stop_color: Color,
    },
    /// Remove a rule by content hash
    Remove(u64),
    /// List every rule
    Rules,
    /// Show the active rule
    Current,
    /// Show the upcoming rule
    Next,
    /// Show the displayed color
    Color,
    /// Switch display mode, optionally setting the default-mode color
    Mode(Mode, Option<Color>),
    /// Stop the poll loop
    Stop,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, args) = match line.split_once(':') {
            Some((name, args)) => (name.trim(), args.trim()),
            None => (line, ""),
        };
        let mut args = args.split_whitespace();

        let command = match name.to_lowercase().as_str() {
            "add" => {
                let mut next = |what: &str| {
                    args.next()
                        .ok_or_else(|| Error::InvalidCommand(format!("add: missing {}", what)))
                };
                Command::Add {
                    days: parse_days(next("days")?)?,
                    start_time: parse_time_of_day(next("start time")?)?,
                    stop_time: parse_time_of_day(next("stop time")?)?,
                    start_color: next("start color")?.parse::<Color>()?,
                    stop_color: next("stop color")?.parse::<Color>()?,
                }
            }
            "remove" => {
                let hash = args
                    .next()
                    .ok_or_else(|| Error::InvalidCommand("remove: missing rule hash".into()))?;
                Command::Remove(parse_hash(hash)?)
            }
            "rules" => Command::Rules,
            "current" => Command::Current,
            "next" => Command::Next,
            "color" => Command::Color,
            "mode" => {
                let mode = args
                    .next()
                    .ok_or_else(|| Error::InvalidCommand("mode: missing mode".into()))?
                    .parse::<Mode>()?;
                let color = args.next().map(str::parse::<Color>).transpose()?;
                Command::Mode(mode, color)
            }
            "stop" => Command::Stop,
            "" => return Err(Error::InvalidCommand("no command given".into())),
            other => return Err(Error::InvalidCommand(format!("unknown command '{}'", other))),
        };

        if let Some(extra) = args.next() {
            return Err(Error::InvalidCommand(format!(
                "{}: unexpected argument '{}'",
                name, extra
            )));
        }

        Ok(command)
    }
}

/// Parses a rule hash as printed by [`render_rules`]
pub fn parse_hash(s: &str) -> Result<u64> {
    let digits = s.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|_| Error::InvalidCommand(format!("invalid rule hash '{}'", s)))
}

/// One line per rule, grouped under day headings; empty days are skipped
pub fn render_rules(scheduler: &Scheduler) -> String {
    let mut out = String::new();
    for (day, rules) in scheduler.iter().filter(|(_, rules)| !rules.is_empty()) {
        let _ = writeln!(out, "{}", day);
        for rule in rules {
            let _ = writeln!(out, "  {}", render_rule(rule));
        }
    }

    if out.is_empty() {
        out.push_str("no rules\n");
    }
    out
}

fn render_rule(rule: &Rule) -> String {
    format!(
        "{:016x} {} {} -> {}",
        rule.content_hash(),
        rule.time_interval(),
        rule.start_color(),
        rule.stop_color()
    )
}

/// Describes the rule active at `now`
pub fn render_current(scheduler: &Scheduler, now: TimeOfWeek) -> String {
    match scheduler.current_rule(now.day, now.msec) {
        (Some(rule), percentage) => {
            format!("{} at {:.1}%", render_rule(rule), percentage * 100.0)
        }
        (None, _) => "no active rule".to_string(),
    }
}

/// Describes what happens next after `now`
pub fn render_next(scheduler: &Scheduler, now: TimeOfWeek) -> String {
    match scheduler.next_rule(now.day, now.msec) {
        (Some(rule), remaining) => format!("{} in {}s", render_rule(rule), remaining.as_secs()),
        (None, remaining) => format!("no next rule, {}s until change", remaining.as_secs()),
    }
}

impl Light {
    /// Applies `command` at `now` and renders the reply
    #[instrument(skip(self))]
    pub fn execute(&mut self, command: Command, now: TimeOfWeek) -> Result<String> {
        debug!("Executing command");
        let reply = match command {
            Command::Add {
                days,
                start_time,
                stop_time,
                start_color,
                stop_color,
            } => {
                // Validate everything before touching the schedule
                let rules = days
                    .iter()
                    .map(|day| Rule::new(*day, start_time, stop_time, start_color, stop_color))
                    .collect::<Result<Vec<_>>>()?;

                let hashes = rules
                    .iter()
                    .map(|rule| format!("{:016x}", rule.content_hash()))
                    .collect::<Vec<_>>();
                for rule in rules {
                    self.scheduler_mut().add_rule(rule);
                }
                format!("added {}", hashes.join(" "))
            }
            Command::Remove(hash) => {
                let removed = self.scheduler_mut().remove_rule_by_hash(hash)?;
                format!("removed {}", removed)
            }
            Command::Rules => render_rules(self.scheduler()).trim_end().to_string(),
            Command::Current => render_current(self.scheduler(), now),
            Command::Next => render_next(self.scheduler(), now),
            Command::Color => self.color().to_string(),
            Command::Mode(mode, color) => {
                self.set_mode(mode);
                if let Some(color) = color {
                    self.set_color(color);
                }
                format!("mode {}", mode)
            }
            Command::Stop => {
                self.set_state(State::Stopped);
                "stopping".to_string()
            }
        };

        Ok(reply)
    }
}
