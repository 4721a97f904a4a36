/*!
 # Seed rule files

 Rules can be seeded at startup from a JSON object mapping day names to rule
 lists:

 ```json
 {
   "Monday": [
     {
       "start_time": 0,
       "stop_time": 3600000,
       "start_color": {"r": 255, "g": 0, "b": 0, "brightness": 1.0},
       "stop_color": {"r": 0, "g": 0, "b": 255, "brightness": 0.5}
     }
   ]
 }
 ```

 Missing fields fall back to an all-day rule between two "off" colors. A
 record that fails validation, a day name that isn't one and a day whose
 value isn't a list are logged and skipped; only a file that can't be read
 or isn't a JSON object fails the load.
*/

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::day::MSEC_PER_DAY;
use crate::{Color, Day, Result, Rule, Scheduler};

/// A rule as stored in a seed file; the day comes from the enclosing key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RuleRecord {
    start_time: u32,
    stop_time: u32,
    start_color: Color,
    stop_color: Color,
}

impl Default for RuleRecord {
    fn default() -> Self {
        Self {
            start_time: 0,
            stop_time: MSEC_PER_DAY,
            start_color: Color::default(),
            stop_color: Color::default(),
        }
    }
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        Self {
            start_time: rule.start_time(),
            stop_time: rule.stop_time(),
            start_color: rule.start_color(),
            stop_color: rule.stop_color(),
        }
    }
}

/// Loads a seed file into a fresh schedule
#[instrument]
pub fn load_rules(path: &Path) -> Result<Scheduler> {
    info!("Loading rules from {}", path.display());
    let contents = fs::read_to_string(path)?;
    load_rules_from_str(&contents)
}

/// Loads a seed file for startup, falling back to an empty schedule
///
/// A file that can't be read or parsed is logged rather than returned, so a
/// broken seed never keeps the light from starting.
pub fn load_rules_or_empty(path: &Path) -> Scheduler {
    load_rules(path).unwrap_or_else(|e| {
        error!("Failed to load rules from {}: {}", path.display(), e);
        Scheduler::new()
    })
}

/// Parses seed JSON into a fresh schedule
///
/// Records go through [`Scheduler::add_rule`], so overlapping seed data is
/// resolved the same way as live edits: later records win.
pub fn load_rules_from_str(json: &str) -> Result<Scheduler> {
    let data: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    let mut scheduler = Scheduler::new();

    for (day_name, records) in data {
        let day = match day_name.parse::<Day>() {
            Ok(day) => day,
            Err(e) => {
                warn!("Skipping rules: {}", e);
                continue;
            }
        };
        let records = match records {
            serde_json::Value::Array(records) => records,
            other => {
                warn!(%day, "Skipping rules: expected a list, found {}", other);
                continue;
            }
        };

        for (index, value) in records.into_iter().enumerate() {
            let rule = serde_json::from_value::<RuleRecord>(value)
                .map_err(crate::Error::from)
                .and_then(|record| {
                    Rule::new(
                        day,
                        record.start_time,
                        record.stop_time,
                        record.start_color,
                        record.stop_color,
                    )
                });

            match rule {
                Ok(rule) => scheduler.add_rule(rule),
                Err(e) => warn!(%day, index, "Skipping invalid rule: {}", e),
            }
        }
    }

    info!("Loaded {} rules", scheduler.len());
    Ok(scheduler)
}

/// Renders a schedule in the seed file format; empty days are left out
pub fn rules_to_json(scheduler: &Scheduler) -> Result<String> {
    let data: BTreeMap<Day, Vec<RuleRecord>> = scheduler
        .iter()
        .filter(|(_, rules)| !rules.is_empty())
        .map(|(day, rules)| (day, rules.iter().map(RuleRecord::from).collect()))
        .collect();

    Ok(serde_json::to_string_pretty(&data)?)
}

/// Writes a schedule to `path` in the seed file format
#[instrument(skip(scheduler))]
pub fn save_rules(path: &Path, scheduler: &Scheduler) -> Result<()> {
    fs::write(path, rules_to_json(scheduler)?)?;
    info!("Saved {} rules to {}", scheduler.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_load_rules() {
        let scheduler = load_rules_from_str(
            r#"{
                "Monday": [
                    {"start_time": 0, "stop_time": 2000,
                     "start_color": {"r": 255, "brightness": 1.0},
                     "stop_color": {"b": 255, "brightness": 0.5}}
                ],
                "Friday": [{}]
            }"#,
        )
        .unwrap();

        let red = Color::new(255, 0, 0, 1.0).unwrap();
        let blue = Color::new(0, 0, 255, 0.5).unwrap();
        assert_eq!(
            scheduler.rules(Day::Monday),
            &[Rule::new(Day::Monday, 0, 2000, red, blue).unwrap()]
        );
        assert_eq!(
            scheduler.rules(Day::Friday),
            &[Rule::all_day(Day::Friday, Color::default(), Color::default())]
        );
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_load_rules_skips_invalid_records() {
        let scheduler = load_rules_from_str(
            r#"{
                "Tuesday": [
                    {"start_time": 30, "stop_time": 8},
                    {"start_time": 1, "stop_time": 8, "start_color": {"r": 256}},
                    {"start_time": -1, "stop_time": 8},
                    {"start_time": 1, "stop_time": 8, "colour": {}},
                    {"start_time": 10, "stop_time": 20}
                ],
                "Caturday": [{"start_time": 0, "stop_time": 10}]
            }"#,
        )
        .unwrap();

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.rules(Day::Tuesday)[0].start_time(), 10);
    }

    #[test]
    fn test_load_rules_resolves_overlaps() {
        let scheduler = load_rules_from_str(
            r#"{"Sunday": [
                {"start_time": 5, "stop_time": 19},
                {"start_time": 8, "stop_time": 11}
            ]}"#,
        )
        .unwrap();

        let bounds: Vec<_> = scheduler
            .rules(Day::Sunday)
            .iter()
            .map(|r| (r.start_time(), r.stop_time()))
            .collect();
        assert_eq!(bounds, vec![(5, 7), (8, 11), (12, 19)]);
    }

    #[test]
    fn test_load_rules_malformed_file() {
        assert!(matches!(load_rules_from_str("not json"), Err(Error::Json(_))));
        assert!(matches!(load_rules_from_str("[]"), Err(Error::Json(_))));
        assert!(load_rules_from_str(r#"{"Monday": {}}"#).unwrap().is_empty());
        assert!(load_rules_from_str(r#"{"Monday": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_load_rules_skips_malformed_day() {
        let scheduler = load_rules_from_str(
            r#"{
                "Monday": {"start_time": 0, "stop_time": 10},
                "Tuesday": [{"start_time": 10, "stop_time": 20}],
                "Wednesday": null
            }"#,
        )
        .unwrap();

        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.rules(Day::Monday).is_empty());
        assert_eq!(
            scheduler.rules(Day::Tuesday),
            &[Rule::new(Day::Tuesday, 10, 20, Color::default(), Color::default()).unwrap()]
        );
    }

    #[test]
    fn test_rules_to_json_reloads() {
        let color = Color::new(1, 2, 3, 0.25).unwrap();
        let mut scheduler = Scheduler::new();
        scheduler.add_rule(Rule::new(Day::Wednesday, 100, 200, color, Color::default()).unwrap());
        scheduler.add_rule(Rule::all_day(Day::Saturday, Color::default(), color));

        let json = rules_to_json(&scheduler).unwrap();

        assert!(json.contains("\"Wednesday\""));
        assert!(!json.contains("\"Monday\""));
        assert_eq!(load_rules_from_str(&json).unwrap(), scheduler);
    }
}
