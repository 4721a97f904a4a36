/*!
 # Weekly rule scheduler

 Owns, per day, a sequence of rules sorted by start time whose closed
 intervals never intersect (they may be adjacent). Inserting a rule always
 succeeds: whatever existing time it covers is trimmed or removed so the new
 rule's span is present unmodified.

 The scheduler never reads the clock. Every query takes the instant as a
 `(Day, millisecond-of-day)` pair, and no internal locking is done; callers
 sharing a scheduler between an edit path and a poll path must serialize
 access themselves (see [`crate::light::SharedLight`]).
*/

use std::time::Duration;

use tracing::{debug, instrument, trace};

use crate::day::{Day, MSEC_PER_DAY};
use crate::rule::{OverlapRegion, Rule};
use crate::{Color, Error, Result};

/// Returned by [`Scheduler::next_rule`] when nothing else happens today
pub const FULL_DAY: Duration = Duration::from_secs(MSEC_PER_DAY as u64 / 1000);

/// The per-day rule sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheduler {
    rules: [Vec<Rule>; 7],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules of one day, sorted and disjoint
    pub fn rules(&self, day: Day) -> &[Rule] {
        &self.rules[day.index()]
    }

    /// Every day with its rules, Monday first
    pub fn iter(&self) -> impl Iterator<Item = (Day, &[Rule])> {
        Day::ALL
            .into_iter()
            .map(move |day| (day, self.rules(day)))
    }

    /// Total number of rules across the week
    pub fn len(&self) -> usize {
        self.rules.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.iter().all(Vec::is_empty)
    }

    /// Inserts a rule, trimming or dropping whatever it overlaps
    ///
    /// Existing rules keep their colors when trimmed; only their bounds
    /// shrink. A trimmed fragment that would be empty or a single instant
    /// (`start >= stop`) is dropped.
    #[instrument(skip(self, rule), fields(rule = %rule))]
    pub fn add_rule(&mut self, rule: Rule) {
        let rules = &mut self.rules[rule.day().index()];

        let appends = rules
            .last()
            .map_or(true, |last| rule.start_time() > last.stop_time());
        if appends {
            debug!("Appending rule after the last one");
            rules.push(rule);
            return;
        }

        let prepends = rules
            .first()
            .is_some_and(|first| rule.stop_time() < first.start_time());
        if prepends {
            debug!("Prepending rule before the first one");
            rules.insert(0, rule);
            return;
        }

        debug!("Resolving overlaps against {} existing rules", rules.len());
        let mut resolved = Vec::with_capacity(rules.len() + 2);
        let mut rule_added = false;

        for existing in rules.drain(..) {
            if existing.within(&rule) {
                trace!("Dropping superseded rule {}", existing);
            } else if rule.within(&existing) {
                trace!("Splitting {} around the new rule", existing);
                resolved.extend(head_fragment(&existing, &rule));
                resolved.push(rule.clone());
                resolved.extend(tail_fragment(&existing, &rule));
                rule_added = true;
            } else if !rule_added && rule.stop_time() < existing.start_time() {
                resolved.push(rule.clone());
                resolved.push(existing);
                rule_added = true;
            } else if rule.overlaps(&existing, Some(OverlapRegion::Head)) {
                trace!("Trimming the start of {}", existing);
                if !rule_added {
                    resolved.push(rule.clone());
                    rule_added = true;
                }
                resolved.extend(tail_fragment(&existing, &rule));
            } else if rule.overlaps(&existing, Some(OverlapRegion::Tail)) {
                trace!("Trimming the end of {}", existing);
                resolved.extend(head_fragment(&existing, &rule));
                if !rule_added {
                    resolved.push(rule.clone());
                    rule_added = true;
                }
            } else {
                resolved.push(existing);
            }
        }

        if !rule_added {
            resolved.push(rule);
        }

        *rules = resolved;
    }

    /// Removes a rule equal to `rule` from its day
    #[instrument(skip(self, rule), fields(rule = %rule))]
    pub fn remove_rule(&mut self, rule: &Rule) -> Result<()> {
        let rules = &mut self.rules[rule.day().index()];
        let index = rules
            .iter()
            .position(|r| r == rule)
            .ok_or(Error::RuleNotFound)?;

        rules.remove(index);
        debug!("Removed rule");
        Ok(())
    }

    /// Removes the first rule, scanning Monday to Sunday, whose
    /// [`Rule::content_hash`] is `hash`
    #[instrument(skip(self))]
    pub fn remove_rule_by_hash(&mut self, hash: u64) -> Result<Rule> {
        for rules in self.rules.iter_mut() {
            if let Some(index) = rules.iter().position(|r| r.content_hash() == hash) {
                let removed = rules.remove(index);
                debug!("Removed rule {}", removed);
                return Ok(removed);
            }
        }

        Err(Error::RuleNotFound)
    }

    /// The rule active at `msec` and the fraction of it already elapsed
    ///
    /// Returns `(None, 0.0)` when no rule is active.
    pub fn current_rule(&self, day: Day, msec: u32) -> (Option<&Rule>, f32) {
        self.rules(day)
            .iter()
            .find(|r| r.contains(msec))
            .map(|r| {
                let elapsed = (msec - r.start_time()) as f64;
                let span = (r.stop_time() - r.start_time()) as f64;
                (Some(r), (elapsed / span) as f32)
            })
            .unwrap_or((None, 0.0))
    }

    /// The rule that takes over next and how long until the current state
    /// changes, rounded to the nearest second
    ///
    /// Inside a rule, "next" is only defined when another rule follows
    /// without a gap; otherwise the rule is `None` and the duration runs to
    /// the end of the current rule. With nothing left today the result is
    /// `(None, FULL_DAY)`. Rule bounds are inclusive, so an instant equal to
    /// a rule's stop time is still inside that rule.
    pub fn next_rule(&self, day: Day, msec: u32) -> (Option<&Rule>, Duration) {
        let rules = self.rules(day);

        for (index, current) in rules.iter().enumerate() {
            if msec < current.start_time() {
                return (Some(current), until(current.start_time() - msec));
            }

            let Some(next) = rules.get(index + 1) else {
                if current.contains(msec) {
                    return (None, until(current.stop_time() - msec));
                }
                return (None, FULL_DAY);
            };

            if msec >= next.start_time() {
                continue;
            }

            if current.contains(msec) {
                let remaining = until(current.stop_time() - msec);
                if current.stop_time() + 1 == next.start_time() {
                    return (Some(next), remaining);
                }
                return (None, remaining);
            }

            return (Some(next), until(next.start_time() - msec));
        }

        (None, FULL_DAY)
    }

    /// The color the active rule's gradient gives at `msec`, or
    /// [`Color::default`] with no active rule
    pub fn current_color(&self, day: Day, msec: u32) -> Color {
        match self.current_rule(day, msec) {
            (Some(rule), percentage) => {
                Color::gradient(&rule.start_color(), &rule.stop_color(), percentage)
            }
            (None, _) => Color::default(),
        }
    }
}

/// `existing` up to just before `rule` starts, if anything is left
fn head_fragment(existing: &Rule, rule: &Rule) -> Option<Rule> {
    let stop = rule.start_time().checked_sub(1)?;
    fragment(existing, existing.start_time(), stop)
}

/// `existing` from just after `rule` stops, if anything is left
fn tail_fragment(existing: &Rule, rule: &Rule) -> Option<Rule> {
    fragment(existing, rule.stop_time() + 1, existing.stop_time())
}

fn fragment(existing: &Rule, start: u32, stop: u32) -> Option<Rule> {
    match existing.with_bounds(start, stop) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            debug!("Dropping degenerate fragment of {}: {}", existing, e);
            None
        }
    }
}

fn until(msec: u32) -> Duration {
    Duration::from_secs((msec as u64 + 500) / 1000)
}
