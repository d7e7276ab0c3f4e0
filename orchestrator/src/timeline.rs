//! Deadline evaluation.
//!
//! Turns absolute deadlines into time-remaining entries relative to a given
//! instant. Evaluation is pure: the caller supplies `now`, so the same inputs
//! always produce the same timeline.

use crate::spec::timestamp;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Hours below which a deadline is critical.
pub const CRITICAL_HOURS: f64 = 48.0;

/// Days below which a deadline is urgent.
pub const URGENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Critical,
    Urgent,
    Scheduled,
}

impl Urgency {
    /// First match wins: under 48 hours is critical, under 7 days urgent.
    /// Overdue deadlines have negative hours and therefore stay critical.
    pub fn classify(remaining_hours: f64, days_remaining: i64) -> Self {
        if remaining_hours < CRITICAL_HOURS {
            Urgency::Critical
        } else if days_remaining < URGENT_DAYS {
            Urgency::Urgent
        } else {
            Urgency::Scheduled
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Critical => "CRITICAL",
            Urgency::Urgent => "URGENT",
            Urgency::Scheduled => "SCHEDULED",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time remaining until one deadline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    #[serde(with = "timestamp")]
    pub deadline: NaiveDateTime,
    /// Whole days, floored (one hour overdue is -1).
    pub days_remaining: i64,
    /// Hours rounded to one decimal place, ties to even.
    pub hours_remaining: f64,
    pub status: Urgency,
    #[serde(skip)]
    remaining_millis: i64,
}

impl TimelineEntry {
    pub fn compute(deadline: NaiveDateTime, now: NaiveDateTime) -> Self {
        let remaining_millis = (deadline - now).num_milliseconds();
        let days_remaining = remaining_millis.div_euclid(MILLIS_PER_DAY);
        let exact_hours = remaining_millis as f64 / MILLIS_PER_HOUR as f64;
        let status = Urgency::classify(exact_hours, days_remaining);

        Self {
            deadline,
            days_remaining,
            hours_remaining: round_tenths(exact_hours),
            status,
            remaining_millis,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.remaining_millis < 0
    }
}

fn round_tenths(value: f64) -> f64 {
    // Halfway values go to the even tenth: 2.25 h reports as 2.2.
    let rounded = (value * 10.0).round_ties_even() / 10.0;
    // Avoid reporting "-0.0" for deadlines a few minutes away.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Evaluates every deadline against `now`, preserving input order.
pub fn evaluate(
    deadlines: &IndexMap<String, NaiveDateTime>,
    now: NaiveDateTime,
) -> IndexMap<String, TimelineEntry> {
    deadlines
        .iter()
        .map(|(name, deadline)| {
            let entry = TimelineEntry::compute(*deadline, now);
            if entry.is_overdue() {
                tracing::warn!(
                    deadline = %name,
                    hours_overdue = -entry.hours_remaining,
                    "deadline has passed"
                );
            }
            (name.clone(), entry)
        })
        .collect()
}
