//! Learning Step Lists
//!
//! Short-interval steps used while an item is in the Learning or Relearning
//! phase. Steps are written as a space- or comma-separated list:
//!
//! - `"1 10"` - bare numbers are minutes
//! - `"10m 1d"` - `s`, `m`, `h` and `d` units
//! - `"1.5h"` - fractional values are rounded to whole minutes
//!
//! A [`StepList`] deserializes from that string form and serializes back to it,
//! so malformed steps are rejected at the settings boundary rather than inside
//! the scheduler.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::card::Rating;
use crate::settings::ConfigError;

/// Minutes in one day; steps at or beyond this are "interday" steps
pub const MINUTES_PER_DAY: u32 = 1440;

/// Fallback when the learning step list is empty
pub const DEFAULT_LEARNING_STEP_MINUTES: u32 = 1;

/// Fallback when the relearning step list is empty
pub const DEFAULT_RELEARNING_STEP_MINUTES: u32 = 10;

/// `now` plus whole minutes, saturating at the latest representable instant
pub(crate) fn after_minutes(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    Duration::try_minutes(minutes)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now` plus whole days, saturating at the latest representable instant
pub(crate) fn after_days(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Parsed list of step delays, in whole minutes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepList(Vec<u32>);

impl StepList {
    /// Parse a step string such as `"1m 10m 1d"`
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut minutes = Vec::new();
        for token in input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            minutes.push(parse_token(token)?);
        }
        Ok(Self(minutes))
    }

    /// Build directly from minute offsets
    pub fn from_minutes(minutes: impl Into<Vec<u32>>) -> Self {
        Self(minutes.into())
    }

    pub fn minutes(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Step delays with an explicit single-step fallback for empty lists
    pub fn or_default(&self, fallback_minutes: u32) -> Vec<u32> {
        if self.0.is_empty() {
            vec![fallback_minutes]
        } else {
            self.0.clone()
        }
    }
}

fn parse_token(token: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidStep {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let lower = token.to_ascii_lowercase();
    let (number, scale) = match lower.chars().last() {
        Some('s') => (&lower[..lower.len() - 1], 1.0 / 60.0),
        Some('m') => (&lower[..lower.len() - 1], 1.0),
        Some('h') => (&lower[..lower.len() - 1], 60.0),
        Some('d') => (&lower[..lower.len() - 1], MINUTES_PER_DAY as f64),
        _ => (lower.as_str(), 1.0),
    };

    let value: f64 = number.parse().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("step must be positive"));
    }

    let minutes = value * scale;
    if minutes > u32::MAX as f64 {
        return Err(invalid("step too large"));
    }

    // Sub-minute steps round up so a step never collapses to zero
    let rounded = if minutes < 1.0 { 1.0 } else { minutes.round() };
    Ok(rounded as u32)
}

impl FromStr for StepList {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StepList {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StepList> for String {
    fn from(steps: StepList) -> Self {
        steps.to_string()
    }
}

impl fmt::Display for StepList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|m| format_minutes(*m)).collect();
        write!(f, "{}", parts.join(" "))
    }
}

fn format_minutes(minutes: u32) -> String {
    if minutes >= MINUTES_PER_DAY && minutes % MINUTES_PER_DAY == 0 {
        format!("{}d", minutes / MINUTES_PER_DAY)
    } else if minutes >= 60 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}

// ============================================================================
// STEP TRANSITIONS
// ============================================================================

/// Result of rating an item that sits on a learning step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Remain in the learning phase at `index`, due after `delay_minutes`
    Stay { index: u32, delay_minutes: u32 },
    /// Leave the step list and enter Review
    Graduate,
}

/// Apply a rating to a position in a (non-empty) step list.
///
/// - Again: back to the first step
/// - Hard: repeat the current step
/// - Good: next step, graduating past the end
/// - Easy: graduate immediately
pub fn step_outcome(steps: &[u32], index: u32, rating: Rating) -> StepOutcome {
    if steps.is_empty() {
        return StepOutcome::Graduate;
    }
    let last = (steps.len() - 1) as u32;
    let current = index.min(last);

    match rating {
        Rating::Again => StepOutcome::Stay {
            index: 0,
            delay_minutes: steps[0],
        },
        Rating::Hard => StepOutcome::Stay {
            index: current,
            delay_minutes: steps[current as usize],
        },
        Rating::Good => {
            let next = current + 1;
            if next > last {
                StepOutcome::Graduate
            } else {
                StepOutcome::Stay {
                    index: next,
                    delay_minutes: steps[next as usize],
                }
            }
        }
        Rating::Easy => StepOutcome::Graduate,
    }
}

// ============================================================================
// TESTS
// ============================================================================
