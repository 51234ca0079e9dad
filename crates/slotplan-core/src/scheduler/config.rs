//! Engine configuration.
//!
//! Covers everything a run can be tuned with: how priority levels map to
//! ranking weight, how much a soft slot may overflow, and how competing
//! overflow candidates are ordered.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::{Slot, MAX_DURATION_MINUTES};

/// Weight assigned to one priority level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeight {
    pub level: u32,
    pub weight: f64,
}

/// How a soft slot's tolerance is derived when the slot does not set one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToleranceRule {
    /// A fraction of the slot's nominal duration, rounded down to seconds.
    /// Must lie within `0.0..=1.0`.
    Fraction { fraction: f64 },
    /// A fixed number of minutes regardless of slot length.
    Fixed { minutes: i64 },
}

impl Default for ToleranceRule {
    fn default() -> Self {
        Self::Fraction { fraction: 0.1 }
    }
}

impl ToleranceRule {
    pub fn tolerance_for(&self, nominal: Duration) -> Duration {
        let tolerance = match *self {
            Self::Fraction { fraction } => {
                Duration::try_seconds((nominal.num_seconds() as f64 * fraction).floor() as i64)
            }
            Self::Fixed { minutes } => Duration::try_minutes(minutes),
        };
        tolerance.unwrap_or(Duration::MAX)
    }
}

/// Ordering between overflow candidates in different slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowTieBreak {
    /// Smallest overflow wins; slot declaration order breaks ties.
    #[default]
    LeastOverflow,
    /// Earliest declared slot wins; overflow size breaks ties.
    DeclarationOrder,
}

/// Which edge of a slot is preferred when both need the same overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowSide {
    /// Start inside the slot and run past its end.
    #[default]
    Trailing,
    /// Start before the slot and finish inside it.
    Leading,
}

fn default_tolerance_rule() -> ToleranceRule {
    ToleranceRule::default()
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub overflow_tie_break: OverflowTieBreak,
    #[serde(default)]
    pub overflow_side: OverflowSide,
    /// Tolerance for soft slots that do not carry their own.
    #[serde(default = "default_tolerance_rule")]
    pub default_soft_tolerance: ToleranceRule,
    /// Priority level to weight. Empty means weight = priority.
    #[serde(default)]
    pub priority_weights: Vec<PriorityWeight>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            overflow_tie_break: OverflowTieBreak::default(),
            overflow_side: OverflowSide::default(),
            default_soft_tolerance: default_tolerance_rule(),
            priority_weights: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_priority_weights(mut self, weights: impl IntoIterator<Item = (u32, f64)>) -> Self {
        self.priority_weights = weights
            .into_iter()
            .map(|(level, weight)| PriorityWeight { level, weight })
            .collect();
        self
    }

    pub fn with_default_soft_tolerance(mut self, rule: ToleranceRule) -> Self {
        self.default_soft_tolerance = rule;
        self
    }

    pub fn with_overflow_tie_break(mut self, tie_break: OverflowTieBreak) -> Self {
        self.overflow_tie_break = tie_break;
        self
    }

    pub fn with_overflow_side(mut self, side: OverflowSide) -> Self {
        self.overflow_side = side;
        self
    }

    /// Check the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for non-finite or negative weights, weights
    /// that do not strictly increase with priority level, duplicate levels,
    /// and tolerances outside their allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut sorted = self.priority_weights.clone();
        sorted.sort_by_key(|w| w.level);

        for w in &sorted {
            if !w.weight.is_finite() || w.weight < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "priority_weights".into(),
                    message: format!("weight for level {} must be a non-negative number", w.level),
                });
            }
        }
        for pair in sorted.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(ConfigError::InvalidValue {
                    key: "priority_weights".into(),
                    message: format!("level {} is listed twice", pair[0].level),
                });
            }
            if pair[1].weight <= pair[0].weight {
                return Err(ConfigError::InvalidValue {
                    key: "priority_weights".into(),
                    message: format!(
                        "weights must increase with level (level {} = {}, level {} = {})",
                        pair[0].level, pair[0].weight, pair[1].level, pair[1].weight
                    ),
                });
            }
        }

        match self.default_soft_tolerance {
            ToleranceRule::Fraction { fraction } if !(0.0..=1.0).contains(&fraction) => {
                Err(ConfigError::InvalidValue {
                    key: "default_soft_tolerance.fraction".into(),
                    message: format!("must be between 0 and 1, got {fraction}"),
                })
            }
            ToleranceRule::Fixed { minutes } if !(0..=MAX_DURATION_MINUTES).contains(&minutes) => {
                Err(ConfigError::InvalidValue {
                    key: "default_soft_tolerance.minutes".into(),
                    message: format!("must be between 0 and {MAX_DURATION_MINUTES}, got {minutes}"),
                })
            }
            _ => Ok(()),
        }
    }

    /// Ranking weight of a priority level.
    ///
    /// Without configured weights this is the identity. Levels between
    /// configured ones are interpolated linearly; levels below the lowest
    /// scale proportionally toward zero, and levels above the highest
    /// continue the last segment's slope. A validated configuration
    /// therefore always yields a strictly increasing function.
    pub fn weight_for(&self, priority: u32) -> f64 {
        if self.priority_weights.is_empty() {
            return f64::from(priority);
        }

        let mut points: Vec<(f64, f64)> = self
            .priority_weights
            .iter()
            .map(|w| (f64::from(w.level), w.weight))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let p = f64::from(priority);
        let (first_level, first_weight) = points[0];
        if p <= first_level {
            if first_level == 0.0 {
                return first_weight;
            }
            return first_weight * p / first_level;
        }

        for pair in points.windows(2) {
            let (l0, w0) = pair[0];
            let (l1, w1) = pair[1];
            if p <= l1 {
                return w0 + (w1 - w0) * (p - l0) / (l1 - l0);
            }
        }

        let (last_level, last_weight) = points[points.len() - 1];
        let slope = if points.len() >= 2 {
            let (prev_level, prev_weight) = points[points.len() - 2];
            (last_weight - prev_weight) / (last_level - prev_level)
        } else if last_level > 0.0 {
            last_weight / last_level
        } else {
            1.0
        };
        last_weight + slope * (p - last_level)
    }

    /// Overflow budget of a slot: zero for hard slots, the slot's own
    /// tolerance if set, otherwise the default rule applied to its length.
    pub fn tolerance_for(&self, slot: &Slot) -> Duration {
        if !slot.is_soft() {
            return Duration::zero();
        }
        match slot.tolerance_minutes {
            Some(minutes) => Duration::minutes(minutes.clamp(0, MAX_DURATION_MINUTES)),
            None => self
                .default_soft_tolerance
                .tolerance_for(slot.interval.duration()),
        }
    }
}
