//! Trial window arithmetic.
//!
//! A trial runs for `duration_days` from its start, then a grace period of
//! `grace_period_days` passes before the first charge. Every calculation
//! takes `now` as an argument; nothing here reads the system clock.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::error::BillingError;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Trial lengths. Immutable once a [`TrialClock`] is built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Length of the free trial (default: 7).
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    /// Days between trial end and the first billing date (default: 1).
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            duration_days: default_duration_days(),
            grace_period_days: default_grace_period_days(),
        }
    }
}

fn default_duration_days() -> u32 {
    7
}

fn default_grace_period_days() -> u32 {
    1
}

impl TrialConfig {
    /// Check that the configuration describes a usable trial.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidTrialConfig` when `duration_days` is 0.
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.duration_days == 0 {
            return Err(BillingError::InvalidTrialConfig {
                message: "duration_days must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Start and end of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Where a trial stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialStatus {
    /// Trial still running.
    Active { days_remaining: u32 },
    /// Trial over, first charge not yet due.
    Grace { billing_date: DateTime<Utc> },
    /// Trial and grace period both over.
    Expired,
}

impl TrialStatus {
    /// Whether trial features should still be unlocked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Pure trial date calculations for a fixed [`TrialConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialClock {
    config: TrialConfig,
}

impl TrialClock {
    #[must_use]
    pub fn new(config: TrialConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// `start + duration_days`.
    #[must_use]
    pub fn trial_end_date(&self, start_date: DateTime<Utc>) -> DateTime<Utc> {
        add_days(start_date, self.config.duration_days)
    }

    /// `start + duration_days + grace_period_days`.
    #[must_use]
    pub fn next_billing_date(&self, start_date: DateTime<Utc>) -> DateTime<Utc> {
        add_days(
            self.trial_end_date(start_date),
            self.config.grace_period_days,
        )
    }

    /// Whole days left in the trial, rounding any partial day up.
    ///
    /// Never negative: a trial that ended, or an `end_date` before `now`,
    /// yields 0.
    #[must_use]
    pub fn days_remaining(&self, end_date: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        let millis = end_date.signed_duration_since(now).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        let days = (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// `days_remaining(end_date, now) > 0`.
    #[must_use]
    pub fn is_active(&self, end_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.days_remaining(end_date, now) > 0
    }

    /// The trial window starting at `start_date`.
    #[must_use]
    pub fn window(&self, start_date: DateTime<Utc>) -> TrialWindow {
        TrialWindow {
            start_date,
            end_date: self.trial_end_date(start_date),
        }
    }

    /// Classify `now` against a trial window.
    #[must_use]
    pub fn status(&self, window: &TrialWindow, now: DateTime<Utc>) -> TrialStatus {
        let days_remaining = self.days_remaining(window.end_date, now);
        if days_remaining > 0 {
            return TrialStatus::Active { days_remaining };
        }

        let billing_date = add_days(window.end_date, self.config.grace_period_days);
        if now < billing_date {
            TrialStatus::Grace { billing_date }
        } else {
            TrialStatus::Expired
        }
    }
}

fn add_days(date: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    date.checked_add_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
