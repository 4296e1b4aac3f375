//! AI usage accounting.
//!
//! The authoritative monthly usage breakdown lives on the backend and is
//! fetched through a [`RemoteUsageSource`]. [`UsageAccountant`] makes exactly
//! one request per query and never fails: if the source errors, the caller
//! sees an all-zero record instead of a blocked screen.
//!
//! That fallback is for display and soft gating only. Anything that needs
//! accurate numbers (invoicing, hard limits) should call
//! [`UsageAccountant::fetch_usage`] and handle the error itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use edudash::billing::{UsageAccountant, UsageCategory, Tier};
//!
//! let accountant = UsageAccountant::new(rpc_usage_source);
//!
//! let usage = accountant.get_combined_usage().await;
//! println!("lessons this month: {}", usage.get(UsageCategory::LessonGeneration));
//!
//! // Ask before incrementing
//! if !accountant.check_quota(Tier::Free, UsageCategory::LessonGeneration).await.is_allowed() {
//!     return Err(UpgradeRequired);
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{EduDashError, Result};
use super::error::BillingError;
use super::plans::{LimitCheckResult, Tier, TierPolicy};
use super::validation::{sanitize_for_error, validate_identifier};

/// A metered AI feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCategory {
    LessonGeneration,
    GradingAssistance,
    HomeworkHelp,
    Transcription,
}

impl UsageCategory {
    /// Every tracked category.
    pub const ALL: [UsageCategory; 4] = [
        UsageCategory::LessonGeneration,
        UsageCategory::GradingAssistance,
        UsageCategory::HomeworkHelp,
        UsageCategory::Transcription,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonGeneration => "lesson_generation",
            Self::GradingAssistance => "grading_assistance",
            Self::HomeworkHelp => "homework_help",
            Self::Transcription => "transcription",
        }
    }

    /// Exact match on the wire key, without normalization.
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageCategory {
    type Err = BillingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = validate_identifier("usage category", s)?;
        Self::from_key(&value).ok_or(BillingError::UnknownUsageCategory { value })
    }
}

/// Per-category usage counts for the current billing period.
///
/// Serializes as a flat JSON object keyed by category. Keys this crate does
/// not track are skipped when deserializing, so a backend that meters a new
/// feature does not invalidate the counts it already reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UsageRecord {
    counts: BTreeMap<UsageCategory, u64>,
}

impl UsageRecord {
    /// A record with every category present and set to zero.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            counts: UsageCategory::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }

    /// Build a record from explicit counts. Categories not listed are zero.
    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = (UsageCategory, u64)>) -> Self {
        let mut record = Self::zeroed();
        record.counts.extend(counts);
        record
    }

    /// Count for a category. Absent keys read as zero.
    #[must_use]
    pub fn get(&self, category: UsageCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Sum over all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Whether every known category has an entry.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        UsageCategory::ALL.iter().all(|c| self.counts.contains_key(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageCategory, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Check every category against the quotas of `tier`.
    #[must_use]
    pub fn quota_report(&self, tier: Tier) -> BTreeMap<UsageCategory, LimitCheckResult> {
        UsageCategory::ALL
            .into_iter()
            .map(|c| (c, TierPolicy::check_quota(tier, c, self.get(c))))
            .collect()
    }
}

impl<'de> Deserialize<'de> for UsageRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
        let mut counts = BTreeMap::new();
        for (key, count) in raw {
            match UsageCategory::from_key(&key) {
                Some(category) => {
                    counts.insert(category, count);
                }
                None => tracing::debug!(
                    target: "edudash::billing",
                    key = %sanitize_for_error(&key),
                    count,
                    "Skipping untracked usage category"
                ),
            }
        }
        Ok(Self { counts })
    }
}

/// Reply from the remote usage source.
///
/// Either `{"monthly": {...}}` or an explicit `{"error": "..."}`. A non-null
/// `error` wins even when `monthly` is also present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UsageReply {
    Monthly { monthly: UsageRecord },
    Failed { error: String },
}

#[derive(Deserialize)]
struct RawUsageReply {
    monthly: Option<UsageRecord>,
    error: Option<String>,
}

impl<'de> Deserialize<'de> for UsageReply {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawUsageReply::deserialize(deserializer)?;
        match (raw.error, raw.monthly) {
            (Some(error), _) => Ok(Self::Failed { error }),
            (None, Some(monthly)) => Ok(Self::Monthly { monthly }),
            (None, None) => Err(de::Error::custom(
                "usage reply has neither `monthly` nor `error`",
            )),
        }
    }
}

/// Authoritative usage backend (an RPC on the hosted database in production).
///
/// Caller identity is implicit in the implementation. Timeouts belong here
/// too; the accountant imposes none.
#[async_trait]
pub trait RemoteUsageSource: Send + Sync {
    /// Fetch the monthly usage breakdown for the current caller.
    async fn fetch_monthly_usage(&self) -> Result<UsageReply>;
}

/// Combines server usage with the local fallback.
pub struct UsageAccountant<S: RemoteUsageSource> {
    source: S,
}

impl<S: RemoteUsageSource> UsageAccountant<S> {
    /// Create a new usage accountant.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the authoritative record, surfacing failures.
    ///
    /// Makes a single request. Transport errors and explicit error replies
    /// both come back as [`BillingError::UsageSourceFailed`].
    pub async fn fetch_usage(&self) -> std::result::Result<UsageRecord, BillingError> {
        match self.source.fetch_monthly_usage().await {
            Ok(UsageReply::Monthly { monthly }) => {
                if !monthly.is_complete() {
                    tracing::debug!(
                        target: "edudash::billing",
                        "Usage source returned an incomplete record"
                    );
                }
                Ok(monthly)
            }
            Ok(UsageReply::Failed { error }) => Err(BillingError::UsageSourceFailed {
                message: error,
                retryable: false,
            }),
            Err(err) => Err(BillingError::UsageSourceFailed {
                retryable: is_transient(&err),
                message: err.to_string(),
            }),
        }
    }

    /// Current usage for display and soft gating.
    ///
    /// Returns the server record verbatim, or a zeroed record if the source
    /// failed. Never errors and never retries.
    pub async fn get_combined_usage(&self) -> UsageRecord {
        match self.fetch_usage().await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    target: "edudash::billing",
                    error = %err,
                    retryable = err.is_retryable(),
                    "Usage source unavailable, reporting zero usage"
                );
                self.local_usage()
            }
        }
    }

    /// Locally tracked usage.
    ///
    /// There is no durable local counter yet, so this is always zero.
    #[must_use]
    pub fn local_usage(&self) -> UsageRecord {
        UsageRecord::zeroed()
    }

    /// Check one category against the tier quota before incrementing it.
    pub async fn check_quota(&self, tier: Tier, category: UsageCategory) -> LimitCheckResult {
        let usage = self.get_combined_usage().await;
        let result = TierPolicy::check_quota(tier, category, usage.get(category));
        if result.is_at_limit() {
            tracing::debug!(
                target: "edudash::billing",
                tier = %tier,
                category = %category,
                "Usage quota reached"
            );
        }
        result
    }
}

fn is_transient(err: &EduDashError) -> bool {
    matches!(
        err,
        EduDashError::ServiceUnavailable(_) | EduDashError::Internal(_) | EduDashError::Anyhow(_)
    )
}

#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    #[derive(Debug, Clone)]
    enum MockBehavior {
        Reply(UsageReply),
        Fail(String),
    }

    /// Mock usage source for testing.
    #[derive(Clone)]
    pub struct MockUsageSource {
        behavior: Arc<RwLock<MockBehavior>>,
        calls: Arc<AtomicUsize>,
    }

    impl Default for MockUsageSource {
        fn default() -> Self {
            Self {
                behavior: Arc::new(RwLock::new(MockBehavior::Reply(UsageReply::Monthly {
                    monthly: UsageRecord::zeroed(),
                }))),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MockUsageSource {
        /// Create a mock that reports zero usage.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Reply with the given monthly record.
        pub fn set_monthly(&self, record: UsageRecord) {
            *self.behavior.write().unwrap() =
                MockBehavior::Reply(UsageReply::Monthly { monthly: record });
        }

        /// Reply with an explicit error condition.
        pub fn set_error_reply(&self, message: &str) {
            *self.behavior.write().unwrap() = MockBehavior::Reply(UsageReply::Failed {
                error: message.to_string(),
            });
        }

        /// Fail the request itself.
        pub fn set_failure(&self, message: &str) {
            *self.behavior.write().unwrap() = MockBehavior::Fail(message.to_string());
        }

        /// Number of requests received.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteUsageSource for MockUsageSource {
        async fn fetch_monthly_usage(&self) -> Result<UsageReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior.read().unwrap().clone() {
                MockBehavior::Reply(reply) => Ok(reply),
                MockBehavior::Fail(message) => Err(EduDashError::service_unavailable(message)),
            }
        }
    }
}
