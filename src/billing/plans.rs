//! Subscription tiers and the capability policy table.
//!
//! Tiers are totally ordered by feature inclusion: everything `free` unlocks,
//! `starter` unlocks too, and everything `starter` unlocks, `premium` unlocks.
//! The table is an exhaustive `match`, so adding a tier or capability fails
//! to compile until the policy covers it.
//!
//! ```rust
//! use edudash::billing::{Capability, Tier, TierPolicy};
//!
//! let tier: Tier = "starter".parse()?;
//! assert!(TierPolicy::grants(tier, Capability::MultimodalVision));
//! assert!(!TierPolicy::grants(tier, Capability::SearchHistory));
//! # Ok::<(), edudash::billing::BillingError>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::usage::UsageCategory;
use super::validation::validate_identifier;

/// Subscription tier used for capability gating.
///
/// `enterprise` is billed through a separate contract and is rejected when
/// parsed (see [`BillingError::TierNotGated`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Starter,
    Premium,
}

impl Tier {
    /// All gated tiers, lowest first.
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Starter, Tier::Premium];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Premium => "premium",
        }
    }

    /// Display name shown on paywalls.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Starter => "Starter",
            Self::Premium => "Premium",
        }
    }

    /// The next tier up, if any.
    #[must_use]
    pub fn upgrade(&self) -> Option<Tier> {
        match self {
            Self::Free => Some(Self::Starter),
            Self::Starter => Some(Self::Premium),
            Self::Premium => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = validate_identifier("tier", s)?;
        match value.as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "premium" => Ok(Self::Premium),
            "enterprise" => Err(BillingError::TierNotGated { tier: value }),
            _ => Err(BillingError::UnknownTier { value }),
        }
    }
}

/// A gated feature unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "multimodal.vision")]
    MultimodalVision,
    #[serde(rename = "multimodal.documents")]
    MultimodalDocuments,
    #[serde(rename = "multimodal.audio")]
    MultimodalAudio,
    #[serde(rename = "search.history")]
    SearchHistory,
    /// Required by attachments nothing can handle. No tier grants it.
    #[serde(rename = "unsupported")]
    Unsupported,
}

impl Capability {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultimodalVision => "multimodal.vision",
            Self::MultimodalDocuments => "multimodal.documents",
            Self::MultimodalAudio => "multimodal.audio",
            Self::SearchHistory => "search.history",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = validate_identifier("capability", s)?;
        match value.as_str() {
            "multimodal.vision" => Ok(Self::MultimodalVision),
            "multimodal.documents" => Ok(Self::MultimodalDocuments),
            "multimodal.audio" => Ok(Self::MultimodalAudio),
            "search.history" => Ok(Self::SearchHistory),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(BillingError::UnknownCapability { value }),
        }
    }
}

const FREE_CAPABILITIES: &[Capability] = &[];

const STARTER_CAPABILITIES: &[Capability] =
    &[Capability::MultimodalVision, Capability::MultimodalDocuments];

const PREMIUM_CAPABILITIES: &[Capability] = &[
    Capability::MultimodalVision,
    Capability::MultimodalDocuments,
    Capability::MultimodalAudio,
    Capability::SearchHistory,
];

/// Static tier to capability policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierPolicy;

impl TierPolicy {
    /// Capabilities unlocked by `tier`.
    #[must_use]
    pub fn capabilities_for(tier: Tier) -> BTreeSet<Capability> {
        Self::granted(tier).iter().copied().collect()
    }

    /// Check whether `tier` unlocks `capability`.
    #[must_use]
    pub fn grants(tier: Tier, capability: Capability) -> bool {
        Self::granted(tier).contains(&capability)
    }

    /// The lowest tier that unlocks `capability`, if any does.
    #[must_use]
    pub fn minimum_tier_for(capability: Capability) -> Option<Tier> {
        Tier::ALL.into_iter().find(|t| Self::grants(*t, capability))
    }

    /// Monthly quota for a usage category. `None` means unlimited.
    #[must_use]
    pub fn monthly_quota(tier: Tier, category: UsageCategory) -> Option<u64> {
        match (tier, category) {
            (Tier::Free, UsageCategory::LessonGeneration) => Some(5),
            (Tier::Free, UsageCategory::GradingAssistance) => Some(5),
            (Tier::Free, UsageCategory::HomeworkHelp) => Some(10),
            (Tier::Free, UsageCategory::Transcription) => Some(0),

            (Tier::Starter, UsageCategory::LessonGeneration) => Some(50),
            (Tier::Starter, UsageCategory::GradingAssistance) => Some(100),
            (Tier::Starter, UsageCategory::HomeworkHelp) => Some(100),
            (Tier::Starter, UsageCategory::Transcription) => Some(30),

            (Tier::Premium, UsageCategory::Transcription) => Some(300),
            (Tier::Premium, _) => None,
        }
    }

    /// Check current usage of a category against the tier quota.
    #[must_use]
    pub fn check_quota(tier: Tier, category: UsageCategory, current: u64) -> LimitCheckResult {
        match Self::monthly_quota(tier, category) {
            None => LimitCheckResult::Unlimited,
            Some(max) if current < max => LimitCheckResult::WithinLimit { current, max },
            Some(max) => LimitCheckResult::AtLimit { current, max },
        }
    }

    fn granted(tier: Tier) -> &'static [Capability] {
        match tier {
            Tier::Free => FREE_CAPABILITIES,
            Tier::Starter => STARTER_CAPABILITIES,
            Tier::Premium => PREMIUM_CAPABILITIES,
        }
    }
}

/// Result of checking a usage quota.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LimitCheckResult {
    /// No limit on this category.
    Unlimited,
    /// Usage is within the limit.
    WithinLimit { current: u64, max: u64 },
    /// Usage has reached or exceeded the limit.
    AtLimit { current: u64, max: u64 },
}

impl LimitCheckResult {
    /// Check if one more unit of usage is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::WithinLimit { .. })
    }

    /// Check if at or over limit.
    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        matches!(self, Self::AtLimit { .. })
    }

    /// Remaining units, `None` when unlimited.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::WithinLimit { current, max } | Self::AtLimit { current, max } => {
                Some(max.saturating_sub(*current))
            }
        }
    }
}
