//! Tier entitlements, trial arithmetic and AI usage accounting.
//!
//! # Components
//!
//! - [`TierPolicy`] - static capability and quota table per [`Tier`]
//! - [`AttachmentGate`] - allow/deny attachments with the missing capabilities
//! - [`TrialClock`] - trial end, billing date and days remaining
//! - [`UsageAccountant`] - monthly AI usage with zero-fallback on failure
//!
//! # Example
//!
//! ```rust,ignore
//! use edudash::billing::{
//!     AttachmentGate, AttachmentKind, Tier, TrialClock, UsageAccountant, UsageCategory,
//! };
//!
//! let tier: Tier = subscription.tier.parse()?;
//!
//! let gate = AttachmentGate::can_attach(tier, &[AttachmentKind::Image]);
//! if !gate.is_allowed() {
//!     return Err(UpgradeRequired(gate.upgrade_to()));
//! }
//!
//! let clock = TrialClock::new(config.trial);
//! let days_left = clock.days_remaining(subscription.trial_end, Utc::now());
//!
//! let usage = UsageAccountant::new(rpc).get_combined_usage().await;
//! ```

pub mod entitlements;
pub mod error;
pub mod plans;
pub mod trial;
pub mod usage;
pub mod validation;

// Plan exports
pub use plans::{Capability, LimitCheckResult, Tier, TierPolicy};

// Entitlements exports
pub use entitlements::{
    AttachmentGate, AttachmentKind, Entitlements, FeatureCheckResult, GateResult,
    require_capability,
};

// Trial exports
pub use trial::{TrialClock, TrialConfig, TrialStatus, TrialWindow};

// Usage exports
pub use usage::{RemoteUsageSource, UsageAccountant, UsageCategory, UsageRecord, UsageReply};

// Error exports
pub use error::BillingError;

// Validation exports
pub use validation::validate_identifier;

// Test exports
#[cfg(any(test, feature = "test-billing"))]
pub use usage::test::MockUsageSource;
