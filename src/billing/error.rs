//! Billing-specific error types.
//!
//! Granular errors for entitlement parsing, trial configuration and usage
//! lookups. They convert into `EduDashError` at the crate boundary.

use std::fmt;

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    // Boundary parsing errors
    /// The tier name is not one of the offered tiers.
    UnknownTier { value: String },
    /// The tier exists for billing but is not part of capability gating.
    TierNotGated { tier: String },
    /// The attachment kind name is not recognized.
    UnknownAttachmentKind { value: String },
    /// The capability id is not recognized.
    UnknownCapability { value: String },
    /// The usage category key is not recognized.
    UnknownUsageCategory { value: String },
    /// An identifier failed format validation.
    InvalidIdentifier { field: String, reason: String },

    // Trial errors
    /// The trial configuration is unusable.
    InvalidTrialConfig { message: String },

    // Usage source errors
    /// The remote usage source failed or reported an error.
    UsageSourceFailed { message: String, retryable: bool },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTier { value } => write!(f, "Unknown tier: {}", value),
            Self::TierNotGated { tier } => {
                write!(f, "Tier '{}' is billed separately and has no capability policy", tier)
            }
            Self::UnknownAttachmentKind { value } => {
                write!(f, "Unknown attachment kind: {}", value)
            }
            Self::UnknownCapability { value } => write!(f, "Unknown capability: {}", value),
            Self::UnknownUsageCategory { value } => {
                write!(f, "Unknown usage category: {}", value)
            }
            Self::InvalidIdentifier { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::InvalidTrialConfig { message } => {
                write!(f, "Invalid trial configuration: {}", message)
            }
            Self::UsageSourceFailed { message, .. } => {
                write!(f, "Usage source failed: {}", message)
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl From<BillingError> for crate::error::EduDashError {
    fn from(err: BillingError) -> Self {
        match &err {
            BillingError::UnknownTier { .. }
            | BillingError::TierNotGated { .. }
            | BillingError::UnknownAttachmentKind { .. }
            | BillingError::UnknownCapability { .. }
            | BillingError::UnknownUsageCategory { .. }
            | BillingError::InvalidIdentifier { .. }
            | BillingError::InvalidTrialConfig { .. } => {
                crate::error::EduDashError::BadRequest(err.to_string())
            }

            BillingError::UsageSourceFailed { .. } => {
                crate::error::EduDashError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl BillingError {
    /// Check if this is a client error (bad input at the boundary).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTier { .. }
                | Self::TierNotGated { .. }
                | Self::UnknownAttachmentKind { .. }
                | Self::UnknownCapability { .. }
                | Self::UnknownUsageCategory { .. }
                | Self::InvalidIdentifier { .. }
                | Self::InvalidTrialConfig { .. }
        )
    }

    /// Check if this is a server-side error.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::UsageSourceFailed { .. })
    }

    /// Check if a caller-side retry could succeed.
    ///
    /// Nothing in this crate retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UsageSourceFailed { retryable: true, .. })
    }
}
