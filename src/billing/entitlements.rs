//! Entitlements and attachment gating.
//!
//! Answers "may this tier attach these files?" and "does this tier have this
//! capability?" before the chat or upload handler does any work. Decisions
//! are pure functions of the tier and the static [`TierPolicy`] table.
//!
//! # Example
//!
//! ```rust
//! use edudash::billing::{AttachmentGate, AttachmentKind, Capability, Tier};
//!
//! let result = AttachmentGate::can_attach(Tier::Free, &[AttachmentKind::Image]);
//! assert!(!result.is_allowed());
//! assert_eq!(result.missing_capabilities(), &[Capability::MultimodalVision]);
//!
//! let result = AttachmentGate::can_attach(Tier::Starter, &[AttachmentKind::Image, AttachmentKind::Pdf]);
//! assert!(result.is_allowed());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::plans::{Capability, Tier, TierPolicy};
use super::usage::UsageCategory;
use super::validation::validate_identifier;

/// What a caller wants to attach to a chat message or upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Pdf,
    /// Word processor documents (doc, docx, odt, rtf).
    Document,
    Spreadsheet,
    Text,
    Audio,
    /// A file nothing can process. Never allowed.
    Unsupported,
}

impl AttachmentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Spreadsheet => "spreadsheet",
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Unsupported => "unsupported",
        }
    }

    /// Capability needed to attach this kind.
    #[must_use]
    pub fn required_capability(&self) -> Capability {
        match self {
            Self::Image => Capability::MultimodalVision,
            Self::Pdf | Self::Document | Self::Spreadsheet | Self::Text => {
                Capability::MultimodalDocuments
            }
            Self::Audio => Capability::MultimodalAudio,
            Self::Unsupported => Capability::Unsupported,
        }
    }

    /// Classify an upload by MIME type. Unknown types are `Unsupported`.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => Self::Pdf,
            "application/msword"
            | "application/rtf"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/vnd.oasis.opendocument.text" => Self::Document,
            "text/csv"
            | "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.oasis.opendocument.spreadsheet" => Self::Spreadsheet,
            "text/plain" | "text/markdown" => Self::Text,
            m if m.starts_with("image/") && m.len() > "image/".len() => Self::Image,
            m if m.starts_with("audio/") && m.len() > "audio/".len() => Self::Audio,
            _ => Self::Unsupported,
        }
    }

    /// Classify an upload by file extension (with or without the dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" => Self::Image,
            "pdf" => Self::Pdf,
            "doc" | "docx" | "odt" | "rtf" => Self::Document,
            "csv" | "xls" | "xlsx" | "ods" => Self::Spreadsheet,
            "txt" | "md" => Self::Text,
            "mp3" | "m4a" | "wav" | "aac" | "ogg" => Self::Audio,
            _ => Self::Unsupported,
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = validate_identifier("attachment kind", s)?;
        match value.as_str() {
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "document" => Ok(Self::Document),
            "spreadsheet" => Ok(Self::Spreadsheet),
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(BillingError::UnknownAttachmentKind { value }),
        }
    }
}

/// Outcome of an attachment check.
///
/// `missing_capabilities` is empty exactly when `allowed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct GateResult {
    allowed: bool,
    missing_capabilities: Vec<Capability>,
}

impl GateResult {
    fn from_missing(missing_capabilities: Vec<Capability>) -> Self {
        Self {
            allowed: missing_capabilities.is_empty(),
            missing_capabilities,
        }
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Missing capabilities, in first-requested order, without duplicates.
    #[must_use]
    pub fn missing_capabilities(&self) -> &[Capability] {
        &self.missing_capabilities
    }

    /// Lowest tier that would allow the request, if one exists.
    #[must_use]
    pub fn upgrade_to(&self) -> Option<Tier> {
        let mut needed = None;
        for cap in &self.missing_capabilities {
            let tier = TierPolicy::minimum_tier_for(*cap)?;
            needed = needed.max(Some(tier));
        }
        needed
    }
}

/// Attachment gate over the static tier policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentGate;

impl AttachmentGate {
    /// Decide whether `tier` may attach every kind in `requested`.
    ///
    /// An empty request is allowed. `Unsupported` kinds are always denied.
    pub fn can_attach(tier: Tier, requested: &[AttachmentKind]) -> GateResult {
        let granted = TierPolicy::capabilities_for(tier);
        let mut seen = BTreeSet::new();
        let missing: Vec<Capability> = requested
            .iter()
            .map(AttachmentKind::required_capability)
            .filter(|cap| seen.insert(*cap))
            .filter(|cap| !granted.contains(cap))
            .collect();

        let result = GateResult::from_missing(missing);
        if !result.is_allowed() {
            tracing::debug!(
                target: "edudash::billing",
                tier = %tier,
                missing = ?result.missing_capabilities(),
                "Attachment denied"
            );
        }
        result
    }
}

/// Result of checking a single capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureCheckResult {
    /// Capability is available.
    Allowed,
    /// Capability not included in the tier.
    CapabilityNotIncluded { upgrade_to: Option<Tier> },
}

impl FeatureCheckResult {
    /// Check if the capability is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Check a capability for use in handlers or guards.
#[must_use = "capability check result must be used to enforce access control"]
pub fn require_capability(tier: Tier, capability: Capability) -> FeatureCheckResult {
    if TierPolicy::grants(tier, capability) {
        FeatureCheckResult::Allowed
    } else {
        FeatureCheckResult::CapabilityNotIncluded {
            upgrade_to: TierPolicy::minimum_tier_for(capability),
        }
    }
}

/// Everything a tier unlocks, for paywalls and settings screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Entitlements {
    pub tier: Tier,
    pub capabilities: BTreeSet<Capability>,
    /// Monthly quota per category; `None` is unlimited.
    pub quotas: BTreeMap<UsageCategory, Option<u64>>,
}

impl Entitlements {
    /// Build the entitlements for `tier`.
    pub fn for_tier(tier: Tier) -> Self {
        Self {
            tier,
            capabilities: TierPolicy::capabilities_for(tier),
            quotas: UsageCategory::ALL
                .into_iter()
                .map(|c| (c, TierPolicy::monthly_quota(tier, c)))
                .collect(),
        }
    }

    /// Check if a capability is available.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
