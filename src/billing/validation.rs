//! Input validation for values crossing into the entitlement core.
//!
//! Tier names, attachment kinds, capability ids and usage category keys all
//! arrive as strings from subscription rows, request bodies or RPC replies.
//! They are validated here before being matched against the closed enums, so
//! that error messages never echo raw caller input into logs.

use super::error::BillingError;

/// Maximum length for any enumerated identifier.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an enumerated identifier and return its normalized form.
///
/// Identifiers must:
/// - Not be empty (after trimming)
/// - Not exceed 64 characters
/// - Contain only ASCII alphanumerics, underscores, hyphens and dots
///
/// The returned value is trimmed and lowercased.
///
/// # Errors
///
/// Returns `BillingError::InvalidIdentifier` if validation fails.
pub fn validate_identifier(field: &str, value: &str) -> Result<String, BillingError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(BillingError::InvalidIdentifier {
            field: field.to_string(),
            reason: format!("{} cannot be empty", field),
        });
    }

    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(BillingError::InvalidIdentifier {
            field: field.to_string(),
            reason: format!(
                "'{}' exceeds maximum length of {}",
                sanitize_for_error(trimmed),
                MAX_IDENTIFIER_LENGTH
            ),
        });
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(BillingError::InvalidIdentifier {
            field: field.to_string(),
            reason: format!("'{}' contains invalid characters", sanitize_for_error(trimmed)),
        });
    }

    Ok(trimmed.to_ascii_lowercase())
}

/// Sanitize a string for error messages to prevent log injection.
pub(crate) fn sanitize_for_error(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .take(50)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '?'
            }
        })
        .collect();

    if s.chars().count() > 50 {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
