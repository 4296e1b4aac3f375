//! EduDash - subscription entitlements for a school management platform
//!
//! Gating decisions for the parent, teacher and admin dashboards and the
//! Dash AI assistant: which tier may attach which files, how long a trial
//! has left, and how much AI usage a school has consumed this month.
//!
//! # Features
//!
//! - **Tier policy**: exhaustive capability and quota table per tier
//! - **Attachment gate**: allow/deny with the exact capabilities missing
//! - **Trial clock**: deterministic trial and billing date arithmetic
//! - **Usage accounting**: remote usage with zero-fallback when unavailable
//!
//! # Quick Start
//!
//! ```rust
//! use edudash::billing::{AttachmentGate, AttachmentKind, Tier, TrialClock};
//! use edudash::ConfigBuilder;
//!
//! let config = ConfigBuilder::new().from_env().build()?;
//! edudash::init_tracing_with_config(&config);
//!
//! let gate = AttachmentGate::can_attach(Tier::Free, &[AttachmentKind::Pdf]);
//! assert!(!gate.is_allowed());
//!
//! let clock = TrialClock::new(config.trial);
//! let start = chrono::Utc::now();
//! assert!(clock.is_active(clock.trial_end_date(start), start));
//! # Ok::<(), edudash::EduDashError>(())
//! ```

pub mod billing;
mod config;
mod error;
pub mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use error::{EduDashError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "edudash=debug")
/// - `EDUDASH_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// Calling this more than once is a no-op after the first subscriber is set.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::parse_env_with_prefix("LOG_JSON").unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);
    install_subscriber(env_filter, config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!(target: "edudash", "Tracing subscriber already installed");
    }
}
