use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use edudash::billing::{
    AttachmentGate, AttachmentKind, BillingError, Capability, LimitCheckResult, RemoteUsageSource,
    Tier, TierPolicy, TrialClock, TrialConfig, UsageAccountant, UsageCategory, UsageRecord,
    UsageReply,
};
use edudash::{EduDashError, Result};

/// Usage source that replays a canned JSON body, or fails.
#[derive(Clone)]
struct JsonUsageSource {
    body: Option<&'static str>,
    calls: Arc<AtomicUsize>,
}

impl JsonUsageSource {
    fn replying(body: &'static str) -> Self {
        Self {
            body: Some(body),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            body: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl RemoteUsageSource for JsonUsageSource {
    async fn fetch_monthly_usage(&self) -> Result<UsageReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.body {
            Some(body) => Ok(serde_json::from_str(body)?),
            None => Err(EduDashError::service_unavailable("network unreachable")),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

#[test]
fn test_monotonic_tiers() {
    for (i, lower) in Tier::ALL.iter().enumerate() {
        for higher in &Tier::ALL[i..] {
            assert!(
                TierPolicy::capabilities_for(*lower).is_subset(&TierPolicy::capabilities_for(*higher)),
                "{lower} is not a subset of {higher}"
            );
        }
    }
}

#[test]
fn test_gate_consistency_over_all_requests() {
    let kinds = [
        AttachmentKind::Image,
        AttachmentKind::Pdf,
        AttachmentKind::Document,
        AttachmentKind::Spreadsheet,
        AttachmentKind::Text,
        AttachmentKind::Audio,
        AttachmentKind::Unsupported,
    ];

    for tier in Tier::ALL {
        // Every subset of kinds, as a bitmask
        for mask in 0u32..(1 << kinds.len()) {
            let requested: Vec<_> = kinds
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, k)| *k)
                .collect();
            let result = AttachmentGate::can_attach(tier, &requested);
            assert_eq!(result.is_allowed(), result.missing_capabilities().is_empty());
        }
    }
}

#[test]
fn test_free_tier_fails_closed_on_image() {
    let result = AttachmentGate::can_attach(Tier::Free, &[AttachmentKind::Image]);
    assert!(!result.is_allowed());
    assert!(result.missing_capabilities().contains(&Capability::MultimodalVision));
}

#[test]
fn test_starter_and_premium_unlock_attachments() {
    for tier in [Tier::Starter, Tier::Premium] {
        assert!(AttachmentGate::can_attach(tier, &[AttachmentKind::Image]).is_allowed());
        assert!(AttachmentGate::can_attach(tier, &[AttachmentKind::Pdf]).is_allowed());
    }
}

#[test]
fn test_mixed_request() {
    let kinds = [AttachmentKind::Image, AttachmentKind::Pdf];
    assert!(AttachmentGate::can_attach(Tier::Premium, &kinds).is_allowed());

    let result = AttachmentGate::can_attach(Tier::Free, &kinds);
    assert!(!result.is_allowed());
    assert!(result.missing_capabilities().contains(&Capability::MultimodalVision));
    assert!(result.missing_capabilities().contains(&Capability::MultimodalDocuments));
}

#[test]
fn test_gate_from_parsed_boundary_values() {
    let tier: Tier = "free".parse().unwrap();
    let kinds = ["image/heic", "application/zip"]
        .into_iter()
        .map(AttachmentKind::from_mime_type)
        .collect::<Vec<_>>();

    let result = AttachmentGate::can_attach(tier, &kinds);
    assert_eq!(
        result.missing_capabilities(),
        &[Capability::MultimodalVision, Capability::Unsupported]
    );
    assert_eq!(result.upgrade_to(), None);

    assert!("enterprise".parse::<Tier>().is_err());
}

#[test]
fn test_trial_arithmetic() {
    let clock = TrialClock::new(TrialConfig {
        duration_days: 7,
        grace_period_days: 1,
    });
    let start = date(2024, 1, 1);

    assert_eq!(clock.trial_end_date(start), date(2024, 1, 8));
    assert_eq!(clock.next_billing_date(start), date(2024, 1, 9));
}

#[test]
fn test_days_remaining_rounds_half_day_up() {
    let clock = TrialClock::default();
    let end = date(2024, 1, 8);
    let now = end - TimeDelta::hours(12);

    assert_eq!(clock.days_remaining(end, now), 1);
    assert!(clock.is_active(end, now));
}

#[test]
fn test_expiry_clamp() {
    let clock = TrialClock::default();
    let end = date(2024, 1, 8);
    let now = date(2024, 2, 1);

    assert_eq!(clock.days_remaining(end, now), 0);
    assert!(!clock.is_active(end, now));
}

#[test]
fn test_trial_across_month_boundary() {
    let clock = TrialClock::default();
    let start = date(2024, 2, 26);
    assert_eq!(clock.trial_end_date(start), date(2024, 3, 4));
    assert_eq!(clock.next_billing_date(start), date(2024, 3, 5));
}

#[tokio::test]
async fn test_usage_success_path() {
    let source = JsonUsageSource::replying(
        r#"{"monthly":{"lesson_generation":10,"grading_assistance":5,"homework_help":2,"transcription":0}}"#,
    );
    let accountant = UsageAccountant::new(source.clone());

    let usage = accountant.get_combined_usage().await;
    assert_eq!(
        usage,
        UsageRecord::from_counts([
            (UsageCategory::LessonGeneration, 10),
            (UsageCategory::GradingAssistance, 5),
            (UsageCategory::HomeworkHelp, 2),
            (UsageCategory::Transcription, 0),
        ])
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_usage_failure_path() {
    let source = JsonUsageSource::failing();
    let accountant = UsageAccountant::new(source.clone());

    let usage = accountant.get_combined_usage().await;
    for category in UsageCategory::ALL {
        assert_eq!(usage.get(category), 0);
    }
    assert!(usage.is_complete());
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_usage_malformed_reply_degrades_to_zero() {
    let source = JsonUsageSource::replying(r#"{"monthly":"oops"}"#);
    let accountant = UsageAccountant::new(source);

    assert!(accountant.fetch_usage().await.is_err());
    assert_eq!(accountant.get_combined_usage().await, UsageRecord::zeroed());
}

#[tokio::test]
async fn test_usage_explicit_error_reply() {
    let source = JsonUsageSource::replying(r#"{"error":"JWT expired"}"#);
    let accountant = UsageAccountant::new(source);

    let err = accountant.fetch_usage().await.unwrap_err();
    assert!(err.to_string().contains("JWT expired"));
    assert_eq!(accountant.get_combined_usage().await, UsageRecord::zeroed());
}

#[tokio::test]
async fn test_usage_error_alongside_monthly_takes_failure_path() {
    let source = JsonUsageSource::replying(
        r#"{"monthly":{"lesson_generation":9,"grading_assistance":1,"homework_help":0,"transcription":0},"error":"permission denied"}"#,
    );
    let accountant = UsageAccountant::new(source.clone());

    let err = accountant.fetch_usage().await.unwrap_err();
    assert_eq!(
        err,
        BillingError::UsageSourceFailed {
            message: "permission denied".to_string(),
            retryable: false,
        }
    );
    assert_eq!(accountant.get_combined_usage().await, UsageRecord::zeroed());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_usage_null_error_is_success() {
    let source = JsonUsageSource::replying(
        r#"{"monthly":{"lesson_generation":9,"grading_assistance":1,"homework_help":0,"transcription":0},"error":null}"#,
    );
    let accountant = UsageAccountant::new(source);

    let usage = accountant.fetch_usage().await.unwrap();
    assert_eq!(usage.get(UsageCategory::LessonGeneration), 9);
}

#[tokio::test]
async fn test_usage_new_backend_category_keeps_known_counts() {
    let source = JsonUsageSource::replying(
        r#"{"monthly":{"lesson_generation":40,"grading_assistance":0,"homework_help":0,"transcription":0,"image_generation":3}}"#,
    );
    let accountant = UsageAccountant::new(source);

    let usage = accountant.get_combined_usage().await;
    assert_eq!(usage.get(UsageCategory::LessonGeneration), 40);

    let result = accountant
        .check_quota(Tier::Free, UsageCategory::LessonGeneration)
        .await;
    assert_eq!(result, LimitCheckResult::AtLimit { current: 40, max: 5 });
}
