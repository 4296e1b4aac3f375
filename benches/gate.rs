use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use edudash::billing::{AttachmentGate, AttachmentKind, Tier, TrialClock};

fn benchmark_can_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("can_attach");

    let single = [AttachmentKind::Image];
    let mixed = [
        AttachmentKind::Image,
        AttachmentKind::Pdf,
        AttachmentKind::Document,
        AttachmentKind::Image,
        AttachmentKind::Audio,
        AttachmentKind::Unsupported,
    ];

    group.bench_function("single_allowed", |b| {
        b.iter(|| AttachmentGate::can_attach(black_box(Tier::Premium), black_box(&single)));
    });

    group.bench_function("mixed_denied", |b| {
        b.iter(|| AttachmentGate::can_attach(black_box(Tier::Free), black_box(&mixed)));
    });

    group.finish();
}

fn benchmark_days_remaining(c: &mut Criterion) {
    let clock = TrialClock::default();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = clock.trial_end_date(start);
    let now = start + TimeDelta::hours(30);

    c.bench_function("days_remaining", |b| {
        b.iter(|| clock.days_remaining(black_box(end), black_box(now)));
    });
}

criterion_group!(benches, benchmark_can_attach, benchmark_days_remaining);
criterion_main!(benches);
