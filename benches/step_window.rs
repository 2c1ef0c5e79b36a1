use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use step_metrics::{
    BucketConfig, BucketedDurationRecorder, MetricContext, MonitorConfig, Pollers, StepWindow,
    WallClock,
};

fn context() -> MetricContext {
    MetricContext::new(Arc::new(WallClock), Pollers::default())
}

fn bench_accumulate(c: &mut Criterion) {
    let window = StepWindow::new(0, context());
    c.bench_function("step_window_accumulate", |b| {
        b.iter(|| window.accumulate(black_box(1)))
    });
}

fn bench_poll(c: &mut Criterion) {
    let window = StepWindow::new(0, context());
    c.bench_function("step_window_poll", |b| b.iter(|| black_box(window.poll(0))));
}

fn bench_record(c: &mut Criterion) {
    let context = context();
    let recorder = BucketedDurationRecorder::new(
        MonitorConfig::new("bench"),
        BucketConfig::new(vec![1, 5, 10, 50, 100, 500, 1_000]).expect("valid buckets"),
        &context,
    );

    let mut group = c.benchmark_group("recorder_record");
    for duration in [0i64, 75, 5_000] {
        group.bench_function(format!("duration_{}", duration), |b| {
            b.iter(|| recorder.record(black_box(duration)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_accumulate, bench_poll, bench_record);
criterion_main!(benches);
