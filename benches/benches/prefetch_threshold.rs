// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Size, Vec2};
use parking_lot::Mutex;
use understory_prefetch::geometry::{ScrollGeometry, evaluate_threshold};
use understory_prefetch::host::{OffsetNotifier, ScrollHost};
use understory_prefetch::trigger::PrefetchTrigger;
use understory_prefetch::types::{Axis, AxisPolicy};

#[derive(Default)]
struct Host {
    geometry: Mutex<ScrollGeometry>,
    offsets: OffsetNotifier,
}

impl ScrollHost for Host {
    fn geometry(&self) -> ScrollGeometry {
        *self.geometry.lock()
    }

    fn offset_notifier(&self) -> &OffsetNotifier {
        &self.offsets
    }
}

fn gen_offsets(n: usize, content: f64) -> Vec<f64> {
    (0..n).map(|i| content * i as f64 / n as f64).collect()
}

fn vertical(offset: f64) -> ScrollGeometry {
    ScrollGeometry {
        bounds: Size::new(400.0, 800.0),
        content_size: Size::new(400.0, 30_000.0),
        content_offset: Vec2::new(0.0, offset),
    }
}

fn bench_evaluate_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_threshold");
    let offsets = gen_offsets(4096, 30_000.0);
    group.throughput(Throughput::Elements(offsets.len() as u64));
    for (name, policy) in [
        ("inferred", AxisPolicy::Inferred),
        ("fixed_vertical", AxisPolicy::Fixed(Axis::Vertical)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let fired = offsets
                    .iter()
                    .filter(|&&o| evaluate_threshold(&vertical(o), 1.0, policy).is_ok())
                    .count();
                black_box(fired);
            });
        });
    }
    group.finish();
}

// Full notification path: notifier fan-out, lock, threshold, and completion.
fn bench_notify_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify_path");
    let offsets = gen_offsets(4096, 30_000.0);
    group.throughput(Throughput::Elements(offsets.len() as u64));

    let host = Arc::new(Host::default());
    *host.geometry.lock() = vertical(0.0);
    let trigger = PrefetchTrigger::new(&host, |_, trigger| trigger.complete_fetching());

    group.bench_function("scroll_sweep", |b| {
        b.iter(|| {
            for &o in &offsets {
                host.geometry.lock().content_offset = Vec2::new(0.0, o);
                host.offsets.notify();
            }
            black_box(trigger.state());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_evaluate_threshold, bench_notify_path);
criterion_main!(benches);
