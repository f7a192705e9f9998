// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use understory_intersection::{
    GeometricBackend, IntersectionEntry, ObserverCache, ObserverConfig, RootSelection,
    VisibilityBinding, VisibilityCallbacks, VisibilityOptions,
};

type Cache = ObserverCache<u32, GeometricBackend>;

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

/// Rows of 40px stacked from the top, scrolled by `scroll_y`.
fn rows(scroll_y: f64) -> impl Fn(&u32) -> Option<Rect> {
    move |e: &u32| {
        let y = f64::from(*e) * 40.0 - scroll_y;
        Some(Rect::new(0.0, y, 800.0, y + 40.0))
    }
}

fn counting_callbacks(hits: &Rc<Cell<usize>>) -> VisibilityCallbacks<u32> {
    let (enter, exit) = (hits.clone(), hits.clone());
    VisibilityCallbacks::new()
        .on_enter(move |_: &IntersectionEntry<u32>| enter.set(enter.get() + 1))
        .on_exit(move |_: &IntersectionEntry<u32>| exit.set(exit.get() + 1))
}

/// `consumers` bindings on the default viewport, each owning `per_consumer` rows.
fn build(
    consumers: u32,
    per_consumer: u32,
    hits: &Rc<Cell<usize>>,
) -> (Cache, Vec<VisibilityBinding<u32, u32, GeometricBackend>>) {
    let cache = Cache::new(GeometricBackend);
    let bindings = (0..consumers)
        .map(|c| {
            let mut b = VisibilityBinding::new(
                cache.clone(),
                VisibilityOptions::default(),
                counting_callbacks(hits),
            );
            b.set_root(Some(RootSelection::DefaultViewport));
            for i in 0..per_consumer {
                let element = c * per_consumer + i;
                b.set_target(element, Some(element));
            }
            b
        })
        .collect();
    (cache, bindings)
}

fn bench_update_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_intersection/update_layout");
    group.sample_size(50);

    for &(consumers, per_consumer) in &[(1_u32, 256_u32), (16, 64), (64, 64)] {
        group.bench_function(
            format!("scroll_sweep(consumers={consumers},targets={per_consumer})"),
            |b| {
                let hits = Rc::new(Cell::new(0));
                let (cache, _bindings) = build(consumers, per_consumer, &hits);
                cache.update_layout(VIEWPORT, rows(0.0));
                let mut scroll_y = 0.0;
                b.iter(|| {
                    scroll_y += 40.0;
                    black_box(cache.update_layout(VIEWPORT, rows(scroll_y)));
                });
            },
        );
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_intersection/dispatch");
    group.sample_size(50);

    for &listeners in &[1_u32, 16, 128] {
        group.bench_function(format!("fan_out(listeners={listeners})"), |b| {
            let hits = Rc::new(Cell::new(0));
            let cache = Cache::new(GeometricBackend);
            let id = cache.get_or_insert(&ObserverConfig::new(RootSelection::DefaultViewport));
            let registered: Vec<_> = (0..listeners)
                .map(|_| {
                    let callbacks = counting_callbacks(&hits);
                    let listener = cache.listener(
                        callbacks.enter_callback().cloned(),
                        callbacks.exit_callback().cloned(),
                    );
                    cache.observe(id, 7, &listener);
                    cache.observe(id, 8, &listener);
                    listener
                })
                .collect();
            b.iter(|| {
                black_box(cache.dispatch(
                    id,
                    [
                        IntersectionEntry::entering(7, 1.0),
                        IntersectionEntry::exiting(8),
                    ],
                ))
            });
            black_box(registered);
        });
    }

    group.finish();
}

fn bench_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_intersection/attach");
    group.sample_size(50);

    for &configs in &[4_u32, 64] {
        group.bench_function(format!("attach_detach(configs={configs})"), |b| {
            let hits = Rc::new(Cell::new(0));
            b.iter_batched(
                || {
                    let cache = Cache::new(GeometricBackend);
                    // Unrelated live observers the lookup has to skip.
                    for root in 0..configs {
                        cache.get_or_insert(&ObserverConfig::new(RootSelection::Explicit(
                            10_000 + root,
                        )));
                    }
                    let mut binding = VisibilityBinding::new(
                        cache.clone(),
                        VisibilityOptions::default(),
                        counting_callbacks(&hits),
                    );
                    for i in 0..32 {
                        binding.set_target(i, Some(i));
                    }
                    (cache, binding)
                },
                |(cache, mut binding)| {
                    binding.set_root(Some(RootSelection::Explicit(1)));
                    binding.set_root(None);
                    black_box(cache.len())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_update_layout, bench_dispatch, bench_attach);
criterion_main!(benches);
