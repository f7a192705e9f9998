// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Vec2};
use understory_intersection::{GeometricBackend, ObserverCache, RootSelection, VisibilityCallbacks};
use understory_scroll_nav::{
    Direction, Gesture, ScrollBehavior, ScrollController, ScrollHost, ScrollOptions,
};

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

struct Page {
    sections: u32,
    scroll_y: f64,
}

impl Page {
    fn layout(&self) -> impl Fn(&u32) -> Option<Rect> + '_ {
        move |e: &u32| {
            if *e == 0 {
                return Some(VIEWPORT);
            }
            let y = f64::from(*e - 1) * 100.0 - self.scroll_y;
            Some(Rect::new(0.0, y, 100.0, y + 100.0))
        }
    }
}

impl ScrollHost<u32> for Page {
    fn scroll_into_view(&mut self, element: &u32, _: ScrollBehavior) {
        self.scroll_y = f64::from(*element - 1) * 100.0;
    }

    fn is_at_edge(&self, _: &RootSelection<u32>, direction: Direction) -> bool {
        let max = f64::from(self.sections - 1) * 100.0;
        match direction {
            Direction::Up | Direction::Left => self.scroll_y <= 0.0,
            Direction::Down | Direction::Right => self.scroll_y >= max,
        }
    }
}

fn bench_navigation(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_scroll_nav");
    group.sample_size(50);

    for &sections in &[8_u32, 256] {
        group.bench_function(format!("wheel_step_round_trip(sections={sections})"), |b| {
            let cache = ObserverCache::new(GeometricBackend);
            let mut nav: ScrollController<u32, u32, GeometricBackend> = ScrollController::new(
                cache.clone(),
                ScrollOptions::default(),
                VisibilityCallbacks::new(),
            );
            nav.set_root(Some(RootSelection::Explicit(0)));
            for n in 1..=sections {
                nav.set_target(n, Some(n));
            }
            let mut page = Page {
                sections,
                scroll_y: 0.0,
            };
            cache.update_layout(VIEWPORT, page.layout());

            let mut now = 0_u64;
            let mut dy = 1.0;
            b.iter(|| {
                // Bounce between the ends of the page.
                if nav.active() <= 0 {
                    dy = 1.0;
                } else if nav.active() >= (sections - 1) as isize {
                    dy = -1.0;
                }
                let response =
                    nav.handle_gesture(now, Gesture::Wheel { delta: Vec2::new(0.0, dy) }, &page);
                nav.poll(now + 200, &mut page);
                cache.update_layout(VIEWPORT, page.layout());
                nav.poll(now + 1_000, &mut page);
                now += 1_000;
                black_box(response)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_navigation);
criterion_main!(benches);
