// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Horizontal carousel with fetches completed on a worker thread.
//!
//! The carousel's content is wider than its viewport, so the trigger measures
//! along `x`. Fetch requests are handed to a worker thread, which appends
//! cards and calls `complete_fetching` from off the scrolling thread.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_prefetch_demos --example prefetch_horizontal`

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use kurbo::{Size, Vec2};
use parking_lot::Mutex;
use understory_prefetch::geometry::ScrollGeometry;
use understory_prefetch::host::{OffsetNotifier, ScrollHost};
use understory_prefetch::trigger::{PrefetchConfig, PrefetchTrigger};
use understory_prefetch::types::State;

const CARD_W: f64 = 180.0;
const VIEW_W: f64 = 360.0;
const VIEW_H: f64 = 240.0;

#[derive(Debug, Default)]
struct Carousel {
    cards: Mutex<usize>,
    offset_x: Mutex<f64>,
    offsets: OffsetNotifier,
}

impl ScrollHost for Carousel {
    fn geometry(&self) -> ScrollGeometry {
        ScrollGeometry {
            bounds: Size::new(VIEW_W, VIEW_H),
            content_size: Size::new(*self.cards.lock() as f64 * CARD_W, VIEW_H),
            content_offset: Vec2::new(*self.offset_x.lock(), 0.0),
        }
    }

    fn offset_notifier(&self) -> &OffsetNotifier {
        &self.offsets
    }
}

impl Carousel {
    fn scroll_to(&self, x: f64) {
        *self.offset_x.lock() = x;
        self.offsets.notify();
    }
}

fn main() {
    env_logger::init();

    let carousel = Arc::new(Carousel::default());
    *carousel.cards.lock() = 8;

    let (requests, pending) = mpsc::channel::<()>();
    let trigger = PrefetchTrigger::with_config(
        &carousel,
        PrefetchConfig::default().with_leading_screens(0.5),
        move |_, _| {
            let _ = requests.send(());
        },
    );
    trigger.log_pipeline(|msg| println!("  {msg}"));
    trigger.on_state_change(|state| println!("  state -> {state}"));

    let worker = {
        let carousel = carousel.clone();
        // Weak, so dropping the trigger closes the request channel.
        let trigger = Arc::downgrade(&trigger);
        thread::spawn(move || {
            for _request in pending {
                thread::sleep(Duration::from_millis(20));
                *carousel.cards.lock() += 4;
                if let Some(trigger) = trigger.upgrade() {
                    trigger.complete_fetching();
                }
            }
        })
    };

    for step in 1..=20 {
        let x = step as f64 * 90.0;
        carousel.scroll_to(x);
        println!("x = {x:.0}, cards = {}", *carousel.cards.lock());
        thread::sleep(Duration::from_millis(10));
    }

    // Let the last request finish before shutting the worker down.
    while trigger.state() == State::Fetching {
        thread::sleep(Duration::from_millis(5));
    }
    let cards = *carousel.cards.lock();
    drop(trigger);
    drop(carousel);
    let _ = worker.join();
    println!("done with {cards} cards");
}
