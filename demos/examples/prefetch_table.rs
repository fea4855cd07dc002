// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinite table: append rows whenever the user nears the end.
//!
//! The table starts with 10 rows of 300 units in an 800-unit-tall viewport.
//! Each fetch request is serviced on the "main loop" (after the scroll step),
//! which appends 10 rows and completes the fetch. Rows entering the two-row
//! lookahead below the viewport are reported through the native prefetch
//! protocol; rows leaving it on the way back up are cancelled.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_prefetch_demos --example prefetch_table`

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::mpsc;

use kurbo::{Size, Vec2};
use parking_lot::Mutex;
use understory_prefetch::datasource::{PrefetchDataSource, PrefetchDataSourceSlot, PrefetchHostKind};
use understory_prefetch::geometry::ScrollGeometry;
use understory_prefetch::host::{OffsetNotifier, ScrollHost};
use understory_prefetch::trigger::ScrollHostExt;
use understory_prefetch::types::{Action, IndexPath};

const ROW_H: f64 = 300.0;
const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 800.0;
const PAGE: usize = 10;
const LOOKAHEAD_ROWS: usize = 2;

#[derive(Debug, Default)]
struct Rows {
    count: usize,
    offset_y: f64,
    lookahead: BTreeSet<usize>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Mutex<Rows>,
    offsets: OffsetNotifier,
    prefetch_source: PrefetchDataSourceSlot,
}

impl ScrollHost for Table {
    fn geometry(&self) -> ScrollGeometry {
        let rows = self.rows.lock();
        ScrollGeometry {
            bounds: Size::new(WIDTH, HEIGHT),
            content_size: Size::new(WIDTH, rows.count as f64 * ROW_H),
            content_offset: Vec2::new(0.0, rows.offset_y),
        }
    }

    fn offset_notifier(&self) -> &OffsetNotifier {
        &self.offsets
    }

    fn prefetch_host_kind(&self) -> Option<PrefetchHostKind> {
        Some(PrefetchHostKind::Table)
    }

    fn set_prefetch_data_source(&self, source: Option<PrefetchDataSource>) {
        self.prefetch_source.set(source);
    }
}

impl Table {
    fn scroll_to(&self, y: f64) {
        let (entered, left) = {
            let mut rows = self.rows.lock();
            let max = (rows.count as f64 * ROW_H - HEIGHT).max(0.0);
            rows.offset_y = y.clamp(0.0, max);

            // Rows just below the viewport, within the loaded range.
            let first_hidden = ((rows.offset_y + HEIGHT) / ROW_H).ceil() as usize;
            let end = (first_hidden + LOOKAHEAD_ROWS).min(rows.count);
            let next: BTreeSet<usize> = (first_hidden..end).collect();
            let entered: Vec<_> = next.difference(&rows.lookahead).copied().collect();
            let left: Vec<_> = rows.lookahead.difference(&next).copied().collect();
            rows.lookahead = next;
            (entered, left)
        };

        if !entered.is_empty() {
            let paths: Vec<_> = entered.into_iter().map(IndexPath::from).collect();
            self.prefetch_source.prefetch(&paths);
        }
        if !left.is_empty() {
            let paths: Vec<_> = left.into_iter().map(IndexPath::from).collect();
            self.prefetch_source.cancel_prefetching(&paths);
        }
        self.offsets.notify();
    }

    fn append_page(&self) -> usize {
        let mut rows = self.rows.lock();
        rows.count += PAGE;
        rows.count
    }
}

fn main() {
    env_logger::init();

    let table = Arc::new(Table::default());
    table.rows.lock().count = PAGE;

    let (requests, pending) = mpsc::channel::<()>();
    let trigger = table.prefetch(move |table, trigger| {
        println!(
            "fetch requested at offset {:.0} ({:?})",
            table.geometry().content_offset.y,
            trigger.state()
        );
        let _ = requests.send(());
    });
    trigger.enable_prefetching_data_source(|action| match action {
        Action::Prefetch(paths) => println!("  prefetch rows {:?}", items(&paths)),
        Action::CancelPrefetching(paths) => println!("  cancel rows {:?}", items(&paths)),
    });
    trigger.log_pipeline(|msg| println!("  {msg}"));

    // Scroll down in 450-unit steps, then back up a little.
    let mut y = 0.0;
    for step in 0..16 {
        y += if step < 14 { 450.0 } else { -900.0 };
        table.scroll_to(y);
        println!("scroll to {y:.0} -> state {}", trigger.state());

        // Main-loop turn: service fetch requests issued during the scroll.
        while pending.try_recv().is_ok() {
            let count = table.append_page();
            println!("loaded page, now {count} rows");
            trigger.complete_fetching();
        }
    }

    trigger.disable_prefetching_data_source();
    println!("final: {} rows, {}", table.rows.lock().count, trigger.state());
}

fn items(paths: &[IndexPath]) -> Vec<usize> {
    paths.iter().map(|p| p.item).collect()
}
