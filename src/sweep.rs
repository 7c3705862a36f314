// Copyright 2026 The layermerge developers
// License: MIT
//
// Sweep-line Boolean union over axis-aligned rectangles.
//
// Every rectangle contributes four signed corner events. Sweeping left to
// right, a linked segment list keeps the exact overlap count of the active
// vertical cross-section; at each column the change in the *covered*
// predicate (count > 0) is emitted as coverage toggles. Columns where the
// merged picture does not change produce no record, so abutting and
// duplicated rectangles fuse silently.

use crate::arena::{Pool, INVALID};
use crate::delta::{DeltaRecord, DeltaSink, DeltaToggle};
use crate::error::Result;
use crate::geom::Rect;

/// One signed rectangle corner.
#[derive(Copy, Clone, Debug)]
struct Corner {
    x: i32,
    y: i32,
    sign: i8,
}

/// Segment of the active cross-section: overlap `count` holds on the band
/// `[y, next.y)`. The list starts at a `y = i32::MIN` head sentinel with
/// count zero and ends at a `y = i32::MAX` tail sentinel.
#[derive(Copy, Clone, Debug)]
struct Seg {
    y: i32,
    count: i32,
    next: u32,
}

#[inline]
fn cov(count: i32) -> i32 {
    (count > 0) as i32
}

pub struct SweepMerge {
    segs: Pool<Seg>,
    head: u32,
    events: Vec<Corner>,
}

impl SweepMerge {
    pub fn new() -> Self {
        let mut segs = Pool::new();
        let tail = segs.alloc(Seg {
            y: i32::MAX,
            count: 0,
            next: INVALID,
        });
        let head = segs.alloc(Seg {
            y: i32::MIN,
            count: 0,
            next: tail,
        });
        SweepMerge {
            segs,
            head,
            events: Vec::new(),
        }
    }

    pub fn add_rect(&mut self, r: Rect) {
        if r.is_degenerate() {
            return;
        }
        self.events.push(Corner { x: r.lx, y: r.ly, sign: 1 });
        self.events.push(Corner { x: r.lx, y: r.hy, sign: -1 });
        self.events.push(Corner { x: r.hx, y: r.ly, sign: -1 });
        self.events.push(Corner { x: r.hx, y: r.hy, sign: 1 });
    }

    /// Sweep all accumulated rectangles into `sink`. Consumes the sweep;
    /// the caller seals the sink afterwards.
    pub fn run(mut self, sink: &mut dyn DeltaSink) -> Result<()> {
        self.events.sort_unstable_by_key(|e| (e.x, e.y));
        let events = std::mem::take(&mut self.events);
        let mut deltas: Vec<(i32, i32)> = Vec::new();
        let mut toggles: Vec<DeltaToggle> = Vec::new();
        let mut i = 0;
        while i < events.len() {
            let x = events[i].x;
            deltas.clear();
            while i < events.len() && events[i].x == x {
                let y = events[i].y;
                let mut df = 0i32;
                while i < events.len() && events[i].x == x && events[i].y == y {
                    df += events[i].sign as i32;
                    i += 1;
                }
                if df != 0 {
                    deltas.push((y, df));
                }
            }
            toggles.clear();
            self.column(x, &deltas, &mut toggles);
            if !toggles.is_empty() {
                sink.push(DeltaRecord {
                    x,
                    toggles: toggles.clone(),
                })?;
            }
        }
        Ok(())
    }

    /// Fold one column of count deltas into the segment list, appending the
    /// resulting coverage toggles in ascending y.
    fn column(&mut self, x: i32, deltas: &[(i32, i32)], toggles: &mut Vec<DeltaToggle>) {
        let mut prev = self.head;
        let mut cur = self.segs[self.head].next;
        // Running sum of applied deltas, and the pre-column count of the
        // band just below the current critical point.
        let mut acc = 0i32;
        let mut old_base = 0i32;
        let mut i = 0;
        while i < deltas.len() {
            let (ey, df) = deltas[i];
            let ny = self.segs[cur].y;
            let y = ny.min(ey);
            let at_node = ny == y;
            let at_event = ey == y;

            let old_before = old_base;
            let old_after = if at_node { self.segs[cur].count } else { old_before };
            let acc_after = acc + if at_event { df } else { 0 };
            let new_before = old_before + acc;
            let new_after = old_after + acc_after;

            let d = (cov(new_after) - cov(new_before)) - (cov(old_after) - cov(old_before));
            for _ in 0..d.abs() {
                toggles.push(DeltaToggle { y, rising: d > 0 });
            }

            if new_after == new_before {
                // Band above y now matches the band below: no segment
                // boundary remains here.
                if at_node {
                    let dead = cur;
                    cur = self.segs[dead].next;
                    self.segs[prev].next = cur;
                    self.segs.free(dead);
                }
            } else if at_node {
                self.segs[cur].count = new_after;
                prev = cur;
                cur = self.segs[cur].next;
            } else {
                let node = self.segs.alloc(Seg {
                    y,
                    count: new_after,
                    next: cur,
                });
                self.segs[prev].next = node;
                prev = node;
            }

            old_base = old_after;
            acc = acc_after;
            if at_event {
                i += 1;
            }
        }
        debug_assert_eq!(acc, 0, "unbalanced corner events in column {x}");
    }
}

impl Default for SweepMerge {
    fn default() -> Self {
        Self::new()
    }
}
