// Copyright 2026 The layermerge developers
// License: MIT
//
// Top-level merge driver. A `LayoutMerger` is bound to one top cell of one
// snapshot; each `merge(layer)` call flattens that layer's rectangles
// through the instance hierarchy, sweeps them into a delta channel (memory
// or spill file, chosen from the estimated volume), and folds the channel
// back into a containment forest of rectilinear polygons.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::contour::{ContourBuilder, PolygonTree};
use crate::db::{HierarchySnapshot, Placement, ShapeGenerator};
use crate::delta::{DeltaSink, MemoryChannel, SpillWriter};
use crate::error::{MergeError, Result, UnmergeableReason};
use crate::flatten::{CellEntry, FlattenCache};
use crate::geom::{grid_ok, CellId, LayerId, Orientation, Rect};
use crate::sweep::SweepMerge;

#[derive(Copy, Clone, Debug)]
pub struct MergeOptions {
    /// Estimated rectangle count above which the delta stream spills to a
    /// temporary file instead of staying in memory.
    pub spill_threshold: u64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            spill_threshold: 1 << 20,
        }
    }
}

/// Strategy turning one layer's flattened rectangles into polygons.
/// Pluggable so alternative merge algorithms can sit behind the same
/// driver.
pub trait MergeEngine: Sync {
    fn merge(&self, rects: Vec<Rect>, sink: Box<dyn DeltaSink>) -> Result<Vec<PolygonTree>>;
}

/// The default engine: corner-event sweep into the delta channel, then
/// contour reconstruction from it.
pub struct DeltaSweep;

impl MergeEngine for DeltaSweep {
    fn merge(&self, rects: Vec<Rect>, mut sink: Box<dyn DeltaSink>) -> Result<Vec<PolygonTree>> {
        let mut sweep = SweepMerge::new();
        for r in rects {
            sweep.add_rect(r);
        }
        sweep.run(sink.as_mut())?;
        let mut src = sink.finish()?;
        ContourBuilder::build(src.as_mut())
    }
}

/// Accumulated placement transform from the top cell down to the current
/// cell, kept in i64 so deep anchor chains are range-checked only when a
/// rectangle is emitted.
#[derive(Copy, Clone, Debug)]
struct Xform {
    orient: Orientation,
    dx: i64,
    dy: i64,
}

impl Xform {
    const IDENTITY: Xform = Xform {
        orient: Orientation::R0,
        dx: 0,
        dy: 0,
    };

    fn then(self, p: &Placement) -> Xform {
        let (ox, oy) = self.orient.apply(p.dx as i64, p.dy as i64);
        Xform {
            orient: self.orient.compose(p.orient),
            dx: self.dx + ox,
            dy: self.dy + oy,
        }
    }

    fn rect(self, r: Rect) -> (i64, i64, i64, i64) {
        let (lx, ly, hx, hy) = self.orient.transform_rect(r);
        (lx + self.dx, ly + self.dy, hx + self.dx, hy + self.dy)
    }
}

pub struct LayoutMerger<'a> {
    snapshot: &'a dyn HierarchySnapshot,
    shapes: &'a dyn ShapeGenerator,
    cache: Arc<FlattenCache>,
    engine: Arc<dyn MergeEngine>,
    options: MergeOptions,
    top: CellId,
    top_entry: Arc<CellEntry>,
}

impl<'a> LayoutMerger<'a> {
    pub fn new(
        snapshot: &'a dyn HierarchySnapshot,
        shapes: &'a dyn ShapeGenerator,
        top: CellId,
    ) -> Result<Self> {
        Self::with_parts(
            snapshot,
            shapes,
            top,
            Arc::new(FlattenCache::new()),
            Arc::new(DeltaSweep),
            MergeOptions::default(),
        )
    }

    /// Construct with a shared flatten cache, a custom engine, or tuned
    /// options. The whole hierarchy under `top` is resolved here, so
    /// cycles and missing cells surface before any merge starts.
    pub fn with_parts(
        snapshot: &'a dyn HierarchySnapshot,
        shapes: &'a dyn ShapeGenerator,
        top: CellId,
        cache: Arc<FlattenCache>,
        engine: Arc<dyn MergeEngine>,
        options: MergeOptions,
    ) -> Result<Self> {
        let top_entry = cache.entry(snapshot, shapes, top)?;
        Ok(LayoutMerger {
            snapshot,
            shapes,
            cache,
            engine,
            options,
            top,
            top_entry,
        })
    }

    /// Layers with any geometry under the top cell, in id order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.top_entry.layers.iter().copied()
    }

    /// Layers that cannot be merged, with the first reason found.
    pub fn bad_layers(&self) -> impl Iterator<Item = (LayerId, UnmergeableReason)> + '_ {
        self.top_entry.bad_layers.iter().map(|(&l, &r)| (l, r))
    }

    pub fn can_merge(&self, layer: LayerId) -> bool {
        !self.top_entry.bad_layers.contains_key(&layer)
    }

    /// Merge one layer into its polygon forest. A layer absent from the
    /// design yields an empty forest.
    pub fn merge(&self, layer: LayerId) -> Result<Vec<PolygonTree>> {
        if let Some(&reason) = self.top_entry.bad_layers.get(&layer) {
            return Err(MergeError::Unmergeable { layer, reason });
        }
        if !self.top_entry.layers.contains(&layer) {
            return Ok(Vec::new());
        }

        let estimate = self.top_entry.rect_counts.get(&layer).copied().unwrap_or(0);
        let mut rects = Vec::with_capacity(estimate.min(1 << 20) as usize);
        let top_entry = Arc::clone(&self.top_entry);
        self.collect(self.top, &top_entry, layer, Xform::IDENTITY, &mut rects)?;
        log::debug!(
            "merging layer {layer:?}: {} rects under cell {:?}",
            rects.len(),
            self.top
        );

        let sink: Box<dyn DeltaSink> = if estimate > self.options.spill_threshold {
            match SpillWriter::create() {
                Ok(w) => Box::new(w),
                Err(e) => {
                    log::warn!("spill file unavailable ({e}), keeping deltas in memory");
                    Box::new(MemoryChannel::new())
                }
            }
        } else {
            Box::new(MemoryChannel::new())
        };
        self.engine.merge(rects, sink)
    }

    /// Merge every layer under the top cell. Failures are per layer; one
    /// bad layer does not abort the rest.
    pub fn merge_all(&self) -> BTreeMap<LayerId, Result<Vec<PolygonTree>>> {
        self.layers()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|l| (l, self.merge(l)))
            .collect()
    }

    fn collect(
        &self,
        cell: CellId,
        entry: &CellEntry,
        layer: LayerId,
        xf: Xform,
        out: &mut Vec<Rect>,
    ) -> Result<()> {
        if let Some(boxes) = entry.layer_boxes.get(&layer) {
            for &r in boxes {
                let (lx, ly, hx, hy) = xf.rect(r);
                for v in [lx, ly, hx, hy] {
                    if !grid_ok(v) {
                        return Err(MergeError::CoordinateOverflow { cell, layer, value: v });
                    }
                }
                out.push(Rect::new(lx as i32, ly as i32, hx as i32, hy as i32));
            }
        }
        for p in &entry.placements {
            let child = self.cache.entry(self.snapshot, self.shapes, p.child)?;
            if !child.layers.contains(&layer) {
                continue;
            }
            self.collect(p.child, &child, layer, xf.then(p), out)?;
        }
        Ok(())
    }
}
