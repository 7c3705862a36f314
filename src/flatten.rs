// Copyright 2026 The layermerge developers
// License: MIT
//
// Per-cell geometry cache. Each cell of a snapshot is flattened into a
// `CellEntry` at most once, shared behind an `Arc`; entries carry the
// cell's own rectangles plus aggregated subtree metadata (which layers
// occur below, how many rectangles they hold, which layers are
// unmergeable and why).
//
// Entries are keyed by `(stamp, cell)` so a cache outlives any single
// snapshot without ever serving stale geometry. Build-once semantics come
// from a `OnceLock` per key; concurrent callers for the same cell block on
// the first builder. Instance cycles are caught by the per-call path set
// before entering the `OnceLock`, which keeps a cycle from deadlocking the
// builder against itself.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use crate::db::{HierarchySnapshot, Placement, Shape, ShapeGenerator};
use crate::error::{MergeError, Result, UnmergeableReason};
use crate::geom::{CellId, LayerId, Rect, SnapshotStamp};

/// Flattened view of one cell: its own rectangles and what its subtree
/// contains.
#[derive(Debug, Default)]
pub struct CellEntry {
    /// This cell's own rectangles, by layer. Empty for parameterized
    /// cells, whose geometry cannot be taken at face value.
    pub layer_boxes: HashMap<LayerId, Vec<Rect>>,
    pub placements: Vec<Placement>,
    /// Every layer with geometry anywhere in the subtree.
    pub layers: BTreeSet<LayerId>,
    /// Layers that cannot be merged, with the first reason found.
    pub bad_layers: HashMap<LayerId, UnmergeableReason>,
    /// Saturating rectangle totals over the whole subtree, counting one
    /// copy per placement. Drives the memory-versus-spill decision.
    pub rect_counts: HashMap<LayerId, u64>,
    pub parameterized: bool,
}

type Slot = Arc<OnceLock<Result<Arc<CellEntry>>>>;

#[derive(Default)]
pub struct FlattenCache {
    entries: Mutex<HashMap<(SnapshotStamp, CellId), Slot>>,
}

impl FlattenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattened entry for `cell`, building it (and its subtree) on first
    /// use.
    ///
    /// Instance cycles are detected along the traversal and reported as
    /// [`MergeError::CycleDetected`]. Concurrent callers entering the
    /// same cyclic hierarchy from different cells can instead block on
    /// each other's in-flight builds: cyclic snapshots must not be
    /// handed to more than one thread at a time. Acyclic hierarchies,
    /// the only well-formed kind, are safe to flatten concurrently.
    pub fn entry(
        &self,
        snap: &dyn HierarchySnapshot,
        shapes: &dyn ShapeGenerator,
        cell: CellId,
    ) -> Result<Arc<CellEntry>> {
        let mut path = HashSet::new();
        self.entry_inner(snap, shapes, cell, &mut path)
    }

    fn entry_inner(
        &self,
        snap: &dyn HierarchySnapshot,
        shapes: &dyn ShapeGenerator,
        cell: CellId,
        path: &mut HashSet<CellId>,
    ) -> Result<Arc<CellEntry>> {
        if !path.insert(cell) {
            return Err(MergeError::CycleDetected { cell });
        }
        let slot = {
            let mut map = match self.entries.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.entry((snap.stamp(), cell)).or_default().clone()
        };
        let res = slot
            .get_or_init(|| self.build(snap, shapes, cell, path))
            .clone();
        path.remove(&cell);
        res
    }

    fn build(
        &self,
        snap: &dyn HierarchySnapshot,
        shapes: &dyn ShapeGenerator,
        cell: CellId,
        path: &mut HashSet<CellId>,
    ) -> Result<Arc<CellEntry>> {
        let rev = snap.cell(cell).ok_or(MergeError::MissingCell { cell })?;
        let mut raw = Vec::new();
        shapes.shapes(cell, &mut raw);

        let mut entry = CellEntry {
            placements: rev.placements.clone(),
            parameterized: rev.parameterized,
            ..CellEntry::default()
        };
        for shape in raw {
            match shape {
                Shape::Rect { layer, rect } => {
                    if rect.is_degenerate() {
                        log::debug!("dropping degenerate rect on {layer:?} in {cell:?}");
                        continue;
                    }
                    entry.layers.insert(layer);
                    if rev.parameterized {
                        entry
                            .bad_layers
                            .entry(layer)
                            .or_insert(UnmergeableReason::ParameterizedCell);
                        continue;
                    }
                    entry.layer_boxes.entry(layer).or_default().push(rect);
                    *entry.rect_counts.entry(layer).or_insert(0) += 1;
                }
                Shape::Complex { layer, source, .. } => {
                    log::warn!(
                        "non-rectilinear shape from {source:?} makes {layer:?} unmergeable in {cell:?}"
                    );
                    entry.layers.insert(layer);
                    entry
                        .bad_layers
                        .entry(layer)
                        .or_insert(UnmergeableReason::NonRectilinearShape);
                }
            }
        }

        for p in &rev.placements {
            let child = self.entry_inner(snap, shapes, p.child, path)?;
            entry.layers.extend(child.layers.iter().copied());
            for (&layer, &reason) in &child.bad_layers {
                entry.bad_layers.entry(layer).or_insert(reason);
            }
            for (&layer, &n) in &child.rect_counts {
                let total = entry.rect_counts.entry(layer).or_insert(0);
                *total = total.saturating_add(n);
            }
        }
        Ok(Arc::new(entry))
    }
}
