// Copyright 2026 The layermerge developers
// License: MIT

//! Hierarchical Boolean merge of VLSI mask layers.
//!
//! A design is an instance hierarchy of cells placing rectangles on mask
//! layers. For each layer, `layermerge` computes the union of every
//! rectangle under a chosen top cell and returns it as closed rectilinear
//! outlines organized into a containment forest: outer boundaries hold
//! their holes as children, holes hold their islands, and so on.
//!
//! The pipeline is exact integer arithmetic end to end:
//!
//! 1. [`FlattenCache`](flatten::FlattenCache) resolves each cell of a
//!    snapshot once, caching its rectangles and subtree metadata.
//! 2. [`SweepMerge`](sweep::SweepMerge) sweeps the flattened rectangles
//!    left to right, reducing the union to a stream of per-column
//!    coverage toggles.
//! 3. The stream moves through a [`delta`] channel, in memory or spilled
//!    to a temporary file for very large layers.
//! 4. [`ContourBuilder`](contour::ContourBuilder) folds the stream back
//!    into nested polygon outlines.
//!
//! [`LayoutMerger`](merge::LayoutMerger) drives all four stages:
//!
//! ```no_run
//! use layermerge::LayoutMerger;
//! # fn demo(snapshot: &dyn layermerge::HierarchySnapshot,
//! #         shapes: &dyn layermerge::ShapeGenerator,
//! #         top: layermerge::CellId) -> layermerge::Result<()> {
//! let merger = LayoutMerger::new(snapshot, shapes, top)?;
//! for (layer, outcome) in merger.merge_all() {
//!     match outcome {
//!         Ok(forest) => println!("{layer:?}: {} polygons", forest.len()),
//!         Err(e) => eprintln!("{layer:?}: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod arena;
pub mod contour;
pub mod db;
pub mod delta;
pub mod error;
pub mod flatten;
pub mod geom;
pub mod merge;
pub mod sweep;

pub use contour::{ContourBuilder, PolygonTree};
pub use db::{CellRevision, HierarchySnapshot, Placement, Shape, ShapeGenerator, ShapeSource};
pub use delta::{DeltaRecord, DeltaSink, DeltaSource, DeltaToggle, MemoryChannel, SpillWriter};
pub use error::{MergeError, Result, UnmergeableReason};
pub use flatten::{CellEntry, FlattenCache};
pub use geom::{
    ArcId, CellId, LayerId, NodeId, Orientation, Point, Rect, SnapshotStamp, GRID_MAX, GRID_MIN,
};
pub use merge::{DeltaSweep, LayoutMerger, MergeEngine, MergeOptions};
pub use sweep::SweepMerge;
