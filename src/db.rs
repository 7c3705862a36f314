// Copyright 2026 The layermerge developers
// License: MIT
//
// The seam between the merge engine and the design database. The engine
// never owns design data; it reads an immutable snapshot through these two
// traits and a handful of plain-data records.

use crate::geom::{ArcId, CellId, LayerId, NodeId, Orientation, Rect, SnapshotStamp};

/// One child-cell instance inside a cell revision.
#[derive(Copy, Clone, Debug)]
pub struct Placement {
    pub child: CellId,
    pub orient: Orientation,
    /// Anchor offset in parent coordinates.
    pub dx: i32,
    pub dy: i32,
}

/// The geometry source an atomic shape came from. Used only for reporting;
/// the merge itself is source-blind.
#[derive(Copy, Clone, Debug)]
pub enum ShapeSource {
    Node(NodeId),
    Arc(ArcId),
}

/// An atomic shape produced for a cell. Anything that is not an
/// axis-aligned rectangle poisons its layer for the whole merge.
#[derive(Clone, Debug)]
pub enum Shape {
    Rect { layer: LayerId, rect: Rect },
    /// Non-rectilinear geometry (polygon outline in cell coordinates).
    /// Recorded so the layer can be reported unmergeable with a cause.
    Complex {
        layer: LayerId,
        source: ShapeSource,
        points: Vec<crate::geom::Point>,
    },
}

/// Immutable view of one cell at a fixed snapshot generation.
#[derive(Clone, Debug, Default)]
pub struct CellRevision {
    pub placements: Vec<Placement>,
    /// Cell takes parameters that alter its own geometry (attribute
    /// evaluation or exports inheriting from the parent).
    pub parameterized: bool,
}

/// Read access to the frozen design hierarchy.
///
/// Implementations must be consistent for the lifetime of a merge: the same
/// stamp always yields the same revisions. `Sync` because flattening may be
/// driven from several threads against one shared cache.
pub trait HierarchySnapshot: Sync {
    /// Generation stamp of this snapshot.
    fn stamp(&self) -> SnapshotStamp;

    /// The revision of `cell`, or `None` if the snapshot has no such cell.
    fn cell(&self, cell: CellId) -> Option<CellRevision>;
}

/// Produces the atomic shapes of a single cell, excluding subcells.
///
/// The generator is invoked at most once per `(stamp, cell)` thanks to the
/// flatten cache; it may be arbitrarily expensive.
pub trait ShapeGenerator: Sync {
    fn shapes(&self, cell: CellId, out: &mut Vec<Shape>);
}
