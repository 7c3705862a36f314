// Copyright 2026 The layermerge developers
// License: MIT
//
// Error taxonomy of the merge pipeline. Errors are `Clone` so a failure
// cached during hierarchy flattening can be replayed to every caller that
// asks for the same cell, which means I/O errors are carried behind an `Arc`.

use std::io;
use std::sync::Arc;

use crate::geom::{CellId, LayerId};

/// Why a layer cannot be merged at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnmergeableReason {
    /// Geometry on this layer comes from a parameterized cell whose shapes
    /// depend on evaluation context.
    ParameterizedCell,
    /// The layer carries a shape that is not an axis-aligned rectangle.
    NonRectilinearShape,
}

impl std::fmt::Display for UnmergeableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnmergeableReason::ParameterizedCell => write!(f, "parameterized cell"),
            UnmergeableReason::NonRectilinearShape => write!(f, "non-rectilinear shape"),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum MergeError {
    /// A transformed coordinate left the merge grid.
    #[error("coordinate {value} out of grid range in cell {cell:?}, layer {layer:?}")]
    CoordinateOverflow {
        cell: CellId,
        layer: LayerId,
        value: i64,
    },

    /// The instance graph contains a cycle through this cell.
    #[error("instance cycle detected through cell {cell:?}")]
    CycleDetected { cell: CellId },

    /// A placement references a cell the snapshot does not contain.
    #[error("placement references missing cell {cell:?}")]
    MissingCell { cell: CellId },

    /// The layer is structurally impossible to merge.
    #[error("layer {layer:?} is unmergeable: {reason}")]
    Unmergeable {
        layer: LayerId,
        reason: UnmergeableReason,
    },

    /// The delta stream violated its own invariants; `x` is the sweep
    /// column where the violation was noticed.
    #[error("malformed delta stream at x={x}: {detail}")]
    MalformedDeltaStream { x: i32, detail: &'static str },

    /// Spill file I/O failed.
    #[error("delta spill I/O error: {0}")]
    StorageIO(#[source] Arc<io::Error>),
}

impl From<io::Error> for MergeError {
    fn from(e: io::Error) -> Self {
        MergeError::StorageIO(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
