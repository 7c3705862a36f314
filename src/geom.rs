// Copyright 2026 The layermerge developers
// License: MIT
//
// Integer geometry primitives: points, axis-aligned rectangles, the eight
// Manhattan placement orientations, and the opaque identifiers handed to us
// by the design database.
//
// Everything is exact fixed-grid integer arithmetic; no floating point is
// used anywhere in the merge pipeline, so results are bit-exact and
// independent of input order.

/// Opaque cell identifier supplied by the design database.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u32);

/// Opaque mask-layer identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

/// Opaque node-instance identifier within a cell revision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Opaque arc-instance (wire) identifier within a cell revision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArcId(pub u32);

/// Database generation stamp. Geometry caches are keyed by
/// `(SnapshotStamp, CellId)` so entries from a stale generation are never
/// reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotStamp(pub u64);

/// Inclusive bounds of the merge grid. Kept two bits inside i32 so that the
/// `(y << 1) | bit` delta wire encoding and the i32::MIN/MAX list sentinels
/// can never collide with real coordinates.
pub const GRID_MAX: i64 = (1 << 30) - 1;
pub const GRID_MIN: i64 = -(1 << 30);

/// Is `c` a legal merge-grid coordinate?
#[inline]
pub fn grid_ok(c: i64) -> bool {
    (GRID_MIN..=GRID_MAX).contains(&c)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned rectangle, `lx < hx && ly < hy`. Degenerate rectangles are
/// dropped at the source and never enter the pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub lx: i32,
    pub ly: i32,
    pub hx: i32,
    pub hy: i32,
}

impl Rect {
    #[inline]
    pub fn new(lx: i32, ly: i32, hx: i32, hy: i32) -> Self {
        Rect { lx, ly, hx, hy }
    }

    /// A rectangle is degenerate when either extent is empty.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.lx >= self.hx || self.ly >= self.hy
    }

    #[inline]
    pub fn area(&self) -> i64 {
        (self.hx as i64 - self.lx as i64) * (self.hy as i64 - self.ly as i64)
    }
}

// ─────────────────────────── Manhattan orientations ───────────────────────────

/// One of the eight symmetries of the square: four quarter-turn rotations,
/// each optionally preceded by a mirror about the x axis (y → −y).
///
/// `MY0` through `MY270` denote "mirror, then rotate by 0/90/180/270".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    R0,
    R90,
    R180,
    R270,
    MY0,
    MY90,
    MY180,
    MY270,
}

impl Orientation {
    /// Decompose into (mirror-first, quarter turns).
    #[inline]
    fn parts(self) -> (bool, u8) {
        match self {
            Orientation::R0 => (false, 0),
            Orientation::R90 => (false, 1),
            Orientation::R180 => (false, 2),
            Orientation::R270 => (false, 3),
            Orientation::MY0 => (true, 0),
            Orientation::MY90 => (true, 1),
            Orientation::MY180 => (true, 2),
            Orientation::MY270 => (true, 3),
        }
    }

    #[inline]
    fn from_parts(mirror: bool, rot: u8) -> Self {
        match (mirror, rot & 3) {
            (false, 0) => Orientation::R0,
            (false, 1) => Orientation::R90,
            (false, 2) => Orientation::R180,
            (false, _) => Orientation::R270,
            (true, 0) => Orientation::MY0,
            (true, 1) => Orientation::MY90,
            (true, 2) => Orientation::MY180,
            (true, _) => Orientation::MY270,
        }
    }

    /// Composition: the transform equal to applying `child` first, then
    /// `self`. Derived from `T(m,r) = Rot_r ∘ Mir_m` and the identity
    /// `Mir ∘ Rot_θ = Rot_−θ ∘ Mir`.
    pub fn compose(self, child: Orientation) -> Orientation {
        let (m1, r1) = self.parts();
        let (m2, r2) = child.parts();
        let r2 = if m1 { 4 - r2 } else { r2 };
        Orientation::from_parts(m1 ^ m2, (r1 + r2) & 3)
    }

    /// Apply to a point in i64 workspace. Wide arithmetic lets callers
    /// compose deep anchor chains before range-checking once.
    #[inline]
    pub fn apply(self, x: i64, y: i64) -> (i64, i64) {
        let (m, r) = self.parts();
        let (x, y) = if m { (x, -y) } else { (x, y) };
        match r {
            0 => (x, y),
            1 => (-y, x),
            2 => (-x, -y),
            _ => (y, -x),
        }
    }

    /// Transform a rectangle's bounds; the two transformed corners are
    /// re-normalized to low/high order.
    pub fn transform_rect(self, r: Rect) -> (i64, i64, i64, i64) {
        let (ax, ay) = self.apply(r.lx as i64, r.ly as i64);
        let (bx, by) = self.apply(r.hx as i64, r.hy as i64);
        (ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }
}
