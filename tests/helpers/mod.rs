// Copyright 2026 The layermerge developers
// License: MIT
//
// Shared fixtures for integration tests: an in-memory design database and
// a few geometry checks.

#![allow(dead_code)]

use std::collections::HashMap;

use layermerge::{
    CellId, CellRevision, HierarchySnapshot, LayerId, Orientation, Placement, PolygonTree, Rect,
    Shape, ShapeGenerator, SnapshotStamp,
};

/// A design held entirely in maps; doubles as snapshot and shape source.
#[derive(Default)]
pub struct Design {
    pub cells: HashMap<CellId, CellRevision>,
    pub shapes: HashMap<CellId, Vec<Shape>>,
    pub stamp: u64,
}

impl Design {
    pub fn add_cell(&mut self, id: u32, placements: Vec<Placement>, shapes: Vec<Shape>) {
        self.cells.insert(
            CellId(id),
            CellRevision {
                placements,
                parameterized: false,
            },
        );
        self.shapes.insert(CellId(id), shapes);
    }

    pub fn add_parameterized(&mut self, id: u32, shapes: Vec<Shape>) {
        self.cells.insert(
            CellId(id),
            CellRevision {
                placements: Vec::new(),
                parameterized: true,
            },
        );
        self.shapes.insert(CellId(id), shapes);
    }
}

impl HierarchySnapshot for Design {
    fn stamp(&self) -> SnapshotStamp {
        SnapshotStamp(self.stamp)
    }
    fn cell(&self, cell: CellId) -> Option<CellRevision> {
        self.cells.get(&cell).cloned()
    }
}

impl ShapeGenerator for Design {
    fn shapes(&self, cell: CellId, out: &mut Vec<Shape>) {
        if let Some(s) = self.shapes.get(&cell) {
            out.extend(s.iter().cloned());
        }
    }
}

pub fn rect(layer: u32, lx: i32, ly: i32, hx: i32, hy: i32) -> Shape {
    Shape::Rect {
        layer: LayerId(layer),
        rect: Rect::new(lx, ly, hx, hy),
    }
}

pub fn place(child: u32, orient: Orientation, dx: i32, dy: i32) -> Placement {
    Placement {
        child: CellId(child),
        orient,
        dx,
        dy,
    }
}

/// Single-cell design: every rectangle lives directly in cell 0.
pub fn flat_design(layer: u32, rects: &[Rect]) -> Design {
    let mut d = Design::default();
    let shapes = rects
        .iter()
        .map(|r| Shape::Rect {
            layer: LayerId(layer),
            rect: *r,
        })
        .collect();
    d.add_cell(0, Vec::new(), shapes);
    d
}

/// Canonical form for forest comparison: each outline rotated to start at
/// its lexicographically smallest vertex, children sorted by that vertex.
pub fn normalize(forest: &mut Vec<PolygonTree>) {
    for t in forest.iter_mut() {
        let min = t
            .outline
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.x, p.y))
            .map(|(i, _)| i)
            .unwrap_or(0);
        t.outline.rotate_left(min);
        normalize(&mut t.children);
    }
    forest.sort_by_key(|t| t.outline.first().map(|p| (p.x, p.y)));
}

pub fn total_area(forest: &[PolygonTree]) -> i64 {
    forest.iter().map(|t| t.net_area()).sum()
}

/// Even-odd point test against the whole forest, in doubled coordinates
/// so grid-cell centers never sit on an edge.
pub fn forest_covers(forest: &[PolygonTree], px2: i64, py2: i64) -> bool {
    fn crossings(t: &PolygonTree, px2: i64, py2: i64, n: &mut u32) {
        let len = t.outline.len();
        for i in 0..len {
            let a = t.outline[i];
            let b = t.outline[(i + 1) % len];
            if a.x == b.x {
                let x2 = 2 * a.x as i64;
                let lo = 2 * a.y.min(b.y) as i64;
                let hi = 2 * a.y.max(b.y) as i64;
                if x2 > px2 && lo < py2 && py2 < hi {
                    *n += 1;
                }
            }
        }
        for c in &t.children {
            crossings(c, px2, py2, n);
        }
    }
    let mut n = 0;
    for t in forest {
        crossings(t, px2, py2, &mut n);
    }
    n % 2 == 1
}
