// Copyright 2026 The layermerge developers
// License: MIT

mod helpers;

use helpers::{flat_design, total_area};
use layermerge::{LayerId, LayoutMerger, Rect};

const L: LayerId = LayerId(0);

fn merge(rects: &[Rect]) -> Vec<layermerge::PolygonTree> {
    let d = flat_design(0, rects);
    let m = LayoutMerger::new(&d, &d, layermerge::CellId(0)).unwrap();
    m.merge(L).unwrap()
}

#[test]
fn overlapping_squares_make_a_staircase() {
    let forest = merge(&[Rect::new(0, 0, 10, 10), Rect::new(5, 5, 15, 15)]);
    assert_eq!(forest.len(), 1);
    let poly = &forest[0];
    assert_eq!(poly.outline.len(), 8);
    assert_eq!(poly.signed_area2(), 350);
    assert_eq!(total_area(&forest), 175);
    assert!(poly.children.is_empty());
}

#[test]
fn abutting_rects_fuse_into_one_rectangle() {
    let forest = merge(&[Rect::new(0, 0, 10, 10), Rect::new(10, 0, 20, 10)]);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].outline.len(), 4);
    assert_eq!(forest[0].net_area(), 200);
}

#[test]
fn disjoint_rects_stay_separate() {
    let forest = merge(&[Rect::new(0, 0, 5, 5), Rect::new(10, 10, 15, 15)]);
    assert_eq!(forest.len(), 2);
    assert_eq!(total_area(&forest), 50);
}

#[test]
fn frame_produces_hole_with_clockwise_winding() {
    let forest = merge(&[
        Rect::new(0, 0, 20, 2),
        Rect::new(0, 18, 20, 20),
        Rect::new(0, 0, 2, 20),
        Rect::new(18, 0, 20, 20),
    ]);
    assert_eq!(forest.len(), 1);
    let outer = &forest[0];
    assert!(outer.signed_area2() > 0);
    assert_eq!(outer.children.len(), 1);
    let hole = &outer.children[0];
    assert!(hole.signed_area2() < 0);
    assert_eq!(hole.signed_area2() / 2, -(16 * 16));
    assert_eq!(outer.net_area(), 400 - 256);
}

#[test]
fn ten_square_with_inner_void() {
    // 10×10 coverage leaving [3,3]–[7,7] uncovered.
    let forest = merge(&[
        Rect::new(0, 0, 10, 3),
        Rect::new(0, 7, 10, 10),
        Rect::new(0, 0, 3, 10),
        Rect::new(7, 0, 10, 10),
    ]);
    assert_eq!(forest.len(), 1);
    let outer = &forest[0];
    assert_eq!(outer.outline.len(), 4);
    assert_eq!(outer.children.len(), 1);
    assert_eq!(outer.children[0].signed_area2(), -32);
    assert_eq!(outer.net_area(), 84);
}

#[test]
fn corner_touching_voids_make_two_holes() {
    // 20×20 plate leaving [5,5]–[10,10] and [10,10]–[15,15] uncovered.
    // The voids meet only at (10, 10): each must stay a simple 4-vertex
    // hole loop rather than fusing through the touch point.
    let forest = merge(&[
        Rect::new(0, 0, 20, 5),
        Rect::new(0, 5, 5, 10),
        Rect::new(10, 5, 20, 10),
        Rect::new(0, 10, 10, 15),
        Rect::new(15, 10, 20, 15),
        Rect::new(0, 15, 20, 20),
    ]);
    assert_eq!(forest.len(), 1);
    let outer = &forest[0];
    assert_eq!(outer.outline.len(), 4);
    assert_eq!(outer.children.len(), 2);
    for hole in &outer.children {
        assert_eq!(hole.outline.len(), 4);
        assert_eq!(hole.signed_area2(), -50);
        let mut verts = hole.outline.clone();
        verts.sort_by_key(|p| (p.x, p.y));
        verts.dedup();
        assert_eq!(verts.len(), 4);
    }
    assert_eq!(outer.net_area(), 350);
}

#[test]
fn island_inside_hole_nests_two_levels_deep() {
    let forest = merge(&[
        // 30×30 frame, 5 thick
        Rect::new(0, 0, 30, 5),
        Rect::new(0, 25, 30, 30),
        Rect::new(0, 0, 5, 30),
        Rect::new(25, 0, 30, 30),
        // island floating in the hole
        Rect::new(10, 10, 20, 20),
    ]);
    assert_eq!(forest.len(), 1);
    let outer = &forest[0];
    assert_eq!(outer.children.len(), 1);
    let hole = &outer.children[0];
    assert_eq!(hole.children.len(), 1);
    let island = &hole.children[0];
    assert!(island.signed_area2() > 0);
    assert!(island.children.is_empty());
    // 900 gross − 400 hole + 100 island
    assert_eq!(total_area(&forest), 600);
}

#[test]
fn corner_touching_squares_are_distinct_polygons() {
    let forest = merge(&[Rect::new(0, 0, 10, 10), Rect::new(10, 10, 20, 20)]);
    assert_eq!(forest.len(), 2);
    assert_eq!(total_area(&forest), 200);
}

#[test]
fn duplicate_geometry_merges_to_one_copy() {
    let r = Rect::new(3, 3, 9, 9);
    let forest = merge(&[r, r, r]);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].net_area(), 36);
}

#[test]
fn empty_layer_yields_empty_forest() {
    assert!(merge(&[]).is_empty());
}
