// Copyright 2026 The layermerge developers
// License: MIT
//
// Contour reconstruction: folds the column-ordered delta stream back into
// closed rectilinear outlines organized as a containment forest.
//
// While sweeping, the boundary of the merged region to the left of the
// current column is a set of open polylines ("chains") whose two endpoints
// both lie on the sweep line. Chain endpoints are kept in a y-sorted list;
// planarity guarantees the endpoint pairs are properly nested, which is
// what lets a plain stack recover direct containment when a loop closes.
//
// Each column's toggles mark where old and new coverage differ. Walking
// endpoints and toggles together in ascending y yields vertical boundary
// segments, and each segment is resolved by exactly one of four ops:
//   glue     both segment ends are new     → start a fresh chain
//   migrate  one end continues an endpoint → slide that endpoint
//   emit     both ends close one chain     → a finished polygon
//   cat      ends belong to two chains     → concatenate them
//
// Outer outlines are emitted counterclockwise (positive signed area,
// y up), holes clockwise.

use crate::arena::{Pool, INVALID};
use crate::delta::{DeltaRecord, DeltaSource};
use crate::error::{MergeError, Result};
use crate::geom::Point;

/// A closed rectilinear outline plus the outlines directly inside it.
/// Levels alternate: children of an outer boundary are holes, children of
/// a hole are islands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolygonTree {
    pub outline: Vec<Point>,
    pub children: Vec<PolygonTree>,
}

impl PolygonTree {
    /// Twice the signed shoelace area of the outline alone. Positive for
    /// outer boundaries, negative for holes.
    pub fn signed_area2(&self) -> i64 {
        let n = self.outline.len();
        let mut s = 0i64;
        for i in 0..n {
            let a = self.outline[i];
            let b = self.outline[(i + 1) % n];
            s += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        s
    }

    /// Covered area of this polygon with all nested holes and islands
    /// accounted for.
    pub fn net_area(&self) -> i64 {
        self.signed_area2().abs() / 2
            - self.children.iter().map(|c| c.net_area()).sum::<i64>()
    }
}

/// Outline vertex under construction. `link` is unordered adjacency: a
/// chain interior bead has two neighbors, a chain tip has one.
#[derive(Copy, Clone, Debug)]
struct Bead {
    x: i32,
    y: i32,
    link: [u32; 2],
}

/// A chain endpoint on the sweep line, kept in a y-sorted doubly linked
/// list between two sentinel ends. `slot` is this end's index in its
/// chain, `side` its parenthesis role: 0 opens the chain's span walking
/// upward, 1 closes it.
#[derive(Copy, Clone, Debug)]
struct End {
    y: i32,
    chain: u32,
    below: u32,
    above: u32,
    bead: u32,
    slot: u8,
    side: u8,
}

/// An open boundary polyline. Chain 0 is the virtual root whose children
/// collect the finished top-level polygons.
#[derive(Clone, Debug)]
struct Chain {
    ends: [u32; 2],
    children: Vec<PolygonTree>,
}

const ROOT: u32 = 0;

/// Lower attachment of the vertical boundary segment currently being
/// built on this column.
#[derive(Copy, Clone)]
enum Attach {
    /// An existing endpoint continues through the segment.
    Old(u32),
    /// The segment starts at a brand-new point at this y.
    Fresh(i32),
}

#[derive(Copy, Clone)]
struct Pending {
    lo: Attach,
    /// True when new coverage is present inside the segment and old
    /// coverage is not (material being added at this column).
    opening: bool,
}

#[inline]
fn malformed(x: i32, detail: &'static str) -> MergeError {
    MergeError::MalformedDeltaStream { x, detail }
}

pub struct ContourBuilder {
    beads: Pool<Bead>,
    ends: Pool<End>,
    chains: Pool<Chain>,
    bottom: u32,
    last_x: Option<i32>,
}

impl ContourBuilder {
    pub fn new() -> Self {
        let beads = Pool::new();
        let mut ends = Pool::new();
        let mut chains = Pool::new();
        let root = chains.alloc(Chain {
            ends: [INVALID; 2],
            children: Vec::new(),
        });
        debug_assert_eq!(root, ROOT);
        let bottom = ends.alloc(End {
            y: i32::MIN,
            chain: ROOT,
            below: INVALID,
            above: INVALID,
            bead: INVALID,
            slot: 0,
            side: 0,
        });
        let top = ends.alloc(End {
            y: i32::MAX,
            chain: ROOT,
            below: bottom,
            above: INVALID,
            bead: INVALID,
            slot: 1,
            side: 1,
        });
        ends[bottom].above = top;
        chains[ROOT].ends = [bottom, top];
        ContourBuilder {
            beads,
            ends,
            chains,
            bottom,
            last_x: None,
        }
    }

    /// Drain `src` into a fresh builder and return the containment forest.
    pub fn build(src: &mut dyn DeltaSource) -> Result<Vec<PolygonTree>> {
        let mut b = ContourBuilder::new();
        while let Some(rec) = src.next()? {
            b.column(&rec)?;
        }
        b.finish()
    }

    /// Apply one column of coverage toggles.
    pub fn column(&mut self, rec: &DeltaRecord) -> Result<()> {
        let x = rec.x;
        if let Some(lx) = self.last_x {
            if x <= lx {
                return Err(malformed(x, "columns not in ascending x order"));
            }
        }
        self.last_x = Some(x);

        let toggles = &rec.toggles;
        let mut t = 0usize;
        let mut cur = self.ends[self.bottom].above;
        // Coverage just below the current critical point, before (fcov)
        // and after (gcov) this column takes effect.
        let mut fcov = false;
        let mut gcov = false;
        let mut pending: Option<Pending> = None;
        let mut stack: Vec<u32> = Vec::new();
        let mut last_y = i32::MIN;

        while t < toggles.len() {
            let ey = toggles[t].y;
            if ey < last_y {
                return Err(malformed(x, "toggles not in ascending y order"));
            }
            if !crate::geom::grid_ok(ey as i64) {
                return Err(malformed(x, "toggle outside the merge grid"));
            }
            let ny = self.ends[cur].y;
            let y = ny.min(ey);
            last_y = y;
            let at_end = ny == y;

            let mut tsum = 0i32;
            if ey == y {
                while t < toggles.len() && toggles[t].y == y {
                    tsum += if toggles[t].rising { 1 } else { -1 };
                    t += 1;
                }
                if tsum == 0 {
                    continue;
                }
            }

            let old_step: i32 = if at_end {
                if fcov {
                    -1
                } else {
                    1
                }
            } else {
                0
            };
            let new_step = old_step + tsum;
            let consistent = match new_step {
                0 => true,
                1 => !gcov,
                -1 => gcov,
                _ => false,
            };
            if !consistent {
                return Err(malformed(x, "coverage step out of range"));
            }

            if old_step == 0 {
                // Pure toggle point: a segment boundary with no old
                // endpoint here.
                match pending.take() {
                    None => {
                        pending = Some(Pending {
                            lo: Attach::Fresh(y),
                            opening: new_step > 0,
                        })
                    }
                    Some(p) => self.resolve(x, p, Attach::Fresh(y), cur, &mut stack)?,
                }
            } else if new_step == 0 {
                // The old endpoint is absorbed into a segment.
                let e = cur;
                cur = self.ends[cur].above;
                match pending.take() {
                    None => {
                        pending = Some(Pending {
                            lo: Attach::Old(e),
                            opening: fcov && gcov,
                        })
                    }
                    Some(p) => self.resolve(x, p, Attach::Old(e), e, &mut stack)?,
                }
            } else if new_step == -old_step {
                // Double toggle at an endpoint: one segment closes here
                // and the next one opens.
                let e = cur;
                cur = self.ends[cur].above;
                let p = pending
                    .take()
                    .ok_or_else(|| malformed(x, "isolated double toggle"))?;
                if old_step > 0 {
                    // If the span below is bounded by old endpoints on
                    // both sides they close against each other; fusing
                    // `e` into the span above would thread one loop
                    // through the touch point.
                    match p.lo {
                        Attach::Old(_) => {
                            self.resolve(x, p, Attach::Old(e), e, &mut stack)?;
                            pending = Some(Pending {
                                lo: Attach::Fresh(y),
                                opening: false,
                            });
                        }
                        Attach::Fresh(_) => {
                            self.resolve(x, p, Attach::Fresh(y), e, &mut stack)?;
                            pending = Some(Pending {
                                lo: Attach::Old(e),
                                opening: false,
                            });
                        }
                    }
                } else {
                    self.resolve(x, p, Attach::Old(e), e, &mut stack)?;
                    pending = Some(Pending {
                        lo: Attach::Fresh(y),
                        opening: true,
                    });
                }
            } else {
                // Endpoint passed with no coverage change on this column.
                debug_assert_eq!(tsum, 0);
                let e = cur;
                cur = self.ends[cur].above;
                self.stack_op(x, e, &mut stack)?;
            }

            if old_step != 0 {
                fcov = !fcov;
            }
            if new_step != 0 {
                gcov = !gcov;
            }
        }

        if pending.is_some() {
            return Err(malformed(x, "column ended inside a boundary segment"));
        }
        Ok(())
    }

    /// All geometry must be closed when the stream ends.
    pub fn finish(mut self) -> Result<Vec<PolygonTree>> {
        if self.chains.live() != 1 {
            return Err(malformed(
                self.last_x.unwrap_or(0),
                "delta stream ended with open contours",
            ));
        }
        Ok(std::mem::take(&mut self.chains[ROOT].children))
    }

    // ─── segment resolution ───

    fn resolve(
        &mut self,
        x: i32,
        p: Pending,
        hi: Attach,
        anchor: u32,
        stack: &mut Vec<u32>,
    ) -> Result<()> {
        match (p.lo, hi) {
            (Attach::Fresh(a), Attach::Fresh(b)) => {
                self.glue(x, a, b, anchor);
                Ok(())
            }
            (Attach::Old(e), Attach::Fresh(b)) => self.migrate(x, e, b, stack),
            (Attach::Fresh(a), Attach::Old(e)) => self.migrate(x, e, a, stack),
            (Attach::Old(e1), Attach::Old(e2)) => self.join(x, e1, e2, p.opening, stack),
        }
    }

    /// Start a fresh chain spanning [a, b], inserted just below `before`
    /// in the endpoint list.
    fn glue(&mut self, x: i32, a: i32, b: i32, before: u32) {
        let chain = self.chains.alloc(Chain {
            ends: [INVALID; 2],
            children: Vec::new(),
        });
        let b_lo = self.beads.alloc(Bead { x, y: a, link: [INVALID; 2] });
        let b_hi = self.beads.alloc(Bead { x, y: b, link: [INVALID; 2] });
        self.link_beads(b_lo, b_hi);
        let below = self.ends[before].below;
        let e_lo = self.ends.alloc(End {
            y: a,
            chain,
            below,
            above: INVALID,
            bead: b_lo,
            slot: 0,
            side: 0,
        });
        let e_hi = self.ends.alloc(End {
            y: b,
            chain,
            below: e_lo,
            above: before,
            bead: b_hi,
            slot: 1,
            side: 1,
        });
        self.ends[e_lo].above = e_hi;
        self.ends[below].above = e_lo;
        self.ends[before].below = e_hi;
        self.chains[chain].ends = [e_lo, e_hi];
    }

    /// Slide endpoint `e` vertically to `to_y`, recording the two corner
    /// beads of the dogleg.
    fn migrate(&mut self, x: i32, e: u32, to_y: i32, stack: &mut Vec<u32>) -> Result<()> {
        let p = self.beads.alloc(Bead {
            x,
            y: self.ends[e].y,
            link: [INVALID; 2],
        });
        let q = self.beads.alloc(Bead {
            x,
            y: to_y,
            link: [INVALID; 2],
        });
        self.link_beads(self.ends[e].bead, p);
        self.link_beads(p, q);
        self.ends[e].bead = q;
        self.ends[e].y = to_y;
        self.stack_op(x, e, stack)
    }

    /// Connect endpoints `e1` (lower) and `e2` (upper) with a vertical
    /// edge: closes a polygon if they belong to one chain, concatenates
    /// two chains otherwise.
    fn join(&mut self, x: i32, e1: u32, e2: u32, opening: bool, stack: &mut Vec<u32>) -> Result<()> {
        let p = self.beads.alloc(Bead {
            x,
            y: self.ends[e1].y,
            link: [INVALID; 2],
        });
        self.link_beads(self.ends[e1].bead, p);
        let q = self.beads.alloc(Bead {
            x,
            y: self.ends[e2].y,
            link: [INVALID; 2],
        });
        self.link_beads(self.ends[e2].bead, q);
        self.link_beads(p, q);

        let c1 = self.ends[e1].chain;
        let c2 = self.ends[e2].chain;
        let sides = (self.ends[e1].side, self.ends[e2].side);

        if c1 == c2 {
            if sides != (0, 1) {
                return Err(malformed(x, "contour joins itself inside out"));
            }
            // A closing segment finishes an outer boundary, an opening
            // segment finishes a hole; the start direction pins winding.
            let outline = if opening {
                self.extract(q, p)
            } else {
                self.extract(p, q)
            };
            self.unlink_end(e1);
            self.unlink_end(e2);
            let children = std::mem::take(&mut self.chains[c1].children);
            self.chains.free(c1);
            let parent = stack.last().copied().unwrap_or(ROOT);
            self.chains[parent].children.push(PolygonTree { outline, children });
            return Ok(());
        }

        let s1 = self.chains[c1].ends[1 - self.ends[e1].slot as usize];
        let s2 = self.chains[c2].ends[1 - self.ends[e2].slot as usize];
        let (lo, hi) = match sides {
            // Surviving ends straddle the joined pair: spans merge and
            // the combined chain stays open across this height.
            (1, 0) => {
                if stack.last() != Some(&c1) {
                    return Err(malformed(x, "nested contours cross"));
                }
                (s1, s2)
            }
            // Both surviving ends lie below: both spans are closed here.
            (1, 1) => {
                if stack.pop() != Some(c1) || stack.pop() != Some(c2) {
                    return Err(malformed(x, "nested contours cross"));
                }
                self.ends[s1].side = 1;
                (s2, s1)
            }
            // Both surviving ends lie above.
            (0, 0) => {
                self.ends[s2].side = 0;
                (s2, s1)
            }
            _ => return Err(malformed(x, "nested contours cross")),
        };
        self.ends[lo].slot = 0;
        self.ends[hi].slot = 1;
        self.ends[s2].chain = c1;
        self.chains[c1].ends = [lo, hi];
        let mut kids = std::mem::take(&mut self.chains[c2].children);
        self.chains[c1].children.append(&mut kids);
        self.unlink_end(e1);
        self.unlink_end(e2);
        self.chains.free(c2);
        Ok(())
    }

    // ─── plumbing ───

    fn stack_op(&self, x: i32, e: u32, stack: &mut Vec<u32>) -> Result<()> {
        let chain = self.ends[e].chain;
        if self.ends[e].side == 0 {
            stack.push(chain);
            Ok(())
        } else if stack.pop() == Some(chain) {
            Ok(())
        } else {
            Err(malformed(x, "nested contours cross"))
        }
    }

    fn link_beads(&mut self, a: u32, b: u32) {
        let sa = if self.beads[a].link[0] == INVALID { 0 } else { 1 };
        debug_assert_eq!(self.beads[a].link[sa], INVALID);
        self.beads[a].link[sa] = b;
        let sb = if self.beads[b].link[0] == INVALID { 0 } else { 1 };
        debug_assert_eq!(self.beads[b].link[sb], INVALID);
        self.beads[b].link[sb] = a;
    }

    fn unlink_end(&mut self, e: u32) {
        let End { below, above, .. } = self.ends[e];
        self.ends[below].above = above;
        self.ends[above].below = below;
        self.ends.free(e);
    }

    /// Walk the completed bead cycle starting along `start → second`,
    /// collecting vertices and releasing the beads.
    fn extract(&mut self, start: u32, second: u32) -> Vec<Point> {
        let mut pts = Vec::new();
        let mut trail = Vec::new();
        let mut prev = start;
        let mut cur = second;
        pts.push(Point::new(self.beads[start].x, self.beads[start].y));
        trail.push(start);
        while cur != start {
            let b = self.beads[cur];
            pts.push(Point::new(b.x, b.y));
            trail.push(cur);
            let next = if b.link[0] == prev { b.link[1] } else { b.link[0] };
            prev = cur;
            cur = next;
        }
        for b in trail {
            self.beads.free(b);
        }
        pts
    }
}

impl Default for ContourBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::DeltaToggle;

    fn rec(x: i32, ts: &[(i32, bool)]) -> DeltaRecord {
        DeltaRecord {
            x,
            toggles: ts.iter().map(|&(y, rising)| DeltaToggle { y, rising }).collect(),
        }
    }

    #[test]
    fn square_is_counterclockwise() {
        let mut b = ContourBuilder::new();
        b.column(&rec(0, &[(0, true), (10, false)])).unwrap();
        b.column(&rec(10, &[(0, false), (10, true)])).unwrap();
        let forest = b.finish().unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].outline.len(), 4);
        assert_eq!(forest[0].signed_area2(), 200);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn hole_is_clockwise_child() {
        // 20×20 plate with a hole from y ∈ [5, 15] opening at x = 5 and
        // closing at x = 15.
        let mut b = ContourBuilder::new();
        b.column(&rec(0, &[(0, true), (20, false)])).unwrap();
        b.column(&rec(5, &[(5, false), (15, true)])).unwrap();
        b.column(&rec(15, &[(5, true), (15, false)])).unwrap();
        b.column(&rec(20, &[(0, false), (20, true)])).unwrap();
        let forest = b.finish().unwrap();
        assert_eq!(forest.len(), 1);
        let outer = &forest[0];
        assert!(outer.signed_area2() > 0);
        assert_eq!(outer.children.len(), 1);
        let hole = &outer.children[0];
        assert!(hole.signed_area2() < 0);
        assert_eq!(hole.signed_area2(), -200);
        assert_eq!(outer.net_area(), 400 - 100);
    }

    #[test]
    fn corner_touch_gives_two_roots() {
        let mut b = ContourBuilder::new();
        b.column(&rec(0, &[(0, true), (10, false)])).unwrap();
        b.column(&rec(10, &[(0, false), (10, true), (10, true), (20, false)]))
            .unwrap();
        b.column(&rec(20, &[(10, false), (20, true)])).unwrap();
        let forest = b.finish().unwrap();
        assert_eq!(forest.len(), 2);
        for t in &forest {
            assert_eq!(t.signed_area2(), 200);
        }
    }

    #[test]
    fn corner_touching_holes_stay_separate() {
        // 20×20 plate leaving [5,5,10,10] and [10,10,15,15] uncovered;
        // the voids meet at (10, 10) and must come back as two simple
        // hole loops, not one loop threaded through the touch point.
        let mut b = ContourBuilder::new();
        b.column(&rec(0, &[(0, true), (20, false)])).unwrap();
        b.column(&rec(5, &[(5, false), (10, true)])).unwrap();
        b.column(&rec(10, &[(5, true), (10, false), (10, false), (15, true)]))
            .unwrap();
        b.column(&rec(15, &[(10, true), (15, false)])).unwrap();
        b.column(&rec(20, &[(0, false), (20, true)])).unwrap();
        let forest = b.finish().unwrap();
        assert_eq!(forest.len(), 1);
        let outer = &forest[0];
        assert_eq!(outer.children.len(), 2);
        for hole in &outer.children {
            assert_eq!(hole.outline.len(), 4);
            assert_eq!(hole.signed_area2(), -50);
        }
        assert_eq!(outer.net_area(), 400 - 50);
    }

    #[test]
    fn open_contour_is_malformed() {
        let mut b = ContourBuilder::new();
        b.column(&rec(0, &[(0, true), (10, false)])).unwrap();
        assert!(matches!(
            b.finish(),
            Err(MergeError::MalformedDeltaStream { .. })
        ));
    }

    #[test]
    fn columns_must_ascend() {
        let mut b = ContourBuilder::new();
        b.column(&rec(5, &[(0, true), (10, false)])).unwrap();
        assert!(matches!(
            b.column(&rec(5, &[(0, false), (10, true)])),
            Err(MergeError::MalformedDeltaStream { .. })
        ));
    }

    #[test]
    fn lone_toggle_is_malformed() {
        let mut b = ContourBuilder::new();
        assert!(matches!(
            b.column(&rec(0, &[(0, true)])),
            Err(MergeError::MalformedDeltaStream { .. })
        ));
    }

    #[test]
    fn net_area_alternates_levels() {
        let island = PolygonTree {
            outline: vec![
                Point::new(8, 8),
                Point::new(12, 8),
                Point::new(12, 12),
                Point::new(8, 12),
            ],
            children: Vec::new(),
        };
        let hole = PolygonTree {
            outline: vec![
                Point::new(5, 5),
                Point::new(5, 15),
                Point::new(15, 15),
                Point::new(15, 5),
            ],
            children: vec![island],
        };
        let outer = PolygonTree {
            outline: vec![
                Point::new(0, 0),
                Point::new(20, 0),
                Point::new(20, 20),
                Point::new(0, 20),
            ],
            children: vec![hole],
        };
        assert_eq!(outer.net_area(), 400 - 100 + 16);
    }
}
