//! No-fit-polygon engine (component N).
//!
//! Implements the orbiting NFP algorithm (Burke/Qiao algorithm 8 as wired
//! up by the original SvgNest `noFitPolygon`), its rectangle special case,
//! and the convex Minkowski-difference fallback used when the orbit fails
//! to close (spec §4.3.3). All functions work on already-rotated,
//! unpositioned point slices; placement offsets are applied by the caller.

use std::collections::HashSet;

use crate::boolean;
use crate::error::{NestError, Result};
use crate::geometry::{self, Point, PointPosition};

/// Identifies one cached no-fit-polygon: which two parts (by id, `-1` for
/// the bin), whether it's an inner or outer NFP, and at which discretized
/// rotations. Rotation is stored in millidegrees so the key can derive
/// `Eq`/`Hash` without floating point comparison pitfalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NfpKey {
    pub a_id: i64,
    pub b_id: i64,
    pub inside: bool,
    a_rotation_millideg: i64,
    b_rotation_millideg: i64,
}

impl NfpKey {
    pub fn a_rotation(&self) -> f64 {
        self.a_rotation_millideg as f64 / 1000.0
    }

    pub fn b_rotation(&self) -> f64 {
        self.b_rotation_millideg as f64 / 1000.0
    }

    pub fn new(a_id: i64, b_id: i64, inside: bool, a_rotation: f64, b_rotation: f64) -> Self {
        NfpKey {
            a_id,
            b_id,
            inside,
            a_rotation_millideg: (a_rotation * 1000.0).round() as i64,
            b_rotation_millideg: (b_rotation * 1000.0).round() as i64,
        }
    }
}

/// A cached no-fit-polygon: one or more simple polygon contours (the orbit
/// can split a concave inner NFP into disjoint reachable regions).
pub type NfpValue = Vec<Vec<Point>>;

/// Exact no-fit-polygon for two axis-independent rectangles (spec §4.3.1):
/// translating `B`'s bounding box to slide around inside/outside `A`'s.
pub fn no_fit_polygon_rectangle(a: &[Point], b: &[Point]) -> Option<NfpValue> {
    let ab = geometry::get_polygon_bounds(a)?;
    let bb = geometry::get_polygon_bounds(b)?;

    if bb.width > ab.width || bb.height > ab.height {
        return None;
    }

    let min_ax = ab.x;
    let min_ay = ab.y;
    let max_ax = ab.x + ab.width;
    let max_ay = ab.y + ab.height;

    let min_bx = bb.x;
    let min_by = bb.y;
    let max_bx = bb.x + bb.width;
    let max_by = bb.y + bb.height;

    let b0 = b[0];

    Some(vec![vec![
        Point::new(min_ax - min_bx + b0.x, min_ay - min_by + b0.y),
        Point::new(max_ax - max_bx + b0.x, min_ay - min_by + b0.y),
        Point::new(max_ax - max_bx + b0.x, max_ay - max_by + b0.y),
        Point::new(min_ax - min_bx + b0.x, max_ay - max_by + b0.y),
    ]])
}

fn close_loop(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    if pts.first() != pts.last() {
        pts.push(pts[0]);
    }
    pts
}

/// Coincidence of `(offset_point, nfp_point)` for `inNfp`'s "already have a
/// start point at this location" check.
fn in_nfp(point: Point, nfp: &[Vec<Point>]) -> bool {
    for contour in nfp {
        for p in contour {
            if geometry::almost_equal(p.x, point.x) && geometry::almost_equal(p.y, point.y) {
                return true;
            }
        }
    }
    false
}

/// Finds the next place to restart the orbit after a loop closes: slides
/// `B` along each unmarked edge of `A` until it's inside/outside (per
/// `inside`) and non-overlapping, skipping positions already present in
/// `nfp` (spec §4.3.4).
pub fn search_start_point(
    a: &[Point],
    b: &[Point],
    inside: bool,
    nfp: &[Vec<Point>],
    marked_a: &mut [bool],
) -> Option<Point> {
    let a_closed = close_loop(a);
    let b_closed = close_loop(b);

    for i in 0..a_closed.len() - 1 {
        if marked_a[i % marked_a.len()] {
            continue;
        }
        marked_a[i % marked_a.len()] = true;

        for j in 0..b_closed.len() {
            let offsetx = a_closed[i].x - b_closed[j].x;
            let offsety = a_closed[i].y - b_closed[j].y;

            let mut b_inside: Option<bool> = None;
            for bp in &b_closed {
                let shifted = Point::new(bp.x + offsetx, bp.y + offsety);
                match geometry::point_in_polygon(shifted, &a_closed) {
                    PointPosition::Inside => {
                        b_inside = Some(true);
                        break;
                    }
                    PointPosition::Outside => {
                        b_inside = Some(false);
                        break;
                    }
                    PointPosition::OnBoundary => continue,
                }
            }

            let b_inside = match b_inside {
                Some(v) => v,
                None => return None,
            };

            let start_point = Point::new(offsetx, offsety);
            let shifted_b: Vec<Point> = geometry::translate(&b_closed, offsetx, offsety);

            if (b_inside == inside) && !geometry::polygons_intersect(&a_closed, &shifted_b) && !in_nfp(start_point, nfp) {
                return Some(start_point);
            }

            let mut vx = a_closed[i + 1].x - a_closed[i].x;
            let mut vy = a_closed[i + 1].y - a_closed[i].y;

            let d1 = geometry::polygon_projection_distance(&a_closed, &shifted_b, Point::new(vx, vy));
            let d2 = geometry::polygon_projection_distance(&shifted_b, &a_closed, Point::new(-vx, -vy));

            let d = match (d1, d2) {
                (None, None) => None,
                (Some(v), None) => Some(v),
                (None, Some(v)) => Some(v),
                (Some(a), Some(b)) => Some(a.min(b)),
            };

            let d = match d {
                Some(d) if d > 0.0 && !geometry::almost_equal(d, 0.0) => d,
                _ => continue,
            };

            let vd2 = vx * vx + vy * vy;
            if d * d < vd2 && !geometry::almost_equal(d * d, vd2) {
                let vd = vd2.sqrt();
                vx *= d / vd;
                vy *= d / vd;
            }

            let offsetx = offsetx + vx;
            let offsety = offsety + vy;

            let mut b_inside: Option<bool> = None;
            for bp in &b_closed {
                let shifted = Point::new(bp.x + offsetx, bp.y + offsety);
                match geometry::point_in_polygon(shifted, &a_closed) {
                    PointPosition::Inside => {
                        b_inside = Some(true);
                        break;
                    }
                    PointPosition::Outside => {
                        b_inside = Some(false);
                        break;
                    }
                    PointPosition::OnBoundary => continue,
                }
            }
            let b_inside = b_inside.unwrap_or(false);

            let start_point = Point::new(offsetx, offsety);
            let shifted_b: Vec<Point> = geometry::translate(&b_closed, offsetx, offsety);

            if (b_inside == inside) && !geometry::polygons_intersect(&a_closed, &shifted_b) && !in_nfp(start_point, nfp) {
                return Some(start_point);
            }
        }
    }

    None
}

#[derive(Clone, Copy)]
struct Candidate {
    v: Point,
    start_a: Option<usize>,
    end_a: Option<usize>,
}

/// Orbits `B` around `A` (or inside `A`, when `inside` is true) tracing
/// the no-fit-polygon one touching-vertex step at a time. `search_edges`
/// additionally restarts the orbit from every unreached edge of `A` to
/// recover the disjoint regions a concave inner NFP can have (spec
/// §4.3.2, §4.3.4).
pub fn no_fit_polygon(a: &[Point], b: &[Point], inside: bool, search_edges: bool) -> Option<NfpValue> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let mut marked_a = vec![false; a.len()];

    let mut min_a_index = 0;
    let mut min_a = a[0].y;
    for (i, p) in a.iter().enumerate() {
        if p.y < min_a {
            min_a = p.y;
            min_a_index = i;
        }
    }

    let mut max_b_index = 0;
    let mut max_b = b[0].y;
    for (i, p) in b.iter().enumerate() {
        if p.y > max_b {
            max_b = p.y;
            max_b_index = i;
        }
    }

    let mut start_point = if !inside {
        Some(Point::new(a[min_a_index].x - b[max_b_index].x, a[min_a_index].y - b[max_b_index].y))
    } else {
        search_start_point(a, b, true, &[], &mut marked_a)
    };

    let mut nfp_list: NfpValue = Vec::new();

    while let Some(sp) = start_point {
        let mut offsetx = sp.x;
        let mut offsety = sp.y;

        let mut prevvector: Option<Point> = None;
        let mut nfp = vec![Point::new(b[0].x + offsetx, b[0].y + offsety)];

        let mut referencex = b[0].x + offsetx;
        let mut referencey = b[0].y + offsety;
        let startx = referencex;
        let starty = referencey;
        let mut counter = 0usize;
        let max_counter = 10 * (a.len() + b.len());
        let mut closed = true;

        while counter < max_counter {
            let mut touching: Vec<(u8, usize, usize)> = Vec::new();

            for i in 0..a.len() {
                let nexti = if i == a.len() - 1 { 0 } else { i + 1 };
                for j in 0..b.len() {
                    let nextj = if j == b.len() - 1 { 0 } else { j + 1 };
                    let bj = Point::new(b[j].x + offsetx, b[j].y + offsety);
                    let bnextj = Point::new(b[nextj].x + offsetx, b[nextj].y + offsety);

                    if geometry::almost_equal(a[i].x, bj.x) && geometry::almost_equal(a[i].y, bj.y) {
                        touching.push((0, i, j));
                    } else if geometry::on_segment(a[i], a[nexti], bj) {
                        touching.push((1, nexti, j));
                    } else if geometry::on_segment(bj, bnextj, a[i]) {
                        touching.push((2, i, nextj));
                    }
                }
            }

            let mut vectors: Vec<Candidate> = Vec::new();

            for &(ttype, ai, bi) in &touching {
                marked_a[ai] = true;

                let prev_a_idx = if ai == 0 { a.len() - 1 } else { ai - 1 };
                let next_a_idx = if ai + 1 >= a.len() { 0 } else { ai + 1 };
                let prev_b_idx = if bi == 0 { b.len() - 1 } else { bi - 1 };
                let next_b_idx = if bi + 1 >= b.len() { 0 } else { bi + 1 };

                let vertex_a = a[ai];
                let prev_a = a[prev_a_idx];
                let next_a = a[next_a_idx];
                let vertex_b = b[bi];
                let prev_b = b[prev_b_idx];
                let next_b = b[next_b_idx];

                match ttype {
                    0 => {
                        vectors.push(Candidate {
                            v: prev_a - vertex_a,
                            start_a: Some(ai),
                            end_a: Some(prev_a_idx),
                        });
                        vectors.push(Candidate {
                            v: next_a - vertex_a,
                            start_a: Some(ai),
                            end_a: Some(next_a_idx),
                        });
                        vectors.push(Candidate {
                            v: vertex_b - prev_b,
                            start_a: None,
                            end_a: None,
                        });
                        vectors.push(Candidate {
                            v: vertex_b - next_b,
                            start_a: None,
                            end_a: None,
                        });
                    }
                    1 => {
                        let bj_off = Point::new(vertex_b.x + offsetx, vertex_b.y + offsety);
                        vectors.push(Candidate {
                            v: vertex_a - bj_off,
                            start_a: Some(prev_a_idx),
                            end_a: Some(ai),
                        });
                        vectors.push(Candidate {
                            v: prev_a - bj_off,
                            start_a: Some(ai),
                            end_a: Some(prev_a_idx),
                        });
                    }
                    _ => {
                        let bj_off = Point::new(vertex_b.x + offsetx, vertex_b.y + offsety);
                        let prev_b_off = Point::new(prev_b.x + offsetx, prev_b.y + offsety);
                        vectors.push(Candidate {
                            v: vertex_a - bj_off,
                            start_a: None,
                            end_a: None,
                        });
                        vectors.push(Candidate {
                            v: vertex_a - prev_b_off,
                            start_a: None,
                            end_a: None,
                        });
                    }
                }
            }

            let mut translate: Option<Candidate> = None;
            let mut maxd = 0.0f64;

            for cand in &vectors {
                if geometry::almost_equal(cand.v.x, 0.0) && geometry::almost_equal(cand.v.y, 0.0) {
                    continue;
                }

                if let Some(pv) = prevvector {
                    if cand.v.y * pv.y + cand.v.x * pv.x < 0.0 {
                        let vlen = (cand.v.x * cand.v.x + cand.v.y * cand.v.y).sqrt();
                        let unitv = Point::new(cand.v.x / vlen, cand.v.y / vlen);
                        let plen = (pv.x * pv.x + pv.y * pv.y).sqrt();
                        let punit = Point::new(pv.x / plen, pv.y / plen);
                        if (unitv.y * punit.x - unitv.x * punit.y).abs() < 0.0001 {
                            continue;
                        }
                    }
                }

                let vecd2 = cand.v.x * cand.v.x + cand.v.y * cand.v.y;
                let mut d = geometry::polygon_slide_distance(a, b, cand.v, false);

                if d.is_none() || d.unwrap() * d.unwrap() > vecd2 {
                    d = Some(vecd2.sqrt());
                }

                if let Some(dv) = d {
                    if dv > maxd {
                        maxd = dv;
                        translate = Some(*cand);
                    }
                }
            }

            let translate = match translate {
                Some(t) if !geometry::almost_equal(maxd, 0.0) => t,
                _ => {
                    closed = false;
                    break;
                }
            };

            if let Some(idx) = translate.start_a {
                marked_a[idx] = true;
            }
            if let Some(idx) = translate.end_a {
                marked_a[idx] = true;
            }

            prevvector = Some(translate.v);

            let mut tv = translate.v;
            let vlength2 = tv.x * tv.x + tv.y * tv.y;
            if maxd * maxd < vlength2 && !geometry::almost_equal(maxd * maxd, vlength2) {
                let scale = (maxd * maxd / vlength2).sqrt();
                tv.x *= scale;
                tv.y *= scale;
            }

            referencex += tv.x;
            referencey += tv.y;

            if geometry::almost_equal(referencex, startx) && geometry::almost_equal(referencey, starty) {
                break;
            }

            let looped = nfp[..nfp.len().saturating_sub(0)]
                .iter()
                .take(nfp.len().saturating_sub(1).max(0))
                .any(|p| geometry::almost_equal(referencex, p.x) && geometry::almost_equal(referencey, p.y));
            if looped {
                break;
            }

            nfp.push(Point::new(referencex, referencey));

            offsetx += tv.x;
            offsety += tv.y;

            counter += 1;
        }

        if counter >= max_counter {
            // hit the sanity bound (spec §4.3.2 step 7) without the orbit
            // closing; this contour never terminated, discard it rather
            // than accept a partial trace.
            closed = false;
        }

        if closed && !nfp.is_empty() {
            nfp_list.push(nfp);
        }

        if !search_edges {
            break;
        }

        start_point = search_start_point(a, b, inside, &nfp_list, &mut marked_a);
    }

    if nfp_list.is_empty() {
        None
    } else {
        Some(nfp_list)
    }
}

/// Minkowski-difference fallback (spec §4.3.3): used when the orbit
/// declines to run (degenerate touching sets) or purely as the fast path
/// for convex parts. Computed as the convex hull of `A ⊕ (-B)`, then
/// shifted by `B`'s first vertex to match the NFP's reference-point
/// convention. See SPEC_FULL.md §5.2 for the corrected largest-area
/// tie-break (the original implementation's comparison is backwards).
pub fn minkowski_difference(a: &[Point], b: &[Point]) -> Result<Vec<Point>> {
    if a.len() < 3 || b.len() < 3 {
        return Err(NestError::DegenerateInput);
    }

    let candidate = boolean::minkowski_difference_convex(a, b);
    if candidate.len() < 3 {
        return Err(NestError::NfpSanity);
    }

    let b0 = b[0];
    Ok(geometry::translate(&candidate, b0.x, b0.y))
}

/// Outer-NFP post-processing (spec §4.3.2): sanity-checks the raw orbit
/// output against `A`'s own area, normalizes the outer contour's winding,
/// and flips any secondary contour whose first vertex lands inside the
/// outer contour into the hole winding convention. Mirrors the original
/// `p_map` worker's `nfp[i].reverse()` passes, which ran in this same
/// order: sanity check first (on the still-unnormalized orbit output),
/// then winding.
fn postprocess_outer_nfp(nfp: NfpValue, a: &[Point], search_edges: bool) -> Result<NfpValue> {
    let area_a = geometry::polygon_area(a).abs();
    for (i, contour) in nfp.iter().enumerate() {
        // with search_edges on, only the first (largest) contour is
        // guaranteed to enclose an area comparable to A; the rest may be
        // legitimately small disjoint regions.
        if (!search_edges || i == 0) && geometry::polygon_area(contour).abs() < area_a {
            return Err(NestError::NfpSanity);
        }
    }

    let mut nfp = nfp;
    for contour in nfp.iter_mut() {
        if geometry::polygon_area(contour) > 0.0 {
            contour.reverse();
        }
    }

    // the first contour is guaranteed to be the outer boundary; any later
    // contour whose first vertex lies inside it is a hole, and holes take
    // the opposite winding.
    for i in 1..nfp.len() {
        let first = nfp[i][0];
        if geometry::point_in_polygon(first, &nfp[0]) == PointPosition::Inside
            && geometry::polygon_area(&nfp[i]) < 0.0
        {
            nfp[i].reverse();
        }
    }

    Ok(nfp)
}

/// Computes the outer no-fit-polygon of `b` around `a`: rectangle special
/// case when applicable, otherwise the orbiting algorithm, falling back
/// to the Minkowski difference if the orbit fails to close. `search_edges`
/// (wired to `NestConfig::explore_concave`) makes the orbit additionally
/// restart from every unreached edge of `a`, recovering regions a single
/// orbit would miss for concave parts.
pub fn outer_nfp(
    a: &[Point],
    b: &[Point],
    spacing: f64,
    curve_tolerance: f64,
    clipper_scale: f64,
    search_edges: bool,
) -> Result<NfpValue> {
    if a.len() < 3 || b.len() < 3 {
        return Err(NestError::DegenerateInput);
    }

    // `no_fit_polygon_rectangle` is the inner-fit shortcut (spec §4.3.1:
    // translations of B's reference vertex that keep B inside A) — it has
    // no outer-NFP analog, so the outer path always orbits or falls back
    // to Minkowski difference, matching the original `p_map` worker.
    let mut nfp = no_fit_polygon(a, b, false, search_edges);

    if nfp.is_none() {
        log::warn!("orbiting outer NFP failed to close, falling back to Minkowski difference");
        nfp = minkowski_difference(a, b).ok().map(|c| vec![c]);
    }

    let nfp = nfp.ok_or(NestError::NfpSanity)?;
    let mut nfp = postprocess_outer_nfp(nfp, a, search_edges)?;

    if spacing.abs() > geometry::TOL {
        let clean_dist = curve_tolerance * clipper_scale;
        let mut expanded = Vec::new();
        for contour in &nfp {
            if let Ok(offsets) = boolean::offset(contour, spacing, clipper_scale) {
                for o in offsets {
                    if let Ok(cleaned) = boolean::clean(&o, clean_dist / clipper_scale) {
                        expanded.push(cleaned);
                    }
                }
            }
        }
        if !expanded.is_empty() {
            nfp = expanded;
        }
    }

    Ok(nfp)
}

/// Computes the inner no-fit-polygon (the reachable placement region for
/// `part` inside `bin`), inverted relative to [`outer_nfp`] (`inside =
/// true`). `search_edges` again ties to `NestConfig::explore_concave`.
pub fn inner_nfp(bin: &[Point], part: &[Point], spacing: f64, search_edges: bool) -> Result<NfpValue> {
    if bin.len() < 3 || part.len() < 3 {
        return Err(NestError::DegenerateInput);
    }

    let nfp = if geometry::is_rectangle(bin, 1e-9) {
        no_fit_polygon_rectangle(bin, part)
    } else {
        no_fit_polygon(bin, part, true, search_edges)
    };

    let mut nfp = nfp.ok_or(NestError::NfpSanity)?;

    if spacing.abs() > geometry::TOL {
        let mut shrunk = Vec::new();
        for contour in &nfp {
            if let Ok(offsets) = boolean::offset(contour, -spacing, geometry::CLIPPER_SCALE) {
                shrunk.extend(offsets);
            }
        }
        if !shrunk.is_empty() {
            nfp = shrunk;
        }
    }

    Ok(nfp)
}

/// Pruneable marker set helper kept for the cache's generation-scoped
/// eviction (spec §4.4): which `(a_id, b_id)` pairs a given NFP key
/// touches, so stale entries referencing removed parts can be found in
/// one pass without re-deriving keys.
pub fn referenced_ids(key: &NfpKey) -> (i64, i64) {
    (key.a_id, key.b_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn rectangle_nfp_matches_bounding_box_difference() {
        let a = square(4.0);
        let b = square(1.0);
        let nfp = no_fit_polygon_rectangle(&a, &b).unwrap();
        assert_eq!(nfp.len(), 1);
        let bounds = geometry::get_polygon_bounds(&nfp[0]).unwrap();
        assert!((bounds.width - 3.0).abs() < 1e-9);
        assert!((bounds.height - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rectangle_nfp_none_when_b_too_large() {
        let a = square(1.0);
        let b = square(2.0);
        assert!(no_fit_polygon_rectangle(&a, &b).is_none());
    }

    #[test]
    fn orbiting_nfp_of_two_squares_closes() {
        let a = square(4.0);
        let b = square(1.0);
        let nfp = no_fit_polygon(&a, &b, false, false);
        assert!(nfp.is_some());
        let contour = &nfp.unwrap()[0];
        assert!(contour.len() >= 4);
    }

    #[test]
    fn minkowski_difference_of_squares_is_larger_square() {
        let a = square(2.0);
        let b = square(1.0);
        let diff = minkowski_difference(&a, &b).unwrap();
        let bounds = geometry::get_polygon_bounds(&diff).unwrap();
        assert!((bounds.width - 3.0).abs() < 1e-6);
    }

    #[test]
    fn nfp_key_distinguishes_inner_and_outer() {
        let outer = NfpKey::new(-1, 1, false, 0.0, 0.0);
        let inner = NfpKey::new(-1, 1, true, 0.0, 0.0);
        assert_ne!(outer, inner);
    }
}
