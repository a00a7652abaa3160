//! Boolean engine adapter (component B).
//!
//! Wraps `geo-clipper`'s integer-scaled Clipper bindings behind the plain
//! `Vec<geometry::Point>` polygon representation used everywhere else in
//! this crate, and adds the constructive operations Clipper doesn't expose
//! directly: polygon cleaning and the convex Minkowski sum used as the NFP
//! engine's fallback path.

use geo::ConvexHull;
use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{LineString, MultiPoint, MultiPolygon, Polygon as GeoPolygon};

use crate::error::{NestError, Result};
use crate::geometry::{self, Point};

fn to_linestring(points: &[Point]) -> LineString<f64> {
    points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into()
}

fn to_geo_polygon(points: &[Point]) -> GeoPolygon<f64> {
    GeoPolygon::new(to_linestring(points), vec![])
}

fn from_linestring(ls: &LineString<f64>) -> Vec<Point> {
    ls.points().map(|c| Point::new(c.x(), c.y())).collect()
}

/// A single contour produced by a boolean operation, outer ring only
/// (matching the engine's use in this crate: NFPs and cleaned parts never
/// carry holes of their own, only the bin/part tree does, handled one
/// level up in [`crate::part`]).
pub type Contour = Vec<Point>;

fn multipolygon_contours(mp: &MultiPolygon<f64>) -> Vec<Contour> {
    mp.iter().map(|p| from_linestring(p.exterior())).collect()
}

/// Union of two polygons (outer rings only) at `scale`.
pub fn union(a: &[Point], b: &[Point], scale: f64) -> Vec<Contour> {
    let pa = to_geo_polygon(a);
    let pb = to_geo_polygon(b);
    let result = pa.union(&pb, scale);
    multipolygon_contours(&result)
}

/// Difference `a - b` (outer rings only) at `scale`.
pub fn difference(a: &[Point], b: &[Point], scale: f64) -> Vec<Contour> {
    let pa = to_geo_polygon(a);
    let pb = to_geo_polygon(b);
    let result = pa.difference(&pb, scale);
    multipolygon_contours(&result)
}

/// Union of many polygons at once, as Clipper sees it (the placement
/// worker's combined-NFP step, spec §4.5 step 4).
pub fn union_many(polys: &[Contour], scale: f64) -> Vec<Contour> {
    let mut acc: Option<MultiPolygon<f64>> = None;
    for poly in polys {
        if poly.len() < 3 {
            continue;
        }
        let p = to_geo_polygon(poly);
        acc = Some(match acc {
            None => MultiPolygon(vec![p]),
            Some(existing) => existing.union(&p, scale),
        });
    }
    acc.map(|mp| multipolygon_contours(&mp)).unwrap_or_default()
}

/// Outward (positive `delta`) or inward (negative `delta`) offset of a
/// closed polygon, used to apply part/bin spacing before nesting (spec
/// §4.7 step 1).
pub fn offset(points: &[Point], delta: f64, scale: f64) -> Result<Vec<Contour>> {
    if points.len() < 3 {
        return Err(NestError::DegenerateInput);
    }
    let poly = to_geo_polygon(points);
    let result = poly.offset(delta, JoinType::Miter(2.0), EndType::ClosedPolygon, scale);
    Ok(multipolygon_contours(&result))
}

/// Removes self-intersections under the non-zero fill rule by unioning a
/// polygon with itself, then keeps only the contour of greatest area
/// (`cleanPolygon` in the original implementation: `SimplifyPolygon` then
/// pick-biggest-area). See SPEC_FULL.md §5.2 for the tie-breaking rule.
pub fn simplify(points: &[Point], scale: f64) -> Result<Contour> {
    if points.len() < 3 {
        return Err(NestError::DegenerateInput);
    }
    let poly = to_geo_polygon(points);
    let simplified = poly.union(&poly, scale);
    let mut best: Option<(f64, Contour)> = None;
    for contour in multipolygon_contours(&simplified) {
        if contour.len() < 3 {
            continue;
        }
        let a = geometry::polygon_area(&contour).abs();
        if best.as_ref().map(|(ba, _)| a > *ba).unwrap_or(true) {
            best = Some((a, contour));
        }
    }
    best.map(|(_, c)| c).ok_or(NestError::NfpSanity)
}

/// Removes near-duplicate consecutive vertices (within `min_distance`) and
/// drops the result if it collapses below a triangle, matching
/// `CleanPolygon`'s role in the placement worker (spec §4.5 step 4).
pub fn clean(points: &[Point], min_distance: f64) -> Result<Contour> {
    if points.is_empty() {
        return Err(NestError::DegenerateInput);
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().map(|last| geometry::within_distance(*last, p, min_distance)).unwrap_or(false) {
            continue;
        }
        out.push(p);
    }
    if out.len() > 1 && geometry::within_distance(out[0], *out.last().unwrap(), min_distance) {
        out.pop();
    }
    if out.len() < 3 {
        return Err(NestError::DegenerateInput);
    }
    Ok(out)
}

/// Minkowski sum of two convex polygons: the convex hull of every
/// pairwise vertex sum. Used by the NFP engine as the no-fit-polygon
/// fallback for concave inputs it declines to orbit (spec §4.3.3).
pub fn minkowski_sum_convex(a: &[Point], b: &[Point]) -> Vec<Point> {
    let mut sums = Vec::with_capacity(a.len() * b.len());
    for pa in a {
        for pb in b {
            sums.push((pa.x + pb.x, pa.y + pb.y));
        }
    }
    let points: MultiPoint<f64> = sums.into_iter().map(geo_types::Point::from).collect();
    let hull = points.convex_hull();
    from_linestring(hull.exterior())
}

/// Minkowski difference `a - b`, computed as `a + (-b)` via
/// [`minkowski_sum_convex`]. `b` need not be convex for the caller's
/// purposes when `b` is the orbiting part's convex hull (see
/// [`crate::nfp::minkowski_difference`]).
pub fn minkowski_difference_convex(a: &[Point], b: &[Point]) -> Vec<Point> {
    let neg_b: Vec<Point> = b.iter().map(|p| Point::new(-p.x, -p.y)).collect();
    minkowski_sum_convex(a, &neg_b)
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
    fn union_of_overlapping_squares_merges_to_one_contour() {
        let a = square(2.0);
        let b: Vec<Point> = square(2.0).iter().map(|p| p.translated(1.0, 1.0)).collect();
        let result = union(&a, &b, geometry::CLIPPER_SCALE);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn difference_of_disjoint_squares_is_unchanged() {
        let a = square(1.0);
        let b: Vec<Point> = square(1.0).iter().map(|p| p.translated(5.0, 5.0)).collect();
        let result = difference(&a, &b, geometry::CLIPPER_SCALE);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn clean_drops_near_duplicate_vertices() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0000001),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let cleaned = clean(&pts, 1e-3).unwrap();
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn clean_rejects_degenerate_input() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!(clean(&pts, 1e-3).is_err());
    }

    #[test]
    fn minkowski_sum_of_two_squares_is_larger_square() {
        let a = square(1.0);
        let b = square(1.0);
        let sum = minkowski_sum_convex(&a, &b);
        let bounds = geometry::get_polygon_bounds(&sum).unwrap();
        assert!((bounds.width - 2.0).abs() < 1e-9);
        assert!((bounds.height - 2.0).abs() < 1e-9);
    }
}
