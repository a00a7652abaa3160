//! Part/bin domain type: a positioned, possibly-holed polygon tree.
//!
//! Unifies the `Polygon` type both Shape Source parsers used to produce
//! (`svg_parser`/`dxf_parser` previously each had their own, inconsistent,
//! flat `{points, closed}` struct) with the nested shape the geometry
//! kernel and NFP engine need: an outer boundary plus recursively nested
//! holes/islands, a placement offset, and identity/rotation bookkeeping
//! (spec's Data Model, "Polygon").

use crate::geometry::{self, Bounds, Point};

/// A polygon positioned at `offset`, with `children` holding nested holes
/// (and, recursively, islands inside those holes). Winding convention:
/// depth 0 (the outer boundary, or the bin) is CCW, depth 1 (holes) is CW,
/// depth 2 (islands) is CCW again, alternating with tree depth.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub offset: Point,
    pub children: Vec<Polygon>,
    pub id: i64,
    pub source: Option<usize>,
    pub rotation: f64,
    pub width: f64,
    pub height: f64,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        let bounds = geometry::get_polygon_bounds(&points);
        let (width, height) = bounds.map(|b| (b.width, b.height)).unwrap_or((0.0, 0.0));
        Polygon {
            points,
            offset: Point::default(),
            children: Vec::new(),
            id: -1,
            source: None,
            rotation: 0.0,
            width,
            height,
        }
    }

    /// The outer boundary translated by this polygon's placement offset;
    /// the shape the NFP engine and placement worker actually reason
    /// about, since every predicate in `geometry`/`nfp` takes already
    /// positioned point slices.
    pub fn positioned_points(&self) -> Vec<Point> {
        geometry::translate(&self.points, self.offset.x, self.offset.y)
    }

    /// A positioned copy of one hole/island, `index` into `children`.
    pub fn positioned_child(&self, index: usize) -> Vec<Point> {
        let child = &self.children[index];
        let mut pts = geometry::translate(&child.points, child.offset.x, child.offset.y);
        for p in &mut pts {
            p.x += self.offset.x;
            p.y += self.offset.y;
        }
        pts
    }

    pub fn bounds(&self) -> Option<Bounds> {
        geometry::get_polygon_bounds(&self.points)
    }

    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    /// Rotates this polygon and every descendant hole/island by `degrees`
    /// around the origin, recomputing cached bounds. Offsets are reset:
    /// rotation happens before placement in the GA's evaluation order
    /// (spec §4.6).
    pub fn rotated(&self, degrees: f64) -> Polygon {
        let points = geometry::rotate_polygon(&self.points, degrees);
        let bounds = geometry::get_polygon_bounds(&points);
        let (width, height) = bounds.map(|b| (b.width, b.height)).unwrap_or((0.0, 0.0));
        Polygon {
            points,
            offset: Point::default(),
            children: self.children.iter().map(|c| c.rotated(degrees)).collect(),
            id: self.id,
            source: self.source,
            rotation: self.rotation + degrees,
            width,
            height,
        }
    }

    pub fn is_rectangle(&self, tolerance: f64) -> bool {
        geometry::is_rectangle(&self.points, tolerance)
    }
}

/// Builds the parent/child hole tree from a flat list of simple polygons
/// handed over by the Shape Source (spec's supplemented
/// `getParts`/`toTree`): a polygon is nested under the first other
/// polygon in the list whose boundary contains its first vertex.
/// Assigns sequential ids root-first, then depth-first into children, so
/// id order matches spec.md's "insertion order" default tie-break.
pub fn build_hole_tree(mut flat: Vec<Polygon>) -> Vec<Polygon> {
    let n = flat.len();
    let mut parent_of: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if flat[i].points.is_empty() {
                continue;
            }
            let probe = flat[i].points[0];
            if geometry::point_in_polygon(probe, &flat[j].points) == geometry::PointPosition::Inside {
                parent_of[i] = Some(j);
                break;
            }
        }
    }

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for i in 0..n {
        match parent_of[i] {
            Some(p) => children_of[p].push(i),
            None => roots.push(i),
        }
    }

    fn assign_ids(
        indices: &[usize],
        flat: &mut Vec<Polygon>,
        children_of: &[Vec<usize>],
        next_id: &mut i64,
    ) -> Vec<Polygon> {
        let mut out = Vec::with_capacity(indices.len());
        for &idx in indices {
            let id = *next_id;
            *next_id += 1;
            let child_indices = children_of[idx].clone();
            let children = assign_ids(&child_indices, flat, children_of, next_id);
            let mut node = std::mem::take(&mut flat[idx]);
            node.id = id;
            node.children = children;
            out.push(node);
        }
        out
    }

    let mut next_id = 0i64;
    assign_ids(&roots, &mut flat, &children_of, &mut next_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64, origin: Point) -> Vec<Point> {
        vec![
            Point::new(origin.x, origin.y),
            Point::new(origin.x + side, origin.y),
            Point::new(origin.x + side, origin.y + side),
            Point::new(origin.x, origin.y + side),
        ]
    }

    #[test]
    fn hole_tree_nests_inner_square_as_child() {
        let outer = Polygon::new(square(10.0, Point::new(0.0, 0.0)));
        let inner = Polygon::new(square(2.0, Point::new(4.0, 4.0)));
        let tree = build_hole_tree(vec![outer, inner]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn hole_tree_keeps_disjoint_shapes_as_siblings() {
        let a = Polygon::new(square(2.0, Point::new(0.0, 0.0)));
        let b = Polygon::new(square(2.0, Point::new(10.0, 10.0)));
        let tree = build_hole_tree(vec![a, b]);
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|p| p.children.is_empty()));
    }

    #[test]
    fn rotated_polygon_rotates_children_too() {
        let mut outer = Polygon::new(square(10.0, Point::new(0.0, 0.0)));
        outer.children.push(Polygon::new(square(2.0, Point::new(4.0, 4.0))));
        let rotated = outer.rotated(90.0);
        assert_eq!(rotated.children.len(), 1);
    }
}
