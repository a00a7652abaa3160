//! Polygon predicates and constructive primitives (component G).
//!
//! Ported from the orbiting-NFP algorithm's geometric core (Burke/Qiao, as
//! implemented by the original SvgNest `geometryutil.js`). Functions operate
//! on already-positioned point slices: callers translate a polygon by its
//! current placement offset before calling in, rather than threading an
//! `offset` field through every predicate (see DESIGN.md).

/// Floating point tolerance used for all coordinate equality checks.
pub const TOL: f64 = 1e-9;

/// Default scale factor used when interfacing with the boolean engine.
pub const CLIPPER_SCALE: f64 = 10_000_000.0;

/// Default curve tolerance when approximating curves from the Shape Source.
pub const CURVE_TOLERANCE: f64 = 0.3;

/// A 2D point, also used as a vector (edge direction, translation, normal).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn sub(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Result of a point-in-polygon test; `OnBoundary` covers both vertex
/// coincidence and on-edge placement within [`TOL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPosition {
    Inside,
    Outside,
    OnBoundary,
}

pub fn almost_equal(a: f64, b: f64) -> bool {
    almost_equal_tol(a, b, TOL)
}

pub fn almost_equal_tol(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

pub fn within_distance(p1: Point, p2: Point, distance: f64) -> bool {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    dx * dx + dy * dy < distance * distance
}

/// Translates a polygon's points by a fixed vector.
pub fn translate(points: &[Point], dx: f64, dy: f64) -> Vec<Point> {
    points.iter().map(|p| p.translated(dx, dy)).collect()
}

/// Unit vector; pass-through if already unit length within tolerance.
pub fn normalize_vector(v: Point) -> Point {
    if almost_equal(v.x * v.x + v.y * v.y, 1.0) {
        return v;
    }
    let len = (v.x * v.x + v.y * v.y).sqrt();
    Point::new(v.x / len, v.y / len)
}

/// Returns the axis-aligned bounding box, or `None` for fewer than 3 points.
pub fn get_polygon_bounds(poly: &[Point]) -> Option<Bounds> {
    if poly.len() < 3 {
        return None;
    }
    let mut xmin = poly[0].x;
    let mut xmax = poly[0].x;
    let mut ymin = poly[0].y;
    let mut ymax = poly[0].y;
    for p in poly {
        if p.x > xmax {
            xmax = p.x;
        } else if p.x < xmin {
            xmin = p.x;
        }
        if p.y > ymax {
            ymax = p.y;
        } else if p.y < ymin {
            ymin = p.y;
        }
    }
    Some(Bounds {
        x: xmin,
        y: ymin,
        width: xmax - xmin,
        height: ymax - ymin,
    })
}

/// Signed area. Negative indicates counter-clockwise winding — the
/// convention used throughout this crate.
pub fn polygon_area(poly: &[Point]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        a += (poly[j].x + poly[i].x) * (poly[j].y - poly[i].y);
        j = i;
    }
    0.5 * a
}

/// Returns `true` if `p` lies strictly between `a` and `b`, collinear
/// within tolerance, excluding the endpoints themselves.
pub fn on_segment(a: Point, b: Point, p: Point) -> bool {
    if almost_equal(a.x, b.x) && almost_equal(p.x, a.x) {
        return !almost_equal(p.y, b.y)
            && !almost_equal(p.y, a.y)
            && p.y < a.y.max(b.y)
            && p.y > a.y.min(b.y);
    }

    if almost_equal(a.y, b.y) && almost_equal(p.y, a.y) {
        return !almost_equal(p.x, b.x)
            && !almost_equal(p.x, a.x)
            && p.x < a.x.max(b.x)
            && p.x > a.x.min(b.x);
    }

    if (p.x < a.x && p.x < b.x)
        || (p.x > a.x && p.x > b.x)
        || (p.y < a.y && p.y < b.y)
        || (p.y > a.y && p.y > b.y)
    {
        return false;
    }

    if (almost_equal(p.x, a.x) && almost_equal(p.y, a.y))
        || (almost_equal(p.x, b.x) && almost_equal(p.y, b.y))
    {
        return false;
    }

    let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
    if cross.abs() > TOL {
        return false;
    }

    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    if dot < 0.0 || almost_equal(dot, 0.0) {
        return false;
    }

    let len2 = (b.x - a.x) * (b.x - a.x) + (b.y - a.y) * (b.y - a.y);
    if dot > len2 || almost_equal(dot, len2) {
        return false;
    }

    true
}

/// Intersection of segment/line `AB` with segment/line `EF`. When
/// `infinite` is `false` both are treated as finite segments.
pub fn line_intersect(a: Point, b: Point, e: Point, f: Point, infinite: bool) -> Option<Point> {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = b.x * a.y - a.x * b.y;
    let a2 = f.y - e.y;
    let b2 = e.x - f.x;
    let c2 = f.x * e.y - e.x * f.y;

    let denom = a1 * b2 - a2 * b1;
    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;

    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    if !infinite {
        if (a.x - b.x).abs() > TOL {
            let out_of_range = if a.x < b.x { x < a.x || x > b.x } else { x > a.x || x < b.x };
            if out_of_range {
                return None;
            }
        }
        if (a.y - b.y).abs() > TOL {
            let out_of_range = if a.y < b.y { y < a.y || y > b.y } else { y > a.y || y < b.y };
            if out_of_range {
                return None;
            }
        }
        if (e.x - f.x).abs() > TOL {
            let out_of_range = if e.x < f.x { x < e.x || x > f.x } else { x > e.x || x < f.x };
            if out_of_range {
                return None;
            }
        }
        if (e.y - f.y).abs() > TOL {
            let out_of_range = if e.y < f.y { y < e.y || y > f.y } else { y > e.y || y < f.y };
            if out_of_range {
                return None;
            }
        }
    }

    Some(Point::new(x, y))
}

/// Ray-crossing point-in-polygon test. Returns [`PointPosition::OnBoundary`]
/// when the point coincides with a vertex or lies on an edge within
/// tolerance.
pub fn point_in_polygon(point: Point, poly: &[Point]) -> PointPosition {
    if poly.len() < 3 {
        return PointPosition::Outside;
    }

    let mut inside = false;
    let mut i = 0;
    let mut j = poly.len() - 1;
    while i < poly.len() {
        let vi = poly[i];
        let vj = poly[j];

        if almost_equal(vi.x, point.x) && almost_equal(vi.y, point.y) {
            return PointPosition::OnBoundary;
        }

        if on_segment(vi, vj, point) {
            return PointPosition::OnBoundary;
        }

        if almost_equal(vi.x, vj.x) && almost_equal(vi.y, vj.y) {
            i += 1;
            j = i;
            continue;
        }

        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }

        i += 1;
        j = i;
    }

    if inside {
        PointPosition::Inside
    } else {
        PointPosition::Outside
    }
}

/// Rotates a polygon by `degrees` around the origin, returning a fresh
/// vertex array. Holes are rotated separately by the caller (see
/// [`crate::part::Polygon::rotated`]).
pub fn rotate_polygon(points: &[Point], degrees: f64) -> Vec<Point> {
    let angle = degrees.to_radians();
    let (sin, cos) = angle.sin_cos();
    points
        .iter()
        .map(|p| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos))
        .collect()
}

/// True if every vertex of `poly` lies on its own bounding-box perimeter
/// within `tolerance`.
pub fn is_rectangle(poly: &[Point], tolerance: f64) -> bool {
    let bb = match get_polygon_bounds(poly) {
        Some(b) => b,
        None => return false,
    };
    for p in poly {
        if !almost_equal_tol(p.x, bb.x, tolerance) && !almost_equal_tol(p.x, bb.x + bb.width, tolerance) {
            return false;
        }
        if !almost_equal_tol(p.y, bb.y, tolerance) && !almost_equal_tol(p.y, bb.y + bb.height, tolerance) {
            return false;
        }
    }
    true
}

/// Returns the continuous polyline forming the most-extremal edge of
/// `poly` in direction `normal` (algo 8 of Burke/Qiao).
pub fn polygon_edge(poly: &[Point], normal: Point) -> Option<Vec<Point>> {
    if poly.len() < 3 {
        return None;
    }
    let normal = normalize_vector(normal);
    let direction = Point::new(-normal.y, normal.x);

    let dotproduct: Vec<f64> = poly.iter().map(|p| p.dot(direction)).collect();
    let min = dotproduct.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = dotproduct.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut index_min = 0;
    let mut index_max = 0;
    let mut normal_min: Option<f64> = None;
    let mut normal_max: Option<f64> = None;

    for (i, p) in poly.iter().enumerate() {
        if almost_equal(dotproduct[i], min) {
            let dot = p.dot(normal);
            if normal_min.is_none() || dot > normal_min.unwrap() {
                normal_min = Some(dot);
                index_min = i;
            }
        } else if almost_equal(dotproduct[i], max) {
            let dot = p.dot(normal);
            if normal_max.is_none() || dot > normal_max.unwrap() {
                normal_max = Some(dot);
                index_max = i;
            }
        }
    }

    let n = poly.len();
    let index_left = if index_min == 0 { n - 1 } else { index_min - 1 };
    let index_right = if index_min + 1 >= n { 0 } else { index_min + 1 };

    let minvertex = poly[index_min];
    let left = poly[index_left];
    let right = poly[index_right];

    let left_vector = left.sub(minvertex);
    let right_vector = right.sub(minvertex);

    let dot_left = left_vector.dot(direction);
    let dot_right = right_vector.dot(direction);

    let scan_direction: i64 = if almost_equal(dot_left, 0.0) {
        1
    } else if almost_equal(dot_right, 0.0) {
        -1
    } else {
        let (normal_dot_left, normal_dot_right) = if almost_equal(dot_left, dot_right) {
            (left_vector.dot(normal), right_vector.dot(normal))
        } else if dot_left < dot_right {
            (left_vector.dot(normal), right_vector.dot(normal) * (dot_left / dot_right))
        } else {
            (left_vector.dot(normal) * (dot_right / dot_left), right_vector.dot(normal))
        };
        if normal_dot_left > normal_dot_right {
            -1
        } else {
            1
        }
    };

    let mut edge = Vec::new();
    let mut i = index_min as i64;
    let mut count = 0usize;
    loop {
        let idx = i.rem_euclid(n as i64) as usize;
        edge.push(poly[idx]);
        if idx == index_max {
            break;
        }
        i += scan_direction;
        count += 1;
        if count >= n {
            break;
        }
    }
    Some(edge)
}

/// Signed normal distance from `p` to segment `s1`-`s2`; `None` if `p`
/// doesn't project onto the segment (subject to `s1_inclusive`/
/// `s2_inclusive` endpoint policy). Algo 9 of Burke/Qiao.
pub fn point_line_distance(
    p: Point,
    s1: Point,
    s2: Point,
    normal: Point,
    s1_inclusive: bool,
    s2_inclusive: bool,
) -> Option<f64> {
    let normal = normalize_vector(normal);
    let dir = Point::new(normal.y, -normal.x);

    let pdot = p.dot(dir);
    let s1dot = s1.dot(dir);
    let s2dot = s2.dot(dir);

    let pdotnorm = p.dot(normal);
    let s1dotnorm = s1.dot(normal);
    let s2dotnorm = s2.dot(normal);

    if almost_equal(pdot, s1dot) && almost_equal(pdot, s2dot) {
        if almost_equal(pdotnorm, s1dotnorm) || almost_equal(pdotnorm, s2dotnorm) {
            return None;
        }
        if pdotnorm > s1dotnorm && pdotnorm > s2dotnorm {
            return Some((pdotnorm - s1dotnorm).min(pdotnorm - s2dotnorm));
        }
        if pdotnorm < s1dotnorm && pdotnorm < s2dotnorm {
            return Some(-(s1dotnorm - pdotnorm).min(s2dotnorm - pdotnorm));
        }
        let diff1 = pdotnorm - s1dotnorm;
        let diff2 = pdotnorm - s2dotnorm;
        return Some(if diff1 > 0.0 { diff1 } else { diff2 });
    } else if almost_equal(pdot, s1dot) {
        return if s1_inclusive { Some(pdotnorm - s1dotnorm) } else { None };
    } else if almost_equal(pdot, s2dot) {
        return if s2_inclusive { Some(pdotnorm - s2dotnorm) } else { None };
    } else if (pdot < s1dot && pdot < s2dot) || (pdot > s1dot && pdot > s2dot) {
        return None;
    }

    Some(pdotnorm - s1dotnorm + (s1dotnorm - s2dotnorm) * (s1dot - pdot) / (s1dot - s2dot))
}

/// Projects `p` onto segment `s1`-`s2` along `direction`; `infinite`
/// relaxes the endpoint exclusivity used while sliding a polygon along an
/// edge in [`crate::nfp::search_start_point`].
pub fn point_distance(p: Point, s1: Point, s2: Point, direction: Point, infinite: bool) -> Option<f64> {
    let normal = normalize_vector(direction);
    let dir = Point::new(normal.y, -normal.x);

    let pdot = p.dot(dir);
    let s1dot = s1.dot(dir);
    let s2dot = s2.dot(dir);

    let pdotnorm = p.dot(normal);
    let s1dotnorm = s1.dot(normal);
    let s2dotnorm = s2.dot(normal);

    if !infinite {
        let below = (pdot < s1dot || almost_equal(pdot, s1dot)) && (pdot < s2dot || almost_equal(pdot, s2dot));
        let above = (pdot > s1dot || almost_equal(pdot, s1dot)) && (pdot > s2dot || almost_equal(pdot, s2dot));
        if below || above {
            return None;
        }
        if almost_equal(pdot, s1dot) && almost_equal(pdot, s2dot) {
            if pdotnorm > s1dotnorm && pdotnorm > s2dotnorm {
                return Some((pdotnorm - s1dotnorm).min(pdotnorm - s2dotnorm));
            }
            if pdotnorm < s1dotnorm && pdotnorm < s2dotnorm {
                return Some(-(s1dotnorm - pdotnorm).min(s2dotnorm - pdotnorm));
            }
        }
    }

    Some(-(pdotnorm - s1dotnorm + (s1dotnorm - s2dotnorm) * (s1dot - pdot) / (s1dot - s2dot)))
}

/// Translation distance along `direction` until segments `AB` and `EF`
/// touch; `None` if they never touch while sliding, `0.0` if already
/// touching while sliding away.
pub fn segment_distance(a: Point, b: Point, e: Point, f: Point, direction: Point) -> Option<f64> {
    let normal = Point::new(direction.y, -direction.x);
    let reverse = Point::new(-direction.x, -direction.y);

    let dot_a = a.dot(normal);
    let dot_b = b.dot(normal);
    let dot_e = e.dot(normal);
    let dot_f = f.dot(normal);

    let cross_a = a.dot(direction);
    let cross_b = b.dot(direction);
    let cross_e = e.dot(direction);
    let cross_f = f.dot(direction);

    let ab_min = dot_a.min(dot_b);
    let ab_max = dot_a.max(dot_b);
    let ef_min = dot_e.min(dot_f);
    let ef_max = dot_e.max(dot_f);

    if almost_equal(ab_max, ef_min) || almost_equal(ab_min, ef_max) {
        return None;
    }
    if ab_max < ef_min || ab_min > ef_max {
        return None;
    }

    let overlap = if (ab_max > ef_max && ab_min < ef_min) || (ef_max > ab_max && ef_min < ab_min) {
        1.0
    } else {
        let min_max = ab_max.min(ef_max);
        let max_min = ab_min.max(ef_min);
        let max_max = ab_max.max(ef_max);
        let min_min = ab_min.min(ef_min);
        (min_max - max_min) / (max_max - min_min)
    };

    let cross_abe = (e.y - a.y) * (b.x - a.x) - (e.x - a.x) * (b.y - a.y);
    let cross_abf = (f.y - a.y) * (b.x - a.x) - (f.x - a.x) * (b.y - a.y);

    if almost_equal(cross_abe, 0.0) && almost_equal(cross_abf, 0.0) {
        let ab_norm_len = ((b.y - a.y).powi(2) + (a.x - b.x).powi(2)).sqrt();
        let ab_norm = Point::new((b.y - a.y) / ab_norm_len, (a.x - b.x) / ab_norm_len);
        let ef_norm_len = ((f.y - e.y).powi(2) + (e.x - f.x).powi(2)).sqrt();
        let ef_norm = Point::new((f.y - e.y) / ef_norm_len, (e.x - f.x) / ef_norm_len);

        if (ab_norm.y * ef_norm.x - ab_norm.x * ef_norm.y).abs() < TOL
            && ab_norm.y * ef_norm.y + ab_norm.x * ef_norm.x < 0.0
        {
            let normdot = ab_norm.y * direction.y + ab_norm.x * direction.x;
            if almost_equal(normdot, 0.0) {
                return None;
            }
            if normdot < 0.0 {
                return Some(0.0);
            }
        }
        return None;
    }

    let mut distances = Vec::new();

    if almost_equal(dot_a, dot_e) {
        distances.push(cross_a - cross_e);
    } else if almost_equal(dot_a, dot_f) {
        distances.push(cross_a - cross_f);
    } else if dot_a > ef_min && dot_a < ef_max {
        let mut d = point_distance(a, e, f, reverse, false);
        if let Some(dv) = d {
            if almost_equal(dv, 0.0) {
                let d_b = point_distance(b, e, f, reverse, true);
                if d_b.map(|v| v < 0.0 || almost_equal(v * overlap, 0.0)).unwrap_or(false) {
                    d = None;
                }
            }
        }
        if let Some(dv) = d {
            distances.push(dv);
        }
    }

    if almost_equal(dot_b, dot_e) {
        distances.push(cross_b - cross_e);
    } else if almost_equal(dot_b, dot_f) {
        distances.push(cross_b - cross_f);
    } else if dot_b > ef_min && dot_b < ef_max {
        let mut d = point_distance(b, e, f, reverse, false);
        if let Some(dv) = d {
            if almost_equal(dv, 0.0) {
                let d_a = point_distance(a, e, f, reverse, true);
                if d_a.map(|v| v < 0.0 || almost_equal(v * overlap, 0.0)).unwrap_or(false) {
                    d = None;
                }
            }
        }
        if let Some(dv) = d {
            distances.push(dv);
        }
    }

    if dot_e > ab_min && dot_e < ab_max {
        let mut d = point_distance(e, a, b, direction, false);
        if let Some(dv) = d {
            if almost_equal(dv, 0.0) {
                let d_f = point_distance(f, a, b, direction, true);
                if d_f.map(|v| v < 0.0 || almost_equal(v * overlap, 0.0)).unwrap_or(false) {
                    d = None;
                }
            }
        }
        if let Some(dv) = d {
            distances.push(dv);
        }
    }

    if dot_f > ab_min && dot_f < ab_max {
        let mut d = point_distance(f, a, b, direction, false);
        if let Some(dv) = d {
            if almost_equal(dv, 0.0) {
                let d_e = point_distance(e, a, b, direction, true);
                if d_e.map(|v| v < 0.0 || almost_equal(v * overlap, 0.0)).unwrap_or(false) {
                    d = None;
                }
            }
        }
        if let Some(dv) = d {
            distances.push(dv);
        }
    }

    distances.into_iter().fold(None, |acc, d| match acc {
        None => Some(d),
        Some(a) => Some(a.min(d)),
    })
}

/// Minimum over all edge pairs of `segment_distance`: how far `b` can
/// slide along `direction` before touching `a`.
pub fn polygon_slide_distance(a: &[Point], b: &[Point], direction: Point, ignore_negative: bool) -> Option<f64> {
    let mut edge_a = a.to_vec();
    if edge_a.first() != edge_a.last() {
        edge_a.push(edge_a[0]);
    }
    let mut edge_b = b.to_vec();
    if edge_b.first() != edge_b.last() {
        edge_b.push(edge_b[0]);
    }

    let dir = normalize_vector(direction);
    let mut distance: Option<f64> = None;

    for i in 0..edge_b.len().saturating_sub(1) {
        for j in 0..edge_a.len().saturating_sub(1) {
            let a1 = edge_a[j];
            let a2 = edge_a[j + 1];
            let b1 = edge_b[i];
            let b2 = edge_b[i + 1];

            if (almost_equal(a1.x, a2.x) && almost_equal(a1.y, a2.y))
                || (almost_equal(b1.x, b2.x) && almost_equal(b1.y, b2.y))
            {
                continue;
            }

            if let Some(d) = segment_distance(a1, a2, b1, b2, dir) {
                if distance.is_none() || d < distance.unwrap() {
                    if !ignore_negative || d > 0.0 || almost_equal(d, 0.0) {
                        distance = Some(d);
                    }
                }
            }
        }
    }
    distance
}

/// Projects each vertex of `b` onto the edges of `a` along `direction`,
/// returning the minimum (most negative) projection.
pub fn polygon_projection_distance(a: &[Point], b: &[Point], direction: Point) -> Option<f64> {
    let mut edge_a = a.to_vec();
    if edge_a.first() != edge_a.last() {
        edge_a.push(edge_a[0]);
    }
    let mut edge_b = b.to_vec();
    if edge_b.first() != edge_b.last() {
        edge_b.push(edge_b[0]);
    }

    let mut distance: Option<f64> = None;

    for i in 0..edge_b.len().saturating_sub(1) {
        let mut min_projection: Option<f64> = None;
        for j in 0..edge_a.len().saturating_sub(1) {
            let p = edge_b[i];
            let s1 = edge_a[j];
            let s2 = edge_a[j + 1];

            if ((s2.y - s1.y) * direction.x - (s2.x - s1.x) * direction.y).abs() < TOL {
                continue;
            }

            if let Some(d) = point_distance(p, s1, s2, direction, false) {
                if min_projection.is_none() || d < min_projection.unwrap() {
                    min_projection = Some(d);
                }
            }
        }
        if let Some(mp) = min_projection {
            if distance.is_none() || mp > distance.unwrap() {
                distance = Some(mp);
            }
        }
    }
    distance
}

/// True if polygon `a` (already positioned) and `b` (already positioned)
/// overlap, including touching-edge ambiguity resolved via neighboring
/// point-in-polygon checks (direct port of `geometryutil.js::intersect`).
pub fn polygons_intersect(a: &[Point], b: &[Point]) -> bool {
    let mut a = a.to_vec();
    if a.first() != a.last() {
        a.push(a[0]);
    }
    let mut b = b.to_vec();
    if b.first() != b.last() {
        b.push(b[0]);
    }

    let na = a.len();
    let nb = b.len();

    for i in 0..na.saturating_sub(1) {
        for j in 0..nb.saturating_sub(1) {
            let a1 = a[i];
            let a2 = a[i + 1];
            let b1 = b[j];
            let b2 = b[j + 1];

            let prevb = if j == 0 { nb - 1 } else { j - 1 };
            let preva = if i == 0 { na - 1 } else { i - 1 };
            let nextb = if j + 1 == nb - 1 { 0 } else { j + 2 };
            let nexta = if i + 1 == na - 1 { 0 } else { i + 2 };

            let prevb = prevb.min(nb - 1);
            let preva = preva.min(na - 1);
            let nextb = nextb.min(nb - 1);
            let nexta = nexta.min(na - 1);

            let a0 = a[preva];
            let b0 = b[prevb];
            let a3 = a[nexta];
            let b3 = b[nextb];

            if on_segment(a1, a2, b1) || (almost_equal(a1.x, b1.x) && almost_equal(a1.y, b1.y)) {
                let b0in = point_in_polygon(b0, &a) == PointPosition::Inside;
                let b2in = point_in_polygon(b2, &a) == PointPosition::Inside;
                if b0in != b2in {
                    return true;
                }
                continue;
            }

            if on_segment(a1, a2, b2) || (almost_equal(a2.x, b2.x) && almost_equal(a2.y, b2.y)) {
                let b1in = point_in_polygon(b1, &a) == PointPosition::Inside;
                let b3in = point_in_polygon(b3, &a) == PointPosition::Inside;
                if b1in != b3in {
                    return true;
                }
                continue;
            }

            if on_segment(b1, b2, a1) || (almost_equal(a1.x, b2.x) && almost_equal(a1.y, b2.y)) {
                let a0in = point_in_polygon(a0, &b) == PointPosition::Inside;
                let a2in = point_in_polygon(a2, &b) == PointPosition::Inside;
                if a0in != a2in {
                    return true;
                }
                continue;
            }

            if on_segment(b1, b2, a2) || (almost_equal(a2.x, b1.x) && almost_equal(a2.y, b1.y)) {
                let a1in = point_in_polygon(a1, &b) == PointPosition::Inside;
                let a3in = point_in_polygon(a3, &b) == PointPosition::Inside;
                if a1in != a3in {
                    return true;
                }
                continue;
            }

            if line_intersect(b1, b2, a1, a2, false).is_some() {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]
    }

    #[test]
    fn area_of_square() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert_eq!(polygon_area(&pts), -1.0);
        let bounds = get_polygon_bounds(&pts).unwrap();
        assert_eq!(bounds.width, 1.0);
        assert_eq!(bounds.height, 1.0);
    }

    #[test]
    fn area_of_triangle_ccw() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
        assert!((polygon_area(&pts) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn rotate_preserves_bounds() {
        let pts = square();
        let rotated = rotate_polygon(&pts, 90.0);
        let b = get_polygon_bounds(&rotated).unwrap();
        assert!((b.width - 2.0).abs() < 1e-6);
        assert!((b.height - 2.0).abs() < 1e-6);
    }

    #[test]
    fn rotate_360_is_pointwise_identity() {
        let pts = square();
        let rotated = rotate_polygon(&pts, 360.0);
        for (a, b) in pts.iter().zip(rotated.iter()) {
            assert!(almost_equal_tol(a.x, b.x, 1e-6));
            assert!(almost_equal_tol(a.y, b.y, 1e-6));
        }
    }

    #[test]
    fn point_in_polygon_trichotomy() {
        let s = square();
        assert_eq!(point_in_polygon(Point::new(1.0, 1.0), &s), PointPosition::Inside);
        assert_eq!(point_in_polygon(Point::new(3.0, 1.0), &s), PointPosition::Outside);
        assert_eq!(point_in_polygon(Point::new(2.0, 1.0), &s), PointPosition::OnBoundary);
    }

    #[test]
    fn is_rectangle_detects_axis_aligned_box() {
        let s = square();
        assert!(is_rectangle(&s, 1e-9));
        let tri = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.5, 1.0)];
        assert!(!is_rectangle(&tri, 1e-9));
    }

    #[test]
    fn degenerate_polygon() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert_eq!(polygon_area(&pts), 0.0);
        assert!(get_polygon_bounds(&pts).is_none());
    }
}
