use svgnest_core::geometry::{polygon_area, Point};
use svgnest_core::nfp::{self, minkowski_difference, no_fit_polygon_rectangle};

fn square(side: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(side, 0.0),
        Point::new(side, side),
        Point::new(0.0, side),
    ]
}

#[test]
fn concave_minkowski_handles_l_shape() {
    let a = vec![
        Point::new(0.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(2.0, 1.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 2.0),
        Point::new(0.0, 2.0),
    ];
    let b = square(1.0);

    let nfp = minkowski_difference(&a, &b).unwrap();
    assert!(nfp.len() > 4);
    let area = polygon_area(&nfp).abs();
    assert!(area > 4.0);
}

#[test]
fn inner_nfp_rectangle_simple() {
    let container = square(10.0);
    let part = square(2.0);

    let nfps = nfp::inner_nfp(&container, &part, 0.0, false).unwrap();
    assert_eq!(nfps.len(), 1);
    let area = polygon_area(&nfps[0]).abs();
    assert!((area - 64.0).abs() < 1e-6);

    let rect_nfp = no_fit_polygon_rectangle(&container, &part).unwrap();
    assert_eq!(rect_nfp.len(), 1);
}

#[test]
fn inner_nfp_concave_container_does_not_panic() {
    let container = vec![
        Point::new(0.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(3.0, 1.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 3.0),
        Point::new(0.0, 3.0),
    ];
    let part = square(1.0);

    let result = nfp::inner_nfp(&container, &part, 0.0, true);
    assert!(result.is_ok() || result.is_err());
}

#[test]
fn outer_nfp_of_two_squares_is_minkowski_sized() {
    // the forbidden zone for B's reference vertex is a square enlarged by
    // B's own extent in each direction: (4 + 1) on a side.
    let a = square(4.0);
    let b = square(1.0);
    let outer = nfp::outer_nfp(&a, &b, 0.0, 0.3, svgnest_core::geometry::CLIPPER_SCALE, false).unwrap();
    assert_eq!(outer.len(), 1);
    let bounds = svgnest_core::geometry::get_polygon_bounds(&outer[0]).unwrap();
    assert!((bounds.width - 5.0).abs() < 1e-6);
    assert!((bounds.height - 5.0).abs() < 1e-6);
}
