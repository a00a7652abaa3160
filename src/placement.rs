//! Placement worker (component P).
//!
//! Bottom-left placement of a sequence of parts into copies of one bin:
//! each part's position is chosen from its precomputed NFPs against the
//! bin and every already-placed part, scored by bounding-box growth
//! (ported from `placementworker.js`'s `placePaths`, spec §4.5).

use crate::boolean;
use crate::cache::NfpCache;
use crate::geometry::{self, Point};
use crate::nfp::NfpKey;
use crate::part::Polygon;

/// Where one part ended up: its id, the rotation it was evaluated at, and
/// its placement offset.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub id: i64,
    pub rotation: f64,
    pub x: f64,
    pub y: f64,
}

/// Outcome of placing one ordered sequence of (rotated) parts into copies
/// of the bin: one `Vec<Placement>` per bin opened, a fitness score
/// (lower is better, spec §4.6), and the ids that could not be placed.
#[derive(Debug, Clone)]
pub struct PlacementResult {
    pub placements: Vec<Vec<Placement>>,
    pub fitness: f64,
    pub unplaced: Vec<i64>,
}

/// Places `parts` (already rotated to the angle recorded in each
/// `Polygon::rotation`) into copies of `bin`, consulting `cache` for every
/// NFP it needs. Parts whose required NFP is missing from `cache` are
/// skipped for this bin and retried in the next one; parts still
/// unplaced when no bin makes further progress are reported in
/// `PlacementResult::unplaced`.
pub fn place_paths(bin: &Polygon, parts: &[Polygon], cache: &NfpCache, clipper_scale: f64) -> PlacementResult {
    let mut remaining: Vec<&Polygon> = parts.iter().collect();
    let bin_area = bin.area().abs();

    let mut all_placements = Vec::new();
    let mut fitness = 0.0;

    loop {
        if remaining.is_empty() {
            break;
        }

        let mut placed: Vec<&Polygon> = Vec::new();
        let mut placements: Vec<Placement> = Vec::new();
        fitness += 1.0;
        let mut minwidth: Option<f64> = None;

        let mut placed_this_bin = Vec::new();

        for (idx, part) in remaining.iter().enumerate() {
            let part_points = part.positioned_points();

            let bin_key = NfpKey::new(-1, part.id, true, 0.0, part.rotation);
            let bin_nfp = match cache.get(&bin_key) {
                Some(nfp) if !nfp.is_empty() => nfp,
                _ => continue,
            };

            let mut missing_placed_nfp = false;
            for placed_part in &placed {
                let key = NfpKey::new(placed_part.id, part.id, false, placed_part.rotation, part.rotation);
                if cache.get(&key).is_none() {
                    missing_placed_nfp = true;
                    break;
                }
            }
            if missing_placed_nfp {
                continue;
            }

            let position = if placed.is_empty() {
                // first placement in this bin: leftmost point of the inner NFP
                let mut best: Option<Placement> = None;
                for contour in bin_nfp {
                    for p in contour {
                        let x = p.x - part_points[0].x;
                        let y = p.y - part_points[0].y;
                        if best.map(|b| x < b.x).unwrap_or(true) {
                            best = Some(Placement { id: part.id, rotation: part.rotation, x, y });
                        }
                    }
                }
                best
            } else {
                let clean_dist = 0.0001 * clipper_scale;

                let mut combined_sources: Vec<Vec<Point>> = Vec::new();
                for (placed_part, placement) in placed.iter().zip(placements.iter()) {
                    let key = NfpKey::new(placed_part.id, part.id, false, placed_part.rotation, part.rotation);
                    let nfp = match cache.get(&key) {
                        Some(n) => n,
                        None => continue,
                    };
                    for contour in nfp {
                        let shifted = geometry::translate(contour, placement.x, placement.y);
                        if let Ok(cleaned) = boolean::clean(&shifted, clean_dist / clipper_scale) {
                            let area = geometry::polygon_area(&cleaned).abs();
                            if area > 0.1 {
                                combined_sources.push(cleaned);
                            }
                        }
                    }
                }

                let combined = boolean::union_many(&combined_sources, clipper_scale);

                let mut final_nfp = Vec::new();
                for bin_contour in bin_nfp {
                    let mut remainder = vec![bin_contour.clone()];
                    for clip in &combined {
                        let mut next = Vec::new();
                        for r in &remainder {
                            next.extend(boolean::difference(r, clip, clipper_scale));
                        }
                        remainder = next;
                    }
                    final_nfp.extend(remainder);
                }

                final_nfp.retain(|c| c.len() >= 3 && geometry::polygon_area(c).abs() > 0.1);

                if final_nfp.is_empty() {
                    None
                } else {
                    let mut best: Option<(f64, Placement)> = None;
                    for contour in &final_nfp {
                        if geometry::polygon_area(contour).abs() < 2.0 {
                            continue;
                        }
                        for p in contour {
                            let shiftx = p.x - part_points[0].x;
                            let shifty = p.y - part_points[0].y;

                            let mut allpoints = Vec::new();
                            for (placed_part, placement) in placed.iter().zip(placements.iter()) {
                                for pp in placed_part.positioned_points() {
                                    allpoints.push(Point::new(pp.x + placement.x, pp.y + placement.y));
                                }
                            }
                            for pp in &part_points {
                                allpoints.push(Point::new(pp.x + shiftx, pp.y + shifty));
                            }

                            let bounds = match geometry::get_polygon_bounds(&allpoints) {
                                Some(b) => b,
                                None => continue,
                            };
                            let area = bounds.width * 2.0 + bounds.height;

                            let candidate = Placement { id: part.id, rotation: part.rotation, x: shiftx, y: shifty };
                            let better = match &best {
                                None => true,
                                Some((best_area, best_pos)) => {
                                    area < *best_area
                                        || (geometry::almost_equal_tol(area, *best_area, 1e-6) && shiftx < best_pos.x)
                                }
                            };
                            if better {
                                best = Some((area, candidate));
                                minwidth = Some(bounds.width);
                            }
                        }
                    }
                    best.map(|(_, p)| p)
                }
            };

            if let Some(pos) = position {
                placed.push(part);
                placements.push(pos);
                placed_this_bin.push(idx);
            }
        }

        if let Some(mw) = minwidth {
            fitness += mw / bin_area;
        }

        if placements.is_empty() {
            break;
        }

        all_placements.push(placements);

        for idx in placed_this_bin.into_iter().rev() {
            remaining.remove(idx);
        }
    }

    let unplaced: Vec<i64> = remaining.iter().map(|p| p.id).collect();
    fitness += 2.0 * unplaced.len() as f64;

    PlacementResult {
        placements: all_placements,
        fitness,
        unplaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfp;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn single_small_square_placed_in_bin_corner() {
        let mut bin = Polygon::new(square(10.0));
        bin.id = -1;
        let mut part = Polygon::new(square(2.0));
        part.id = 0;

        let mut cache = NfpCache::new();
        let inner = nfp::inner_nfp(&bin.points, &part.points, 0.0, true).unwrap();
        cache.insert(NfpKey::new(-1, 0, true, 0.0, 0.0), inner);

        let result = place_paths(&bin, std::slice::from_ref(&part), &cache, geometry::CLIPPER_SCALE);
        assert!(result.unplaced.is_empty());
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].len(), 1);
    }

    #[test]
    fn part_with_no_cached_nfp_is_left_unplaced() {
        let mut bin = Polygon::new(square(10.0));
        bin.id = -1;
        let mut part = Polygon::new(square(2.0));
        part.id = 0;

        let cache = NfpCache::new();
        let result = place_paths(&bin, std::slice::from_ref(&part), &cache, geometry::CLIPPER_SCALE);
        assert_eq!(result.unplaced, vec![0]);
    }
}
