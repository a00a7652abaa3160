//! Coordinator (component K).
//!
//! Owns the bin/part set for one nesting run, drives the generation loop,
//! and fans the per-generation NFP computation out across a `rayon` pool
//! before handing the populated cache to the GA for evaluation (spec
//! §4.7, replacing the original's `launchWorkers`/`p_map`/`p2_map` worker
//! pool simulation with native threads).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::boolean;
use crate::cache::NfpCache;
use crate::error::{NestError, Result};
use crate::ga::{GAConfig, GeneticAlgorithm, Individual};
use crate::geometry;
use crate::nfp::{self, NfpKey, NfpValue};
use crate::part::Polygon;
use crate::placement::PlacementResult;

/// Every tunable named in spec §6, mapped 1:1 from the CLI's `clap`
/// struct. Defaults match the original implementation's `Config`.
#[derive(Debug, Clone, Copy)]
pub struct NestConfig {
    pub curve_tolerance: f64,
    pub spacing: f64,
    pub rotations: usize,
    pub population_size: usize,
    pub mutation_rate: usize,
    pub use_holes: bool,
    pub explore_concave: bool,
    pub clipper_scale: f64,
    /// Records every computed NFP to [`NestResult::debug_nfp`] (spec §6
    /// "Persisted state").
    pub debug_nfp: bool,
}

impl Default for NestConfig {
    fn default() -> Self {
        NestConfig {
            curve_tolerance: geometry::CURVE_TOLERANCE,
            spacing: 0.0,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
            explore_concave: false,
            clipper_scale: geometry::CLIPPER_SCALE,
            debug_nfp: false,
        }
    }
}

impl NestConfig {
    fn ga_config(&self) -> GAConfig {
        GAConfig {
            population_size: self.population_size,
            mutation_rate: self.mutation_rate,
            rotations: self.rotations,
            spacing: self.spacing,
            use_holes: self.use_holes,
            explore_concave: self.explore_concave,
            clipper_scale: self.clipper_scale,
        }
    }
}

/// One computed NFP recorded for the debug side-channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DebugNfpRecord {
    pub a_id: i64,
    pub b_id: i64,
    pub inside: bool,
    pub nfp: NfpValue,
}

/// Outcome of a completed (or cancelled mid-flight) nesting run: the best
/// individual's placement, its fitness, the part ids that never fit, and
/// the debug NFP trail if `NestConfig::debug_nfp` was set.
#[derive(Debug, Clone)]
pub struct NestResult {
    pub placement: PlacementResult,
    pub best_individual: Individual,
    pub debug_nfp: Vec<DebugNfpRecord>,
}

pub struct Coordinator {
    bin: Polygon,
    parts: Vec<Polygon>,
    config: NestConfig,
    cache: NfpCache,
    debug_records: Vec<DebugNfpRecord>,
    cancelled: Arc<AtomicBool>,
}

impl Coordinator {
    /// Builds a coordinator for one bin/part-set run. Applies the
    /// part-spacing offsets up front (spec §4.7 step 1, supplemented
    /// feature from `svgnest.py::start`): parts shrink inward by
    /// `spacing/2`, the bin grows outward by `spacing/2`, so later NFP
    /// computation can ignore spacing entirely save for the one residual
    /// `spacing` term orbiting/minkowski NFPs expand by (kept from the
    /// original's belt-and-suspenders double application).
    pub fn new(bin: Polygon, parts: Vec<Polygon>, config: NestConfig) -> Result<Self> {
        if bin.points.len() < 3 {
            return Err(NestError::NoBin);
        }

        let bin = if config.spacing.abs() > geometry::TOL {
            let expanded = boolean::offset(&bin.points, config.spacing / 2.0, config.clipper_scale)
                .ok()
                .and_then(|contours| contours.into_iter().max_by(|a, b| {
                    geometry::polygon_area(a).abs().partial_cmp(&geometry::polygon_area(b).abs()).unwrap()
                }));
            match expanded {
                Some(points) => Polygon { points, ..bin },
                None => bin,
            }
        } else {
            bin
        };

        Ok(Coordinator {
            bin,
            parts,
            config,
            cache: NfpCache::new(),
            debug_records: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A clone-able flag the caller can set from another thread to stop
    /// the run after its current generation (spec's concurrency model:
    /// cooperative cancellation, no hard kill of in-flight NFP work).
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Computes one NFP for `key` against the given bin/part corpus. A
    /// free-standing associated function (no `self` receiver) so the
    /// per-generation fan-out in [`Self::ensure_nfp_cache`] only ever
    /// borrows the specific fields it needs, rather than all of
    /// `Coordinator` — [`run`](Self::run) holds the GA's own borrow of
    /// `bin`/`parts` open across the whole generation loop, and a
    /// `&mut self`/`&self` method here would conflict with that.
    ///
    /// When `config.use_holes` is set and `a` has holes whose bounds
    /// exceed `b`'s on both axes, appends the additional inner NFPs of
    /// each qualifying hole against `b` (spec §4.3.2's hole
    /// post-processing step), normalized to the hole winding convention.
    fn compute_nfp(bin: &Polygon, key: &NfpKey, lookup: &HashMap<i64, &Polygon>, config: &NestConfig) -> Option<NfpValue> {
        if key.inside {
            let part = lookup.get(&key.b_id)?;
            let rotated = part.rotated(key.b_rotation());
            nfp::inner_nfp(&bin.points, &rotated.points, config.spacing, config.explore_concave).ok()
        } else {
            let a = lookup.get(&key.a_id)?;
            let b = lookup.get(&key.b_id)?;
            let ra = a.rotated(key.a_rotation());
            let rb = b.rotated(key.b_rotation());
            let mut result = nfp::outer_nfp(
                &ra.points,
                &rb.points,
                config.spacing,
                config.curve_tolerance,
                config.clipper_scale,
                config.explore_concave,
            )
            .ok()?;

            if config.use_holes {
                if let Some(b_bounds) = geometry::get_polygon_bounds(&rb.points) {
                    for hole in &ra.children {
                        let Some(hole_bounds) = geometry::get_polygon_bounds(&hole.points) else {
                            continue;
                        };
                        if hole_bounds.width > b_bounds.width && hole_bounds.height > b_bounds.height {
                            if let Ok(mut cnfp) =
                                nfp::inner_nfp(&hole.points, &rb.points, config.spacing, config.explore_concave)
                            {
                                for contour in cnfp.iter_mut() {
                                    if geometry::polygon_area(contour) < 0.0 {
                                        contour.reverse();
                                    }
                                }
                                result.extend(cnfp);
                            }
                        }
                    }
                }
            }

            Some(result)
        }
    }

    /// Computes and caches every NFP the current population can need,
    /// fanned out across `rayon`'s work-stealing pool (spec §5: one NFP
    /// pair per task, a generation barrier before placement evaluation,
    /// single-threaded cache merge). Associated function rather than a
    /// `&mut self` method for the same borrow-disjointness reason as
    /// [`Self::compute_nfp`]: callers pass `bin`/`parts`/`config` and
    /// `cache`/`debug_records` as separate field borrows so they can
    /// coexist with a live `GeneticAlgorithm` borrow of `bin`/`parts`.
    fn ensure_nfp_cache(
        bin: &Polygon,
        parts: &[Polygon],
        config: &NestConfig,
        cache: &mut NfpCache,
        debug_records: &mut Vec<DebugNfpRecord>,
        required_keys: Vec<NfpKey>,
    ) {
        let missing: Vec<NfpKey> = required_keys.into_iter().filter(|k| !cache.contains(k)).collect();

        if missing.is_empty() {
            return;
        }

        let lookup: HashMap<i64, &Polygon> = parts.iter().map(|p| (p.id, p)).collect();
        let computed: Vec<(NfpKey, Option<NfpValue>)> =
            missing.par_iter().map(|key| (*key, Coordinator::compute_nfp(bin, key, &lookup, config))).collect();

        for (key, value) in computed {
            match value {
                Some(v) => {
                    if config.debug_nfp {
                        debug_records.push(DebugNfpRecord { a_id: key.a_id, b_id: key.b_id, inside: key.inside, nfp: v.clone() });
                    }
                    cache.insert(key, v);
                }
                None => {
                    log::warn!(
                        "NFP computation failed for pair (a={}, b={}, inside={})",
                        key.a_id,
                        key.b_id,
                        key.inside
                    );
                }
            }
        }
    }

    /// Runs the GA for up to `generations` rounds, stopping early if the
    /// cancel handle is set. Each round: fan out missing NFPs, evaluate
    /// the population against the now-complete cache, log the best
    /// fitness, then advance (spec §4.7 steps 2-4).
    pub fn run(&mut self, generations: usize) -> Result<NestResult> {
        let mut ga = GeneticAlgorithm::new(&self.parts, &self.bin, self.config.ga_config())?;

        for generation in 0..generations {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("nesting run cancelled after {generation} generations");
                break;
            }

            let required = ga.required_nfp_keys();
            Coordinator::ensure_nfp_cache(
                &self.bin,
                &self.parts,
                &self.config,
                &mut self.cache,
                &mut self.debug_records,
                required,
            );
            ga.evaluate_population(&self.cache);

            if let Some(best) = ga.best() {
                log::info!("generation {generation}: best fitness {:.4}", best.fitness);
            }

            if generation + 1 < generations {
                ga.generation();
            }
        }

        let best = ga.best().cloned().ok_or(NestError::NfpSanity)?;
        let placement = ga.layout_for(&best, &self.cache);

        Ok(NestResult {
            placement,
            best_individual: best,
            debug_nfp: self.debug_records.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn run_places_a_single_small_part() {
        let bin = Polygon::new(square(50.0));
        let mut part = Polygon::new(square(5.0));
        part.id = 0;

        let config = NestConfig { population_size: 4, rotations: 1, ..Default::default() };
        let mut coordinator = Coordinator::new(bin, vec![part], config).unwrap();
        let result = coordinator.run(2).unwrap();

        assert!(result.placement.unplaced.is_empty());
    }

    #[test]
    fn rejects_bin_with_fewer_than_three_points() {
        let bin = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let result = Coordinator::new(bin, vec![], NestConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn cancel_handle_stops_before_all_generations_run() {
        let bin = Polygon::new(square(50.0));
        let mut part = Polygon::new(square(5.0));
        part.id = 0;
        let config = NestConfig { population_size: 4, rotations: 1, ..Default::default() };
        let mut coordinator = Coordinator::new(bin, vec![part], config).unwrap();
        let handle = coordinator.cancel_handle();
        handle.store(true, Ordering::Relaxed);
        let result = coordinator.run(100);
        assert!(result.is_ok());
    }
}
