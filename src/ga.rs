//! Genetic algorithm over (insertion order, rotation) individuals
//! (component GA).
//!
//! An individual is a permutation of part indices plus a per-part
//! rotation angle; fitness comes from running the real NFP-driven
//! placement worker over that ordering (spec §4.6). The NFP cache itself
//! is generation-scoped and owned by [`crate::coordinator`], which
//! computes it once per generation and hands it to [`GeneticAlgorithm`]
//! for evaluation — this mirrors the original implementation's separation
//! between `launchWorkers` (NFP fan-out) and `GeneticAlgorithm`.

use rand::prelude::*;

use crate::cache::NfpCache;
use crate::geometry::Bounds;
use crate::part::Polygon;
use crate::placement::{self, PlacementResult};

#[derive(Clone, Copy, Debug)]
pub struct GAConfig {
    pub population_size: usize,
    /// Percent chance per gene of swap-mutation / rotation reroll (matches
    /// the original's `mutationRate`, e.g. `10` means 10%).
    pub mutation_rate: usize,
    pub rotations: usize,
    pub spacing: f64,
    pub use_holes: bool,
    pub explore_concave: bool,
    pub clipper_scale: f64,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 10,
            mutation_rate: 10,
            rotations: 4,
            spacing: 0.0,
            use_holes: false,
            explore_concave: false,
            clipper_scale: crate::geometry::CLIPPER_SCALE,
        }
    }
}

/// One candidate solution: a part ordering plus the rotation angle each
/// part is evaluated at.
#[derive(Clone, Debug)]
pub struct Individual {
    pub placement: Vec<usize>,
    pub rotation: Vec<f64>,
    pub fitness: f64,
}

pub struct GeneticAlgorithm<'a> {
    parts: &'a [Polygon],
    bin: &'a Polygon,
    bin_bounds: Bounds,
    config: GAConfig,
    pub population: Vec<Individual>,
}

impl<'a> GeneticAlgorithm<'a> {
    pub fn new(parts: &'a [Polygon], bin: &'a Polygon, config: GAConfig) -> crate::error::Result<Self> {
        let bin_bounds = bin.bounds().ok_or(crate::error::NestError::NoBin)?;

        let mut ga = GeneticAlgorithm {
            parts,
            bin,
            bin_bounds,
            config,
            population: Vec::new(),
        };

        // seed individual: parts ordered by descending area, as in the
        // original's `launchWorkers` ("adam"), which tends to place the
        // hardest-to-fit parts first.
        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| {
            parts[b].area().abs().partial_cmp(&parts[a].area().abs()).unwrap_or(std::cmp::Ordering::Equal)
        });
        let angles: Vec<f64> = order.iter().map(|&idx| ga.random_angle(&parts[idx])).collect();

        let base = Individual {
            placement: order,
            rotation: angles,
            fitness: f64::MAX,
        };
        ga.population.push(base.clone());
        while ga.population.len() < config.population_size {
            let m = ga.mutate(&base);
            ga.population.push(m);
        }
        Ok(ga)
    }

    /// Picks a rotation (shuffled candidates, first that fits the bin's
    /// bounding box) or `0.0` if none do — the bin-bounds check is only a
    /// coarse prefilter, real fit is decided by the placement worker.
    fn random_angle(&self, part: &Polygon) -> f64 {
        if self.config.rotations == 0 {
            return 0.0;
        }
        let mut angles: Vec<f64> = (0..self.config.rotations).map(|i| i as f64 * 360.0 / self.config.rotations as f64).collect();
        let mut rng = thread_rng();
        angles.shuffle(&mut rng);
        for angle in angles {
            let rotated = part.rotated(angle);
            if let Some(b) = rotated.bounds() {
                if b.width <= self.bin_bounds.width && b.height <= self.bin_bounds.height {
                    return angle;
                }
            }
        }
        0.0
    }

    fn mutate(&self, ind: &Individual) -> Individual {
        let mut rng = thread_rng();
        let mut placement = ind.placement.clone();
        let mut rotation = ind.rotation.clone();
        for i in 0..placement.len() {
            if rng.r#gen::<f64>() < self.config.mutation_rate as f64 * 0.01 {
                if i + 1 < placement.len() {
                    placement.swap(i, i + 1);
                }
            }
            if rng.r#gen::<f64>() < self.config.mutation_rate as f64 * 0.01 {
                rotation[i] = self.random_angle(&self.parts[placement[i]]);
            }
        }
        Individual { placement, rotation, fitness: f64::MAX }
    }

    /// Single-point crossover: the cut keeps `male`'s prefix, then fills
    /// the rest from `female`'s order skipping genes already present
    /// (and symmetrically for the second child), matching the original's
    /// `mate`.
    fn mate(&self, male: &Individual, female: &Individual) -> (Individual, Individual) {
        let len = male.placement.len();
        let mut rng = thread_rng();
        let cut = ((len as f64 * rng.gen_range(0.1..0.9)).round().clamp(0.0, len as f64)) as usize;

        let mut gene1 = male.placement[..cut].to_vec();
        let mut rot1 = male.rotation[..cut].to_vec();
        for (&p, &r) in female.placement.iter().zip(&female.rotation) {
            if !gene1.contains(&p) {
                gene1.push(p);
                rot1.push(r);
            }
        }

        let mut gene2 = female.placement[..cut].to_vec();
        let mut rot2 = female.rotation[..cut].to_vec();
        for (&p, &r) in male.placement.iter().zip(&male.rotation) {
            if !gene2.contains(&p) {
                gene2.push(p);
                rot2.push(r);
            }
        }

        (
            Individual { placement: gene1, rotation: rot1, fitness: f64::MAX },
            Individual { placement: gene2, rotation: rot2, fitness: f64::MAX },
        )
    }

    /// Linearly-decreasing-weight roulette selection, favoring
    /// lower-index (fitter, since the population is sorted ascending
    /// before selection) individuals. Matches the original's
    /// `randomWeightedIndividual`.
    fn random_weighted_index(&self, exclude: Option<usize>) -> usize {
        let mut rng = thread_rng();
        let mut idxs: Vec<usize> = (0..self.population.len()).collect();
        if let Some(e) = exclude {
            idxs.retain(|&v| v != e);
        }
        let rand = rng.r#gen::<f64>();
        let mut lower = 0.0;
        let weight = 1.0 / idxs.len() as f64;
        let mut upper = weight;
        for (pos, &i) in idxs.iter().enumerate() {
            if rand > lower && rand < upper {
                return i;
            }
            lower = upper;
            upper += 2.0 * weight * ((idxs.len() - pos) as f64 / idxs.len() as f64);
        }
        idxs[0]
    }

    /// Builds the rotated, ordered part list an individual represents.
    fn ordered_parts(&self, ind: &Individual) -> Vec<Polygon> {
        ind.placement
            .iter()
            .zip(&ind.rotation)
            .map(|(&idx, &angle)| self.parts[idx].rotated(angle))
            .collect()
    }

    /// Evaluates every individual's fitness by running the placement
    /// worker over its ordering, using `cache` for every NFP lookup
    /// (spec §4.6 step 2; the coordinator has already populated `cache`
    /// with every NFP this generation's population can need, so this step
    /// does no NFP computation itself and is safe to call per-individual
    /// from a parallel iterator).
    pub fn evaluate_population(&mut self, cache: &NfpCache) {
        let parts = self.parts;
        let bin = self.bin;
        let scale = self.config.clipper_scale;
        for ind in &mut self.population {
            let ordered: Vec<Polygon> =
                ind.placement.iter().zip(&ind.rotation).map(|(&idx, &angle)| parts[idx].rotated(angle)).collect();
            let result = placement::place_paths(bin, &ordered, cache, scale);
            ind.fitness = result.fitness;
        }
    }

    /// Advances one generation: elitism (keep the current best), then
    /// fill the rest via weighted selection + crossover + mutation
    /// (spec §4.6 step 3).
    pub fn generation(&mut self) {
        self.population.sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal));
        let mut newpop = vec![self.population[0].clone()];
        while newpop.len() < self.population.len() {
            let m_idx = self.random_weighted_index(None);
            let f_idx = self.random_weighted_index(Some(m_idx));
            let (c1, c2) = self.mate(&self.population[m_idx], &self.population[f_idx]);
            newpop.push(self.mutate(&c1));
            if newpop.len() < self.population.len() {
                newpop.push(self.mutate(&c2));
            }
        }
        self.population = newpop;
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population.iter().min_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Every distinct NFP key the current population could need this
    /// generation: one inner-fit key per (part, rotation) and one outer
    /// key per ordered pair of (part, rotation) combinations that can end
    /// up adjacent in some individual's placement order. The coordinator
    /// uses this to drive its parallel NFP pass (spec §4.7 step 2).
    pub fn required_nfp_keys(&self) -> Vec<crate::nfp::NfpKey> {
        use crate::nfp::NfpKey;
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        let mut push_unique = |key: NfpKey| {
            if seen.insert(key) {
                keys.push(key);
            }
        };

        for ind in &self.population {
            for (&idx, &angle) in ind.placement.iter().zip(&ind.rotation) {
                let part_id = self.parts[idx].id;
                push_unique(NfpKey::new(-1, part_id, true, 0.0, angle));
            }
            for i in 0..ind.placement.len() {
                for j in 0..ind.placement.len() {
                    if i == j {
                        continue;
                    }
                    let a_id = self.parts[ind.placement[i]].id;
                    let b_id = self.parts[ind.placement[j]].id;
                    push_unique(NfpKey::new(a_id, b_id, false, ind.rotation[i], ind.rotation[j]));
                }
            }
        }
        keys
    }

    /// Re-runs placement for `ind` and returns it, for rendering the best
    /// individual found so far (spec's Renderer collaborator).
    pub fn layout_for(&self, ind: &Individual, cache: &NfpCache) -> PlacementResult {
        let ordered = self.ordered_parts(ind);
        placement::place_paths(self.bin, &ordered, cache, self.config.clipper_scale)
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
    fn new_ga_seeds_population_to_configured_size() {
        let bin = Polygon::new(square(100.0));
        let mut p1 = Polygon::new(square(10.0));
        p1.id = 0;
        let mut p2 = Polygon::new(square(5.0));
        p2.id = 1;
        let parts = vec![p1, p2];
        let config = GAConfig { population_size: 6, ..Default::default() };
        let ga = GeneticAlgorithm::new(&parts, &bin, config).unwrap();
        assert_eq!(ga.population.len(), 6);
    }

    #[test]
    fn generation_keeps_best_individual_via_elitism() {
        let bin = Polygon::new(square(100.0));
        let mut p1 = Polygon::new(square(10.0));
        p1.id = 0;
        let parts = vec![p1];
        let config = GAConfig { population_size: 4, rotations: 1, ..Default::default() };
        let mut ga = GeneticAlgorithm::new(&parts, &bin, config).unwrap();
        ga.population[0].fitness = 1.0;
        for ind in ga.population.iter_mut().skip(1) {
            ind.fitness = 100.0;
        }
        let best_before = ga.population[0].placement.clone();
        ga.generation();
        assert_eq!(ga.population[0].placement, best_before);
    }

    #[test]
    fn required_nfp_keys_includes_inner_fit_for_every_individual_part() {
        let bin = Polygon::new(square(100.0));
        let mut p1 = Polygon::new(square(10.0));
        p1.id = 0;
        let parts = vec![p1];
        let config = GAConfig { population_size: 2, rotations: 1, ..Default::default() };
        let ga = GeneticAlgorithm::new(&parts, &bin, config).unwrap();
        let keys = ga.required_nfp_keys();
        assert!(keys.iter().any(|k| k.a_id == -1 && k.b_id == 0 && k.inside));
    }
}
