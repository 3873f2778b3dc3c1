use crate::alignment::SiteState;
use crate::ancestry::common_ancestor::{logged_node, path_from_root};
use crate::ancestry::weighted_choice::random_choice_pdf;
use crate::ancestry::{AncestryError, SamplingError};
use crate::likelihood::{Backend, LikelihoodEngine};
use crate::model::{Tree, VertexIndex};
use rand::Rng;
use tracing::{debug, trace};

/// Samples ancestral states top-down, one state per site.
///
/// The root is drawn from its partial likelihoods; every other vertex is
/// drawn conditioned on the sampled state of its parent, weighting state `s`
/// of a site by `partial[s] * P(parent state -> s)`. Leaves are copied from
/// the observed data unless the engine treats them as ambiguity partials;
/// ambiguous observations then stay unresolved (`None`).
///
/// Sampled vectors are cached per vertex until [begin_pass](Self::begin_pass),
/// so vertices sampled for several clades within one pass stay consistent.
/// The random generator is owned by the sampler and seeded by the caller.
///
/// # Example
/// ```no_run
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use stochmap::ancestry::AncestralSampler;
/// # use stochmap::likelihood::LikelihoodEngine;
/// # fn run(tree: &stochmap::model::Tree, engine: &mut impl LikelihoodEngine, clade: &[usize]) {
///
/// let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(1));
/// engine.recompute_all().unwrap();
/// sampler.begin_pass();
/// let states = sampler.sample_clade_states(tree, &*engine, clade, false).unwrap();
/// println!("{states:?}");
/// # }
/// ```
pub struct AncestralSampler<R> {
    rng: R,
    cache: Vec<Option<Vec<SiteState>>>,
}

impl<R: Rng> AncestralSampler<R> {
    /// Creates a sampler drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng, cache: Vec::new() }
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Starts a new pass, forgetting all sampled states.
    pub fn begin_pass(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
    }

    /// States sampled for `node` in the current pass, if any.
    pub fn cached(&self, node: VertexIndex) -> Option<&[SiteState]> {
        self.cache.get(node).and_then(|entry| entry.as_deref())
    }

    /// Samples the states of `node`, one per site.
    ///
    /// Ancestors of `node` not yet sampled in this pass are sampled first,
    /// root down. Repeated calls within a pass return the cached vector
    /// without drawing.
    ///
    /// # Errors
    /// * [SamplingError::Unsupported] if the engine has more than one rate
    ///   category or no plain partials
    /// * [SamplingError::DegenerateWeights] if a site has no state with positive weight
    pub fn sample<E: LikelihoodEngine + ?Sized>(
        &mut self,
        tree: &Tree,
        engine: &E,
        node: VertexIndex,
    ) -> Result<&[SiteState], SamplingError> {
        if !tree.contains(node) {
            return Err(AncestryError::UnknownVertex(node).into());
        }
        if self.cache.len() < tree.num_vertices() {
            self.cache.resize(tree.num_vertices(), None);
        }

        if self.cache[node].is_none() {
            check_supported(engine)?;

            let mut sampled = 0;
            for vertex in path_from_root(tree, node) {
                if self.cache[vertex].is_some() {
                    continue;
                }
                let states = match tree.parent(vertex) {
                    None => sample_root(engine, &mut self.rng)?,
                    Some(parent) => {
                        let parent_states = self.cache[parent]
                            .as_deref()
                            .expect("ancestors are sampled before descendants");
                        if tree[vertex].is_leaf() && !engine.uses_ambiguities() {
                            copy_leaf(engine, vertex)?
                        } else {
                            sample_child(engine, vertex, parent_states, &mut self.rng)?
                        }
                    }
                };
                trace!(vertex, "sampled vertex states");
                self.cache[vertex] = Some(states);
                sampled += 1;
            }
            debug!(node, sampled, "sampled ancestral states");
        }

        Ok(self.cache[node].as_deref().unwrap_or_default())
    }

    /// Samples the states logged for a clade: those of the MRCA of
    /// `clade_leaves`, or of its parent if `log_parent` is set.
    pub fn sample_clade_states<E: LikelihoodEngine + ?Sized>(
        &mut self,
        tree: &Tree,
        engine: &E,
        clade_leaves: &[VertexIndex],
        log_parent: bool,
    ) -> Result<Vec<SiteState>, SamplingError> {
        let node = logged_node(tree, clade_leaves, log_parent)?;
        Ok(self.sample(tree, engine, node)?.to_vec())
    }
}

fn check_supported<E: LikelihoodEngine + ?Sized>(engine: &E) -> Result<(), SamplingError> {
    if engine.category_count() != 1 {
        return Err(SamplingError::Unsupported(format!(
            "rate heterogeneity with {} categories",
            engine.category_count()
        )));
    }
    if engine.backend() != Backend::Plain {
        return Err(SamplingError::Unsupported(format!("{} likelihood backend", engine.backend())));
    }
    Ok(())
}

fn sample_root<E: LikelihoodEngine + ?Sized, R: Rng>(engine: &E, rng: &mut R) -> Result<Vec<SiteState>, SamplingError> {
    (0..engine.site_count())
        .map(|site| {
            let weights = engine.root_partials(engine.pattern_index(site));
            random_choice_pdf(weights, rng).map(Some)
        })
        .collect()
}

/// Copies observed states of a leaf; ambiguous codes stay unresolved.
fn copy_leaf<E: LikelihoodEngine + ?Sized>(engine: &E, leaf: VertexIndex) -> Result<Vec<SiteState>, SamplingError> {
    let codes = engine.leaf_states(leaf).ok_or(SamplingError::MissingLeafStates(leaf))?;
    let state_count = engine.state_count();
    Ok((0..engine.site_count())
        .map(|site| {
            let code = codes[engine.pattern_index(site)];
            (code < state_count).then_some(code)
        })
        .collect())
}

fn sample_child<E: LikelihoodEngine + ?Sized, R: Rng>(
    engine: &E,
    vertex: VertexIndex,
    parent_states: &[SiteState],
    rng: &mut R,
) -> Result<Vec<SiteState>, SamplingError> {
    let state_count = engine.state_count();
    let matrix = engine.transition_matrix(vertex, 0);
    let partials = engine.node_partials(vertex, 0);
    let mut weights = vec![0.0; state_count];

    (0..engine.site_count())
        .map(|site| {
            let parent = parent_states[site].ok_or(SamplingError::UnresolvedParent { vertex, site })?;
            let offset = engine.pattern_index(site) * state_count;
            for (s, w) in weights.iter_mut().enumerate() {
                *w = partials[offset + s] * matrix[parent * state_count + s];
            }
            random_choice_pdf(&weights, rng).map(Some)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::LikelihoodError;
    use crate::model::LeafLabelMap;
    use crate::newick;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    const SCENARIO: &str = "((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;";

    /// Wraps a generator and counts the words drawn from it.
    struct CountingRng {
        inner: ChaCha8Rng,
        draws: usize,
    }

    impl CountingRng {
        fn new(seed: u64) -> Self {
            Self { inner: ChaCha8Rng::seed_from_u64(seed), draws: 0 }
        }
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dst);
        }
    }

    /// Binary-state engine with one pattern per site.
    struct StubEngine {
        sites: usize,
        root: Vec<f64>,
        partials: Vec<Vec<f64>>,
        matrix: Vec<f64>,
        leaf_states: Vec<Option<Vec<usize>>>,
        categories: usize,
        backend: Backend,
        ambiguities: bool,
        excluded: BTreeSet<usize>,
    }

    impl StubEngine {
        /// Uniform partials and uniform transitions, so every draw is random.
        fn uniform(tree: &Tree, sites: usize) -> Self {
            Self {
                sites,
                root: vec![0.5; 2 * sites],
                partials: vec![vec![1.0; 2 * sites]; tree.num_vertices()],
                matrix: vec![0.5; 4],
                leaf_states: vec![None; tree.num_vertices()],
                categories: 1,
                backend: Backend::Plain,
                ambiguities: false,
                excluded: BTreeSet::new(),
            }
        }
    }

    impl LikelihoodEngine for StubEngine {
        fn recompute_all(&mut self) -> Result<f64, LikelihoodError> {
            Ok(0.0)
        }
        fn root_partials(&self, pattern: usize) -> &[f64] {
            &self.root[2 * pattern..2 * pattern + 2]
        }
        fn node_partials(&self, node: VertexIndex, _category: usize) -> &[f64] {
            &self.partials[node]
        }
        fn transition_matrix(&self, _node: VertexIndex, _category: usize) -> &[f64] {
            &self.matrix
        }
        fn leaf_states(&self, node: VertexIndex) -> Option<&[usize]> {
            self.leaf_states[node].as_deref()
        }
        fn pattern_index(&self, site: usize) -> usize {
            site
        }
        fn site_count(&self) -> usize {
            self.sites
        }
        fn pattern_count(&self) -> usize {
            self.sites
        }
        fn state_count(&self) -> usize {
            2
        }
        fn category_count(&self) -> usize {
            self.categories
        }
        fn excluded_patterns(&self) -> &BTreeSet<usize> {
            &self.excluded
        }
        fn backend(&self) -> Backend {
            self.backend
        }
        fn uses_ambiguities(&self) -> bool {
            self.ambiguities
        }
    }

    fn scenario() -> (Tree, LeafLabelMap) {
        newick::parse_str(SCENARIO).unwrap()
    }

    #[test]
    fn test_length_matches_site_count() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 17);
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(5));
        let f = tree.find_vertex("F", &labels).unwrap();
        let states = sampler.sample(&tree, &engine, f).unwrap();
        assert_eq!(states.len(), 17);
        assert!(states.iter().all(|s| matches!(s, Some(0) | Some(1))));
    }

    #[test]
    fn test_memoized_within_pass() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 8);
        let mut sampler = AncestralSampler::new(CountingRng::new(11));
        let h = tree.find_vertex("H", &labels).unwrap();

        let first = sampler.sample(&tree, &engine, h).unwrap().to_vec();
        let draws = sampler.rng().draws;
        assert!(draws > 0);

        let second = sampler.sample(&tree, &engine, h).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(sampler.rng().draws, draws);
    }

    #[test]
    fn test_ancestors_are_shared_between_nodes() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 4);
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(2));
        let f = tree.find_vertex("F", &labels).unwrap();
        let h = tree.find_vertex("H", &labels).unwrap();

        sampler.sample(&tree, &engine, f).unwrap();
        let h_states = sampler.cached(h).unwrap().to_vec();
        assert_eq!(sampler.sample(&tree, &engine, h).unwrap(), h_states.as_slice());
        assert!(sampler.cached(tree.root_index()).is_some());
        assert!(sampler.cached(tree.find_vertex("C", &labels).unwrap()).is_none());
    }

    #[test]
    fn test_begin_pass_clears_cache() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 4);
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(2));
        let c = tree.find_vertex("C", &labels).unwrap();

        sampler.sample(&tree, &engine, c).unwrap();
        sampler.begin_pass();
        assert!(sampler.cached(c).is_none());
        assert!(sampler.cached(tree.root_index()).is_none());
    }

    #[test]
    fn test_states_follow_parent_through_identity_matrix() {
        let (tree, labels) = scenario();
        let mut engine = StubEngine::uniform(&tree, 6);
        engine.matrix = vec![1.0, 0.0, 0.0, 1.0];
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(9));

        let root = sampler.sample(&tree, &engine, tree.root_index()).unwrap().to_vec();
        let f = tree.find_vertex("F", &labels).unwrap();
        assert_eq!(sampler.sample(&tree, &engine, f).unwrap(), root.as_slice());
    }

    #[test]
    fn test_root_drawn_from_root_partials() {
        let (tree, _) = scenario();
        let mut engine = StubEngine::uniform(&tree, 3);
        engine.root = vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.3];
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(4));
        let root = sampler.sample(&tree, &engine, tree.root_index()).unwrap();
        assert_eq!(root, &[Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn test_leaf_copies_observed_states_without_draws() {
        let (tree, labels) = scenario();
        let mut engine = StubEngine::uniform(&tree, 4);
        let d = tree.find_vertex("D", &labels).unwrap();
        engine.leaf_states[d] = Some(vec![1, 0, 2, 1]);
        let mut sampler = AncestralSampler::new(CountingRng::new(8));

        let f = tree.find_vertex("F", &labels).unwrap();
        sampler.sample(&tree, &engine, f).unwrap();
        let draws = sampler.rng().draws;

        let states = sampler.sample(&tree, &engine, d).unwrap().to_vec();
        assert_eq!(states, vec![Some(1), Some(0), None, Some(1)]);
        assert_eq!(sampler.rng().draws, draws);
    }

    #[test]
    fn test_leaf_sampled_with_ambiguities() {
        let (tree, labels) = scenario();
        let mut engine = StubEngine::uniform(&tree, 3);
        engine.ambiguities = true;
        let d = tree.find_vertex("D", &labels).unwrap();
        engine.partials[d] = vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(3));

        let states = sampler.sample(&tree, &engine, d).unwrap();
        assert_eq!(states[0], Some(1));
        assert_eq!(states[1], Some(0));
        assert!(states[2].is_some());
    }

    #[test]
    fn test_log_parent_samples_parent_of_mrca() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 5);
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(21));
        let leaves = [tree.find_vertex("D", &labels).unwrap(), tree.find_vertex("E", &labels).unwrap()];

        let states = sampler.sample_clade_states(&tree, &engine, &leaves, true).unwrap();
        let h = tree.find_vertex("H", &labels).unwrap();
        assert_eq!(sampler.cached(h), Some(states.as_slice()));
        assert!(sampler.cached(tree.find_vertex("F", &labels).unwrap()).is_none());
    }

    #[test]
    fn test_log_parent_of_root_fails() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 5);
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(21));
        let leaves = [tree.find_vertex("A", &labels).unwrap(), tree.find_vertex("G", &labels).unwrap()];
        assert_eq!(
            sampler.sample_clade_states(&tree, &engine, &leaves, true),
            Err(SamplingError::Ancestry(AncestryError::NoParentOfRoot))
        );
    }

    #[test]
    fn test_same_seed_same_states() {
        let (tree, labels) = scenario();
        let engine = StubEngine::uniform(&tree, 32);
        let e = tree.find_vertex("E", &labels).unwrap();
        let g = tree.find_vertex("G", &labels).unwrap();

        let run = || {
            let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(1234));
            sampler.sample_clade_states(&tree, &engine, &[e, g], false).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_unsupported_configurations() {
        let (tree, _) = scenario();
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(0));

        let mut engine = StubEngine::uniform(&tree, 2);
        engine.categories = 4;
        assert!(matches!(
            sampler.sample(&tree, &engine, tree.root_index()),
            Err(SamplingError::Unsupported(_))
        ));

        let mut engine = StubEngine::uniform(&tree, 2);
        engine.backend = Backend::Accelerated;
        assert!(matches!(
            sampler.sample(&tree, &engine, tree.root_index()),
            Err(SamplingError::Unsupported(_))
        ));
    }

    #[test]
    fn test_zero_root_weights_fail() {
        let (tree, _) = scenario();
        let mut engine = StubEngine::uniform(&tree, 2);
        engine.root = vec![0.5, 0.5, 0.0, 0.0];
        let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(
            sampler.sample(&tree, &engine, tree.root_index()),
            Err(SamplingError::DegenerateWeights(_))
        ));
    }
}
