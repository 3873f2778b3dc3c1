use crate::alignment::SitePatterns;
use crate::likelihood::{
    Backend, EngineSettings, LikelihoodEngine, LikelihoodError, SiteModel, SubstitutionModel,
};
use crate::model::{LabelIndex, LeafLabelMap, Tree, VertexIndex};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Felsenstein pruning on a [Tree] for the patterns of an alignment.
///
/// Per vertex and rate category the engine keeps the partial likelihoods of
/// all patterns and the transition matrix of the branch above. Partials of
/// internal vertices are rescaled per pattern by their maximum over states
/// and categories; the log scale factors only enter the log likelihood.
///
/// Leaf partials are indicator vectors of the observed state, or of every
/// state compatible with an ambiguous observation.
///
/// # Example
/// ```
/// use stochmap::alignment::{Alignment, DataType, SitePatterns};
/// use stochmap::likelihood::{EngineSettings, LikelihoodEngine, PruningLikelihood, SiteModel, SubstitutionModel};
///
/// let alignment = Alignment::from_sequences(DataType::Nucleotide, [("A", "AC"), ("B", "AG")]).unwrap();
/// let (tree, labels) = stochmap::newick::parse_str("(A:0.1,B:0.1);").unwrap();
/// let patterns = SitePatterns::new(&alignment);
///
/// let mut engine = PruningLikelihood::new(
///     &tree,
///     &labels,
///     &patterns,
///     SubstitutionModel::equal_frequencies(4).unwrap(),
///     SiteModel::single(),
///     EngineSettings::new(),
/// ).unwrap();
/// let log_likelihood = engine.recompute_all().unwrap();
/// assert!(log_likelihood < 0.0);
/// ```
pub struct PruningLikelihood<'a> {
    tree: &'a Tree,
    patterns: &'a SitePatterns,
    model: SubstitutionModel,
    site_model: SiteModel,
    settings: EngineSettings,
    /// Alignment taxon of each leaf vertex
    leaf_taxa: Vec<Option<LabelIndex>>,
    /// Per vertex: categories x patterns x states
    partials: Vec<Vec<f64>>,
    /// Per vertex: categories x states x states
    matrices: Vec<Vec<f64>>,
    /// Per vertex: log scale factor of each pattern
    scale_factors: Vec<Vec<f64>>,
    /// Patterns x states, integrated over categories
    root_partials: Vec<f64>,
}

impl<'a> PruningLikelihood<'a> {
    /// Sets up the engine; partials are computed by [LikelihoodEngine::recompute_all].
    ///
    /// `tree_labels` resolves the leaf labels of `tree`, which are matched by
    /// name against the taxa of `patterns`.
    ///
    /// # Errors
    /// * [LikelihoodError::UnsupportedBackend] for [Backend::Accelerated]
    /// * [LikelihoodError::InvalidModel] if model and data type disagree on the state count
    /// * [LikelihoodError::UnknownTaxon] / [LikelihoodError::TaxonCountMismatch]
    ///   if tree leaves and alignment taxa do not correspond
    /// * [LikelihoodError::MissingBranchLength] if a non-root vertex has no branch length
    pub fn new(
        tree: &'a Tree,
        tree_labels: &LeafLabelMap,
        patterns: &'a SitePatterns,
        model: SubstitutionModel,
        site_model: SiteModel,
        settings: EngineSettings,
    ) -> Result<Self, LikelihoodError> {
        if settings.backend != Backend::Plain {
            return Err(LikelihoodError::UnsupportedBackend(settings.backend));
        }
        let state_count = patterns.state_count();
        if model.state_count() != state_count {
            return Err(LikelihoodError::InvalidModel(format!(
                "model has {} states, data type {} has {}",
                model.state_count(),
                patterns.data_type(),
                state_count
            )));
        }
        if tree.num_leaves() != patterns.taxa().num_labels() {
            return Err(LikelihoodError::TaxonCountMismatch {
                alignment: patterns.taxa().num_labels(),
                tree: tree.num_leaves(),
            });
        }

        let mut leaf_taxa = vec![None; tree.num_vertices()];
        for vertex in tree.pre_order_iter() {
            if !vertex.is_root() {
                match vertex.branch_length() {
                    None => return Err(LikelihoodError::MissingBranchLength(vertex.index())),
                    Some(length) if *length == 0.0 => {
                        warn!(vertex = vertex.index(), "zero-length branch");
                    }
                    Some(_) => {}
                }
            }
            if let Some(label_index) = vertex.label_index() {
                let label = tree_labels.get_label(label_index).unwrap_or_default();
                let taxon = patterns
                    .taxa()
                    .get_index(label)
                    .ok_or_else(|| LikelihoodError::UnknownTaxon(label.to_string()))?;
                leaf_taxa[vertex.index()] = Some(taxon);
            }
        }

        let categories = site_model.category_count();
        let pattern_count = patterns.pattern_count();
        let block = pattern_count * state_count;
        let mut engine = Self {
            tree,
            patterns,
            model,
            site_model,
            settings,
            leaf_taxa,
            partials: vec![vec![0.0; categories * block]; tree.num_vertices()],
            matrices: vec![vec![0.0; categories * state_count * state_count]; tree.num_vertices()],
            scale_factors: vec![vec![0.0; pattern_count]; tree.num_vertices()],
            root_partials: vec![0.0; block],
        };
        engine.init_leaf_partials();
        Ok(engine)
    }

    fn init_leaf_partials(&mut self) {
        let state_count = self.state_count();
        let patterns = self.patterns;
        let data_type = patterns.data_type();
        for (vertex, taxon) in self.leaf_taxa.iter().enumerate() {
            let Some(taxon) = *taxon else { continue };
            let codes = patterns.taxon_states(taxon);
            if codes.is_empty() {
                continue;
            }
            for chunk in self.partials[vertex].chunks_exact_mut(codes.len() * state_count) {
                for (pattern, &code) in codes.iter().enumerate() {
                    for state in 0..state_count {
                        chunk[pattern * state_count + state] = if data_type.allows(code, state) { 1.0 } else { 0.0 };
                    }
                }
            }
        }
    }

    fn update_matrices(&mut self) {
        let n2 = self.state_count() * self.state_count();
        let tree = self.tree;
        for vertex in tree.pre_order_iter() {
            let Some(length) = vertex.branch_length() else { continue };
            let matrices = &mut self.matrices[vertex.index()];
            for category in 0..self.site_model.category_count() {
                let distance = *length * self.site_model.rate(category);
                self.model
                    .transition_probabilities(distance, &mut matrices[category * n2..(category + 1) * n2]);
            }
        }
    }

    /// Computes partials of `vertex` from those of its children.
    fn update_partials(&mut self, vertex: VertexIndex, left: VertexIndex, right: VertexIndex) {
        let state_count = self.state_count();
        let pattern_count = self.pattern_count();
        let n2 = state_count * state_count;
        let block = pattern_count * state_count;

        let mut partials = std::mem::take(&mut self.partials[vertex]);
        for category in 0..self.site_model.category_count() {
            let left_partials = &self.partials[left][category * block..(category + 1) * block];
            let right_partials = &self.partials[right][category * block..(category + 1) * block];
            let left_matrix = &self.matrices[left][category * n2..(category + 1) * n2];
            let right_matrix = &self.matrices[right][category * n2..(category + 1) * n2];

            for pattern in 0..pattern_count {
                let offset = pattern * state_count;
                for parent in 0..state_count {
                    let row = parent * state_count;
                    let mut sum_left = 0.0;
                    let mut sum_right = 0.0;
                    for child in 0..state_count {
                        sum_left += left_matrix[row + child] * left_partials[offset + child];
                        sum_right += right_matrix[row + child] * right_partials[offset + child];
                    }
                    partials[category * block + offset + parent] = sum_left * sum_right;
                }
            }
        }

        // rescale per pattern
        let scale = &mut self.scale_factors[vertex];
        for pattern in 0..pattern_count {
            let offset = pattern * state_count;
            let max = (0..self.site_model.category_count())
                .flat_map(|c| partials[c * block + offset..c * block + offset + state_count].iter())
                .fold(0.0f64, |acc, &p| acc.max(p));
            if max > 0.0 {
                for c in 0..self.site_model.category_count() {
                    for p in &mut partials[c * block + offset..c * block + offset + state_count] {
                        *p /= max;
                    }
                }
                scale[pattern] = max.ln();
            } else {
                scale[pattern] = 0.0;
            }
        }

        self.partials[vertex] = partials;
    }

    fn integrate_root(&mut self) {
        let root = self.tree.root_index();
        let block = self.pattern_count() * self.state_count();
        self.root_partials.iter_mut().for_each(|p| *p = 0.0);
        for category in 0..self.site_model.category_count() {
            let proportion = self.site_model.proportion(category);
            let partials = &self.partials[root][category * block..(category + 1) * block];
            for (total, &p) in self.root_partials.iter_mut().zip(partials) {
                *total += proportion * p;
            }
        }
    }

    /// Sum over included patterns of weight times log likelihood,
    /// corrected for the ascertainment of excluded patterns.
    fn log_likelihood(&self) -> Result<f64, LikelihoodError> {
        let state_count = self.state_count();
        let frequencies = self.model.frequencies();
        let pattern_log_likelihoods: Vec<f64> = (0..self.pattern_count())
            .map(|pattern| {
                let partials = self.root_partials(pattern);
                let site_likelihood: f64 = (0..state_count).map(|s| frequencies[s] * partials[s]).sum();
                let scale: f64 = self.scale_factors.iter().map(|factors| factors[pattern]).sum();
                site_likelihood.ln() + scale
            })
            .collect();

        let excluded = self.excluded_patterns();
        let correction = if excluded.is_empty() {
            0.0
        } else {
            let excluded_probability: f64 = excluded.iter().map(|&p| pattern_log_likelihoods[p].exp()).sum();
            if excluded_probability >= 1.0 {
                return Err(LikelihoodError::NumericalFailure(format!(
                    "excluded patterns have total probability {excluded_probability}"
                )));
            }
            (1.0 - excluded_probability).ln()
        };

        let log_likelihood: f64 = pattern_log_likelihoods
            .iter()
            .zip(self.patterns.weights())
            .enumerate()
            .filter(|(pattern, _)| !excluded.contains(pattern))
            .map(|(_, (log_l, &weight))| (log_l - correction) * weight as f64)
            .sum();

        if log_likelihood.is_nan() {
            return Err(LikelihoodError::NumericalFailure("log likelihood is NaN".to_string()));
        }
        Ok(log_likelihood)
    }
}

impl LikelihoodEngine for PruningLikelihood<'_> {
    fn recompute_all(&mut self) -> Result<f64, LikelihoodError> {
        self.update_matrices();
        let order: Vec<(VertexIndex, (VertexIndex, VertexIndex))> = self
            .tree
            .post_order_iter()
            .filter_map(|v| v.children().map(|children| (v.index(), children)))
            .collect();
        for (vertex, (left, right)) in order {
            self.update_partials(vertex, left, right);
        }
        self.integrate_root();
        let log_likelihood = self.log_likelihood()?;
        debug!(log_likelihood, "recomputed tree likelihood");
        Ok(log_likelihood)
    }

    fn root_partials(&self, pattern: usize) -> &[f64] {
        let state_count = self.state_count();
        &self.root_partials[pattern * state_count..(pattern + 1) * state_count]
    }

    fn node_partials(&self, node: VertexIndex, category: usize) -> &[f64] {
        let block = self.pattern_count() * self.state_count();
        &self.partials[node][category * block..(category + 1) * block]
    }

    fn transition_matrix(&self, node: VertexIndex, category: usize) -> &[f64] {
        let n2 = self.state_count() * self.state_count();
        &self.matrices[node][category * n2..(category + 1) * n2]
    }

    fn leaf_states(&self, node: VertexIndex) -> Option<&[usize]> {
        self.leaf_taxa
            .get(node)
            .copied()
            .flatten()
            .map(|taxon| self.patterns.taxon_states(taxon))
    }

    fn pattern_index(&self, site: usize) -> usize {
        self.patterns.pattern_index(site)
    }

    fn site_count(&self) -> usize {
        self.patterns.site_count()
    }

    fn pattern_count(&self) -> usize {
        self.patterns.pattern_count()
    }

    fn state_count(&self) -> usize {
        self.patterns.state_count()
    }

    fn category_count(&self) -> usize {
        self.site_model.category_count()
    }

    fn excluded_patterns(&self) -> &BTreeSet<usize> {
        self.patterns.excluded_patterns()
    }

    fn backend(&self) -> Backend {
        self.settings.backend
    }

    fn uses_ambiguities(&self) -> bool {
        self.settings.use_ambiguities
    }
}
