//! Likelihood of an alignment on a tree.
//!
//! The sampler only talks to the [LikelihoodEngine] trait: after a full
//! recomputation it reads root and vertex partial likelihoods, per-branch
//! transition matrices and the observed leaf states. [PruningLikelihood] is
//! the plain CPU implementation (Felsenstein pruning under an equal-input
//! [SubstitutionModel] with the rate categories of a [SiteModel]).

pub mod pruning;
pub mod site_model;
pub mod substitution;

pub use pruning::PruningLikelihood;
pub use site_model::SiteModel;
pub use substitution::SubstitutionModel;

use crate::model::VertexIndex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors raised by likelihood engines and their models.
#[derive(Debug, Error, PartialEq)]
pub enum LikelihoodError {
    #[error("Likelihood backend {0} is not supported")]
    UnsupportedBackend(Backend),
    #[error("Tree leaf {0} has no sequence in the alignment")]
    UnknownTaxon(String),
    #[error("Alignment has {alignment} taxa but tree has {tree} leaves")]
    TaxonCountMismatch { alignment: usize, tree: usize },
    #[error("Vertex {0} has no branch length")]
    MissingBranchLength(VertexIndex),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
}

/// Representation of partial likelihoods used by an engine.
///
/// Chosen once when the engine is built and passed along as a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Partials kept as plain per-vertex arrays that can be read back.
    #[default]
    Plain,
    /// An accelerated library holding partials out of reach.
    Accelerated,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Backend::Plain => write!(f, "plain"),
            Backend::Accelerated => write!(f, "accelerated"),
        }
    }
}

/// Construction settings for a likelihood engine.
///
/// # Configuration
/// * `with_backend(backend)` - partial likelihood representation, [Backend::Plain] by default
/// * `with_ambiguities(flag)` - whether leaves are treated as partials over all states
///   compatible with an ambiguous observation; off by default
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineSettings {
    pub backend: Backend,
    pub use_ambiguities: bool,
}

impl EngineSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_ambiguities(mut self, use_ambiguities: bool) -> Self {
        self.use_ambiguities = use_ambiguities;
        self
    }
}

/// Read access to a fitted likelihood computation.
///
/// Layouts:
/// * partials are pattern-major: state `s` of pattern `p` at `p * state_count + s`
/// * transition matrices are row-major: `P(child = s | parent = r)` at `r * state_count + s`
/// * leaf states are state codes per pattern; codes `>= state_count` are ambiguous
pub trait LikelihoodEngine {
    /// Recomputes all partials and matrices from scratch, returning the log likelihood.
    fn recompute_all(&mut self) -> Result<f64, LikelihoodError>;

    /// Root partials of `pattern`, integrated over rate categories.
    fn root_partials(&self, pattern: usize) -> &[f64];

    /// Partials of `node` in rate `category`, for all patterns.
    fn node_partials(&self, node: VertexIndex, category: usize) -> &[f64];

    /// Transition matrix of the branch above `node` in rate `category`.
    fn transition_matrix(&self, node: VertexIndex, category: usize) -> &[f64];

    /// Observed state codes of a leaf, one per pattern; `None` for other vertices.
    fn leaf_states(&self, node: VertexIndex) -> Option<&[usize]>;

    fn pattern_index(&self, site: usize) -> usize;

    fn site_count(&self) -> usize;

    fn pattern_count(&self) -> usize;

    fn state_count(&self) -> usize;

    fn category_count(&self) -> usize;

    fn excluded_patterns(&self) -> &BTreeSet<usize>;

    fn backend(&self) -> Backend;

    fn uses_ambiguities(&self) -> bool;
}
