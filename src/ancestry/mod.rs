//! Stochastic mapping of ancestral states.
//!
//! * [common_ancestor] - root-to-MRCA paths of sets of vertices
//! * [weighted_choice] - inverse-CDF draws over unnormalised weights
//! * [sampler] - top-down sampling of per-site states, memoized per pass

pub mod common_ancestor;
pub mod sampler;
pub mod weighted_choice;

pub use common_ancestor::{clade_leaves, common_ancestors, logged_node, mrca, path_from_root};
pub use sampler::AncestralSampler;
pub use weighted_choice::random_choice_pdf;

use crate::model::VertexIndex;
use thiserror::Error;

/// Errors when resolving common ancestors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AncestryError {
    #[error("No vertices given")]
    EmptyNodeSet,
    #[error("Cannot log the parent of the root")]
    NoParentOfRoot,
    #[error("Vertex {0} is not part of the tree")]
    UnknownVertex(VertexIndex),
}

/// Errors when sampling ancestral states.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplingError {
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),
    #[error("Cannot draw from weights {0:?}: negative, non-finite or all zero")]
    DegenerateWeights(Vec<f64>),
    #[error("Likelihood engine provides no observed states for leaf {0}")]
    MissingLeafStates(VertexIndex),
    #[error("Parent of vertex {vertex} has no state at site {site}")]
    UnresolvedParent { vertex: VertexIndex, site: usize },
    #[error(transparent)]
    Ancestry(#[from] AncestryError),
}
