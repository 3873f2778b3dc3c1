//! # stochmap
//!
//! Stochastic mapping of ancestral states for rooted binary phylogenetic trees.
//!
//! Given a tree, an alignment and a substitution model, the likelihood engine
//! computes partial likelihoods bottom-up; the sampler then draws one discrete
//! state per site for the most recent common ancestor (MRCA) of each
//! configured clade, top-down from the root and conditioned on the sampled
//! parent states. Repeated draws are written as a tab-separated log.
//!
//! ## Modules
//! * [model] - arena [Tree](model::Tree), leaf labels, clade definitions
//! * [newick] / [parser] - Newick trees with labelled internal vertices
//! * [alignment] - data types, FASTA input, site patterns and exclusions
//! * [likelihood] - the [LikelihoodEngine](likelihood::LikelihoodEngine) boundary and
//!   a pruning implementation
//! * [ancestry] - common ancestors and the [AncestralSampler](ancestry::AncestralSampler)
//! * [logger] - headers, row formatting and the
//!   [AncestralStatesLogger](logger::AncestralStatesLogger)
//! * [config] / [run] - TOML run configuration and the driver used by the binary
//!
//! ## Example
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use stochmap::alignment::{Alignment, DataType, SitePatterns};
//! use stochmap::ancestry::{AncestralSampler, clade_leaves};
//! use stochmap::likelihood::{EngineSettings, LikelihoodEngine, PruningLikelihood, SiteModel, SubstitutionModel};
//! use stochmap::model::TaxonSet;
//!
//! let alignment = Alignment::from_sequences(
//!     DataType::Nucleotide,
//!     [("A", "ACGT"), ("B", "ACGA"), ("C", "TCGA")],
//! ).unwrap();
//! let (tree, labels) = stochmap::newick::parse_str("((A:0.1,B:0.1):0.1,C:0.2);").unwrap();
//! let patterns = SitePatterns::new(&alignment);
//! let mut engine = PruningLikelihood::new(
//!     &tree, &labels, &patterns,
//!     SubstitutionModel::equal_frequencies(4).unwrap(),
//!     SiteModel::single(),
//!     EngineSettings::new(),
//! ).unwrap();
//! engine.recompute_all().unwrap();
//!
//! let mut sampler = AncestralSampler::new(ChaCha8Rng::seed_from_u64(1));
//! sampler.begin_pass();
//! let leaves = clade_leaves(&tree, &labels, &TaxonSet::new("ab", ["A", "B"]));
//! let states = sampler.sample_clade_states(&tree, &engine, &leaves, false).unwrap();
//! assert_eq!(states.len(), 4);
//! ```

pub mod alignment;
pub mod ancestry;
pub mod config;
pub mod error;
pub mod likelihood;
pub mod logger;
pub mod model;
pub mod newick;
pub mod parser;
pub mod run;

pub use error::{Error, Result};
