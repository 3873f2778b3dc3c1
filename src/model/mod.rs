//! Data model for rooted binary phylogenetic trees and clade definitions.
//!
//! # Tree representation
//! Trees are represented by [Tree], which uses the arena pattern to store
//! [Vertex] nodes. Each vertex is either a `Root`, `Internal`, or `Leaf`,
//! referenced by [VertexIndex]. Parent and child relations are stored as
//! indices, so trees can be traversed repeatedly without reference juggling.
//!
//! # Label handling
//! Leaves store a [LabelIndex] into a [LeafLabelMap], which doubles as the
//! taxon list shared with the alignment and the [TaxonSet] definitions.
//! Root and internal vertices may carry their own optional label.

pub mod leaf_label_map;
pub mod taxon_set;
pub mod tree;
pub mod vertex;

pub use leaf_label_map::LabelIndex;
pub use leaf_label_map::LeafLabelMap;
pub use taxon_set::{TaxonSet, TaxonSetError};
pub use tree::Tree;
pub use tree::VertexIndex;
pub use vertex::{BranchLength, Vertex, VertexKind};
