//! Named sets of taxa (clades) whose common ancestor is logged.

use crate::model::leaf_label_map::LeafLabelMap;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Setup-time errors of a [TaxonSet] checked against a taxon list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonSetError {
    #[error("cannot find taxon {taxon} of clade {clade} in data")]
    UnknownTaxon { clade: String, taxon: String },
    #[error("taxon {taxon} is defined multiple times in clade {clade}, while taxa should be unique")]
    DuplicateTaxon { clade: String, taxon: String },
    #[error(
        "cannot log parent of the root for clade {clade}; either choose a different clade, or disable parent logging"
    )]
    ParentOfRoot { clade: String },
    #[error("clade {clade} contains no taxa")]
    Empty { clade: String },
}

// =#========================================================================#=
// TAXON SET
// =#========================================================================#=
/// A named, ordered set of leaf labels defining a clade.
///
/// The common ancestor of the leaves carrying these labels (or its parent)
/// is the vertex whose states get sampled and logged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaxonSet {
    /// Identifier, used as prefix of the clade's log columns
    pub name: String,
    /// Leaf labels in configuration order
    pub taxa: Vec<String>,
}

impl TaxonSet {
    /// Creates a new taxon set from a name and its labels.
    pub fn new<S: Into<String>>(name: S, taxa: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TaxonSet {
            name: name.into(),
            taxa: taxa.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of labels in this set.
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Returns whether this set has no labels.
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Returns whether `label` belongs to this set.
    pub fn contains(&self, label: &str) -> bool {
        self.taxa.iter().any(|t| t == label)
    }

    /// Checks this set against the dataset's taxon list.
    ///
    /// Labels are checked in order; for each one, it must exist in `taxa`,
    /// must not repeat, and, with `log_parent`, the set must not cover all
    /// taxa (its common ancestor would be the root, which has no parent).
    ///
    /// # Errors
    /// The first violated rule as [TaxonSetError].
    pub fn validate(&self, taxa: &LeafLabelMap, log_parent: bool) -> Result<(), TaxonSetError> {
        if self.taxa.is_empty() {
            return Err(TaxonSetError::Empty { clade: self.name.clone() });
        }

        let mut seen = HashSet::with_capacity(self.taxa.len());
        for taxon in &self.taxa {
            if !taxa.contains_label(taxon) {
                return Err(TaxonSetError::UnknownTaxon {
                    clade: self.name.clone(),
                    taxon: taxon.clone(),
                });
            }
            if !seen.insert(taxon.as_str()) {
                return Err(TaxonSetError::DuplicateTaxon {
                    clade: self.name.clone(),
                    taxon: taxon.clone(),
                });
            }
            if log_parent && taxa.num_labels() == self.taxa.len() {
                return Err(TaxonSetError::ParentOfRoot { clade: self.name.clone() });
            }
        }

        Ok(())
    }
}
