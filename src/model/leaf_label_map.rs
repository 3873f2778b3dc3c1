//! Taxon labels and their indices.

use std::collections::HashMap;

/// Index of a leaf label in a [LeafLabelMap].
pub type LabelIndex = usize;

// =#========================================================================#=
// LEAF LABEL MAP
// =#========================================================================#=
/// Interns taxon labels as dense indices in insertion order.
///
/// One map serves as the ordered taxon list of a dataset: alignment rows,
/// tree leaves and clade definitions all refer to taxa by the same index.
///
/// # Example
/// ```
/// use stochmap::model::LeafLabelMap;
///
/// let mut labels = LeafLabelMap::new(3);
/// let kea = labels.get_or_insert("kea");
/// let kaka = labels.get_or_insert("kaka");
///
/// assert_eq!(labels.get_or_insert("kea"), kea);
/// assert_eq!(labels.get_label(kaka), Some("kaka"));
/// assert_eq!(&labels[kea], "kea");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LeafLabelMap {
    labels: Vec<String>,
    indices: HashMap<String, LabelIndex>,
}

impl LeafLabelMap {
    /// An empty map with room for `num_leaves` labels.
    pub fn new(num_leaves: usize) -> Self {
        LeafLabelMap {
            labels: Vec::with_capacity(num_leaves),
            indices: HashMap::with_capacity(num_leaves),
        }
    }

    /// Index of `label`, appending it first if unknown.
    pub fn get_or_insert(&mut self, label: &str) -> LabelIndex {
        if let Some(&index) = self.indices.get(label) {
            return index;
        }
        let index = self.labels.len();
        self.labels.push(label.to_owned());
        self.indices.insert(label.to_owned(), index);
        index
    }

    pub fn get_index(&self, label: &str) -> Option<LabelIndex> {
        self.indices.get(label).copied()
    }

    pub fn get_label(&self, index: LabelIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.indices.contains_key(label)
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// All labels, by index.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl std::ops::Index<LabelIndex> for LeafLabelMap {
    type Output = str;

    fn index(&self, index: LabelIndex) -> &str {
        &self.labels[index]
    }
}
