//! Common ancestors of sets of vertices.
//!
//! The common path of a set of vertices is the longest common prefix of their
//! root-to-vertex paths. It starts at the root and ends at the MRCA.

use crate::ancestry::AncestryError;
use crate::model::{LeafLabelMap, TaxonSet, Tree, VertexIndex};

/// Returns the path from the root to `vertex`, root first.
pub fn path_from_root(tree: &Tree, vertex: VertexIndex) -> Vec<VertexIndex> {
    let mut path = Vec::with_capacity(tree.depth(vertex) + 1);
    let mut current = Some(vertex);
    while let Some(v) = current {
        path.push(v);
        current = tree.parent(v);
    }
    path.reverse();
    path
}

/// Returns the common path of `nodes`: root first, MRCA last.
///
/// A single vertex yields its full path from the root. For several vertices,
/// the path of the first is matched in lock step against the common path of
/// the others and cut at the first mismatch, or where either ends.
/// The MRCA (last element) does not depend on the order of `nodes`.
///
/// # Errors
/// * [AncestryError::EmptyNodeSet] if `nodes` is empty
/// * [AncestryError::UnknownVertex] if a vertex is not in `tree`
///
/// # Example
/// ```
/// use stochmap::ancestry::common_ancestors;
///
/// let (tree, labels) = stochmap::newick::parse_str("((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;").unwrap();
/// let e = tree.find_vertex("E", &labels).unwrap();
/// let g = tree.find_vertex("G", &labels).unwrap();
///
/// let path = common_ancestors(&tree, &[e, g]).unwrap();
/// assert_eq!(path, vec![tree.root_index(), tree.find_vertex("H", &labels).unwrap()]);
/// ```
pub fn common_ancestors(tree: &Tree, nodes: &[VertexIndex]) -> Result<Vec<VertexIndex>, AncestryError> {
    let Some((&last, rest)) = nodes.split_last() else {
        return Err(AncestryError::EmptyNodeSet);
    };
    if let Some(&unknown) = nodes.iter().find(|&&v| !tree.contains(v)) {
        return Err(AncestryError::UnknownVertex(unknown));
    }

    let mut common = path_from_root(tree, last);
    for &node in rest.iter().rev() {
        let path = path_from_root(tree, node);
        let shared = path.iter().zip(&common).take_while(|(a, b)| a == b).count();
        common.truncate(shared);
    }
    Ok(common)
}

/// Returns the most recent common ancestor of `nodes`.
pub fn mrca(tree: &Tree, nodes: &[VertexIndex]) -> Result<VertexIndex, AncestryError> {
    let common = common_ancestors(tree, nodes)?;
    common.last().copied().ok_or(AncestryError::EmptyNodeSet)
}

/// Returns the vertex whose states are logged for `nodes`:
/// their MRCA, or the MRCA's parent if `log_parent` is set.
///
/// # Errors
/// [AncestryError::NoParentOfRoot] if `log_parent` is set and the MRCA is the root.
pub fn logged_node(tree: &Tree, nodes: &[VertexIndex], log_parent: bool) -> Result<VertexIndex, AncestryError> {
    let common = common_ancestors(tree, nodes)?;
    let offset = if log_parent { 2 } else { 1 };
    common
        .len()
        .checked_sub(offset)
        .map(|i| common[i])
        .ok_or(if log_parent { AncestryError::NoParentOfRoot } else { AncestryError::EmptyNodeSet })
}

/// Returns the leaves of `tree` whose labels are in `taxon_set`,
/// in the order in which the tree enumerates its leaves.
pub fn clade_leaves(tree: &Tree, labels: &LeafLabelMap, taxon_set: &TaxonSet) -> Vec<VertexIndex> {
    tree.leaves()
        .into_iter()
        .filter(|&leaf| {
            tree[leaf]
                .label_index()
                .and_then(|index| labels.get_label(index))
                .is_some_and(|label| taxon_set.contains(label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick;

    const SCENARIO: &str = "((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;";

    struct Scenario {
        tree: Tree,
        labels: LeafLabelMap,
    }

    impl Scenario {
        fn new() -> Self {
            let (tree, labels) = newick::parse_str(SCENARIO).unwrap();
            Self { tree, labels }
        }

        fn v(&self, label: &str) -> VertexIndex {
            self.tree.find_vertex(label, &self.labels).unwrap()
        }
    }

    #[test]
    fn test_single_node_is_full_path() {
        let s = Scenario::new();
        let path = common_ancestors(&s.tree, &[s.v("D")]).unwrap();
        assert_eq!(path, vec![s.tree.root_index(), s.v("H"), s.v("F"), s.v("D")]);
    }

    #[test]
    fn test_ancestor_before_descendant() {
        let s = Scenario::new();
        let path = common_ancestors(&s.tree, &[s.v("H"), s.v("E")]).unwrap();
        assert_eq!(path, vec![s.tree.root_index(), s.v("H")]);
    }

    #[test]
    fn test_empty_and_unknown() {
        let s = Scenario::new();
        assert_eq!(common_ancestors(&s.tree, &[]), Err(AncestryError::EmptyNodeSet));
        assert_eq!(
            common_ancestors(&s.tree, &[s.v("A"), 99]),
            Err(AncestryError::UnknownVertex(99))
        );
    }

    #[test]
    fn test_logged_node() {
        let s = Scenario::new();
        let d_e = [s.v("D"), s.v("E")];
        assert_eq!(logged_node(&s.tree, &d_e, false), Ok(s.v("F")));
        assert_eq!(logged_node(&s.tree, &d_e, true), Ok(s.v("H")));
        assert_eq!(logged_node(&s.tree, &[s.v("A"), s.v("G")], true), Err(AncestryError::NoParentOfRoot));
        assert_eq!(mrca(&s.tree, &[s.v("A"), s.v("B")]), Ok(s.v("C")));
    }

    #[test]
    fn test_clade_leaves_in_tree_order() {
        let s = Scenario::new();
        let clade = TaxonSet::new("southern", ["G", "D", "X"]);
        assert_eq!(clade_leaves(&s.tree, &s.labels, &clade), vec![s.v("D"), s.v("G")]);
    }
}
