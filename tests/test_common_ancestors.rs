use proptest::prelude::*;
use proptest::sample::Index;
use stochmap::ancestry::{AncestryError, common_ancestors, logged_node, mrca};
use stochmap::model::{BranchLength, LeafLabelMap, Tree, VertexIndex};
use stochmap::newick::parse_str;
use std::collections::HashSet;

const SCENARIO: &str = "((A:1,B:1)C:2,((D:1,E:1)F:1,G:2)H:1):1;";

fn scenario() -> (Tree, impl Fn(&str) -> VertexIndex) {
    let (tree, labels) = parse_str(SCENARIO).unwrap();
    let lookup_tree = tree.clone();
    (tree, move |label: &str| lookup_tree.find_vertex(label, &labels).unwrap())
}

#[test]
fn test_single_node() {
    let (tree, v) = scenario();
    let common = common_ancestors(&tree, &[v("C")]).unwrap();
    assert_eq!(common.last(), Some(&v("C")));
    assert_eq!(common, vec![tree.root_index(), v("C")]);
}

#[test]
fn test_sibling_subtrees_meet_at_root() {
    let (tree, v) = scenario();
    let common = common_ancestors(&tree, &[v("C"), v("H")]).unwrap();
    assert_eq!(common, vec![tree.root_index()]);
}

#[test]
fn test_divergent_leaves() {
    let (tree, v) = scenario();
    let common = common_ancestors(&tree, &[v("E"), v("G")]).unwrap();
    assert_eq!(common.last(), Some(&v("H")));
    assert!(!common.contains(&v("C")));
    assert!(!common.contains(&v("F")));
}

#[test]
fn test_three_leaves() {
    let (tree, v) = scenario();
    let common = common_ancestors(&tree, &[v("D"), v("E"), v("G")]).unwrap();
    assert_eq!(common.last(), Some(&v("H")));
    assert_eq!(common[0], tree.root_index());
}

#[test]
fn test_leaf_and_its_ancestor() {
    let (tree, v) = scenario();
    for nodes in [[v("E"), v("H")], [v("H"), v("E")]] {
        let common = common_ancestors(&tree, &nodes).unwrap();
        assert_eq!(common.last(), Some(&v("H")));
        assert!(!common.contains(&v("C")));
    }
}

#[test]
fn test_logged_node_with_parent() {
    let (tree, v) = scenario();
    assert_eq!(logged_node(&tree, &[v("A"), v("B")], true), Ok(tree.root_index()));
    assert_eq!(logged_node(&tree, &[v("C"), v("H")], true), Err(AncestryError::NoParentOfRoot));
    assert_eq!(mrca(&tree, &[]), Err(AncestryError::EmptyNodeSet));
}

// --- PROPERTIES ON RANDOM TREES ---

/// Builds a tree on `num_leaves` leaves by joining pairs picked from a shrinking pool.
fn random_tree(num_leaves: usize, picks: &[(Index, Index)]) -> Tree {
    let mut labels = LeafLabelMap::new(num_leaves);
    let mut tree = Tree::new(num_leaves);
    let mut pool: Vec<VertexIndex> = (0..num_leaves)
        .map(|i| tree.add_leaf(Some(BranchLength::new(1.0)), labels.get_or_insert(&format!("t{i}"))))
        .collect();

    for (first, second) in picks.iter().take(num_leaves - 1) {
        let left = pool.swap_remove(first.index(pool.len()));
        let right = pool.swap_remove(second.index(pool.len()));
        let joined = if pool.is_empty() {
            tree.add_root((left, right), None)
        } else {
            tree.add_internal_vertex((left, right), Some(BranchLength::new(1.0)))
        };
        pool.push(joined);
    }
    tree
}

/// Deepest vertex that is an ancestor (or self) of all `nodes`.
fn brute_force_mrca(tree: &Tree, nodes: &[VertexIndex]) -> VertexIndex {
    let ancestors = |v: VertexIndex| {
        let mut set = HashSet::new();
        let mut current = Some(v);
        while let Some(c) = current {
            set.insert(c);
            current = tree.parent(c);
        }
        set
    };
    let mut common = ancestors(nodes[0]);
    for &node in &nodes[1..] {
        let other = ancestors(node);
        common.retain(|v| other.contains(v));
    }
    common.into_iter().max_by_key(|&v| tree.depth(v)).unwrap()
}

proptest! {
    #[test]
    fn mrca_is_deepest_common_ancestor_for_any_order(
        num_leaves in 2usize..16,
        picks in prop::collection::vec(any::<(Index, Index)>(), 15),
        chosen in prop::collection::vec(any::<Index>(), 1..6),
        rotation in any::<Index>(),
    ) {
        let tree = random_tree(num_leaves, &picks);
        prop_assert!(tree.is_valid());

        let nodes: Vec<VertexIndex> = chosen.iter().map(|i| i.index(tree.num_vertices())).collect();
        let expected = brute_force_mrca(&tree, &nodes);

        let mut reversed = nodes.clone();
        reversed.reverse();
        let mut rotated = nodes.clone();
        rotated.rotate_left(rotation.index(nodes.len()));

        for order in [&nodes, &reversed, &rotated] {
            let common = common_ancestors(&tree, order).unwrap();
            prop_assert_eq!(common[0], tree.root_index());
            prop_assert_eq!(*common.last().unwrap(), expected);
        }
    }
}
