//! Rooted binary trees stored as a vertex arena.

use crate::model::leaf_label_map::{LabelIndex, LeafLabelMap};
use crate::model::vertex::{BranchLength, Vertex};

/// Index of a vertex in the arena of its [Tree].
pub type VertexIndex = usize;

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted binary tree whose [Vertex]es live in one vector.
///
/// Vertices refer to each other by [VertexIndex]. Leaves carry a
/// [LabelIndex] into a [LeafLabelMap] shared with the alignment, so the
/// same label index addresses a leaf and its sequence. Indices carry no
/// order: leaves need not come first.
///
/// Trees are built bottom-up: add leaves, then internal vertices over
/// existing children, then the root. [Tree::is_valid] checks the result.
///
/// # Example
/// ```
/// use stochmap::model::{BranchLength, LeafLabelMap, Tree};
///
/// // ((A:0.2,B:0.2):0.2,C:0.4);
/// let mut tree = Tree::new(3);
/// let mut labels = LeafLabelMap::new(3);
///
/// let a = tree.add_leaf(Some(BranchLength::new(0.2)), labels.get_or_insert("A"));
/// let b = tree.add_leaf(Some(BranchLength::new(0.2)), labels.get_or_insert("B"));
/// let c = tree.add_leaf(Some(BranchLength::new(0.4)), labels.get_or_insert("C"));
/// let ab = tree.add_internal_vertex((a, b), Some(BranchLength::new(0.2)));
/// tree.add_root((ab, c), None);
///
/// assert!(tree.is_valid());
/// assert_eq!(tree.parent(a), Some(ab));
/// assert_eq!(tree.depth(a), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    /// Leaves the finished tree is expected to have
    num_leaves_init: usize,
    vertices: Vec<Vertex>,
    root_index: Option<VertexIndex>,
}

impl Tree {
    /// An empty tree with room for `num_leaves` leaves (`2n - 1` vertices).
    ///
    /// # Panics
    /// Panics if `num_leaves` is zero.
    pub fn new(num_leaves: usize) -> Self {
        assert!(num_leaves > 0, "a tree needs at least one leaf");
        Tree {
            num_leaves_init: num_leaves,
            vertices: Vec::with_capacity(2 * num_leaves - 1),
            root_index: None,
        }
    }

    /// Adds the root over `children` and returns its index.
    pub fn add_root(&mut self, children: (VertexIndex, VertexIndex), branch_length: Option<BranchLength>) -> VertexIndex {
        let index = self.push_with_children(children, |index| Vertex::new_root(index, children, branch_length));
        self.root_index = Some(index);
        index
    }

    /// Adds an internal vertex over `children` and returns its index.
    pub fn add_internal_vertex(
        &mut self,
        children: (VertexIndex, VertexIndex),
        branch_length: Option<BranchLength>,
    ) -> VertexIndex {
        self.push_with_children(children, |index| Vertex::new_internal(index, children, branch_length))
    }

    pub fn add_leaf(&mut self, branch_length: Option<BranchLength>, label_index: LabelIndex) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new_leaf(index, branch_length, label_index));
        index
    }

    fn push_with_children(
        &mut self,
        (left, right): (VertexIndex, VertexIndex),
        make: impl FnOnce(VertexIndex) -> Vertex,
    ) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(make(index));
        self[left].set_parent(index);
        self[right].set_parent(index);
        index
    }

    /// Whether the arena forms one consistent binary tree.
    ///
    /// Requires a single root, vertex indices matching arena positions,
    /// parent and child links agreeing in both directions, and the
    /// expected number of leaves.
    pub fn is_valid(&self) -> bool {
        let Some(root) = self.root_index else { return false };
        if !self.contains(root) || !self.vertices[root].is_root() {
            return false;
        }

        let links_agree = |(index, vertex): (usize, &Vertex)| {
            let children_point_back = vertex.children().is_none_or(|(left, right)| {
                [left, right]
                    .into_iter()
                    .all(|child| self.contains(child) && self.vertices[child].parent() == Some(index))
            });
            let parent_lists_child = match vertex.parent() {
                None => index == root,
                Some(parent) => {
                    self.contains(parent) && self.children(parent).is_some_and(|(l, r)| l == index || r == index)
                }
            };
            vertex.index() == index && children_point_back && parent_lists_child
        };

        self.vertices.iter().filter(|v| v.is_root()).count() == 1
            && self.vertices.iter().enumerate().all(links_agree)
            && self.num_leaves() == self.num_leaves_init
    }

    /// # Panics
    /// Panics if no root has been added yet.
    pub fn root(&self) -> &Vertex {
        &self[self.root_index()]
    }

    /// # Panics
    /// Panics if no root has been added yet.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index.expect("tree has no root yet")
    }

    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self[index]
    }

    /// Whether `index` addresses a vertex of this tree.
    pub fn contains(&self, index: VertexIndex) -> bool {
        index < self.vertices.len()
    }

    pub fn parent(&self, index: VertexIndex) -> Option<VertexIndex> {
        self[index].parent()
    }

    pub fn children(&self, index: VertexIndex) -> Option<(VertexIndex, VertexIndex)> {
        self[index].children()
    }

    /// Number of edges between the root and `index`.
    pub fn depth(&self, index: VertexIndex) -> usize {
        std::iter::successors(self.parent(index), |&v| self.parent(v)).count()
    }

    pub fn num_leaves_init(&self) -> usize {
        self.num_leaves_init
    }

    /// Fixes the expected leaf count once a parser knows it.
    pub(crate) fn set_num_leaves_init(&mut self, num_leaves: usize) {
        self.num_leaves_init = num_leaves;
    }

    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_leaf()).count()
    }

    /// Internal vertices, root excluded.
    pub fn num_internal(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_internal()).count()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Leaf indices, left to right.
    pub fn leaves(&self) -> Vec<VertexIndex> {
        self.pre_order_iter().filter(|v| v.is_leaf()).map(Vertex::index).collect()
    }

    pub fn leaf_with_label_index(&self, label_index: LabelIndex) -> Option<VertexIndex> {
        self.vertices
            .iter()
            .position(|v| v.label_index() == Some(label_index))
    }

    /// Finds a leaf by its label in `leaf_label_map`, or else a root or
    /// internal vertex by its own label.
    pub fn find_vertex(&self, label: &str, leaf_label_map: &LeafLabelMap) -> Option<VertexIndex> {
        leaf_label_map
            .get_index(label)
            .and_then(|label_index| self.leaf_with_label_index(label_index))
            .or_else(|| self.vertices.iter().position(|v| v.label() == Some(label)))
    }

    /// Whether every vertex but the root has a branch length.
    pub fn vertices_have_branch_lengths(&self) -> bool {
        self.vertices.iter().all(|v| v.is_root() || v.has_branch_length())
    }

    /// Sum of branch lengths below the root.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices
            .iter()
            .filter(|v| !v.is_root())
            .filter_map(Vertex::branch_length)
            .map(|length| *length)
            .sum()
    }

    /// Children before parents, left subtree first.
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter {
            tree: self,
            stack: self.root_index.map(|root| (root, false)).into_iter().collect(),
        }
    }

    /// Parents before children, left subtree first.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter {
            tree: self,
            stack: self.root_index.into_iter().collect(),
        }
    }
}

impl std::ops::Index<VertexIndex> for Tree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

impl std::ops::IndexMut<VertexIndex> for Tree {
    fn index_mut(&mut self, index: VertexIndex) -> &mut Self::Output {
        &mut self.vertices[index]
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// See [Tree::post_order_iter].
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    /// (vertex, whether its children are already on the stack)
    stack: Vec<(VertexIndex, bool)>,
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, expanded)) = self.stack.pop() {
            let vertex = &self.tree[index];
            match vertex.children() {
                Some((left, right)) if !expanded => {
                    self.stack.extend([(index, true), (right, false), (left, false)]);
                }
                _ => return Some(vertex),
            }
        }
        None
    }
}

/// See [Tree::pre_order_iter].
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<VertexIndex>,
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let vertex = &self.tree[self.stack.pop()?];
        if let Some((left, right)) = vertex.children() {
            self.stack.extend([right, left]);
        }
        Some(vertex)
    }
}
