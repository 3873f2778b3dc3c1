//! Vertices of a [Tree](crate::model::Tree) and their branch lengths.

use crate::model::leaf_label_map::LabelIndex;
use crate::model::tree::VertexIndex;
use std::ops::Deref;

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// A vertex of a rooted binary tree, stored in the tree's arena at `index`.
///
/// The parent is unset while the tree is being built bottom-up and stays
/// unset for the root. The branch length, if any, belongs to the edge
/// towards the parent.
#[derive(PartialEq, Debug, Clone)]
pub struct Vertex {
    index: VertexIndex,
    parent: Option<VertexIndex>,
    branch_length: Option<BranchLength>,
    kind: VertexKind,
}

/// Position of a [Vertex] in the tree.
#[derive(PartialEq, Debug, Clone)]
pub enum VertexKind {
    Root {
        children: (VertexIndex, VertexIndex),
        label: Option<String>,
    },
    Internal {
        children: (VertexIndex, VertexIndex),
        label: Option<String>,
    },
    /// Leaf labels live in the shared [LeafLabelMap](crate::model::LeafLabelMap).
    Leaf { label_index: LabelIndex },
}

impl Vertex {
    fn with_kind(index: VertexIndex, branch_length: Option<BranchLength>, kind: VertexKind) -> Self {
        Self {
            index,
            parent: None,
            branch_length,
            kind,
        }
    }

    /// A root; `branch_length` is kept for inputs like `(A,B):1;`.
    pub fn new_root(
        index: VertexIndex,
        children: (VertexIndex, VertexIndex),
        branch_length: Option<BranchLength>,
    ) -> Self {
        Self::with_kind(index, branch_length, VertexKind::Root { children, label: None })
    }

    pub fn new_internal(
        index: VertexIndex,
        children: (VertexIndex, VertexIndex),
        branch_length: Option<BranchLength>,
    ) -> Self {
        Self::with_kind(index, branch_length, VertexKind::Internal { children, label: None })
    }

    pub fn new_leaf(index: VertexIndex, branch_length: Option<BranchLength>, label_index: LabelIndex) -> Self {
        Self::with_kind(index, branch_length, VertexKind::Leaf { label_index })
    }

    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn kind(&self) -> &VertexKind {
        &self.kind
    }

    pub fn branch_length(&self) -> Option<BranchLength> {
        self.branch_length
    }

    pub fn has_branch_length(&self) -> bool {
        self.branch_length.is_some()
    }

    /// Label index of a leaf, `None` otherwise.
    pub fn label_index(&self) -> Option<LabelIndex> {
        match self.kind {
            VertexKind::Leaf { label_index } => Some(label_index),
            _ => None,
        }
    }

    /// Name of a root or internal vertex, as in `(A,B)C`.
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            VertexKind::Root { label, .. } | VertexKind::Internal { label, .. } => label.as_deref(),
            VertexKind::Leaf { .. } => None,
        }
    }

    /// Names a root or internal vertex.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn set_label(&mut self, name: String) {
        match &mut self.kind {
            VertexKind::Root { label, .. } | VertexKind::Internal { label, .. } => *label = Some(name),
            VertexKind::Leaf { .. } => panic!("Leaf labels are stored in the LeafLabelMap"),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, VertexKind::Leaf { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind, VertexKind::Internal { .. })
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, VertexKind::Root { .. })
    }

    pub fn children(&self) -> Option<(VertexIndex, VertexIndex)> {
        match self.kind {
            VertexKind::Root { children, .. } | VertexKind::Internal { children, .. } => Some(children),
            VertexKind::Leaf { .. } => None,
        }
    }

    /// Links a non-root vertex to its parent.
    ///
    /// # Panics
    /// Panics on the root.
    pub fn set_parent(&mut self, parent: VertexIndex) {
        assert!(!self.is_root(), "Cannot set parent on root vertex");
        self.parent = Some(parent);
    }

    /// Parent index; `None` for the root and for vertices not yet linked.
    pub fn parent(&self) -> Option<VertexIndex> {
        self.parent
    }
}

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Non-negative, finite length of the edge above a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchLength(f64);

impl BranchLength {
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn new(length: f64) -> Self {
        Self::try_new(length).unwrap_or_else(|| panic!("Branch length must be non-negative and finite, got {length}"))
    }

    /// `None` if `length` is negative or not finite.
    pub fn try_new(length: f64) -> Option<Self> {
        (length >= 0.0 && length.is_finite()).then_some(BranchLength(length))
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
