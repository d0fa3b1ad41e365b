use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureId(usize);

impl FeatureId {
    /// Create a new feature id from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena, identifying a node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new node id from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` with children referenced by [`NodeId`]
/// rather than pointers, which keeps them cache-friendly and trivially
/// serializable.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) enum Node {
    /// An interior split node.
    Split {
        /// Feature used for the split.
        feature: FeatureId,
        /// Threshold value: rows with feature <= threshold go left.
        threshold: f64,
        /// Index of the left child node.
        left: NodeId,
        /// Index of the right child node.
        right: NodeId,
        /// Weighted decrease in impurity from this split.
        decrease: f64,
        /// Number of training rows that reached this node.
        n_samples: usize,
    },
    /// A terminal leaf node.
    Leaf {
        /// Predicted class (argmax of the distribution).
        prediction: usize,
        /// Normalized class probability distribution.
        distribution: Vec<f64>,
        /// Number of training rows in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training rows that reached this node.
    #[cfg(test)]
    pub(crate) fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
