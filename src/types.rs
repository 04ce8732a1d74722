//! Common index and subset types.

use serde::{Deserialize, Serialize};

/// Identifier of one training point. The universe of a utility with `n`
/// points is `0..n`.
pub type DataIndex = usize;

/// A set of data indices in canonical form.
///
/// Indices are kept sorted and de-duplicated, so two subsets holding the same
/// points compare (and hash) equal regardless of how they were built. This is
/// what lets [`UtilityCache`](crate::utility::UtilityCache) key scores by
/// subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subset {
    indices: Vec<DataIndex>,
}

impl Subset {
    /// The empty coalition. Its utility is `0.0` by convention.
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
        }
    }

    /// Build a subset from arbitrary indices, sorting and removing duplicates.
    pub fn new(indices: impl IntoIterator<Item = DataIndex>) -> Self {
        let mut indices: Vec<DataIndex> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Number of points in the subset.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether this is the empty coalition.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Membership test, `O(log n)`.
    pub fn contains(&self, index: DataIndex) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Return `self ∪ {index}`.
    pub fn with(&self, index: DataIndex) -> Self {
        match self.indices.binary_search(&index) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut indices = Vec::with_capacity(self.indices.len() + 1);
                indices.extend_from_slice(&self.indices[..pos]);
                indices.push(index);
                indices.extend_from_slice(&self.indices[pos..]);
                Self { indices }
            }
        }
    }

    /// Insert an index in place, keeping canonical order.
    pub fn insert(&mut self, index: DataIndex) {
        if let Err(pos) = self.indices.binary_search(&index) {
            self.indices.insert(pos, index);
        }
    }

    /// The largest index in the subset, if any.
    pub fn max_index(&self) -> Option<DataIndex> {
        self.indices.last().copied()
    }

    /// Sorted indices.
    pub fn as_slice(&self) -> &[DataIndex] {
        &self.indices
    }

    /// Iterate over the indices in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = DataIndex> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<DataIndex> for Subset {
    fn from_iter<I: IntoIterator<Item = DataIndex>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<DataIndex>> for Subset {
    fn from(indices: Vec<DataIndex>) -> Self {
        Self::new(indices)
    }
}

impl<'a> IntoIterator for &'a Subset {
    type Item = &'a DataIndex;
    type IntoIter = std::slice::Iter<'a, DataIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

/// What to do when a single utility evaluation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the whole estimation and return the error.
    #[default]
    Propagate,
    /// Record the failed score as `NaN`. Only the statistics of the indices
    /// whose marginals touch the failed score are affected.
    RecordNan,
}
