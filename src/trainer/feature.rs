//! Packed training feature: one expanded-space index plus its multiplicity.
//!
//! The index and the count share a single `u32`: the upper `INDEX_BITS` hold
//! the index and the lower `COUNT_BITS` hold the count. Ordering the packed
//! word orders by index first, so sorting a sample's list brings duplicates
//! together for merging.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bits reserved for the expanded-space index.
pub const INDEX_BITS: u32 = 24;

/// Bits reserved for the multiplicity.
pub const COUNT_BITS: u32 = u32::BITS - INDEX_BITS;

/// Exclusive upper bound on any index a `TrainingFeature` can hold.
pub const INDEX_LIMIT: u32 = 1 << INDEX_BITS;

/// Exclusive upper bound on a multiplicity.
pub const COUNT_LIMIT: u32 = 1 << COUNT_BITS;

const COUNT_MASK: u32 = COUNT_LIMIT - 1;

/// Errors raised while producing or combining training features.
///
/// Every variant is a broken contract rather than a transient fault: the
/// sample being expanded must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("compact index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: u32, limit: u32 },

    #[error("training feature index {0} does not fit in {bits} bits", bits = INDEX_BITS)]
    IndexOverflow(i64),

    #[error("multiplicity {0} does not fit in {bits} bits", bits = COUNT_BITS)]
    CountOverflow(u32),

    #[error("cannot merge training features with indices {0} and {1}")]
    IndexMismatch(u32, u32),

    #[error("training feature index {index} violates the layout invariant: {reason}")]
    InvariantViolation { index: u32, reason: &'static str },

    #[error("invalid dimensions: compact {compact}, expanded {expanded}")]
    InvalidDimensions { compact: u64, expanded: u64 },

    #[error("a feature set needs at least one feature type")]
    EmptyFeatureSet,
}

/// One index of the expanded (training) feature space with a multiplicity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "FeatureRecord", try_from = "FeatureRecord")]
pub struct TrainingFeature {
    index_and_count: u32,
}

impl TrainingFeature {
    /// Creates a feature with multiplicity 1.
    pub fn new(index: u32) -> Result<Self, FeatureError> {
        if index >= INDEX_LIMIT {
            return Err(FeatureError::IndexOverflow(i64::from(index)));
        }
        Ok(TrainingFeature {
            index_and_count: (index << COUNT_BITS) | 1,
        })
    }

    /// Expanded-space index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index_and_count >> COUNT_BITS
    }

    /// Number of elementary contributions collapsed onto this index.
    #[inline]
    pub fn count(&self) -> u32 {
        self.index_and_count & COUNT_MASK
    }

    /// Adds the multiplicity of `other`, which must carry the same index.
    pub fn merge(&mut self, other: &TrainingFeature) -> Result<(), FeatureError> {
        if other.index() != self.index() {
            return Err(FeatureError::IndexMismatch(self.index(), other.index()));
        }
        let count = self.count() + other.count();
        if count >= COUNT_LIMIT {
            return Err(FeatureError::CountOverflow(count));
        }
        self.index_and_count += other.count();
        Ok(())
    }

    /// Moves the index by `offset`, keeping the multiplicity.
    pub fn shift_index(&mut self, offset: i64) -> Result<(), FeatureError> {
        let shifted = i64::from(self.index()) + offset;
        if !(0..i64::from(INDEX_LIMIT)).contains(&shifted) {
            return Err(FeatureError::IndexOverflow(shifted));
        }
        self.index_and_count = ((shifted as u32) << COUNT_BITS) | self.count();
        Ok(())
    }
}

impl fmt::Debug for TrainingFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainingFeature({}x{})", self.index(), self.count())
    }
}

/// Unpacked wire form of a `TrainingFeature`.
#[derive(Serialize, Deserialize)]
struct FeatureRecord {
    index: u32,
    count: u32,
}

impl From<TrainingFeature> for FeatureRecord {
    fn from(feature: TrainingFeature) -> Self {
        FeatureRecord {
            index: feature.index(),
            count: feature.count(),
        }
    }
}

impl TryFrom<FeatureRecord> for TrainingFeature {
    type Error = FeatureError;

    fn try_from(record: FeatureRecord) -> Result<Self, Self::Error> {
        if record.count == 0 || record.count >= COUNT_LIMIT {
            return Err(FeatureError::CountOverflow(record.count));
        }
        let feature = TrainingFeature::new(record.index)?;
        Ok(TrainingFeature {
            index_and_count: (feature.index() << COUNT_BITS) | record.count,
        })
    }
}

/// Sorts `features` and merges entries that share an index.
///
/// On error the list is left as it was.
pub fn merge_duplicates(features: &mut Vec<TrainingFeature>) -> Result<(), FeatureError> {
    let mut sorted = features.clone();
    sorted.sort_unstable();

    let mut merged: Vec<TrainingFeature> = Vec::with_capacity(sorted.len());
    for feature in sorted {
        match merged.last_mut() {
            Some(last) if last.index() == feature.index() => last.merge(&feature)?,
            _ => merged.push(feature),
        }
    }

    *features = merged;
    Ok(())
}
