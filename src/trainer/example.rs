//! Training samples in the expanded feature space.

use log::trace;
use serde::{Deserialize, Serialize};

use super::feature::{merge_duplicates, FeatureError, TrainingFeature};
use super::options::ExpansionOptions;
use crate::factorizer::FeatureSetFactorizer;

/// The two sides a position is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perspective {
    Black,
    White,
}

/// Both perspectives, in storage order.
pub const ALL_PERSPECTIVES: [Perspective; 2] = [Perspective::Black, Perspective::White];

impl Perspective {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Perspective::Black => 0,
            Perspective::White => 1,
        }
    }
}

/// Errors raised by a sample whose target metadata is unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("sample sign must be 1 or -1, got {0}")]
    InvalidSign(i8),

    #[error("sample weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),
}

/// One training sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ExampleRecord", try_from = "ExampleRecord")]
pub struct Example {
    /// Expanded features, indexed by `Perspective::index`.
    pub training_features: [Vec<TrainingFeature>; 2],
    /// Target evaluation.
    pub target: i32,
    /// +1 or -1: which side the target is stated for.
    pub sign: i8,
    pub weight: f64,
}

impl Example {
    /// Expands the active compact indices of both perspectives.
    ///
    /// Any failure discards the whole sample.
    pub fn from_active_indices<S>(
        set: &S,
        active: [&[u32]; 2],
        target: i32,
        sign: i8,
        options: &ExpansionOptions,
    ) -> Result<Self, FeatureError>
    where
        S: FeatureSetFactorizer + ?Sized,
    {
        let black = expand_active_indices(set, active[0], options.merge_duplicates)?;
        let white = expand_active_indices(set, active[1], options.merge_duplicates)?;
        Ok(Example {
            training_features: [black, white],
            target,
            sign,
            weight: options.weight,
        })
    }

    pub fn features(&self, perspective: Perspective) -> &[TrainingFeature] {
        &self.training_features[perspective.index()]
    }
}

/// Wire form of an `Example`, checked on the way in.
#[derive(Serialize, Deserialize)]
struct ExampleRecord {
    training_features: [Vec<TrainingFeature>; 2],
    target: i32,
    sign: i8,
    weight: f64,
}

impl From<Example> for ExampleRecord {
    fn from(example: Example) -> Self {
        ExampleRecord {
            training_features: example.training_features,
            target: example.target,
            sign: example.sign,
            weight: example.weight,
        }
    }
}

impl TryFrom<ExampleRecord> for Example {
    type Error = SampleError;

    fn try_from(record: ExampleRecord) -> Result<Self, Self::Error> {
        if record.sign != 1 && record.sign != -1 {
            return Err(SampleError::InvalidSign(record.sign));
        }
        if !record.weight.is_finite() || record.weight < 0.0 {
            return Err(SampleError::InvalidWeight(record.weight));
        }
        Ok(Example {
            training_features: record.training_features,
            target: record.target,
            sign: record.sign,
            weight: record.weight,
        })
    }
}

/// Expands one perspective's active compact indices.
pub fn expand_active_indices<S>(
    set: &S,
    active: &[u32],
    merge: bool,
) -> Result<Vec<TrainingFeature>, FeatureError>
where
    S: FeatureSetFactorizer + ?Sized,
{
    let mut features = Vec::with_capacity(active.len() * 2);
    for &index in active {
        set.append_training_features(index, &mut features)?;
    }
    if merge {
        merge_duplicates(&mut features)?;
    }
    trace!(
        "expanded {} active indices into {} training features",
        active.len(),
        features.len()
    );
    Ok(features)
}
