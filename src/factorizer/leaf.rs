//! Concrete leaf factorizers.

use super::Factorizer;
use crate::trainer::{FeatureError, TrainingFeature};

/// Feature type trained as-is, without factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    dimensions: u32,
}

impl Identity {
    pub fn new(dimensions: u32) -> Self {
        Identity { dimensions }
    }
}

impl Factorizer for Identity {
    fn compact_dimensions(&self) -> u32 {
        self.dimensions
    }

    fn dimensions(&self) -> u32 {
        self.dimensions
    }

    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError> {
        if index >= self.dimensions {
            return Err(FeatureError::IndexOutOfRange {
                index,
                limit: self.dimensions,
            });
        }
        features.push(TrainingFeature::new(index)?);
        Ok(())
    }
}

/// Product feature `outer * inner + i`, factorized into its two marginals.
///
/// This is the shape of king-relative piece features: the pair feature is
/// kept, and each active pair also lights one feature for its outer
/// coordinate and one for its inner coordinate. Expanded layout:
///
/// ```text
/// [0, outer * inner)                      pairs (pass-through)
/// [outer * inner, outer * inner + outer)  outer marginal
/// [outer * inner + outer, ... + inner)    inner marginal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    outer: u32,
    inner: u32,
    factors: bool,
}

impl Product {
    /// Fails when either side is empty or the expanded size overflows `u32`.
    pub fn new(outer: u32, inner: u32) -> Result<Self, FeatureError> {
        let compact = u64::from(outer) * u64::from(inner);
        let expanded = compact + u64::from(outer) + u64::from(inner);
        if outer == 0 || inner == 0 || expanded > u64::from(u32::MAX) {
            return Err(FeatureError::InvalidDimensions { compact, expanded });
        }
        Ok(Product {
            outer,
            inner,
            factors: true,
        })
    }

    /// Enables or disables the marginal factors. Dimensions do not change.
    pub fn with_factors(mut self, factors: bool) -> Self {
        self.factors = factors;
        self
    }

    pub fn outer(&self) -> u32 {
        self.outer
    }

    pub fn inner(&self) -> u32 {
        self.inner
    }

    pub fn factors_enabled(&self) -> bool {
        self.factors
    }
}

impl Factorizer for Product {
    fn compact_dimensions(&self) -> u32 {
        self.outer * self.inner
    }

    fn dimensions(&self) -> u32 {
        self.outer * self.inner + self.outer + self.inner
    }

    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError> {
        let compact = self.compact_dimensions();
        if index >= compact {
            return Err(FeatureError::IndexOutOfRange {
                index,
                limit: compact,
            });
        }

        features.push(TrainingFeature::new(index)?);
        if self.factors {
            features.push(TrainingFeature::new(compact + index / self.inner)?);
            features.push(TrainingFeature::new(
                compact + self.outer + index % self.inner,
            )?);
        }
        Ok(())
    }
}
