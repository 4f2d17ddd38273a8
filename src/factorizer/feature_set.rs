//! Recursive composition of leaf factorizers.
//!
//! `Single<F>` wraps one leaf; `Chain<H, T>` puts leaf `H` in front of the
//! feature set `T`. Dimensions are summed once at construction.
//!
//! Compact layout of `Chain<H, T>`: `[0, T.compact)` is the tail,
//! `[T.compact, compact)` the head. The head's output is re-based on the way
//! back out:
//!
//! - a pass-through index `p < H.compact` moves to `p + T.compact`, which is
//!   the compact index it came from;
//! - a factor index, already placed at `[base, base + H.factors)` by the
//!   head's `Single`, moves past the tail's factors by
//!   `T.dimensions - T.compact`.

use log::debug;

use super::{Factorizer, FeatureSetFactorizer};
use crate::trainer::{FeatureError, TrainingFeature, INDEX_LIMIT};

/// Checks a compact/expanded pair against the index budget.
fn checked_dimensions(compact: u64, expanded: u64) -> Result<(u32, u32), FeatureError> {
    if expanded < compact || expanded > u64::from(INDEX_LIMIT) {
        return Err(FeatureError::InvalidDimensions { compact, expanded });
    }
    Ok((compact as u32, expanded as u32))
}

/// Rejects calls whose base would push factors onto pass-through indices.
fn check_base(base_dimensions: u32, compact: u32) -> Result<(), FeatureError> {
    if base_dimensions < compact {
        return Err(FeatureError::InvariantViolation {
            index: base_dimensions,
            reason: "base dimensions below compact dimensions",
        });
    }
    Ok(())
}

/// Feature set holding exactly one leaf.
#[derive(Debug, Clone)]
pub struct Single<F> {
    leaf: F,
    compact_dimensions: u32,
    dimensions: u32,
}

impl<F: Factorizer> Single<F> {
    pub fn new(leaf: F) -> Result<Self, FeatureError> {
        let (compact_dimensions, dimensions) = checked_dimensions(
            u64::from(leaf.compact_dimensions()),
            u64::from(leaf.dimensions()),
        )?;
        Ok(Single {
            leaf,
            compact_dimensions,
            dimensions,
        })
    }

    pub fn leaf(&self) -> &F {
        &self.leaf
    }
}

impl<F: Factorizer> FeatureSetFactorizer for Single<F> {
    fn compact_dimensions(&self) -> u32 {
        self.compact_dimensions
    }

    fn dimensions(&self) -> u32 {
        self.dimensions
    }

    fn append_with_base(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
        base_dimensions: u32,
    ) -> Result<(), FeatureError> {
        if index >= self.compact_dimensions {
            return Err(FeatureError::IndexOutOfRange {
                index,
                limit: self.compact_dimensions,
            });
        }
        check_base(base_dimensions, self.compact_dimensions)?;

        let start = features.len();
        self.leaf.append_training_features(index, features)?;

        let factor_shift = i64::from(base_dimensions - self.compact_dimensions);
        for feature in &mut features[start..] {
            let produced = feature.index();
            if produced >= self.dimensions {
                return Err(FeatureError::InvariantViolation {
                    index: produced,
                    reason: "leaf produced an index past its dimensions",
                });
            }
            if produced >= self.compact_dimensions {
                feature.shift_index(factor_shift)?;
            }
        }
        Ok(())
    }
}

/// Feature set with a leading leaf `head` and the remaining list `tail`.
#[derive(Debug, Clone)]
pub struct Chain<H, T> {
    head: Single<H>,
    tail: T,
    compact_dimensions: u32,
    dimensions: u32,
}

impl<H: Factorizer, T: FeatureSetFactorizer> Chain<H, T> {
    pub fn new(head: H, tail: T) -> Result<Self, FeatureError> {
        let head = Single::new(head)?;
        let (compact_dimensions, dimensions) = checked_dimensions(
            u64::from(head.compact_dimensions()) + u64::from(tail.compact_dimensions()),
            u64::from(head.dimensions()) + u64::from(tail.dimensions()),
        )?;
        Ok(Chain {
            head,
            tail,
            compact_dimensions,
            dimensions,
        })
    }

    pub fn head(&self) -> &H {
        self.head.leaf()
    }

    pub fn tail(&self) -> &T {
        &self.tail
    }
}

impl<H: Factorizer, T: FeatureSetFactorizer> FeatureSetFactorizer for Chain<H, T> {
    fn compact_dimensions(&self) -> u32 {
        self.compact_dimensions
    }

    fn dimensions(&self) -> u32 {
        self.dimensions
    }

    fn append_with_base(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
        base_dimensions: u32,
    ) -> Result<(), FeatureError> {
        if index >= self.compact_dimensions {
            return Err(FeatureError::IndexOutOfRange {
                index,
                limit: self.compact_dimensions,
            });
        }
        check_base(base_dimensions, self.compact_dimensions)?;

        let boundary = self.tail.compact_dimensions();
        if index < boundary {
            return self.tail.append_with_base(index, features, base_dimensions);
        }

        let start = features.len();
        self.head
            .append_with_base(index - boundary, features, base_dimensions)?;

        let head_compact = self.head.compact_dimensions();
        let head_factors = u64::from(self.head.dimensions() - head_compact);
        let factor_range = u64::from(base_dimensions)..u64::from(base_dimensions) + head_factors;
        let pass_through_shift = i64::from(boundary);
        let factor_shift = i64::from(self.tail.dimensions() - boundary);

        for feature in &mut features[start..] {
            let produced = feature.index();
            if produced < head_compact {
                feature.shift_index(pass_through_shift)?;
            } else {
                // `Single` has already bounded and re-based the head's factors.
                debug_assert!(factor_range.contains(&u64::from(produced)));
                feature.shift_index(factor_shift)?;
            }
        }
        Ok(())
    }
}

/// Composes `leaves`, first to last, into one feature set.
pub fn build_feature_set(
    leaves: Vec<Box<dyn Factorizer>>,
) -> Result<Box<dyn FeatureSetFactorizer>, FeatureError> {
    let mut leaves = leaves.into_iter().rev();
    let last = leaves.next().ok_or(FeatureError::EmptyFeatureSet)?;

    let mut set: Box<dyn FeatureSetFactorizer> = Box::new(Single::new(last)?);
    for head in leaves {
        set = Box::new(Chain::new(head, set)?);
    }

    debug!(
        "composed feature set: compact {} expanded {}",
        set.compact_dimensions(),
        set.dimensions()
    );
    Ok(set)
}
