//! Feature factorizers.
//!
//! A leaf [`Factorizer`] expands the compact indices of one elementary
//! feature type into training features. A [`FeatureSetFactorizer`] composes an
//! ordered list of leaves into one flat expanded space:
//!
//! - compact space: the last leaf's range comes first, each earlier leaf is
//!   offset by the compact width of everything after it;
//! - expanded space: `[0, compact)` holds pass-through features (the
//!   pass-through of compact index `i` is exactly `i`), followed by the factor
//!   ranges, again last leaf first.
//!
//! Compositions are built statically with [`feature_set!`](crate::feature_set)
//! or at runtime with [`build_feature_set`].

pub mod feature_set;
pub mod layout;
pub mod leaf;

pub use feature_set::{build_feature_set, Chain, Single};
pub use layout::{build_feature_set_from_specs, LayoutError, LeafKind, LeafSpec};
pub use leaf::{Identity, Product};

use crate::trainer::{FeatureError, TrainingFeature};

/// Expands one elementary feature type.
pub trait Factorizer: Send + Sync {
    /// Size of the compact (inference) index range.
    fn compact_dimensions(&self) -> u32;

    /// Size of the expanded (training) index range, at least
    /// `compact_dimensions()`.
    fn dimensions(&self) -> u32;

    /// Appends the training features for compact `index` to `features`.
    ///
    /// Produced indices lie in `[0, dimensions())`; those below
    /// `compact_dimensions()` are pass-through, the rest are factors.
    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError>;
}

impl<F: Factorizer + ?Sized> Factorizer for Box<F> {
    fn compact_dimensions(&self) -> u32 {
        (**self).compact_dimensions()
    }

    fn dimensions(&self) -> u32 {
        (**self).dimensions()
    }

    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError> {
        (**self).append_training_features(index, features)
    }
}

/// Expands an ordered list of feature types into one flat training space.
pub trait FeatureSetFactorizer: Send + Sync {
    /// Sum of the members' compact dimensions.
    fn compact_dimensions(&self) -> u32;

    /// Sum of the members' expanded dimensions.
    fn dimensions(&self) -> u32;

    /// Appends the training features for compact `index`, placing factor
    /// features relative to `base_dimensions`.
    ///
    /// Every appended index lies in `[0, compact_dimensions())` or in
    /// `[base_dimensions, base_dimensions + dimensions() - compact_dimensions())`.
    /// On error `features` may hold a partial expansion and must be discarded.
    fn append_with_base(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
        base_dimensions: u32,
    ) -> Result<(), FeatureError>;

    /// Appends the training features for compact `index`.
    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError> {
        self.append_with_base(index, features, self.compact_dimensions())
    }
}

impl<S: FeatureSetFactorizer + ?Sized> FeatureSetFactorizer for Box<S> {
    fn compact_dimensions(&self) -> u32 {
        (**self).compact_dimensions()
    }

    fn dimensions(&self) -> u32 {
        (**self).dimensions()
    }

    fn append_with_base(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
        base_dimensions: u32,
    ) -> Result<(), FeatureError> {
        (**self).append_with_base(index, features, base_dimensions)
    }
}

/// Composes leaf factorizers into a feature set.
///
/// `feature_set![a, b, c]` evaluates to
/// `Result<Chain<A, Chain<B, Single<C>>>, FeatureError>`.
#[macro_export]
macro_rules! feature_set {
    ($leaf:expr $(,)?) => {
        $crate::factorizer::Single::new($leaf)
    };
    ($head:expr, $($rest:expr),+ $(,)?) => {
        $crate::feature_set!($($rest),+)
            .and_then(|tail| $crate::factorizer::Chain::new($head, tail))
    };
}
