//! Textual feature-set layouts.
//!
//! A layout is a list of leaf descriptions, first leaf first:
//!
//! - `identity:N`: N features, no factors
//! - `product:OxI`: O*I pair features with outer and inner marginals

use super::feature_set::build_feature_set;
use super::leaf::{Identity, Product};
use super::{Factorizer, FeatureSetFactorizer};
use crate::trainer::{receive_message, FeatureError, Message, MessageError};

/// Errors that can occur while parsing or building a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid leaf description: '{0}'")]
    InvalidSpec(String),

    #[error("unknown leaf kind: '{0}'")]
    UnknownKind(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Shape of one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Identity { dimensions: u32 },
    Product { outer: u32, inner: u32 },
}

/// A parsed leaf description plus its adjustable knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSpec {
    pub kind: LeafKind,
    /// Emit factor features. Has no effect on `identity` leaves.
    pub factors: bool,
}

impl LeafSpec {
    pub fn new(kind: LeafKind) -> Self {
        LeafSpec {
            kind,
            factors: true,
        }
    }

    /// Parses `identity:N` or `product:OxI`.
    pub fn parse(s: &str) -> Result<Self, LayoutError> {
        let (kind, args) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| LayoutError::InvalidSpec(s.to_string()))?;

        let parse_dim = |part: &str| -> Result<u32, LayoutError> {
            part.trim()
                .parse()
                .map_err(|_| LayoutError::InvalidSpec(s.to_string()))
        };

        let kind = match kind.trim() {
            "identity" => LeafKind::Identity {
                dimensions: parse_dim(args)?,
            },
            "product" => {
                let (outer, inner) = args
                    .split_once('x')
                    .ok_or_else(|| LayoutError::InvalidSpec(s.to_string()))?;
                LeafKind::Product {
                    outer: parse_dim(outer)?,
                    inner: parse_dim(inner)?,
                }
            }
            other => return Err(LayoutError::UnknownKind(other.to_string())),
        };
        Ok(LeafSpec::new(kind))
    }

    /// Applies a `factors` / `factors[k]` message.
    pub fn receive_message(&mut self, message: &mut Message) -> Result<bool, MessageError> {
        if receive_message("factors", message) {
            self.factors = message.parse_bool()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn build(&self) -> Result<Box<dyn Factorizer>, FeatureError> {
        let leaf: Box<dyn Factorizer> = match self.kind {
            LeafKind::Identity { dimensions } => Box::new(Identity::new(dimensions)),
            LeafKind::Product { outer, inner } => {
                Box::new(Product::new(outer, inner)?.with_factors(self.factors))
            }
        };
        Ok(leaf)
    }
}

/// Builds the feature set described by `specs`, first leaf first.
pub fn build_feature_set_from_specs(
    specs: &[LeafSpec],
) -> Result<Box<dyn FeatureSetFactorizer>, LayoutError> {
    let leaves = specs
        .iter()
        .map(LeafSpec::build)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_feature_set(leaves)?)
}
