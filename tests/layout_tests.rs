//! Layout checks for composed feature sets.
//!
//! Synthetic leaves emit their pass-through index plus one factor chosen from
//! the compact index, so every factor slot of every leaf gets exercised. The
//! expected global position of each feature is computed independently from
//! the leaf list and compared with what the recursive composition produces.

use std::collections::BTreeSet;

use proptest::prelude::*;

use nnue_factorizer::factorizer::{
    build_feature_set, Chain, Factorizer, FeatureSetFactorizer, Identity, Product, Single,
};
use nnue_factorizer::feature_set;
use nnue_factorizer::trainer::{FeatureError, TrainingFeature, INDEX_LIMIT};

#[derive(Debug, Clone, Copy)]
struct Synthetic {
    compact: u32,
    expanded: u32,
}

impl Factorizer for Synthetic {
    fn compact_dimensions(&self) -> u32 {
        self.compact
    }

    fn dimensions(&self) -> u32 {
        self.expanded
    }

    fn append_training_features(
        &self,
        index: u32,
        features: &mut Vec<TrainingFeature>,
    ) -> Result<(), FeatureError> {
        features.push(TrainingFeature::new(index)?);
        let factors = self.expanded - self.compact;
        if factors > 0 {
            features.push(TrainingFeature::new(self.compact + index % factors)?);
            // Every index also hits the last factor so slots are shared.
            if factors > 1 {
                features.push(TrainingFeature::new(self.expanded - 1)?);
            }
        }
        Ok(())
    }
}

/// Expected global indices, computed from the list without recursion.
fn oracle(leaves: &[Synthetic], index: u32) -> Vec<u32> {
    let total_compact: u32 = leaves.iter().map(|l| l.compact).sum();

    let mut compact_offset = total_compact;
    let mut factor_offset: u32 = leaves.iter().map(|l| l.expanded - l.compact).sum();
    for leaf in leaves {
        compact_offset -= leaf.compact;
        factor_offset -= leaf.expanded - leaf.compact;
        if index >= compact_offset {
            let local = index - compact_offset;
            let mut local_features = Vec::new();
            leaf.append_training_features(local, &mut local_features)
                .unwrap();
            return local_features
                .iter()
                .map(|f| {
                    let i = f.index();
                    if i < leaf.compact {
                        i + compact_offset
                    } else {
                        total_compact + factor_offset + (i - leaf.compact)
                    }
                })
                .collect();
        }
    }
    unreachable!("index {} outside compact range", index)
}

fn expand<S: FeatureSetFactorizer + ?Sized>(set: &S, index: u32) -> Vec<u32> {
    let mut features = Vec::new();
    set.append_training_features(index, &mut features).unwrap();
    features.iter().map(|f| f.index()).collect()
}

fn dynamic(leaves: &[Synthetic]) -> Box<dyn FeatureSetFactorizer> {
    build_feature_set(
        leaves
            .iter()
            .map(|&l| Box::new(l) as Box<dyn Factorizer>)
            .collect(),
    )
    .unwrap()
}

/// All leaf shapes with compact in 1..=3 and up to 2 factors.
fn shapes() -> Vec<Synthetic> {
    let mut out = Vec::new();
    for compact in 1..=3 {
        for factors in 0..=2 {
            out.push(Synthetic {
                compact,
                expanded: compact + factors,
            });
        }
    }
    out
}

fn check_layout(leaves: &[Synthetic]) {
    let set = dynamic(leaves);
    let compact: u32 = leaves.iter().map(|l| l.compact).sum();
    let expanded: u32 = leaves.iter().map(|l| l.expanded).sum();
    assert_eq!(set.compact_dimensions(), compact);
    assert_eq!(set.dimensions(), expanded);

    let mut pass_through = BTreeSet::new();
    let mut factors = BTreeSet::new();
    for index in 0..compact {
        let produced = expand(set.as_ref(), index);
        assert_eq!(produced, oracle(leaves, index), "leaves {:?} index {}", leaves, index);

        // First feature is the pass-through and equals the compact index.
        assert_eq!(produced[0], index);
        pass_through.insert(produced[0]);
        for &f in &produced[1..] {
            assert!(f >= compact && f < expanded);
            factors.insert(f);
        }
    }

    // Pass-through covers the compact space exactly; every factor slot is used.
    assert_eq!(pass_through, (0..compact).collect());
    assert_eq!(factors, (compact..expanded).collect());

    // Out of range is rejected, never wrapped.
    let mut features = Vec::new();
    assert_eq!(
        set.append_training_features(compact, &mut features),
        Err(FeatureError::IndexOutOfRange {
            index: compact,
            limit: compact
        })
    );
}

#[test]
fn exhaustive_one_and_two_leaves() {
    let shapes = shapes();
    for &a in &shapes {
        check_layout(&[a]);
        for &b in &shapes {
            check_layout(&[a, b]);
        }
    }
}

#[test]
fn exhaustive_three_leaves() {
    let shapes = shapes();
    for &a in &shapes {
        for &b in &shapes {
            for &c in &shapes {
                check_layout(&[a, b, c]);
            }
        }
    }
}

#[test]
fn exhaustive_four_leaves_small_shapes() {
    let shapes: Vec<_> = shapes().into_iter().filter(|s| s.compact <= 2).collect();
    for &a in &shapes {
        for &b in &shapes {
            for &c in &shapes {
                for &d in &shapes {
                    check_layout(&[a, b, c, d]);
                }
            }
        }
    }
}

#[test]
fn static_and_runtime_compositions_agree() {
    let a = Synthetic { compact: 3, expanded: 5 };
    let b = Synthetic { compact: 1, expanded: 1 };
    let c = Synthetic { compact: 2, expanded: 4 };
    let d = Synthetic { compact: 2, expanded: 3 };

    let fixed: Chain<Synthetic, Chain<Synthetic, Chain<Synthetic, Single<Synthetic>>>> =
        feature_set![a, b, c, d].unwrap();
    let runtime = dynamic(&[a, b, c, d]);

    assert_eq!(fixed.dimensions(), runtime.dimensions());
    for index in 0..fixed.compact_dimensions() {
        assert_eq!(expand(&fixed, index), expand(runtime.as_ref(), index));
    }
}

#[test]
fn product_and_identity_layout() {
    // product:3x4 (compact 12, 7 factors) in front of identity:5.
    let set = feature_set![Product::new(3, 4).unwrap(), Identity::new(5)].unwrap();
    assert_eq!(set.compact_dimensions(), 17);
    assert_eq!(set.dimensions(), 24);

    assert_eq!(expand(&set, 4), vec![4]);
    // compact 5 + 6 = 11 is product pair 6 (outer 1, inner 2).
    assert_eq!(expand(&set, 11), vec![11, 17 + 1, 17 + 3 + 2]);
}

proptest! {
    #[test]
    fn every_index_lands_in_range(
        dims in prop::collection::vec((1u32..40, 0u32..20), 1..=4),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..16),
    ) {
        let leaves: Vec<Synthetic> = dims
            .iter()
            .map(|&(compact, factors)| Synthetic { compact, expanded: compact + factors })
            .collect();
        let set = dynamic(&leaves);
        let compact = set.compact_dimensions();

        for pick in picks {
            let index = pick.index(compact as usize) as u32;
            let produced = expand(set.as_ref(), index);
            prop_assert_eq!(&produced, &oracle(&leaves, index));
            prop_assert_eq!(produced[0], index);
            prop_assert!(produced.iter().all(|&i| i < set.dimensions()));
        }
    }

    #[test]
    fn shift_round_trip(index in 0u32..INDEX_LIMIT, offset in -(INDEX_LIMIT as i64)..(INDEX_LIMIT as i64)) {
        let original = TrainingFeature::new(index).unwrap();
        let mut shifted = original;
        match shifted.shift_index(offset) {
            Ok(()) => {
                shifted.shift_index(-offset).unwrap();
                prop_assert_eq!(shifted, original);
            }
            Err(e) => {
                prop_assert_eq!(e, FeatureError::IndexOverflow(i64::from(index) + offset));
                prop_assert_eq!(shifted, original);
            }
        }
    }

    #[test]
    fn merge_adds_counts(index in 0u32..INDEX_LIMIT, m1 in 1u32..128, m2 in 1u32..128) {
        let one = TrainingFeature::new(index).unwrap();
        let mut a = one;
        for _ in 1..m1 {
            a.merge(&one).unwrap();
        }
        let mut b = one;
        for _ in 1..m2 {
            b.merge(&one).unwrap();
        }
        a.merge(&b).unwrap();
        prop_assert_eq!(a.count(), m1 + m2);
        prop_assert_eq!(a.index(), index);
    }
}
