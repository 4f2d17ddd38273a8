//! Training-time feature factorization for NNUE evaluation functions.
//!
//! The evaluation function sees a compact, sparse feature encoding. While
//! training, each compact feature is expanded into itself plus correlated
//! factor features so that gradients are shared between related inputs.
//! Factor weights are folded back into the compact weights afterwards, so
//! the expansion is an exact, fixed mapping of index ranges.
//!
//! - `factorizer`: leaf factorizers and their recursive composition
//! - `trainer`: packed training features, samples, options, and messages

pub mod factorizer;
pub mod trainer;
