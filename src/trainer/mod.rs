//! Training-side data: packed features, samples, and the message channel
//! the trainer uses to adjust expansion knobs.

pub mod example;
pub mod feature;
pub mod message;
pub mod options;

pub use example::{expand_active_indices, Example, Perspective, SampleError, ALL_PERSPECTIVES};
pub use feature::{
    merge_duplicates, FeatureError, TrainingFeature, COUNT_BITS, COUNT_LIMIT, INDEX_BITS,
    INDEX_LIMIT,
};
pub use message::{parse_assignment, parse_setoption, receive_message, Message, MessageError};
pub use options::ExpansionOptions;
