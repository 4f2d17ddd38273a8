//! Sample expansion options.

use serde::{Deserialize, Serialize};

use super::message::{receive_message, Message, MessageError};

/// Knobs applied while turning active indices into an `Example`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionOptions {
    /// Collapse repeated indices into one feature with a higher count.
    pub merge_duplicates: bool,
    /// Weight given to each sample.
    pub weight: f64,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        ExpansionOptions {
            merge_duplicates: true,
            weight: 1.0,
        }
    }
}

impl ExpansionOptions {
    /// Loads options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Applies `message` if it is addressed to these options.
    ///
    /// Returns whether the message was accepted.
    pub fn receive_message(&mut self, message: &mut Message) -> Result<bool, MessageError> {
        if receive_message("merge_duplicates", message) {
            self.merge_duplicates = message.parse_bool()?;
            return Ok(true);
        }
        if receive_message("weight", message) {
            let weight: f64 = message.parse_value()?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(MessageError::InvalidValue {
                    name: message.name.clone(),
                    value: message.value.clone(),
                });
            }
            self.weight = weight;
            return Ok(true);
        }
        Ok(false)
    }
}
