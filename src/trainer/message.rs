//! Hyperparameter messages.
//!
//! A message carries a name and a string value. Receivers are asked in a
//! fixed order; a receiver accepts a message named exactly like it, or named
//! `name[k]` when it is the k-th receiver of that name to look at the
//! message. This lets `factors[1]` address the second leaf that listens for
//! `factors` while plain `factors` reaches all of them.

use std::str::FromStr;

/// Errors raised when a message value cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("invalid value '{value}' for message '{name}'")]
    InvalidValue { name: String, value: String },
}

/// A named hyperparameter setting on its way through the receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub value: String,
    /// Receivers that inspected an indexed form of this message.
    pub num_peekers: u32,
    /// Receivers that accepted this message.
    pub num_receivers: u32,
}

impl Message {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Message {
            name: name.into(),
            value: value.into(),
            num_peekers: 0,
            num_receivers: 0,
        }
    }

    /// Parses the value, reporting the message name on failure.
    pub fn parse_value<T: FromStr>(&self) -> Result<T, MessageError> {
        self.value.trim().parse().map_err(|_| MessageError::InvalidValue {
            name: self.name.clone(),
            value: self.value.clone(),
        })
    }

    /// Parses a boolean value. Accepts `true/false`, `on/off`, `1/0`.
    pub fn parse_bool(&self) -> Result<bool, MessageError> {
        match self.value.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Ok(true),
            "false" | "off" | "0" => Ok(false),
            _ => Err(MessageError::InvalidValue {
                name: self.name.clone(),
                value: self.value.clone(),
            }),
        }
    }
}

/// Returns true when the receiver called `name` should act on `message`.
pub fn receive_message(name: &str, message: &mut Message) -> bool {
    let subscript = format!("[{}]", message.num_peekers);

    let indexed = message
        .name
        .strip_prefix(name)
        .is_some_and(|rest| rest.starts_with('['));
    if indexed {
        message.num_peekers += 1;
    }

    let accepted = message.name == name
        || message
            .name
            .strip_prefix(name)
            .is_some_and(|rest| rest == subscript);
    if accepted {
        message.num_receivers += 1;
    }
    accepted
}

/// Parses `setoption name <id> [value <x>]` into a message.
///
/// Returns `None` for any other line.
pub fn parse_setoption(line: &str) -> Option<Message> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || tokens[0] != "setoption" || tokens[1] != "name" {
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");
    let (name_parts, value_parts) = match value_idx {
        Some(vi) => (&tokens[2..vi], &tokens[vi + 1..]),
        None => (&tokens[2..], &tokens[tokens.len()..]),
    };
    if name_parts.is_empty() {
        return None;
    }

    Some(Message::new(name_parts.join(" "), value_parts.join(" ")))
}

/// Parses a `name=value` pair into a message. A bare name gets an empty value.
pub fn parse_assignment(arg: &str) -> Option<Message> {
    let (name, value) = arg.split_once('=').unwrap_or((arg, ""));
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Message::new(name, value.trim()))
}
