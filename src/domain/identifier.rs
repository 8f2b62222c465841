// Copyright (c) 2025 - Cowboy AI, Inc.
//! Logical Id Value Object with Template Naming Invariants

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Logical id validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogicalIdError {
    #[error("Logical id is empty")]
    Empty,

    #[error("Logical id exceeds maximum length of 255 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in logical id: {0:?}")]
    InvalidCharacter(char),

    #[error("Logical id must start with a letter: {0}")]
    LeadingDigit(String),
}

/// Logical id of a declared entity
///
/// Every entity in a resource graph is addressed by its logical id. The id is
/// also the key the provisioning engine diffs against previously realized
/// state, so it must be stable across builds and template-safe:
/// - Non-empty, at most 255 characters
/// - ASCII alphanumeric only
/// - Starts with a letter
///
/// # Examples
///
/// ```rust
/// use cim_mirror_topology::domain::LogicalId;
///
/// let id = LogicalId::new("ConsumerVpc").unwrap();
/// assert_eq!(id.as_str(), "ConsumerVpc");
///
/// // Labels with separators are squashed into PascalCase
/// let id = LogicalId::from_label("Gateway Load Balancer").unwrap();
/// assert_eq!(id.as_str(), "GatewayLoadBalancer");
///
/// assert!(LogicalId::new("").is_err());
/// assert!(LogicalId::new("Consumer VPC").is_err());
/// assert!(LogicalId::new("1stNetwork").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Maximum length accepted by template engines for a logical id
    pub const MAX_LENGTH: usize = 255;

    /// Create a new logical id with validation
    pub fn new(id: impl Into<String>) -> Result<Self, LogicalIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(LogicalIdError::Empty);
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(LogicalIdError::TooLong(id.len()));
        }

        if let Some(ch) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(LogicalIdError::InvalidCharacter(ch));
        }

        if id.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(LogicalIdError::LeadingDigit(id));
        }

        Ok(Self(id))
    }

    /// Build a logical id from a human label ("Consumer EC2 Instance")
    ///
    /// Words are split on anything that is not ASCII alphanumeric and joined
    /// with their first letter uppercased.
    pub fn from_label(label: &str) -> Result<Self, LogicalIdError> {
        let squashed: String = label
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect();

        Self::new(squashed)
    }

    /// Derive a child id by appending a suffix ("ConsumerVpc" + "PublicSubnet1")
    pub fn child(&self, suffix: &str) -> Result<Self, LogicalIdError> {
        Self::new(format!("{}{}", self.0, suffix))
    }

    /// Get the logical id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LogicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LogicalId {
    type Error = LogicalIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LogicalId {
    type Error = LogicalIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}
