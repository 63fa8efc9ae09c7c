//! API-key authentication
//!
//! Callers present a key in the `X-API-Key` header; it must match one of the
//! configured keys exactly.

use std::collections::HashSet;

use crate::error::LookupError;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Set of accepted API keys
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    keys: HashSet<String>,
}

impl ApiKeyAuth {
    /// Create an authenticator accepting the given keys
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// Check a presented key (`None` when the header is absent)
    pub fn validate(&self, presented: Option<&str>) -> Result<(), LookupError> {
        match presented {
            Some(key) if self.keys.contains(key) => Ok(()),
            _ => Err(LookupError::Unauthorized),
        }
    }
}
