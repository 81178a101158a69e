use serde::{Deserialize, Serialize};

/// Persisted upstream access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    /// RFC 3339 timestamp of the renewal that produced `token`
    pub updated_at: String,
}

impl TokenRecord {
    pub fn new(token: impl Into<String>, updated_at: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            updated_at: updated_at.into(),
        }
    }
}
