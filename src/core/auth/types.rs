use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::enums::Role;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    #[serde(default)]
    pub user: Value,
}

impl Session {
    pub fn new(token: &str, role: Role) -> Self {
        Self {
            token: token.to_string(),
            role,
            user: Value::Null,
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = user;
        self
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the token itself
        write!(f, "Session {{ role: {}, user: {} }}", self.role, self.user)
    }
}

/// The only claim the client cares about; the server owns verification.
#[derive(Debug, Deserialize)]
pub struct ExpiryClaims {
    pub exp: Option<i64>,
}
