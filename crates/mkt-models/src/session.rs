//! Authenticated session descriptors.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::account::Account;

/// The authenticated session resolved for one inbound request.
///
/// Sessions are never stored by this backend; the identity provider owns
/// their lifetime and they are rebuilt from the presented token per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionDescriptor {
    /// Subject of the verified token.
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub email_verified: bool,

    /// Account record, when account resolution is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl SessionDescriptor {
    /// Create a session for `user_id` without an account record.
    pub fn new(
        user_id: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            email_verified: false,
            account: None,
            issued_at,
            expires_at,
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_with_account_roundtrip() {
        let now = Utc::now();
        let session = SessionDescriptor::new("u1", now, now + Duration::hours(1))
            .with_account(Account::new("u1"));

        let json = serde_json::to_string(&session).unwrap();
        let parsed: SessionDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
        assert_eq!(parsed.account.unwrap().uid, "u1");
    }
}
