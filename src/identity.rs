//! Tagged user identities.
//!
//! The ledger is keyed by identity. Web accounts are email addresses; chat
//! accounts are synthesized from a platform handle. The two namespaces are
//! kept disjoint by construction: storage keys are always prefixed, so a
//! crafted email can never alias a bot handle or vice versa.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::QuizforgeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Email { address: String },
    BotHandle { platform: String, user_id: String },
}

impl Identity {
    /// Build a validated email identity. The address is lowercased so the
    /// same mailbox always maps to the same ledger row.
    pub fn email(address: &str) -> Result<Self, QuizforgeError> {
        let address = address.trim().to_ascii_lowercase();
        if !is_plausible_email(&address) {
            return Err(QuizforgeError::Config(format!(
                "not a valid email address: {address:?}"
            )));
        }
        Ok(Identity::Email { address })
    }

    /// Build a chat-platform identity, e.g. `bot_handle("telegram", 12345)`.
    pub fn bot_handle(platform: &str, user_id: impl fmt::Display) -> Self {
        Identity::BotHandle {
            platform: platform.to_ascii_lowercase(),
            user_id: user_id.to_string(),
        }
    }

    /// The ledger row key. Prefixes guarantee the namespaces never overlap:
    /// `:` cannot appear in a validated email's local prefix position the
    /// way it does here, and bot keys never parse as emails.
    pub fn storage_key(&self) -> String {
        match self {
            Identity::Email { address } => format!("email:{address}"),
            Identity::BotHandle { platform, user_id } => format!("bot:{platform}:{user_id}"),
        }
    }
}

fn is_plausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.contains(char::is_whitespace)
        && !s.contains(':')
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

impl FromStr for Identity {
    type Err = QuizforgeError;

    /// Parse a storage key or a bare email. Bare strings without a
    /// recognized prefix must be valid emails; there is no untagged
    /// fallback namespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("email:") {
            return Identity::email(rest);
        }
        if let Some(rest) = s.strip_prefix("bot:") {
            let Some((platform, user_id)) = rest.split_once(':') else {
                return Err(QuizforgeError::Config(format!(
                    "bot identity must be bot:<platform>:<user_id>, got {s:?}"
                )));
            };
            if platform.is_empty() || user_id.is_empty() {
                return Err(QuizforgeError::Config(format!(
                    "bot identity must be bot:<platform>:<user_id>, got {s:?}"
                )));
            }
            return Ok(Identity::bot_handle(platform, user_id));
        }
        Identity::email(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let id = Identity::email("  Student@Example.COM ").unwrap();
        assert_eq!(id.storage_key(), "email:student@example.com");
    }

    #[test]
    fn test_email_rejects_garbage() {
        assert!(Identity::email("not-an-email").is_err());
        assert!(Identity::email("@example.com").is_err());
        assert!(Identity::email("user@").is_err());
        assert!(Identity::email("user@nodot").is_err());
        assert!(Identity::email("user name@example.com").is_err());
    }

    #[test]
    fn test_bot_handle_key() {
        let id = Identity::bot_handle("Telegram", 987654321u64);
        assert_eq!(id.storage_key(), "bot:telegram:987654321");
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        // A mailbox that tries to look like a bot key still lands in the
        // email namespace, and the reverse cannot parse as an email.
        let email = Identity::email("bot.telegram.42@example.com").unwrap();
        let bot = Identity::bot_handle("telegram", 42);
        assert_ne!(email.storage_key(), bot.storage_key());
        assert!(email.storage_key().starts_with("email:"));
        assert!(bot.storage_key().starts_with("bot:"));
    }

    #[test]
    fn test_parse_roundtrip() {
        for key in ["email:user@example.com", "bot:telegram:42"] {
            let id: Identity = key.parse().unwrap();
            assert_eq!(id.storage_key(), key);
        }
    }

    #[test]
    fn test_parse_bare_email() {
        let id: Identity = "user@example.com".parse().unwrap();
        assert_eq!(id.storage_key(), "email:user@example.com");
    }

    #[test]
    fn test_parse_rejects_malformed_bot_key() {
        assert!("bot:telegram".parse::<Identity>().is_err());
        assert!("bot::42".parse::<Identity>().is_err());
    }

    #[test]
    fn test_serde_tagged_representation() {
        let id = Identity::bot_handle("telegram", 42);
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.contains("bot_handle"));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
