use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

const MAX_LEN: usize = 64;

/// Validated session identifier; safe to use as a file stem.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Id of the single conversation the chat page opens by default.
    pub const DEFAULT: &'static str = "current_chat";

    /// Fresh random id (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let valid = !s.is_empty()
            && s.len() <= MAX_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Self(s))
        } else {
            Err(SessionError::InvalidId(s))
        }
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_default_and_uuids() {
        assert_eq!(SessionId::default().as_str(), "current_chat");
        let g = SessionId::generate();
        assert_eq!(g.as_str().parse::<SessionId>().unwrap(), g);
    }

    #[test]
    fn rejects_path_tricks_and_bad_lengths() {
        let long = "x".repeat(65);
        for bad in ["", "../etc", "a/b", "a.json", "sp ace", long.as_str()] {
            assert!(bad.parse::<SessionId>().is_err(), "{bad:?} accepted");
        }
        assert!("x".repeat(64).parse::<SessionId>().is_ok());
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<SessionId>(r#""ok_id-1""#).is_ok());
        assert!(serde_json::from_str::<SessionId>(r#""../x""#).is_err());
    }
}
