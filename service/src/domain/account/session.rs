//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::{account, Account};

/// Payload of a signed session [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// Display name of the [`Account`] at the time of login.
    #[serde(default)]
    pub name: String,

    /// [`account::Username`] of the [`Account`] this [`Session`] belongs to.
    #[serde(default)]
    pub username: String,

    /// [`DateTime`] when this [`Session`] was created.
    pub created_at: CreationDateTime,
}

impl Session {
    /// Creates a new [`Session`] of the provided [`Account`].
    #[must_use]
    pub fn of(account: &Account) -> Self {
        Self {
            name: account.display_name.to_string(),
            username: account.username.to_string(),
            created_at: CreationDateTime::now(),
        }
    }

    /// Returns the [`account::Username`] this [`Session`] refers to, if this
    /// [`Session`] is valid.
    ///
    /// A valid [`Session`] has a non-empty name, a well-formed username and
    /// a creation [`DateTime`] after the Unix epoch.
    #[must_use]
    pub fn username(&self) -> Option<account::Username> {
        if self.name.is_empty() || self.created_at <= CreationDateTime::UNIX_EPOCH
        {
            return None;
        }
        account::Username::new(self.username.as_str())
    }
}

/// Signed access token of a [`Session`].
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    PartialEq,
    Serialize,
)]
#[as_ref(str)]
#[serde(transparent)]
pub struct Token(String);

/// [`DateTime`] when a [`Session`] was created.
pub type CreationDateTime = DateTimeOf<(Session, unit::Creation)>;

/// [`DateTime`] when a [`Session`] expires.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::Session;

    #[test]
    fn missing_claims_make_session_invalid() {
        let session = serde_json::from_str::<Session>(
            r#"{"created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(session.username().is_none());

        let session = serde_json::from_str::<Session>(
            r#"{"username":"sec1","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(session.username().is_none(), "empty name");

        let session = serde_json::from_str::<Session>(
            r#"{"name":"Sec","username":"sec1","created_at":"1970-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(session.username().is_none(), "zero creation time");

        let session = serde_json::from_str::<Session>(
            r#"{"name":"Sec","username":"sec1","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(session.username().unwrap().to_string(), "sec1");
    }
}
