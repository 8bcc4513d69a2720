//! The session token stored inside the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID};

/// Who is logged in and until when.
///
/// The expiry is stored as a Unix timestamp so the token does not depend on
/// the server's local offset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SessionToken {
    pub user_id: UserID,

    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl SessionToken {
    /// Whether the session has ended at `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Serialize the token into the cookie value.
    ///
    /// # Errors
    ///
    /// Returns an [Error::JSONSerializationError] if serialization fails.
    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|error| {
            tracing::error!("could not serialize session token: {error}");
            Error::JSONSerializationError(error.to_string())
        })
    }

    /// Parse a cookie value produced by [SessionToken::encode].
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidToken] for anything that is not a token.
    pub fn decode(value: &str) -> Result<Self, Error> {
        serde_json::from_str(value).map_err(|_| Error::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use crate::{Error, UserID, auth::token::SessionToken};

    fn token() -> SessionToken {
        SessionToken {
            user_id: UserID::new(3),
            expires_at: datetime!(2025-12-21 00:00:00 UTC),
        }
    }

    #[test]
    fn encodes_expiry_as_timestamp() {
        let encoded = token().encode().unwrap();

        assert_eq!(encoded, r#"{"user_id":3,"expires_at":1766275200}"#);
    }

    #[test]
    fn decodes_encoded_token() {
        let encoded = token().encode().unwrap();

        assert_eq!(SessionToken::decode(&encoded), Ok(token()));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(SessionToken::decode("deleted"), Err(Error::InvalidToken));
        assert_eq!(
            SessionToken::decode(r#"{"user_id":3}"#),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn expires_at_the_expiry_instant() {
        let token = token();

        assert!(!token.is_expired_at(token.expires_at - Duration::seconds(1)));
        assert!(token.is_expired_at(token.expires_at));
    }
}
