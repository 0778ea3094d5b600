//! Signed [JWT] tokens.
//!
//! [JWT]: https://datatracker.ietf.org/doc/html/rfc7519

use std::time::Duration;

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{Debug, Display, Error as StdError, From};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

define_kind! {
    #[doc = "Purpose a token is issued for."]
    enum Purpose {
        #[doc = "Authenticating an account session."]
        Session = 1,

        #[doc = "Verifying an account action. Not issued by any command yet."]
        Verification = 2,
    }
}

/// Issuer signing and decoding tokens with a shared HMAC secret.
#[derive(Clone, Debug)]
pub struct Issuer {
    /// Key to sign tokens with.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key to verify token signatures with.
    #[debug(skip)]
    decoding_key: DecodingKey,
}

/// Token signed by an [`Issuer`].
#[derive(Clone, Debug)]
pub struct Signed {
    /// Encoded token.
    pub token: String,

    /// [`DateTime`] when the token expires.
    pub expires_at: ExpirationDateTime,
}

/// Claims of a token: the payload extended with registered claims.
#[derive(Debug, Deserialize, Serialize)]
struct Claims<T> {
    /// Custom payload.
    #[serde(flatten)]
    payload: T,

    /// [`Purpose`] the token is issued for.
    aud: Purpose,

    /// [`DateTime`] when the token expires.
    #[serde(with = "common::datetime::unix_timestamp")]
    exp: ExpirationDateTime,
}

impl Issuer {
    /// Signature algorithm used for every token.
    const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates a new [`Issuer`] out of the provided keys.
    #[must_use]
    pub fn new(encoding_key: EncodingKey, decoding_key: DecodingKey) -> Self {
        Self {
            encoding_key,
            decoding_key,
        }
    }

    /// Creates a new [`Issuer`] out of the provided HMAC `secret`.
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )
    }

    /// Signs the provided `payload` for the given [`Purpose`], valid for the
    /// provided `ttl`.
    ///
    /// # Errors
    ///
    /// If the `payload` cannot be serialized, or the `ttl` overflows the
    /// supported [`DateTime`] range.
    pub fn sign<T: Serialize>(
        &self,
        payload: T,
        purpose: Purpose,
        ttl: Duration,
    ) -> Result<Signed, Error> {
        let expires_at = DateTime::now()
            .checked_add(ttl)
            .ok_or(Error::TtlOutOfRange(ttl))?
            .coerce();
        let token = self.encode(&Claims {
            payload,
            aud: purpose,
            exp: expires_at,
        })?;
        Ok(Signed { token, expires_at })
    }

    /// Decodes the payload of the provided `token` issued for the given
    /// [`Purpose`].
    ///
    /// # Errors
    ///
    /// If the `token` has an invalid signature, was issued for another
    /// [`Purpose`], has expired, or its payload doesn't match `T`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: Purpose,
    ) -> Result<T, Error> {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.set_audience(&[purpose]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        jsonwebtoken::decode::<Claims<T>>(
            token,
            &self.decoding_key,
            &validation,
        )
        .map(|data| data.claims.payload)
        .map_err(Error::Jwt)
    }

    /// Encodes the provided [`Claims`] into a signed token.
    fn encode<T: Serialize>(&self, claims: &Claims<T>) -> Result<String, Error> {
        jsonwebtoken::encode(
            &Header::new(Self::ALGORITHM),
            claims,
            &self.encoding_key,
        )
        .map_err(Error::Jwt)
    }
}

/// Error of signing or decoding a token.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Token cannot be encoded, or is not a valid one.
    #[display("invalid token: {_0}")]
    Jwt(jsonwebtoken::errors::Error),

    /// Token lifetime exceeds the supported [`DateTime`] range.
    #[display("token lifetime of {_0:?} is out of range")]
    #[from(ignore)]
    TtlOutOfRange(#[error(not(source))] Duration),
}

/// [`DateTime`] when a token expires.
pub type ExpirationDateTime = DateTimeOf<(Signed, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use serde::{Deserialize, Serialize};

    use super::{Claims, Error, Issuer, Purpose};

    #[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
    struct Payload {
        name: String,
    }

    fn payload() -> Payload {
        Payload {
            name: "sec1".into(),
        }
    }

    #[test]
    fn round_trips() {
        let issuer = Issuer::from_secret(b"secret");
        let signed = issuer
            .sign(payload(), Purpose::Session, Duration::from_secs(60))
            .unwrap();

        assert!(signed.expires_at > DateTime::now().coerce());
        assert_eq!(
            issuer
                .decode::<Payload>(&signed.token, Purpose::Session)
                .unwrap(),
            payload(),
        );
    }

    #[test]
    fn rejects_other_purpose() {
        let issuer = Issuer::from_secret(b"secret");
        let signed = issuer
            .sign(payload(), Purpose::Verification, Duration::from_secs(60))
            .unwrap();

        assert!(issuer
            .decode::<Payload>(&signed.token, Purpose::Session)
            .is_err());
    }

    #[test]
    fn rejects_other_secret() {
        let signed = Issuer::from_secret(b"secret")
            .sign(payload(), Purpose::Session, Duration::from_secs(60))
            .unwrap();

        assert!(Issuer::from_secret(b"another")
            .decode::<Payload>(&signed.token, Purpose::Session)
            .is_err());
    }

    #[test]
    fn rejects_expired() {
        let issuer = Issuer::from_secret(b"secret");
        let token = issuer
            .encode(&Claims {
                payload: payload(),
                aud: Purpose::Session,
                exp: (DateTime::now() - Duration::from_secs(1)).coerce(),
            })
            .unwrap();

        assert!(issuer.decode::<Payload>(&token, Purpose::Session).is_err());
    }

    #[test]
    fn refuses_out_of_range_lifetime() {
        let issuer = Issuer::from_secret(b"secret");
        let ttl = Duration::from_secs(u64::MAX / 2);

        let err = issuer.sign(payload(), Purpose::Session, ttl).unwrap_err();

        assert!(matches!(err, Error::TtlOutOfRange(d) if d == ttl));
    }

    #[test]
    fn rejects_garbage() {
        let issuer = Issuer::from_secret(b"secret");

        assert!(issuer.decode::<Payload>("", Purpose::Session).is_err());
        assert!(issuer.decode::<Payload>("a.b.c", Purpose::Session).is_err());
    }
}
