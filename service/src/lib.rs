//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;

#[cfg(test)]
mod fixture;

use std::time::Duration;

use derive_more::Debug;

#[cfg(doc)]
use infra::{Cache, Database};
use infra::{token, Sessions};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Time an account session lives for.
    pub session_ttl: Duration,
}

impl Config {
    /// Default time an account session lives for.
    pub const DEFAULT_SESSION_TTL: Duration =
        Duration::from_secs(60 * 24 * 60 * 60);

    /// Creates a new [`Config`] signing tokens with the provided HMAC
    /// `secret`.
    #[must_use]
    pub fn from_secret(secret: &[u8], session_ttl: Duration) -> Self {
        Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            session_ttl,
        }
    }
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, C> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Sessions`] stored in a [`Cache`] of this [`Service`].
    sessions: Sessions<C>,

    /// [`token::Issuer`] of this [`Service`].
    tokens: token::Issuer,
}

impl<Db, C> Service<Db, C> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, cache: C) -> Self {
        let tokens = token::Issuer::new(
            config.jwt_encoding_key.clone(),
            config.jwt_decoding_key.clone(),
        );
        let sessions = Sessions::new(cache, config.session_ttl);
        Self {
            config,
            database,
            sessions,
            tokens,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Sessions`] of this [`Service`].
    #[must_use]
    pub fn sessions(&self) -> &Sessions<C> {
        &self.sessions
    }

    /// Returns [`token::Issuer`] of this [`Service`].
    #[must_use]
    pub fn tokens(&self) -> &token::Issuer {
        &self.tokens
    }
}
