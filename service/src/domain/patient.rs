//! [`Patient`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::define_text;

/// Patient of the clinic, referenced by visits.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Patient {
    /// ID of this [`Patient`].
    pub id: Id,

    /// [`PublicId`] printed on the card of this [`Patient`].
    pub public_id: PublicId,

    /// [`Name`] of this [`Patient`].
    pub name: Name,

    /// [`DateTime`] when this [`Patient`] was registered.
    pub created_at: CreationDateTime,
}

/// ID of a [`Patient`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Public ID of a [`Patient`], printed on their card."]
    PublicId(max = 64)
}

define_text! {
    #[doc = "Full name of a [`Patient`]."]
    Name(max = 512)
}

/// [`DateTime`] when a [`Patient`] was registered.
pub type CreationDateTime = DateTimeOf<(Patient, unit::Creation)>;
