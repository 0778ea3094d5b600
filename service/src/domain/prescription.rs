//! [`Prescription`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{medicine, patient, visit};
#[cfg(doc)]
use crate::domain::{Medicine, Visit};

/// Single [`Medicine`] package dispensed during a [`Visit`].
///
/// Every dispensed package has its own [`Prescription`], so it can be marked
/// as used individually.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Prescription {
    /// ID of this [`Prescription`].
    pub id: Id,

    /// ID of the [`Visit`] this [`Prescription`] was made during.
    pub visit_id: visit::Id,

    /// ID of the patient this [`Prescription`] was made for.
    pub patient_id: patient::Id,

    /// ID of the prescribed [`Medicine`].
    pub medicine_id: medicine::Id,

    /// [`DateTime`] when the prescribed package was used, if it was.
    pub used_at: Option<UsageDateTime>,

    /// [`DateTime`] when this [`Prescription`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Prescription`].
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

/// [`DateTime`] when a [`Prescription`] was created.
pub type CreationDateTime = DateTimeOf<(Prescription, unit::Creation)>;

/// [`DateTime`] when a prescribed package was used.
pub type UsageDateTime = DateTimeOf<(Prescription, unit::Usage)>;
