//! [`Visit`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::patient;

/// Clinical visit of a patient.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Visit {
    /// ID of this [`Visit`].
    pub id: Id,

    /// ID of the visiting patient.
    pub patient_id: patient::Id,

    /// [`Reason`] of this [`Visit`].
    pub reason: Reason,

    /// Free-form notes of this [`Visit`].
    pub notes: String,

    /// Weight of the patient measured during this [`Visit`].
    pub patient_weight: Option<Weight>,

    /// Height of the patient measured during this [`Visit`].
    pub patient_height: Option<Height>,

    /// [`DateTime`] when this [`Visit`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Visit`].
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

define_kind! {
    #[doc = "Reason of a [`Visit`]."]
    enum Reason {
        #[doc = "Primary prophylaxis."]
        PrimaryProphylaxis = 1,

        #[doc = "Secondary prophylaxis."]
        SecondaryProphylaxis = 2,

        #[doc = "Surgery."]
        Surgery = 3,

        #[doc = "Evaluation of joints."]
        JointEvaluation = 4,

        #[doc = "Injection into a joint."]
        JointInjection = 5,

        #[doc = "Hemelibra treatment."]
        Hemelibra = 6,

        #[doc = "Treatment at home."]
        HomeTreatment = 7,

        #[doc = "Active bleeding."]
        ActiveBleeding = 8,
    }
}

/// Weight of a patient in kilograms.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Into, PartialEq, Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Weight(Decimal);

impl Weight {
    /// Creates a new [`Weight`] if the given `kg` is positive.
    #[must_use]
    pub fn new(kg: Decimal) -> Option<Self> {
        (kg > Decimal::ZERO).then_some(Self(kg))
    }
}

/// Height of a patient in centimeters.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Into, PartialEq, Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Height(Decimal);

impl Height {
    /// Creates a new [`Height`] if the given `cm` is positive.
    #[must_use]
    pub fn new(cm: Decimal) -> Option<Self> {
        (cm > Decimal::ZERO).then_some(Self(cm))
    }
}

/// [`DateTime`] when a [`Visit`] was created.
pub type CreationDateTime = DateTimeOf<(Visit, unit::Creation)>;
