//! [`Query`] collection related to a single [`Medicine`].

use common::operations::By;

use crate::domain::{account::Permissions, medicine, Medicine};
#[cfg(doc)]
use crate::Query;

use super::{DatabaseQuery, Restricted};

/// Queries a [`Medicine`] by its [`medicine::Id`].
pub type ById = DatabaseQuery<By<Option<Medicine>, medicine::Id>>;

impl Restricted for ById {
    const REQUIRED: Permissions = Permissions::READ_MEDICINE;
}
