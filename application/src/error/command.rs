//! [`AsError`] implementations for [`command`] errors.

use service::command;

use super::{AccessError, AsError, Error, ExistsError, NotFoundError};

impl AsError for command::authenticate_account::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Cache(e) => e.try_as_error(),
            Self::Token(_)
            | Self::InvalidSession
            | Self::AccountNotExists(_) => {
                Some(AccessError::InvalidSessionToken.into())
            }
        }
    }
}

impl AsError for command::check_account_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Cache(e) => e.try_as_error(),
            Self::NotAlive => Some(AccessError::InvalidSessionToken.into()),
        }
    }
}

impl AsError for command::create_account::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Hash(_) => None,
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::ForbiddenKind(_) => Some(Error::invalid_field("kind", self)),
            Self::UsernameOccupied(_) => Some(ExistsError::Account.into()),
        }
    }
}

impl AsError for command::create_account_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Token(_) => None,
            Self::InvalidCredentials => {
                Some(AccessError::InvalidLoginCredentials.into())
            }
        }
    }
}

impl AsError for command::create_medicine::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
        }
    }
}

impl AsError for command::create_patient::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Hash(_) => None,
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::InvalidUsername(_) => {
                Some(Error::invalid_field("public_id", self))
            }
            Self::InvalidDisplayName(_) => {
                Some(Error::invalid_field("name", self))
            }
            Self::PatientExists(_) => Some(ExistsError::Patient.into()),
            Self::UsernameOccupied(_) => Some(ExistsError::Account.into()),
        }
    }
}

impl AsError for command::create_super_admin::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Hash(_) => None,
            Self::UsernameOccupied(_) => Some(ExistsError::Account.into()),
        }
    }
}

impl AsError for command::create_visit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::PatientNotExists(_) => Some(NotFoundError::Patient.into()),
            Self::MedicineNotExists(_) => Some(NotFoundError::Medicine.into()),
            Self::AmountOverflow(_) => {
                Some(Error::invalid_field("medicines", self))
            }
            Self::InsufficientMedicine {
                name,
                exceeding,
                left,
            } => Some(Error {
                code: "INSUFFICIENT_MEDICINE",
                status_code: http::StatusCode::FORBIDDEN,
                message: self.to_string(),
                extra: vec![
                    ("medicine_name", name.to_string()),
                    ("exceeding_amount", exceeding.to_string()),
                    ("left_packages", left.to_string()),
                ],
                backtrace: None,
            }),
        }
    }
}

impl AsError for command::delete_account::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Cache(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::AccountNotExists(_) => Some(NotFoundError::Account.into()),
        }
    }
}

impl AsError for command::delete_account_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Cache(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_medicine::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::MedicineNotExists(_) => Some(NotFoundError::Medicine.into()),
        }
    }
}

impl AsError for command::update_account::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Cache(e) => e.try_as_error(),
            Self::Hash(_) => None,
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::AccountNotExists(_) => Some(NotFoundError::Account.into()),
            Self::UsernameOccupied(_) => Some(ExistsError::Account.into()),
        }
    }
}

impl AsError for command::update_medicine_amount::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::MedicineNotExists(_) => Some(NotFoundError::Medicine.into()),
        }
    }
}

impl AsError for command::use_visit_medicine::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => {
                Some(AccessError::PermissionDenied.into())
            }
            Self::PrescriptionNotExists(_) => {
                Some(NotFoundError::Prescription.into())
            }
        }
    }
}
