//! [`Error`]-related definitions.

mod command;

use std::fmt;

use derive_more::Error as StdError;
use itertools::Itertools as _;
use service::{
    infra::{cache, database},
    query,
};
use tracerr::{Trace, Traced};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            extra: Vec::new(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

define_error! {
    enum AccessError {
        #[code = "INVALID_LOGIN_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Provided credentials do not match any `Account`"]
        InvalidLoginCredentials,

        #[code = "INVALID_SESSION_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Session token is invalid or expired"]
        InvalidSessionToken,

        #[code = "PERMISSION_DENIED"]
        #[status = UNAUTHORIZED]
        #[message = "Authenticated `Account` lacks required permissions"]
        PermissionDenied,
    }
}

define_error! {
    enum NotFoundError {
        #[code = "ACCOUNT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Account` does not exist"]
        Account,

        #[code = "MEDICINE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Medicine` does not exist"]
        Medicine,

        #[code = "PATIENT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Patient` does not exist"]
        Patient,

        #[code = "PRESCRIPTION_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Prescription` does not exist within the `Visit`"]
        Prescription,
    }
}

define_error! {
    enum ExistsError {
        #[code = "ACCOUNT_EXISTS"]
        #[status = CONFLICT]
        #[message = "`Account` with the provided username already exists"]
        Account,

        #[code = "PATIENT_EXISTS"]
        #[status = CONFLICT]
        #[message = "`Patient` with the provided public ID already exists"]
        Patient,
    }
}

/// Client-facing [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// [`Error`] message.
    pub message: String,

    /// Structured details of this [`Error`].
    pub extra: Vec<(&'static str, String)>,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            extra: Vec::new(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] about the invalid value of the provided
    /// field.
    #[must_use]
    pub fn invalid_field(field_name: &'static str, msg: &impl ToString) -> Self {
        Self {
            code: "INVALID_FIELD",
            status_code: http::StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            extra: vec![("field_name", field_name.to_owned())],
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            message,
            extra,
            backtrace,
        } = self;

        write!(f, "[{code}]: {message}")?;
        if !extra.is_empty() {
            write!(
                f,
                " ({})",
                extra.iter().format_with(", ", |(k, v), f| f(&format_args!(
                    "{k}: {v}"
                ))),
            )?;
        }
        write!(
            f,
            "{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    ///
    /// Types having no client-facing representation become an internal
    /// [`Error`] and are logged.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| {
            tracing::error!("internal error: {self}");
            Error::internal(&"Internal server error")
        })
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for cache::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for query::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PermissionDenied => Some(AccessError::PermissionDenied.into()),
            Self::PatientNotExists(_) | Self::NotPatient => {
                Some(NotFoundError::Patient.into())
            }
        }
    }
}
