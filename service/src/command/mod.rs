//! [`Command`] definition.

pub mod authenticate_account;
pub mod check_account_session;
pub mod create_account;
pub mod create_account_session;
pub mod create_medicine;
pub mod create_patient;
pub mod create_super_admin;
pub mod create_visit;
pub mod delete_account;
pub mod delete_account_session;
pub mod delete_medicine;
pub mod update_account;
pub mod update_medicine_amount;
pub mod use_visit_medicine;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authenticate_account::AuthenticateAccount,
    check_account_session::CheckAccountSession, create_account::CreateAccount,
    create_account_session::CreateAccountSession,
    create_medicine::CreateMedicine, create_patient::CreatePatient,
    create_super_admin::CreateSuperAdmin, create_visit::CreateVisit,
    delete_account::DeleteAccount,
    delete_account_session::DeleteAccountSession,
    delete_medicine::DeleteMedicine, update_account::UpdateAccount,
    update_medicine_amount::UpdateMedicineAmount,
    use_visit_medicine::UseVisitMedicine,
};
