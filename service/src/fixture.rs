//! Shared fixtures of `#[cfg(test)]` modules.

use std::time::Duration;

use common::{
    operations::{By, Insert, Select},
    DateTime,
};

use crate::{
    domain::{
        account::{self, DisplayName, Kind, Password, PasswordHash, Username},
        medicine, patient, Account, Medicine, Patient,
    },
    infra::{cache, database, Database as _},
    Config, Service,
};

/// [`Service`] over in-process infrastructure.
pub(crate) type TestService = Service<database::Memory, cache::Memory>;

/// Creates a new [`TestService`] with empty storages.
pub(crate) fn service() -> TestService {
    Service::new(
        Config::from_secret(b"test-secret", Duration::from_secs(60)),
        database::Memory::new(),
        cache::Memory::new(),
    )
}

/// Stores a new [`Account`] of the provided [`Kind`] with its preset
/// permissions.
pub(crate) async fn account(
    svc: &TestService,
    kind: Kind,
    username: &str,
    password: &str,
) -> Account {
    let acc = Account {
        id: account::Id::new(),
        display_name: DisplayName::new(format!("{username} display"))
            .unwrap(),
        username: Username::new(username).unwrap(),
        password_hash: PasswordHash::new(&Password::from(password)).unwrap(),
        kind,
        permissions: kind.default_permissions(),
        created_at: DateTime::now().coerce(),
        updated_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(acc.clone())).await.unwrap();
    acc
}

/// Stores a new [`Medicine`] with the provided `amount` of packages.
pub(crate) async fn medicine(
    svc: &TestService,
    name: &str,
    amount: i32,
) -> Medicine {
    let med = Medicine {
        id: medicine::Id::new(),
        name: medicine::Name::new(name).unwrap(),
        dose: medicine::Dose::new(250).unwrap(),
        unit: medicine::Unit::new("IU").unwrap(),
        amount: medicine::Amount::new(amount).unwrap(),
        expires_at: (DateTime::now() + Duration::from_secs(86_400)).coerce(),
        received_at: DateTime::now().coerce(),
        manufacturer: medicine::Manufacturer::new("Acme").unwrap(),
        batch_number: medicine::BatchNumber::new("B-1").unwrap(),
        factor_type: medicine::FactorType::new("VIII").unwrap(),
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(med.clone())).await.unwrap();
    med
}

/// Stores a new [`Patient`] with the provided public ID.
pub(crate) async fn patient(svc: &TestService, public_id: &str) -> Patient {
    let p = Patient {
        id: patient::Id::new(),
        public_id: patient::PublicId::new(public_id).unwrap(),
        name: patient::Name::new("John Doe").unwrap(),
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(p.clone())).await.unwrap();
    p
}

/// Returns the stored [`Amount`] of the [`Medicine`] with the provided ID.
///
/// [`Amount`]: medicine::Amount
pub(crate) async fn amount_of(
    svc: &TestService,
    id: medicine::Id,
) -> medicine::Amount {
    svc.database()
        .execute(Select(By::<Option<Medicine>, _>::new(id)))
        .await
        .unwrap()
        .unwrap()
        .amount
}
