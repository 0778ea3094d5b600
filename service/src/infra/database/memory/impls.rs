//! [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{
    By, Commit, Decrement, Delete, Insert, Lock, Select, Transact, Update,
};
use tracerr::Traced;

use crate::{
    domain::{
        account, medicine, patient, prescription, visit, Account, Medicine,
        Patient, Prescription, Visit,
    },
    infra::{
        database::{
            self,
            constraint::{ACCOUNTS_USERNAME_KEY, PATIENTS_PUBLIC_ID_KEY},
        },
        Database,
    },
};

use super::{Access, Error, Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(self.0.state.clone()).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Option<Account>, account::Id>>>
    for Memory<C>
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.accounts.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<'l, C: Access> Database<Select<By<Option<Account>, &'l account::Username>>>
    for Memory<C>
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, &'l account::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        self.with(|s| {
            s.accounts
                .values()
                .find(|a| a.username == *username)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Vec<Account>, ()>>> for Memory<C> {
    type Ok = Vec<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Account>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            let mut all = s.accounts.values().cloned().collect::<Vec<_>>();
            all.sort_by_key(|a| a.created_at);
            all
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Insert<Account>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(account): Insert<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            if s.accounts.values().any(|a| a.username == account.username) {
                return Err(Error::UniqueViolation(ACCOUNTS_USERNAME_KEY));
            }
            drop(s.accounts.insert(account.id, account));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())?
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C: Access> Database<Update<Account>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(account): Update<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            if s.accounts.values().any(|a| {
                a.id != account.id && a.username == account.username
            }) {
                return Err(Error::UniqueViolation(ACCOUNTS_USERNAME_KEY));
            }
            drop(s.accounts.insert(account.id, account));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())?
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C: Access> Database<Delete<By<Account, account::Id>>> for Memory<C> {
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Account, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.accounts.remove(&id))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Lock<By<Account, account::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Account, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Whole `State` is already held exclusively by a `Tx`.
        Ok(())
    }
}

impl<C, IDs> Database<Select<By<HashMap<medicine::Id, Medicine>, IDs>>>
    for Memory<C>
where
    C: Access,
    IDs: AsRef<[medicine::Id]>,
{
    type Ok = HashMap<medicine::Id, Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<medicine::Id, Medicine>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        self.with(|s| {
            ids.as_ref()
                .iter()
                .filter_map(|id| Some((*id, s.medicines.get(id)?.clone())))
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Option<Medicine>, medicine::Id>>>
    for Memory<C>
{
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Medicine>, medicine::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.medicines.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Vec<Medicine>, ()>>> for Memory<C> {
    type Ok = Vec<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Medicine>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            let mut all = s.medicines.values().cloned().collect::<Vec<_>>();
            all.sort_by_key(|m| (m.created_at, m.id));
            all
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Insert<Medicine>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(medicine): Insert<Medicine>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| drop(s.medicines.insert(medicine.id, medicine)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<By<Medicine, (medicine::Id, medicine::Amount)>>>
    for Memory<C>
where
    C: Access,
{
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Medicine, (medicine::Id, medicine::Amount)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, amount) = by.into_inner();
        self.with(|s| {
            let medicine = s.medicines.get_mut(&id)?;
            medicine.amount = amount;
            Some(medicine.clone())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<
        Decrement<By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>>,
    > for Memory<C>
where
    C: Access,
{
    type Ok = Option<medicine::Amount>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Decrement(by): Decrement<
            By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, amount) = by.into_inner();
        self.with(|s| {
            let medicine = s.medicines.get_mut(&id)?;
            medicine.amount = medicine.amount.checked_sub(amount)?;
            Some(medicine.amount)
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Delete<By<Medicine, medicine::Id>>> for Memory<C> {
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Medicine, medicine::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.with(|s| s.medicines.remove(&id))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C, IDs> Database<Lock<By<Medicine, IDs>>> for Memory<C>
where
    C: Access,
    IDs: AsRef<[medicine::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Medicine, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Whole `State` is already held exclusively by a `Tx`.
        Ok(())
    }
}

impl<'l, C> Database<Select<By<Option<Patient>, &'l patient::PublicId>>>
    for Memory<C>
where
    C: Access,
{
    type Ok = Option<Patient>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Patient>, &'l patient::PublicId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let public_id = by.into_inner();
        self.with(|s| {
            s.patients
                .values()
                .find(|p| p.public_id == *public_id)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Insert<Patient>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(patient): Insert<Patient>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| {
            if s.patients.values().any(|p| p.public_id == patient.public_id) {
                return Err(Error::UniqueViolation(PATIENTS_PUBLIC_ID_KEY));
            }
            drop(s.patients.insert(patient.id, patient));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())?
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C: Access> Database<Insert<Visit>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(visit): Insert<Visit>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| s.visits.push(visit))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Vec<Visit>, patient::Id>>>
    for Memory<C>
{
    type Ok = Vec<Visit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Visit>, patient::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let patient_id = by.into_inner();
        self.with(|s| {
            let mut visits = s
                .visits
                .iter()
                .filter(|v| v.patient_id == patient_id)
                .cloned()
                .collect::<Vec<_>>();
            visits.sort_by_key(|v| v.created_at);
            visits
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Option<Visit>, patient::Id>>>
    for Memory<C>
{
    type Ok = Option<Visit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Visit>, patient::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let patient_id = by.into_inner();
        self.with(|s| {
            s.visits
                .iter()
                .filter(|v| v.patient_id == patient_id)
                .max_by_key(|v| v.created_at)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Insert<Vec<Prescription>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(prescriptions): Insert<Vec<Prescription>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.with(|s| s.prescriptions.extend(prescriptions))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Access> Database<Select<By<Vec<Prescription>, visit::Id>>>
    for Memory<C>
{
    type Ok = Vec<Prescription>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Prescription>, visit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let visit_id = by.into_inner();
        self.with(|s| {
            s.prescriptions
                .iter()
                .filter(|p| p.visit_id == visit_id)
                .cloned()
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<
        Update<
            By<
                Option<Prescription>,
                (prescription::Id, visit::Id, prescription::UsageDateTime),
            >,
        >,
    > for Memory<C>
where
    C: Access,
{
    type Ok = Option<Prescription>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<
            By<
                Option<Prescription>,
                (prescription::Id, visit::Id, prescription::UsageDateTime),
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, visit_id, used_at) = by.into_inner();
        self.with(|s| {
            let p = s
                .prescriptions
                .iter_mut()
                .find(|p| p.id == id && p.visit_id == visit_id)?;
            p.used_at = Some(used_at);
            Some(p.clone())
        })
        .await
        .map_err(tracerr::wrap!())
    }
}
