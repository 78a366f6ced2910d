//! Reversible commands over the generic store operations
//!
//! Each command keeps whatever it needs to reverse itself: the created record
//! (add), the full pre-state (update) or the removed record and its index
//! (delete).

use shared::models::{Customer, Editable, Laptop, Record, Repair};

use crate::store::EntityStore;
use crate::utils::{AppError, AppResult};

/// A store mutation that can be undone and re-executed
pub trait Command: Send {
    /// First run and every redo
    fn execute(&mut self, store: &EntityStore) -> AppResult<()>;

    fn undo(&mut self, store: &EntityStore) -> AppResult<()>;

    /// Human-readable label, e.g. `Add laptop Dell XPS 13`
    fn description(&self) -> String;
}

fn describe<E: Record>(verb: &str, label: Option<String>, id: Option<i64>) -> String {
    match (label, id) {
        (Some(label), _) => format!("{verb} {} {label}", E::TABLE.singular()),
        (None, Some(id)) => format!("{verb} {} #{id}", E::TABLE.singular()),
        (None, None) => format!("{verb} {}", E::TABLE.singular()),
    }
}

// ========== Add ==========

pub struct AddCommand<E: Editable> {
    create: E::Create,
    record: Option<E>,
}

impl<E: Editable> AddCommand<E> {
    pub fn new(create: E::Create) -> Self {
        Self {
            create,
            record: None,
        }
    }

    /// The inserted record (after the first execute)
    pub fn record(&self) -> Option<&E> {
        self.record.as_ref()
    }
}

impl<E: Editable> Command for AddCommand<E> {
    fn execute(&mut self, store: &EntityStore) -> AppResult<()> {
        match &self.record {
            // redo: same id, same values
            Some(record) => store.reinsert(record.clone(), None),
            None => {
                let record = store.insert::<E>(self.create.clone())?;
                self.record = Some(record);
                Ok(())
            }
        }
    }

    fn undo(&mut self, store: &EntityStore) -> AppResult<()> {
        let Some(record) = &self.record else {
            return Err(AppError::internal("add command was never executed"));
        };
        match store.remove::<E>(record.id())? {
            Some(_) => Ok(()),
            None => Err(AppError::record_not_found(E::TABLE, record.id())),
        }
    }

    fn description(&self) -> String {
        describe::<E>(
            "Add",
            self.record.as_ref().map(Editable::label),
            self.record.as_ref().map(Record::id),
        )
    }
}

// ========== Update ==========

pub struct UpdateCommand<E: Editable> {
    id: i64,
    patch: E::Patch,
    before: Option<E>,
    label: Option<String>,
}

impl<E: Editable> UpdateCommand<E> {
    pub fn new(id: i64, patch: E::Patch) -> Self {
        Self {
            id,
            patch,
            before: None,
            label: None,
        }
    }
}

impl<E: Editable> Command for UpdateCommand<E> {
    fn execute(&mut self, store: &EntityStore) -> AppResult<()> {
        let (before, after) = store
            .patch::<E>(self.id, &self.patch)?
            .ok_or_else(|| AppError::record_not_found(E::TABLE, self.id))?;
        self.label = Some(after.label());
        self.before = Some(before);
        Ok(())
    }

    /// Whole-record revert to the captured pre-state
    fn undo(&mut self, store: &EntityStore) -> AppResult<()> {
        let Some(before) = &self.before else {
            return Err(AppError::internal("update command was never executed"));
        };
        if store.replace(before.clone())? {
            Ok(())
        } else {
            Err(AppError::record_not_found(E::TABLE, self.id))
        }
    }

    fn description(&self) -> String {
        describe::<E>("Update", self.label.clone(), Some(self.id))
    }
}

// ========== Delete ==========

pub struct DeleteCommand<E: Record> {
    id: i64,
    removed: Option<(E, usize)>,
    label: Option<String>,
}

impl<E: Editable> DeleteCommand<E> {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            removed: None,
            label: None,
        }
    }

    pub fn removed(&self) -> Option<&E> {
        self.removed.as_ref().map(|(record, _)| record)
    }
}

impl<E: Editable> Command for DeleteCommand<E> {
    fn execute(&mut self, store: &EntityStore) -> AppResult<()> {
        let (record, index) = store
            .remove::<E>(self.id)?
            .ok_or_else(|| AppError::record_not_found(E::TABLE, self.id))?;
        self.label = Some(record.label());
        self.removed = Some((record, index));
        Ok(())
    }

    /// Re-insert the exact snapshot at its original position
    fn undo(&mut self, store: &EntityStore) -> AppResult<()> {
        let Some((record, index)) = &self.removed else {
            return Err(AppError::internal("delete command was never executed"));
        };
        store.reinsert(record.clone(), Some(*index))
    }

    fn description(&self) -> String {
        describe::<E>("Delete", self.label.clone(), Some(self.id))
    }
}

pub type AddLaptop = AddCommand<Laptop>;
pub type UpdateLaptop = UpdateCommand<Laptop>;
pub type DeleteLaptop = DeleteCommand<Laptop>;
pub type AddCustomer = AddCommand<Customer>;
pub type UpdateCustomer = UpdateCommand<Customer>;
pub type DeleteCustomer = DeleteCommand<Customer>;
pub type AddRepair = AddCommand<Repair>;
pub type UpdateRepair = UpdateCommand<Repair>;
pub type DeleteRepair = DeleteCommand<Repair>;
