//! In-memory ledger store.
//!
//! `LedgerBook` holds a set of balance holders and their movements. Every
//! append updates the holder's cached balance in the same step, and a batch
//! append either applies completely or not at all. The persistence layer
//! loads a book as a snapshot for reconciliation; tests use it as the store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use moneybox_shared::types::InstanceId;
use rust_decimal::Decimal;

use super::balance::RunningBalance;
use super::error::LedgerError;
use super::types::{HolderAccount, HolderRef, LedgerMovement, NewMovement};

/// Result of a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Number of movements deleted.
    pub movements_removed: usize,
    /// Number of holders whose cached balance was reset.
    pub holders_reset: usize,
}

/// Holders and their append-only movement log.
#[derive(Debug, Clone, Default)]
pub struct LedgerBook {
    holders: BTreeMap<HolderRef, HolderAccount>,
    movements: Vec<LedgerMovement>,
}

impl LedgerBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from stored holders and movements without touching
    /// cached balances.
    ///
    /// Movements whose holder is not among `holders` are kept and reported
    /// by the reconciler's orphan check.
    #[must_use]
    pub fn from_snapshot(holders: Vec<HolderAccount>, movements: Vec<LedgerMovement>) -> Self {
        Self {
            holders: holders.into_iter().map(|h| (h.holder, h)).collect(),
            movements,
        }
    }

    /// Registers a holder.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::DuplicateHolder` if the holder is already present.
    pub fn open(&mut self, account: HolderAccount) -> Result<(), LedgerError> {
        if self.holders.contains_key(&account.holder) {
            return Err(LedgerError::DuplicateHolder(account.holder));
        }
        self.holders.insert(account.holder, account);
        Ok(())
    }

    /// Returns a holder.
    #[must_use]
    pub fn holder(&self, holder: HolderRef) -> Option<&HolderAccount> {
        self.holders.get(&holder)
    }

    /// Iterates holders, bank accounts first, then boxes.
    pub fn holders(&self) -> impl Iterator<Item = &HolderAccount> {
        self.holders.values()
    }

    /// Returns the holder's cached balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::HolderNotFound` for an unknown holder.
    pub fn cached_balance(&self, holder: HolderRef) -> Result<Decimal, LedgerError> {
        self.holders
            .get(&holder)
            .map(|h| h.cached_balance)
            .ok_or(LedgerError::HolderNotFound(holder))
    }

    /// Appends one movement and updates the cached balance.
    ///
    /// # Errors
    ///
    /// See [`LedgerBook::append_all`].
    pub fn append(&mut self, movement: NewMovement) -> Result<LedgerMovement, LedgerError> {
        self.append_all(vec![movement])?
            .pop()
            .ok_or(LedgerError::ZeroAmount)
    }

    /// Appends a batch of movements atomically.
    ///
    /// Every movement is validated and every resulting balance computed
    /// before anything is written, so a failure leaves the book unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if any movement has a zero amount, targets an
    /// unknown or inactive holder, or overflows a balance.
    pub fn append_all(
        &mut self,
        batch: Vec<NewMovement>,
    ) -> Result<Vec<LedgerMovement>, LedgerError> {
        self.append_all_at(batch, Utc::now())
    }

    /// Same as [`LedgerBook::append_all`] with an explicit creation timestamp.
    ///
    /// # Errors
    ///
    /// See [`LedgerBook::append_all`].
    pub fn append_all_at(
        &mut self,
        batch: Vec<NewMovement>,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<LedgerMovement>, LedgerError> {
        self.apply(batch, created_at, true)
    }

    /// Appends movements that undo earlier postings, such as the reversal of
    /// a confirmed instance.
    ///
    /// Inactive holders accept compensations, so a posting can always be
    /// taken back after its holder is deactivated.
    ///
    /// # Errors
    ///
    /// Returns an error if any movement has a zero amount, targets an
    /// unknown holder, or overflows a balance.
    pub fn append_compensations_at(
        &mut self,
        batch: Vec<NewMovement>,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<LedgerMovement>, LedgerError> {
        self.apply(batch, created_at, false)
    }

    fn apply(
        &mut self,
        batch: Vec<NewMovement>,
        created_at: DateTime<Utc>,
        require_active: bool,
    ) -> Result<Vec<LedgerMovement>, LedgerError> {
        let mut staged: HashMap<HolderRef, Decimal> = HashMap::new();

        for movement in &batch {
            if movement.amount.is_zero() {
                return Err(LedgerError::ZeroAmount);
            }
            let account = self
                .holders
                .get(&movement.holder)
                .ok_or(LedgerError::HolderNotFound(movement.holder))?;
            if require_active && !account.is_active {
                return Err(LedgerError::HolderInactive(movement.holder));
            }
            let current = staged
                .get(&movement.holder)
                .copied()
                .unwrap_or(account.cached_balance);
            let next = current
                .checked_add(movement.amount)
                .ok_or(LedgerError::BalanceOverflow(movement.holder))?;
            staged.insert(movement.holder, next);
        }

        for (holder, balance) in staged {
            if let Some(account) = self.holders.get_mut(&holder) {
                account.cached_balance = balance;
            }
        }

        let appended: Vec<LedgerMovement> = batch
            .into_iter()
            .map(|m| LedgerMovement::record(m, created_at))
            .collect();
        self.movements.extend(appended.iter().cloned());
        Ok(appended)
    }

    /// Deletes every movement produced by an instance and reverses its
    /// effect on the cached balances. Returns the deleted movements.
    pub fn remove_for_instance(&mut self, instance_id: InstanceId) -> Vec<LedgerMovement> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .movements
            .drain(..)
            .partition(|m| m.instance_id == Some(instance_id));
        self.movements = kept;

        for movement in &removed {
            if let Some(account) = self.holders.get_mut(&movement.holder) {
                account.cached_balance -= movement.amount;
            }
        }
        removed
    }

    /// Movements linked to an instance, in chronological order.
    #[must_use]
    pub fn movements_for_instance(&self, instance_id: InstanceId) -> Vec<&LedgerMovement> {
        let mut found: Vec<&LedgerMovement> = self
            .movements
            .iter()
            .filter(|m| m.instance_id == Some(instance_id))
            .collect();
        found.sort_by_key(|m| m.chronological_key());
        found
    }

    /// Movements of a holder in display order: newest effective date first,
    /// then newest creation time first.
    #[must_use]
    pub fn movements_for(&self, holder: HolderRef) -> Vec<&LedgerMovement> {
        let mut found = self.chronological(holder);
        found.reverse();
        found
    }

    /// Movements of a holder in non-decreasing date order.
    #[must_use]
    pub fn chronological(&self, holder: HolderRef) -> Vec<&LedgerMovement> {
        let mut found: Vec<&LedgerMovement> = self
            .movements
            .iter()
            .filter(|m| m.holder == holder)
            .collect();
        found.sort_by_key(|m| m.chronological_key());
        found
    }

    /// Movements grouped by holder, each group chronological.
    #[must_use]
    pub fn movements_by_holder(&self) -> HashMap<HolderRef, Vec<&LedgerMovement>> {
        let mut grouped: HashMap<HolderRef, Vec<&LedgerMovement>> = HashMap::new();
        for movement in &self.movements {
            grouped.entry(movement.holder).or_default().push(movement);
        }
        for group in grouped.values_mut() {
            group.sort_by_key(|m| m.chronological_key());
        }
        grouped
    }

    /// All movements, in append order.
    #[must_use]
    pub fn movements(&self) -> &[LedgerMovement] {
        &self.movements
    }

    /// Sum of a holder's movement amounts.
    #[must_use]
    pub fn sum(&self, holder: HolderRef) -> Decimal {
        self.movements
            .iter()
            .filter(|m| m.holder == holder)
            .map(|m| m.amount)
            .sum()
    }

    /// Audit view: each movement with the balance before and after it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown holder or if the chain overflows.
    pub fn running_balances(
        &self,
        holder: HolderRef,
    ) -> Result<Vec<(&LedgerMovement, RunningBalance)>, LedgerError> {
        let account = self
            .holders
            .get(&holder)
            .ok_or(LedgerError::HolderNotFound(holder))?;
        let movements = self.chronological(holder);
        let changes: Vec<Decimal> = movements.iter().map(|m| m.amount).collect();
        let chain = RunningBalance::chain(account.baseline, &changes)
            .ok_or(LedgerError::BalanceOverflow(holder))?;
        Ok(movements.into_iter().zip(chain).collect())
    }

    /// Overwrites a holder's cached balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::HolderNotFound` for an unknown holder.
    pub fn set_cached_balance(
        &mut self,
        holder: HolderRef,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        let account = self
            .holders
            .get_mut(&holder)
            .ok_or(LedgerError::HolderNotFound(holder))?;
        account.cached_balance = balance;
        Ok(())
    }

    /// Deletes every movement and resets each cached balance to its baseline.
    pub fn purge(&mut self) -> PurgeSummary {
        let movements_removed = self.movements.len();
        self.movements.clear();
        for account in self.holders.values_mut() {
            account.cached_balance = account.baseline;
        }
        PurgeSummary {
            movements_removed,
            holders_reset: self.holders.len(),
        }
    }
}
