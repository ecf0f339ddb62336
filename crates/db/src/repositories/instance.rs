//! Instance repository: confirm, unconfirm and delete transaction instances.
//!
//! Each operation runs in one database transaction: the instance row is
//! locked, the lifecycle decision is made in core, and the resulting ledger
//! movements, cached balances and invoice totals are written together.

use chrono::NaiveDate;
use moneybox_core::instance::{
    Deletion, InstanceError, InstanceLifecycle, ManualInstanceInput, TransactionInstance,
};
use moneybox_shared::BoxInitialBalance;
use moneybox_shared::types::InstanceId;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QuerySelect, TransactionTrait,
};
use tracing::info;

use super::invoice::{self, InvoiceRepoError};
use super::ledger::{self, LedgerRepoError};
use super::mapping::{self, MappingError};
use crate::entities::transaction_instances;

/// Error types for instance operations.
#[derive(Debug, thiserror::Error)]
pub enum InstanceRepoError {
    /// Instance not found.
    #[error("Instance not found: {0}")]
    NotFound(InstanceId),

    /// Lifecycle rule violated.
    #[error(transparent)]
    Instance(#[from] InstanceError),

    /// Ledger write rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Invoice update rejected.
    #[error(transparent)]
    Invoice(#[from] InvoiceRepoError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Instance repository.
#[derive(Debug, Clone)]
pub struct InstanceRepository {
    db: DatabaseConnection,
    policy: BoxInitialBalance,
}

impl InstanceRepository {
    /// Creates a new instance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: BoxInitialBalance) -> Self {
        Self { db, policy }
    }

    /// Loads an instance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown instance.
    pub async fn find(&self, id: InstanceId) -> Result<TransactionInstance, InstanceRepoError> {
        find_instance(&self.db, id, false).await
    }

    /// Creates a pending ad-hoc instance. A card instance joins the invoice
    /// of its card and month at its expected amount, opening the invoice if
    /// it is the month's first charge.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written, an error if
    /// the card's invoice for the month is already paid, or a database
    /// error.
    pub async fn create_manual(
        &self,
        input: ManualInstanceInput,
    ) -> Result<TransactionInstance, InstanceRepoError> {
        let mut instance = InstanceLifecycle::create_manual(input)?;

        let txn = self.db.begin().await?;
        if let Some(key) = instance.invoice_key() {
            invoice::attach(&txn, key, &mut instance).await?;
        }
        mapping::instance_active_model(&instance).insert(&txn).await?;
        txn.commit().await?;

        info!(
            instance_id = %instance.id,
            month = %instance.month_year,
            payment_method = instance.payment_method.as_str(),
            "Manual instance created"
        );
        Ok(instance)
    }

    /// Confirms a pending instance with its actual amount.
    ///
    /// Holder instances append one ledger movement (none for a zero amount);
    /// card instances are attached to their invoice and the invoice total is
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is already confirmed, the amount is
    /// negative, there is no payment source, the invoice is paid, or the
    /// database fails. On error nothing is written.
    pub async fn confirm(
        &self,
        id: InstanceId,
        actual: Decimal,
        on: NaiveDate,
    ) -> Result<TransactionInstance, InstanceRepoError> {
        let txn = self.db.begin().await?;

        let instance = find_instance(&txn, id, true).await?;
        let confirmation = InstanceLifecycle::confirm(&instance, actual, on)?;
        let mut confirmed = confirmation.instance;

        if let Some(movement) = confirmation.movement {
            ledger::append_in(&txn, vec![movement], self.policy).await?;
        }
        if let Some(key) = confirmation.invoice {
            invoice::attach(&txn, key, &mut confirmed).await?;
        }
        save_instance(&txn, &confirmed).await?;

        txn.commit().await?;

        info!(
            instance_id = %id,
            amount = %actual,
            confirmed_on = %on,
            "Instance confirmed"
        );
        Ok(confirmed)
    }

    /// Returns a confirmed instance to pending, appending one compensating
    /// movement per holder it affected. Holders deactivated since the
    /// posting still take the compensation.
    ///
    /// # Errors
    ///
    /// Returns `NotConfirmed` for a pending instance, or a database error.
    pub async fn unconfirm(
        &self,
        id: InstanceId,
        on: NaiveDate,
    ) -> Result<TransactionInstance, InstanceRepoError> {
        let txn = self.db.begin().await?;

        let instance = find_instance(&txn, id, true).await?;
        let posted = ledger::load_instance_movements(&txn, id).await?;
        let reversion = InstanceLifecycle::unconfirm(&instance, &posted, on)?;

        let compensations = reversion.compensations.len();
        if compensations > 0 {
            ledger::compensate_in(&txn, reversion.compensations, self.policy).await?;
        }
        save_instance(&txn, &reversion.instance).await?;
        if let Some(key) = reversion.invoice {
            invoice::recompute(&txn, key).await?;
        }

        txn.commit().await?;

        info!(instance_id = %id, compensations, "Instance unconfirmed");
        Ok(reversion.instance)
    }

    /// Deletes an instance together with every movement it produced; the
    /// affected cached balances drop by the deleted net.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown instance, or a database error.
    pub async fn delete(&self, id: InstanceId) -> Result<Deletion, InstanceRepoError> {
        let txn = self.db.begin().await?;

        let instance = find_instance(&txn, id, true).await?;
        let posted = ledger::load_instance_movements(&txn, id).await?;
        let deletion = InstanceLifecycle::delete(&instance, &posted);

        ledger::reverse_in(&txn, &deletion.reversed, self.policy).await?;
        // Movements cascade with the instance row.
        transaction_instances::Entity::delete_by_id(id.0)
            .exec(&txn)
            .await?;
        if let Some(key) = deletion.invoice {
            invoice::recompute(&txn, key).await?;
        }

        txn.commit().await?;

        info!(
            instance_id = %id,
            movements = posted.len(),
            holders = deletion.reversed.len(),
            "Instance deleted"
        );
        Ok(deletion)
    }
}

async fn find_instance<C: ConnectionTrait>(
    conn: &C,
    id: InstanceId,
    lock: bool,
) -> Result<TransactionInstance, InstanceRepoError> {
    let mut query = transaction_instances::Entity::find_by_id(id.0);
    if lock {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await?
        .ok_or(InstanceRepoError::NotFound(id))?;
    Ok(mapping::instance(model)?)
}

/// Writes every mutable column of an existing instance.
pub(crate) async fn save_instance<C: ConnectionTrait>(
    conn: &C,
    instance: &TransactionInstance,
) -> Result<(), DbErr> {
    let mut model = mapping::instance_active_model(instance);
    model.created_at = NotSet;
    model.update(conn).await?;
    Ok(())
}
