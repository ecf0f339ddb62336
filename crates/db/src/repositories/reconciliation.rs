//! Reconciliation repository: repairs cached balances from the ledger and
//! runs the purge.

use moneybox_core::ledger::{HolderAccount, HolderRef, LedgerBook, LedgerError};
use moneybox_core::reconcile::{
    HolderFailure, ReconcileError, ReconcileOutcome, Reconciler, ReconciliationReport,
};
use moneybox_shared::BoxInitialBalance;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

use super::ledger::{self, LedgerRepoError};
use super::mapping::{self, MappingError};
use crate::entities::{
    bank_accounts, boxes, card_invoices, ledger_movements, transaction_instances, transfers,
};

/// Error types for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationRepoError {
    /// Ledger could not be summed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Ledger read rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Rows removed and holders reset by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Ledger movements deleted.
    pub movements_removed: u64,
    /// Transfers deleted.
    pub transfers_removed: u64,
    /// Transaction instances deleted.
    pub instances_removed: u64,
    /// Card invoices deleted.
    pub invoices_removed: u64,
    /// Bank accounts and boxes whose cached balance was reset.
    pub holders_reset: u64,
}

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    reconciler: Reconciler,
    policy: BoxInitialBalance,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        reconciler: Reconciler,
        policy: BoxInitialBalance,
    ) -> Self {
        Self {
            db,
            reconciler,
            policy,
        }
    }

    /// Recomputes one holder's balance from its baseline and movements and
    /// overwrites the cached balance when it drifted beyond the tolerance.
    ///
    /// The holder row stays locked for the duration, so a concurrent
    /// confirmation on the same holder waits.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown holder, an overflowing ledger sum, or
    /// a database failure.
    pub async fn reconcile(
        &self,
        holder: HolderRef,
    ) -> Result<ReconcileOutcome, ReconciliationRepoError> {
        let txn = self.db.begin().await?;

        let account = ledger::find_holder(&txn, holder, self.policy, true)
            .await?
            .ok_or_else(|| LedgerRepoError::from(LedgerError::HolderNotFound(holder)))?;
        let movements = ledger::load_movements(&txn, holder).await?;
        let book = LedgerBook::from_snapshot(vec![account.clone()], movements);
        let outcome = self
            .reconciler
            .evaluate(&account, &book.chronological(holder))?;

        if outcome.corrected {
            ledger::write_cached_balance(&txn, holder, outcome.recomputed).await?;
        }
        txn.commit().await?;

        if let Some(line) = outcome.correction_line() {
            warn!(
                holder = %holder,
                name = %line.holder_name,
                before = %line.before,
                after = %line.after,
                "Cached balance corrected"
            );
        }
        Ok(outcome)
    }

    /// Reconciles every bank account, then every box.
    ///
    /// Holders are assessed in parallel over a snapshot; each holder that
    /// needs a correction is then reconciled again under its row lock. A
    /// failing holder is reported and does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot cannot be loaded.
    pub async fn reconcile_all(&self) -> Result<ReconciliationReport, ReconciliationRepoError> {
        let book = self.snapshot().await?;
        let assessments = self.reconciler.assess_all(&book);

        let mut report = ReconciliationReport {
            checked: assessments.len(),
            ..ReconciliationReport::default()
        };

        for assessment in assessments {
            match assessment {
                Ok(outcome) if outcome.corrected => match self.reconcile(outcome.holder).await {
                    Ok(applied) => report.corrections.extend(applied.correction_line()),
                    Err(err) => report.failures.push(holder_failure(
                        outcome.holder,
                        outcome.holder_name,
                        &err,
                    )),
                },
                Ok(_) => {}
                Err(failure) => report.failures.push(failure),
            }
        }

        for failure in &report.failures {
            warn!(
                holder = %failure.holder,
                name = %failure.holder_name,
                reason = %failure.reason,
                "Holder reconciliation failed"
            );
        }
        info!(
            checked = report.checked,
            corrections = report.corrections.len(),
            failures = report.failures.len(),
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Deletes every ledger movement, transfer, instance and invoice, then
    /// resets each bank account to its initial balance and each box to its
    /// baseline. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns a database error; on error nothing is deleted.
    pub async fn purge(&self) -> Result<PurgeReport, ReconciliationRepoError> {
        let txn = self.db.begin().await?;

        let movements_removed = ledger_movements::Entity::delete_many()
            .exec(&txn)
            .await?
            .rows_affected;
        let transfers_removed = transfers::Entity::delete_many()
            .exec(&txn)
            .await?
            .rows_affected;
        let instances_removed = transaction_instances::Entity::delete_many()
            .exec(&txn)
            .await?
            .rows_affected;
        let invoices_removed = card_invoices::Entity::delete_many()
            .exec(&txn)
            .await?
            .rows_affected;

        let holders_reset = reset_balances(&txn, self.policy).await?;

        txn.commit().await?;

        let report = PurgeReport {
            movements_removed,
            transfers_removed,
            instances_removed,
            invoices_removed,
            holders_reset,
        };
        info!(
            movements = report.movements_removed,
            transfers = report.transfers_removed,
            instances = report.instances_removed,
            invoices = report.invoices_removed,
            holders = report.holders_reset,
            "Ledger purged"
        );
        Ok(report)
    }

    async fn snapshot(&self) -> Result<LedgerBook, ReconciliationRepoError> {
        let mut holders: Vec<HolderAccount> = bank_accounts::Entity::find()
            .order_by_asc(bank_accounts::Column::Name)
            .all(&self.db)
            .await?
            .iter()
            .map(|model| mapping::bank_account(model).to_holder())
            .collect();
        holders.extend(
            boxes::Entity::find()
                .order_by_asc(boxes::Column::Name)
                .all(&self.db)
                .await?
                .iter()
                .map(|model| mapping::money_box(model).to_holder(self.policy)),
        );

        let movements = ledger_movements::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(mapping::movement)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LedgerBook::from_snapshot(holders, movements))
    }
}

fn holder_failure(
    holder: HolderRef,
    holder_name: String,
    err: &ReconciliationRepoError,
) -> HolderFailure {
    HolderFailure {
        holder,
        holder_name,
        reason: err.to_string(),
    }
}

async fn reset_balances<C: ConnectionTrait>(
    conn: &C,
    policy: BoxInitialBalance,
) -> Result<u64, DbErr> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

    let accounts = bank_accounts::Entity::update_many()
        .col_expr(
            bank_accounts::Column::CachedBalance,
            Expr::col(bank_accounts::Column::InitialBalance).into(),
        )
        .col_expr(bank_accounts::Column::UpdatedAt, Expr::value(now))
        .exec(conn)
        .await?
        .rows_affected;

    let box_baseline = match policy {
        BoxInitialBalance::Zero => Expr::value(Decimal::ZERO),
        BoxInitialBalance::Funded => Expr::col(boxes::Column::InitialValue).into(),
    };
    let boxes = boxes::Entity::update_many()
        .col_expr(boxes::Column::CachedBalance, box_baseline)
        .col_expr(boxes::Column::UpdatedAt, Expr::value(now))
        .exec(conn)
        .await?
        .rows_affected;

    Ok(accounts + boxes)
}
