//! Transfer repository: zero-sum moves between bank accounts and boxes.

use moneybox_core::ledger::{HolderRef, LedgerError, LedgerMovement};
use moneybox_core::transfer::{Transfer, TransferError, TransferRequest, TransferService};
use moneybox_shared::BoxInitialBalance;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;

use super::ledger::{self, LedgerRepoError};
use super::mapping::{self, MappingError};
use crate::entities::transfers;

/// Error types for transfer operations.
#[derive(Debug, thiserror::Error)]
pub enum TransferRepoError {
    /// Request rejected.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Ledger write rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Transfer repository.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
    policy: BoxInitialBalance,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: BoxInitialBalance) -> Self {
        Self { db, policy }
    }

    /// Records a transfer and its two legs atomically. Both cached balances
    /// change in the same transaction or neither does.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount, identical holders, an
    /// unknown or inactive holder, or a database failure.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<(Transfer, Vec<LedgerMovement>), TransferRepoError> {
        let (transfer, legs) = TransferService::prepare(request)?;

        let txn = self.db.begin().await?;
        for holder in [request.source, request.destination] {
            ledger::find_holder(&txn, holder, self.policy, false)
                .await?
                .ok_or_else(|| LedgerRepoError::from(LedgerError::HolderNotFound(holder)))?;
        }
        mapping::transfer_active_model(&transfer).insert(&txn).await?;
        let movements = ledger::append_in(&txn, legs.into(), self.policy).await?;
        txn.commit().await?;

        info!(
            transfer_id = %transfer.id,
            source = %transfer.source,
            destination = %transfer.destination,
            amount = %transfer.amount,
            kind = transfer.kind.as_str(),
            "Transfer recorded"
        );
        Ok((transfer, movements))
    }

    /// Lists every transfer touching a holder, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is invalid.
    pub async fn transfers_for(
        &self,
        holder: HolderRef,
    ) -> Result<Vec<Transfer>, TransferRepoError> {
        load_transfers(&self.db, holder).await
    }
}

/// Transfers where `holder` is the source or the destination.
pub(crate) async fn load_transfers<C: ConnectionTrait>(
    conn: &C,
    holder: HolderRef,
) -> Result<Vec<Transfer>, TransferRepoError> {
    let condition = match holder {
        HolderRef::BankAccount(id) => Condition::any()
            .add(transfers::Column::SourceBankAccountId.eq(id.0))
            .add(transfers::Column::DestinationBankAccountId.eq(id.0)),
        HolderRef::Box(id) => Condition::any()
            .add(transfers::Column::SourceBoxId.eq(id.0))
            .add(transfers::Column::DestinationBoxId.eq(id.0)),
    };

    let rows = transfers::Entity::find()
        .filter(condition)
        .order_by_asc(transfers::Column::TransferDate)
        .order_by_asc(transfers::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(mapping::transfer)
        .collect::<Result<Vec<_>, _>>()?)
}
