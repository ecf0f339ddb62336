//! Ledger repository: append-only movements and cached holder balances.
//!
//! Every write that touches a cached balance locks the holder row
//! (`SELECT ... FOR UPDATE`) inside the surrounding database transaction,
//! then lets [`LedgerBook`] validate the batch before anything is written.

use std::collections::BTreeSet;

use chrono::Utc;
use moneybox_core::ledger::{
    HolderAccount, HolderRef, LedgerBook, LedgerError, LedgerMovement, NewMovement,
    RunningBalance,
};
use moneybox_shared::BoxInitialBalance;
use moneybox_shared::types::{InstanceId, PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::info;

use super::mapping::{self, MappingError};
use crate::entities::{bank_accounts, boxes, ledger_movements};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerRepoError {
    /// Ledger rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    policy: BoxInitialBalance,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: BoxInitialBalance) -> Self {
        Self { db, policy }
    }

    /// Appends one movement and updates the holder's cached balance in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero amount, an unknown or inactive holder, a
    /// balance overflow, or a database failure.
    pub async fn append(&self, movement: NewMovement) -> Result<LedgerMovement, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let recorded = append_in(&txn, vec![movement], self.policy).await?;
        txn.commit().await?;

        recorded
            .into_iter()
            .next()
            .ok_or_else(|| DbErr::Custom("append recorded no movement".to_string()).into())
    }

    /// Returns a holder with its cached balance.
    ///
    /// # Errors
    ///
    /// Returns `HolderNotFound` for an unknown holder.
    pub async fn holder(&self, holder: HolderRef) -> Result<HolderAccount, LedgerRepoError> {
        find_holder(&self.db, holder, self.policy, false)
            .await?
            .ok_or_else(|| LedgerError::HolderNotFound(holder).into())
    }

    /// Lists a holder's movements in display order: newest effective date
    /// first, then newest creation time first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is invalid.
    pub async fn movements_for(
        &self,
        holder: HolderRef,
        page: &PageRequest,
    ) -> Result<PageResponse<LedgerMovement>, LedgerRepoError> {
        let paginator = ledger_movements::Entity::find()
            .filter(holder_condition(holder))
            .order_by_desc(ledger_movements::Column::EffectiveDate)
            .order_by_desc(ledger_movements::Column::CreatedAt)
            .order_by_desc(ledger_movements::Column::Id)
            .paginate(&self.db, page.limit().max(1));

        let total = paginator.num_items().await?;
        let rows = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await?;
        let data = rows
            .into_iter()
            .map(mapping::movement)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Sum of a holder's movement amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sum(&self, holder: HolderRef) -> Result<Decimal, LedgerRepoError> {
        let total: Option<Option<Decimal>> = ledger_movements::Entity::find()
            .select_only()
            .column_as(Expr::col(ledger_movements::Column::Amount).sum(), "total")
            .filter(holder_condition(holder))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Audit view: every movement of a holder in chronological order with
    /// the balance before and after it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown holder or an overflowing chain.
    pub async fn running_balances(
        &self,
        holder: HolderRef,
    ) -> Result<Vec<(LedgerMovement, RunningBalance)>, LedgerRepoError> {
        let account = self.holder(holder).await?;
        let movements = load_movements(&self.db, holder).await?;
        let book = LedgerBook::from_snapshot(vec![account], movements);

        Ok(book
            .running_balances(holder)?
            .into_iter()
            .map(|(movement, balance)| (movement.clone(), balance))
            .collect())
    }
}

// ============================================================
// SHARED HELPERS (used by the other repositories)
// ============================================================

/// Filter selecting a holder's movements.
pub(crate) fn holder_condition(holder: HolderRef) -> SimpleExpr {
    match holder {
        HolderRef::BankAccount(id) => ledger_movements::Column::BankAccountId.eq(id.0),
        HolderRef::Box(id) => ledger_movements::Column::BoxId.eq(id.0),
    }
}

/// Loads a holder row, optionally locking it for the rest of the
/// transaction.
pub(crate) async fn find_holder<C: ConnectionTrait>(
    conn: &C,
    holder: HolderRef,
    policy: BoxInitialBalance,
    lock: bool,
) -> Result<Option<HolderAccount>, DbErr> {
    match holder {
        HolderRef::BankAccount(id) => {
            let mut query = bank_accounts::Entity::find_by_id(id.0);
            if lock {
                query = query.lock_exclusive();
            }
            Ok(query
                .one(conn)
                .await?
                .map(|model| mapping::bank_account(&model).to_holder()))
        }
        HolderRef::Box(id) => {
            let mut query = boxes::Entity::find_by_id(id.0);
            if lock {
                query = query.lock_exclusive();
            }
            Ok(query
                .one(conn)
                .await?
                .map(|model| mapping::money_box(&model).to_holder(policy)))
        }
    }
}

/// Overwrites a holder's cached balance.
pub(crate) async fn write_cached_balance<C: ConnectionTrait>(
    conn: &C,
    holder: HolderRef,
    balance: Decimal,
) -> Result<(), DbErr> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    match holder {
        HolderRef::BankAccount(id) => {
            bank_accounts::Entity::update_many()
                .col_expr(bank_accounts::Column::CachedBalance, Expr::value(balance))
                .col_expr(bank_accounts::Column::UpdatedAt, Expr::value(now))
                .filter(bank_accounts::Column::Id.eq(id.0))
                .exec(conn)
                .await?;
        }
        HolderRef::Box(id) => {
            boxes::Entity::update_many()
                .col_expr(boxes::Column::CachedBalance, Expr::value(balance))
                .col_expr(boxes::Column::UpdatedAt, Expr::value(now))
                .filter(boxes::Column::Id.eq(id.0))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

/// Loads every movement of a holder.
pub(crate) async fn load_movements<C: ConnectionTrait>(
    conn: &C,
    holder: HolderRef,
) -> Result<Vec<LedgerMovement>, LedgerRepoError> {
    let rows = ledger_movements::Entity::find()
        .filter(holder_condition(holder))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(mapping::movement)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Loads every movement linked to an instance.
pub(crate) async fn load_instance_movements<C: ConnectionTrait>(
    conn: &C,
    instance_id: InstanceId,
) -> Result<Vec<LedgerMovement>, LedgerRepoError> {
    let rows = ledger_movements::Entity::find()
        .filter(ledger_movements::Column::InstanceId.eq(instance_id.0))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(mapping::movement)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Appends a batch of movements inside an open transaction.
///
/// Holder rows are locked in a fixed order (bank accounts, then boxes) so
/// concurrent batches cannot deadlock. The batch is validated as a whole;
/// on error nothing is written.
pub(crate) async fn append_in<C: ConnectionTrait>(
    conn: &C,
    batch: Vec<NewMovement>,
    policy: BoxInitialBalance,
) -> Result<Vec<LedgerMovement>, LedgerRepoError> {
    write_batch(conn, batch, policy, false).await
}

/// Like [`append_in`] for compensating movements, which inactive holders
/// also accept.
pub(crate) async fn compensate_in<C: ConnectionTrait>(
    conn: &C,
    batch: Vec<NewMovement>,
    policy: BoxInitialBalance,
) -> Result<Vec<LedgerMovement>, LedgerRepoError> {
    write_batch(conn, batch, policy, true).await
}

async fn write_batch<C: ConnectionTrait>(
    conn: &C,
    batch: Vec<NewMovement>,
    policy: BoxInitialBalance,
    compensating: bool,
) -> Result<Vec<LedgerMovement>, LedgerRepoError> {
    let touched: BTreeSet<HolderRef> = batch.iter().map(|m| m.holder).collect();

    let mut accounts = Vec::with_capacity(touched.len());
    for holder in &touched {
        if let Some(account) = find_holder(conn, *holder, policy, true).await? {
            accounts.push(account);
        }
    }

    let mut book = LedgerBook::from_snapshot(accounts, Vec::new());
    let recorded = if compensating {
        book.append_compensations_at(batch, Utc::now())?
    } else {
        book.append_all_at(batch, Utc::now())?
    };

    for movement in &recorded {
        mapping::movement_active_model(movement).insert(conn).await?;
        info!(
            holder = %movement.holder,
            amount = %movement.amount,
            kind = %movement.kind,
            movement_id = %movement.id,
            "Ledger movement appended"
        );
    }
    for holder in touched {
        write_cached_balance(conn, holder, book.cached_balance(holder)?).await?;
    }

    Ok(recorded)
}

/// Subtracts each holder's net from its cached balance; used when an
/// instance and its movements are deleted.
pub(crate) async fn reverse_in<C: ConnectionTrait>(
    conn: &C,
    reversed: &[(HolderRef, Decimal)],
    policy: BoxInitialBalance,
) -> Result<(), LedgerRepoError> {
    for (holder, net) in reversed {
        let account = find_holder(conn, *holder, policy, true)
            .await?
            .ok_or(LedgerError::HolderNotFound(*holder))?;
        let balance = account
            .cached_balance
            .checked_sub(*net)
            .ok_or(LedgerError::BalanceOverflow(*holder))?;
        write_cached_balance(conn, *holder, balance).await?;
    }
    Ok(())
}
