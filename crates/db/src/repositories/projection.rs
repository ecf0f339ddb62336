//! Projection repository: loads a holder's scheduled activity and runs the
//! projection engine over it. Read-only.

use chrono::NaiveDate;
use moneybox_core::ledger::{HolderRef, LedgerError};
use moneybox_core::projection::{
    MAX_MONTHS_AHEAD, MonthProjection, ProjectionEngine, ProjectionError, ProjectionInput,
};
use moneybox_shared::BoxInitialBalance;
use moneybox_shared::types::MonthYear;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use super::ledger::{self, LedgerRepoError};
use super::mapping::{self, MappingError};
use super::template::{self, TemplateRepoError};
use super::transfer::{self, TransferRepoError};
use crate::entities::{provisioned_templates, transaction_instances};

/// Error types for projection queries.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionRepoError {
    /// Horizon rejected or projection overflowed.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Holder could not be loaded.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Templates could not be loaded.
    #[error(transparent)]
    Template(#[from] TemplateRepoError),

    /// Transfers could not be loaded.
    #[error(transparent)]
    Transfer(#[from] TransferRepoError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Projection repository.
#[derive(Debug, Clone)]
pub struct ProjectionRepository {
    db: DatabaseConnection,
    policy: BoxInitialBalance,
}

impl ProjectionRepository {
    /// Creates a new projection repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: BoxInitialBalance) -> Self {
        Self { db, policy }
    }

    /// Projects a holder's balance month by month, starting with the month
    /// of `as_of` and its current cached balance.
    ///
    /// # Errors
    ///
    /// Returns an error for a horizon outside 1..=60, an unknown holder, or
    /// a database failure.
    pub async fn project(
        &self,
        holder: HolderRef,
        months_ahead: u32,
        as_of: NaiveDate,
    ) -> Result<Vec<MonthProjection>, ProjectionRepoError> {
        if !(1..=MAX_MONTHS_AHEAD).contains(&months_ahead) {
            return Err(ProjectionError::InvalidHorizon {
                requested: months_ahead,
                max: MAX_MONTHS_AHEAD,
            }
            .into());
        }

        let account = ledger::find_holder(&self.db, holder, self.policy, false)
            .await?
            .ok_or_else(|| LedgerRepoError::from(LedgerError::HolderNotFound(holder)))?;

        let first = MonthYear::from_date(as_of);
        let last = first.plus_months(months_ahead - 1);

        // Every instance in range feeds the materialization index, so a
        // template already materialized for another holder is not projected
        // twice.
        let instances = transaction_instances::Entity::find()
            .filter(transaction_instances::Column::MonthYear.gte(first.to_string()))
            .filter(transaction_instances::Column::MonthYear.lte(last.to_string()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(mapping::instance)
            .collect::<Result<Vec<_>, _>>()?;

        let transfers = transfer::load_transfers(&self.db, holder).await?;

        let holder_column = match holder {
            HolderRef::BankAccount(id) => provisioned_templates::Column::BankAccountId.eq(id.0),
            HolderRef::Box(id) => provisioned_templates::Column::BoxId.eq(id.0),
        };
        let templates = template::load_templates(
            &self.db,
            Condition::all()
                .add(provisioned_templates::Column::IsActive.eq(true))
                .add(holder_column),
        )
        .await?;

        debug!(
            holder = %holder,
            instances = instances.len(),
            transfers = transfers.len(),
            templates = templates.len(),
            months = months_ahead,
            "Projection inputs loaded"
        );

        let input = ProjectionInput {
            holder,
            current_balance: account.cached_balance,
            as_of,
            instances,
            transfers,
            templates,
        };
        Ok(ProjectionEngine::project(&input, months_ahead)?)
    }
}
