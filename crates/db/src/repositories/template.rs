//! Template repository: persistence and month expansion of provisioned
//! templates.

use moneybox_core::instance::TransactionInstance;
use moneybox_core::schedule::{
    ExpansionOutcome, Materialization, MaterializationIndex, ProvisionedTemplate, ScheduleError,
    TemplateExpander,
};
use moneybox_shared::types::{MonthYear, TemplateId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::invoice::{self, InvoiceRepoError};
use super::mapping::{self, MappingError};
use crate::entities::{accounts, provisioned_templates, template_exclusions, transaction_instances};

/// Error types for template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateRepoError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(TemplateId),

    /// Template or month rejected.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Card charge could not join its invoice.
    #[error(transparent)]
    Invoice(#[from] InvoiceRepoError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Template repository.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    db: DatabaseConnection,
}

impl TemplateRepository {
    /// Creates a new template repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores a template with its excluded months.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written, or a database
    /// error.
    pub async fn create(&self, template: &ProvisionedTemplate) -> Result<(), TemplateRepoError> {
        TemplateExpander::validate(template)?;

        let txn = self.db.begin().await?;
        mapping::template_active_model(template)?.insert(&txn).await?;
        for month in &template.excluded {
            insert_exclusion(&txn, template.id, *month).await?;
        }
        txn.commit().await?;

        info!(
            template_id = %template.id,
            recurrence = template.recurrence.as_str(),
            "Template created"
        );
        Ok(())
    }

    /// Loads a template with its exclusions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown template.
    pub async fn find(&self, id: TemplateId) -> Result<ProvisionedTemplate, TemplateRepoError> {
        let condition = Condition::all().add(provisioned_templates::Column::Id.eq(id.0));
        load_templates(&self.db, condition)
            .await?
            .into_iter()
            .next()
            .ok_or(TemplateRepoError::NotFound(id))
    }

    /// Skips a month for a template. Excluding an already excluded month is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not exist or the insert fails.
    pub async fn exclude_month(
        &self,
        id: TemplateId,
        month: MonthYear,
    ) -> Result<(), TemplateRepoError> {
        provisioned_templates::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or(TemplateRepoError::NotFound(id))?;
        insert_exclusion(&self.db, id, month).await?;
        Ok(())
    }

    /// Applies the decision rule to a stored template.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown template or an invalid month/year.
    pub async fn should_materialize(
        &self,
        id: TemplateId,
        month: u32,
        year: i32,
    ) -> Result<bool, TemplateRepoError> {
        let template = self.find(id).await?;
        Ok(TemplateExpander::should_materialize(&template, month, year)?)
    }

    /// Materializes a template for a month. Calling it again for the same
    /// pair returns the existing instance instead of creating another. A
    /// card charge joins its invoice in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid template or month, an
    /// invoice error if the card's invoice for the month is already paid,
    /// or a database error.
    pub async fn materialize(
        &self,
        id: TemplateId,
        month: u32,
        year: i32,
    ) -> Result<Materialization, TemplateRepoError> {
        let month = MonthYear::new(year, month).map_err(ScheduleError::from)?;
        let template = self.find(id).await?;

        let mut index = load_index(&self.db, month, Some(id)).await?;
        let outcome = TemplateExpander::materialize_for(&template, month, &mut index)?;

        match outcome {
            Materialization::Created(instance) => self.insert_created(*instance).await,
            other => {
                debug!(
                    template_id = %id,
                    month = %month,
                    outcome = ?other,
                    "Template not materialized"
                );
                Ok(other)
            }
        }
    }

    /// Expands every active template for one month in a single transaction.
    /// Invalid templates, and card charges whose invoice is already paid,
    /// are reported in their outcome and do not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or inserting fails.
    pub async fn materialize_month(
        &self,
        month: MonthYear,
    ) -> Result<Vec<ExpansionOutcome>, TemplateRepoError> {
        let txn = self.db.begin().await?;
        let templates = load_templates(
            &txn,
            Condition::all().add(provisioned_templates::Column::IsActive.eq(true)),
        )
        .await?;
        let mut index = load_index(&txn, month, None).await?;

        let mut outcomes = TemplateExpander::materialize_month(&templates, month, &mut index);

        for outcome in &mut outcomes {
            if let Ok(Materialization::Created(instance)) = &mut outcome.result
                && let Some(key) = instance.invoice_key()
            {
                // Rule violations are detected before the invoice row is written.
                match invoice::attach(&txn, key, instance).await {
                    Ok(_) => {}
                    Err(InvoiceRepoError::Invoice(err)) => outcome.result = Err(err.into()),
                    Err(err) => return Err(err.into()),
                }
            }

            match &outcome.result {
                Ok(Materialization::Created(instance)) => {
                    mapping::instance_active_model(instance).insert(&txn).await?;
                    info!(
                        template_id = %outcome.template_id,
                        instance_id = %instance.id,
                        month = %month,
                        "Instance materialized"
                    );
                }
                Ok(other) => {
                    debug!(
                        template_id = %outcome.template_id,
                        month = %month,
                        outcome = ?other,
                        "Template skipped"
                    );
                }
                Err(err) => {
                    warn!(
                        template_id = %outcome.template_id,
                        month = %month,
                        error = %err,
                        "Template rejected"
                    );
                }
            }
        }
        txn.commit().await?;

        Ok(outcomes)
    }

    /// Inserts a freshly built instance; a concurrent insert of the same
    /// `(template, month)` pair resolves to the instance that won.
    async fn insert_created(
        &self,
        mut instance: TransactionInstance,
    ) -> Result<Materialization, TemplateRepoError> {
        let txn = self.db.begin().await?;
        if let Some(key) = instance.invoice_key() {
            invoice::attach(&txn, key, &mut instance).await?;
        }

        match mapping::instance_active_model(&instance).insert(&txn).await {
            Ok(_) => {
                txn.commit().await?;
                info!(
                    template_id = ?instance.template_id,
                    instance_id = %instance.id,
                    month = %instance.month_year,
                    "Instance materialized"
                );
                Ok(Materialization::Created(Box::new(instance)))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                txn.rollback().await?;
                let template_id = instance.template_id;
                let index = load_index(&self.db, instance.month_year, template_id).await?;
                template_id
                    .and_then(|id| index.get(id, instance.month_year))
                    .map(Materialization::AlreadyMaterialized)
                    .ok_or(TemplateRepoError::Database(err))
            }
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================
// SHARED HELPERS
// ============================================================

/// Loads templates matching `condition` with their classification type and
/// exclusions.
pub(crate) async fn load_templates<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> Result<Vec<ProvisionedTemplate>, TemplateRepoError> {
    let rows = provisioned_templates::Entity::find()
        .find_also_related(accounts::Entity)
        .filter(condition)
        .all(conn)
        .await?;

    let ids: Vec<_> = rows.iter().map(|(template, _)| template.id).collect();
    let exclusions = if ids.is_empty() {
        Vec::new()
    } else {
        template_exclusions::Entity::find()
            .filter(template_exclusions::Column::TemplateId.is_in(ids))
            .all(conn)
            .await?
    };

    rows.into_iter()
        .map(|(template, account)| {
            mapping::template(template, account.map(|a| a.account_type), &exclusions)
                .map_err(TemplateRepoError::from)
        })
        .collect()
}

/// Builds the `(template, month)` index for one month, optionally narrowed
/// to one template.
pub(crate) async fn load_index<C: ConnectionTrait>(
    conn: &C,
    month: MonthYear,
    template_id: Option<TemplateId>,
) -> Result<MaterializationIndex, TemplateRepoError> {
    let mut query = transaction_instances::Entity::find()
        .filter(transaction_instances::Column::MonthYear.eq(month.to_string()))
        .filter(transaction_instances::Column::TemplateId.is_not_null());
    if let Some(id) = template_id {
        query = query.filter(transaction_instances::Column::TemplateId.eq(id.0));
    }

    let instances = query
        .all(conn)
        .await?
        .into_iter()
        .map(mapping::instance)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MaterializationIndex::from_instances(&instances))
}

async fn insert_exclusion<C: ConnectionTrait>(
    conn: &C,
    template_id: TemplateId,
    month: MonthYear,
) -> Result<(), DbErr> {
    let exclusion = template_exclusions::ActiveModel {
        template_id: Set(template_id.0),
        month_year: Set(month.to_string()),
    };
    template_exclusions::Entity::insert(exclusion)
        .on_conflict(
            OnConflict::columns([
                template_exclusions::Column::TemplateId,
                template_exclusions::Column::MonthYear,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
