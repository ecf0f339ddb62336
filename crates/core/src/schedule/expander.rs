//! Template expander.
//!
//! Decision rule, evaluated in order:
//! 1. before the start month: no
//! 2. after the end month: no
//! 3. explicitly excluded month: no
//! 4. monthly: yes
//! 5. installment and unique: only the start month
//! 6. yearly: the start month's calendar month, every year

use chrono::Datelike;
use moneybox_shared::types::{InstanceId, MonthYear};
use rust_decimal::Decimal;

use super::error::ScheduleError;
use super::types::{
    ExpansionOutcome, Materialization, MaterializationIndex, PaymentSource, ProvisionedTemplate,
    Recurrence,
};
use crate::instance::{InstanceStatus, PaymentMethod, TransactionInstance};

/// Template expansion service.
pub struct TemplateExpander;

impl TemplateExpander {
    /// Validates a template before persistence or expansion.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing classification account, a
    /// non-positive amount, an end date before the start date, or an
    /// inconsistent installment counter.
    pub fn validate(template: &ProvisionedTemplate) -> Result<(), ScheduleError> {
        if template.account_id.is_none() {
            return Err(ScheduleError::MissingAccount(template.id));
        }
        if template.expected_amount <= Decimal::ZERO {
            return Err(ScheduleError::NonPositiveAmount(template.id));
        }
        if let Some(end) = template.end_date
            && end < template.start_date
        {
            return Err(ScheduleError::EndBeforeStart {
                start: template.start_date,
                end,
            });
        }
        if let Recurrence::Installment { count } = template.recurrence {
            if count == 0 {
                return Err(ScheduleError::InvalidInstallmentCount);
            }
            if !(1..=count).contains(&template.current_installment) {
                return Err(ScheduleError::InstallmentOutOfRange {
                    current: template.current_installment,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Applies the decision rule to a month.
    #[must_use]
    pub fn is_scheduled(template: &ProvisionedTemplate, month: MonthYear) -> bool {
        let start = template.start_month();
        if month < start {
            return false;
        }
        if template.end_month().is_some_and(|end| month > end) {
            return false;
        }
        if template.excluded.contains(&month) {
            return false;
        }
        match template.recurrence {
            Recurrence::Monthly => true,
            Recurrence::Installment { .. } | Recurrence::Unique => month == start,
            Recurrence::Yearly => month.month() == start.month(),
        }
    }

    /// Boundary form of [`TemplateExpander::is_scheduled`] taking a 1-12
    /// month and a 4-digit year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` if the month or year is out of range.
    pub fn should_materialize(
        template: &ProvisionedTemplate,
        month: u32,
        year: i32,
    ) -> Result<bool, ScheduleError> {
        let month = MonthYear::new(year, month)?;
        Ok(Self::is_scheduled(template, month))
    }

    /// Materializes a template for a month, at most once per pair.
    ///
    /// The template is validated first, so an invalid template is rejected
    /// even for months it would not apply to. A created instance is
    /// recorded in `index`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid template or month.
    pub fn materialize(
        template: &ProvisionedTemplate,
        month: u32,
        year: i32,
        index: &mut MaterializationIndex,
    ) -> Result<Materialization, ScheduleError> {
        let month = MonthYear::new(year, month)?;
        Self::materialize_for(template, month, index)
    }

    /// Same as [`TemplateExpander::materialize`] for an already validated month.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid template.
    pub fn materialize_for(
        template: &ProvisionedTemplate,
        month: MonthYear,
        index: &mut MaterializationIndex,
    ) -> Result<Materialization, ScheduleError> {
        Self::validate(template)?;

        if let Some(existing) = index.get(template.id, month) {
            return Ok(Materialization::AlreadyMaterialized(existing));
        }
        if !Self::is_scheduled(template, month) {
            return Ok(Materialization::NotScheduled);
        }

        let instance = Self::build_instance(template, month);
        index.insert(template.id, month, instance.id);
        Ok(Materialization::Created(Box::new(instance)))
    }

    /// Expands every template for one month.
    #[must_use]
    pub fn materialize_month(
        templates: &[ProvisionedTemplate],
        month: MonthYear,
        index: &mut MaterializationIndex,
    ) -> Vec<ExpansionOutcome> {
        templates
            .iter()
            .map(|template| ExpansionOutcome {
                template_id: template.id,
                result: Self::materialize_for(template, month, index),
            })
            .collect()
    }

    /// Builds the pending instance for a template and month.
    ///
    /// The due date keeps the start date's day, clamped to the month length.
    #[must_use]
    pub fn build_instance(template: &ProvisionedTemplate, month: MonthYear) -> TransactionInstance {
        let (payment_method, bank_account_id, card_id) = match template.payment_source {
            Some(PaymentSource::BankAccount(id)) => (PaymentMethod::Account, Some(id), None),
            Some(PaymentSource::Card(id)) => (PaymentMethod::Card, None, Some(id)),
            None if template.target_box.is_some() => (PaymentMethod::Account, None, None),
            None => (PaymentMethod::Undefined, None, None),
        };

        TransactionInstance {
            id: InstanceId::new(),
            template_id: Some(template.id),
            invoice_id: None,
            paid_invoice_id: None,
            month_year: month,
            due_date: month.day_clamped(template.start_date.day()),
            description: template.instance_label(),
            account_id: template.account_id,
            account_type: template.account_type,
            expected_amount: template.expected_amount,
            actual_amount: None,
            status: InstanceStatus::Pending,
            payment_method,
            bank_account_id,
            card_id,
            box_id: template.target_box,
            confirmed_on: None,
        }
    }
}
