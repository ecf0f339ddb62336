//! Projection engine.

use moneybox_shared::types::MonthYear;
use rust_decimal::Decimal;

use super::error::ProjectionError;
use super::types::{LineSource, MonthProjection, ProjectionInput, ProjectionLine, Provenance};
use crate::schedule::{MaterializationIndex, TemplateExpander};

/// Largest supported horizon, in months.
pub const MAX_MONTHS_AHEAD: u32 = 60;

/// Engine for month-by-month balance projection.
pub struct ProjectionEngine;

impl ProjectionEngine {
    /// Projects `input.holder` over `months_ahead` months, month 0 being the
    /// month of `input.as_of`.
    ///
    /// - Confirmed instances and transfers of month 0 are already part of
    ///   the current balance and are skipped there.
    /// - Pending instances count at their expected amount, confirmed ones at
    ///   their actual amount.
    /// - Templates selected by the decision rule with no instance for the
    ///   month count at their expected amount.
    ///
    /// # Errors
    ///
    /// Returns an error for a horizon outside 1..=60 or a balance overflow.
    pub fn project(
        input: &ProjectionInput,
        months_ahead: u32,
    ) -> Result<Vec<MonthProjection>, ProjectionError> {
        if !(1..=MAX_MONTHS_AHEAD).contains(&months_ahead) {
            return Err(ProjectionError::InvalidHorizon {
                requested: months_ahead,
                max: MAX_MONTHS_AHEAD,
            });
        }

        let start = MonthYear::from_date(input.as_of);
        let index = MaterializationIndex::from_instances(&input.instances);
        let mut months = Vec::with_capacity(months_ahead as usize);
        let mut balance = input.current_balance;

        for offset in 0..months_ahead {
            let month = start.plus_months(offset);
            let lines = Self::lines_for(input, &index, month, offset == 0);
            let projection = Self::close_month(month, balance, lines)?;
            balance = projection.final_balance;
            months.push(projection);
        }

        Ok(months)
    }

    /// Collects the lines of one month: instances, then transfers, then
    /// templates.
    fn lines_for(
        input: &ProjectionInput,
        index: &MaterializationIndex,
        month: MonthYear,
        is_current: bool,
    ) -> Vec<ProjectionLine> {
        let holder = input.holder;
        let mut lines = Vec::new();

        for instance in input
            .instances
            .iter()
            .filter(|i| i.month_year == month && i.holder() == Some(holder))
        {
            if is_current && instance.is_confirmed() {
                continue;
            }
            lines.push(ProjectionLine {
                label: instance.description.clone(),
                amount: instance.signed_amount(),
                provenance: if instance.is_confirmed() {
                    Provenance::Confirmed
                } else {
                    Provenance::Pending
                },
                source: LineSource::Instance(instance.id),
            });
        }

        if !is_current {
            for transfer in input
                .transfers
                .iter()
                .filter(|t| month.contains(t.date))
            {
                let amount = transfer.effect_on(holder);
                if amount.is_zero() {
                    continue;
                }
                lines.push(ProjectionLine {
                    label: transfer.description.clone(),
                    amount,
                    provenance: if amount.is_sign_positive() {
                        Provenance::TransferIn
                    } else {
                        Provenance::TransferOut
                    },
                    source: LineSource::Transfer(transfer.id),
                });
            }
        }

        for template in input.templates.iter().filter(|t| {
            t.holder() == Some(holder)
                && TemplateExpander::validate(t).is_ok()
                && TemplateExpander::is_scheduled(t, month)
                && !index.contains(t.id, month)
        }) {
            lines.push(ProjectionLine {
                label: template.instance_label(),
                amount: template.account_type.signed(template.expected_amount),
                provenance: Provenance::TemplateProjected,
                source: LineSource::Template(template.id),
            });
        }

        lines
    }

    fn close_month(
        month: MonthYear,
        initial_balance: Decimal,
        lines: Vec<ProjectionLine>,
    ) -> Result<MonthProjection, ProjectionError> {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        for line in &lines {
            if line.amount.is_sign_positive() {
                income = income
                    .checked_add(line.amount)
                    .ok_or(ProjectionError::Overflow(month))?;
            } else {
                expense = expense
                    .checked_add(line.amount.abs())
                    .ok_or(ProjectionError::Overflow(month))?;
            }
        }
        let final_balance = initial_balance
            .checked_add(income)
            .and_then(|b| b.checked_sub(expense))
            .ok_or(ProjectionError::Overflow(month))?;

        Ok(MonthProjection {
            month_year: month,
            initial_balance,
            income,
            expense,
            final_balance,
            lines,
        })
    }
}
