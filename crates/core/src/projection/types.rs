//! Projection domain types.

use chrono::NaiveDate;
use moneybox_shared::types::{InstanceId, MonthYear, TemplateId, TransferId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::instance::TransactionInstance;
use crate::ledger::HolderRef;
use crate::schedule::ProvisionedTemplate;
use crate::transfer::Transfer;

/// Where a projected line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A confirmed instance.
    Confirmed,
    /// A pending instance.
    Pending,
    /// A template not yet materialized for the month.
    TemplateProjected,
    /// Incoming leg of a transfer.
    TransferIn,
    /// Outgoing leg of a transfer.
    TransferOut,
}

/// Record behind a projected line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineSource {
    /// An instance.
    Instance(InstanceId),
    /// A template.
    Template(TemplateId),
    /// A transfer.
    Transfer(TransferId),
}

/// One contribution to a projected month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionLine {
    /// Label shown to the user.
    pub label: String,
    /// Signed amount (positive is income).
    pub amount: Decimal,
    /// Provenance.
    pub provenance: Provenance,
    /// Originating record.
    pub source: LineSource,
}

/// Simulated balance of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthProjection {
    /// Month.
    pub month_year: MonthYear,
    /// Balance at the start of the month.
    pub initial_balance: Decimal,
    /// Total of positive lines.
    pub income: Decimal,
    /// Total of negative lines, as a positive number.
    pub expense: Decimal,
    /// `initial_balance + income - expense`.
    pub final_balance: Decimal,
    /// Contributing lines.
    pub lines: Vec<ProjectionLine>,
}

/// Everything the engine needs to project one holder.
#[derive(Debug, Clone)]
pub struct ProjectionInput {
    /// Holder being projected.
    pub holder: HolderRef,
    /// Current cached balance.
    pub current_balance: Decimal,
    /// Today; its month is month 0.
    pub as_of: NaiveDate,
    /// Instances in the projected range.
    pub instances: Vec<TransactionInstance>,
    /// Transfers in the projected range.
    pub transfers: Vec<Transfer>,
    /// Active templates.
    pub templates: Vec<ProvisionedTemplate>,
}
