//! Template domain types.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use moneybox_shared::types::{
    AccountId, BankAccountId, BoxId, CardId, InstanceId, MonthYear, TemplateId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ScheduleError;
use crate::classification::AccountType;
use crate::instance::TransactionInstance;
use crate::ledger::HolderRef;

/// How often a template recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    /// A single occurrence.
    Unique,
    /// A purchase split into `count` installments.
    Installment {
        /// Number of installments.
        count: u32,
    },
    /// Every month.
    Monthly,
    /// Every year, in the start month.
    Yearly,
}

impl Recurrence {
    /// Returns the string representation of the recurrence kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Installment { .. } => "installment",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Where a template's instances are paid from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PaymentSource {
    /// A bank account.
    BankAccount(BankAccountId),
    /// A card.
    Card(CardId),
}

/// Budget intent that expands into month-scoped instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedTemplate {
    /// Template ID.
    pub id: TemplateId,
    /// Classification account (required before expansion).
    pub account_id: Option<AccountId>,
    /// Direction of the classification account.
    pub account_type: AccountType,
    /// Description copied onto instances.
    pub description: String,
    /// Expected amount per occurrence.
    pub expected_amount: Decimal,
    /// Payment source; `None` means to be defined.
    pub payment_source: Option<PaymentSource>,
    /// Box the instances land in.
    pub target_box: Option<BoxId>,
    /// Recurrence.
    pub recurrence: Recurrence,
    /// First day the template applies.
    pub start_date: NaiveDate,
    /// Last day the template applies.
    pub end_date: Option<NaiveDate>,
    /// Installment counter (1-based), used for the installment label.
    pub current_installment: u32,
    /// Months explicitly skipped.
    #[serde(default)]
    pub excluded: BTreeSet<MonthYear>,
}

impl ProvisionedTemplate {
    /// First month the template applies.
    #[must_use]
    pub fn start_month(&self) -> MonthYear {
        MonthYear::from_date(self.start_date)
    }

    /// Last month the template applies, if bounded.
    #[must_use]
    pub fn end_month(&self) -> Option<MonthYear> {
        self.end_date.map(MonthYear::from_date)
    }

    /// Holder the template's instances will post to, if any.
    ///
    /// Mirrors [`TransactionInstance::holder`] for the instances built from
    /// this template: card templates have none and a target box wins over
    /// the bank account.
    #[must_use]
    pub fn holder(&self) -> Option<HolderRef> {
        match (self.payment_source, self.target_box) {
            (Some(PaymentSource::Card(_)), _) => None,
            (_, Some(box_id)) => Some(HolderRef::Box(box_id)),
            (Some(PaymentSource::BankAccount(id)), None) => Some(HolderRef::BankAccount(id)),
            (None, None) => None,
        }
    }

    /// Description with the installment position, e.g. `"Laptop (2/10)"`.
    #[must_use]
    pub fn instance_label(&self) -> String {
        match self.recurrence {
            Recurrence::Installment { count } => {
                format!("{} ({}/{})", self.description, self.current_installment, count)
            }
            _ => self.description.clone(),
        }
    }
}

/// Index of existing instances keyed by `(template, month)`.
#[derive(Debug, Clone, Default)]
pub struct MaterializationIndex {
    entries: HashMap<(TemplateId, MonthYear), InstanceId>,
}

impl MaterializationIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from existing instances; ad-hoc instances are skipped.
    pub fn from_instances<'a, I>(instances: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionInstance>,
    {
        let mut index = Self::new();
        for instance in instances {
            if let Some(template_id) = instance.template_id {
                index.insert(template_id, instance.month_year, instance.id);
            }
        }
        index
    }

    /// Instance already materialized for the pair, if any.
    #[must_use]
    pub fn get(&self, template_id: TemplateId, month: MonthYear) -> Option<InstanceId> {
        self.entries.get(&(template_id, month)).copied()
    }

    /// Returns true if the pair has an instance.
    #[must_use]
    pub fn contains(&self, template_id: TemplateId, month: MonthYear) -> bool {
        self.entries.contains_key(&(template_id, month))
    }

    /// Records an instance for the pair.
    pub fn insert(&mut self, template_id: TemplateId, month: MonthYear, instance_id: InstanceId) {
        self.entries.insert((template_id, month), instance_id);
    }

    /// Number of indexed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of materializing one template for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialization {
    /// A new pending instance.
    Created(Box<TransactionInstance>),
    /// An instance already exists for the pair.
    AlreadyMaterialized(InstanceId),
    /// The template does not apply to the month.
    NotScheduled,
}

/// Per-template result of a month expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionOutcome {
    /// Template.
    pub template_id: TemplateId,
    /// What happened, or why it was rejected.
    pub result: Result<Materialization, ScheduleError>,
}
