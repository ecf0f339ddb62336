//! Moneybox ledger operator CLI.
//!
//! Usage:
//!   ledgerctl reconcile --bank-account <ID> | --box <ID>
//!   ledgerctl reconcile-all
//!   ledgerctl purge --yes
//!   ledgerctl materialize --month 2025-03
//!   ledgerctl project --bank-account <ID> [--months 12] [--as-of 2025-03-10]
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneybox_core::ledger::HolderRef;
use moneybox_core::reconcile::Reconciler;
use moneybox_core::schedule::{ExpansionOutcome, Materialization};
use moneybox_db::{ProjectionRepository, ReconciliationRepository, TemplateRepository, connect};
use moneybox_shared::AppConfig;
use moneybox_shared::types::{BankAccountId, BoxId, MonthYear};

/// Moneybox ledger maintenance.
#[derive(Debug, Parser)]
#[command(name = "ledgerctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recompute one holder's cached balance from its ledger.
    Reconcile(HolderArgs),
    /// Reconcile every bank account, then every box.
    ReconcileAll,
    /// Delete every movement, transfer, instance and invoice, then reset
    /// all balances.
    Purge {
        /// Confirm the irreversible purge.
        #[arg(long)]
        yes: bool,
    },
    /// Materialize every active template for a month.
    Materialize {
        /// Month as YYYY-MM.
        #[arg(long)]
        month: MonthYear,
    },
    /// Project a holder's balance month by month.
    Project {
        #[command(flatten)]
        holder: HolderArgs,
        /// Months to project, 1-60 (defaults to configuration).
        #[arg(long)]
        months: Option<u32>,
        /// Projection date (defaults to today).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

/// Exactly one balance holder.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct HolderArgs {
    /// Bank account ID.
    #[arg(long)]
    bank_account: Option<BankAccountId>,
    /// Box ID.
    #[arg(long = "box")]
    box_id: Option<BoxId>,
}

impl HolderArgs {
    fn holder(&self) -> anyhow::Result<HolderRef> {
        match (self.bank_account, self.box_id) {
            (Some(id), None) => Ok(HolderRef::BankAccount(id)),
            (None, Some(id)) => Ok(HolderRef::Box(id)),
            _ => bail!("pass exactly one of --bank-account or --box"),
        }
    }
}

/// Printable form of one template's expansion.
#[derive(Debug, Serialize)]
struct ExpansionLine {
    template_id: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<&ExpansionOutcome> for ExpansionLine {
    fn from(outcome: &ExpansionOutcome) -> Self {
        let (label, instance_id, reason) = match &outcome.result {
            Ok(Materialization::Created(instance)) => {
                ("created", Some(instance.id.to_string()), None)
            }
            Ok(Materialization::AlreadyMaterialized(id)) => {
                ("already_materialized", Some(id.to_string()), None)
            }
            Ok(Materialization::NotScheduled) => ("not_scheduled", None, None),
            Err(err) => ("rejected", None, Some(err.to_string())),
        };
        Self {
            template_id: outcome.template_id.to_string(),
            outcome: label,
            instance_id,
            reason,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moneybox=info,ledgerctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let policy = config.ledger.box_initial_balance;
    let reconciler = Reconciler::new(config.ledger.reconciliation_tolerance);

    match cli.command {
        Command::Reconcile(holder) => {
            let repo = ReconciliationRepository::new(db, reconciler, policy);
            let outcome = repo.reconcile(holder.holder()?).await?;
            print_json(&outcome)?;
        }
        Command::ReconcileAll => {
            let repo = ReconciliationRepository::new(db, reconciler, policy);
            let report = repo.reconcile_all().await?;
            for line in report.lines() {
                info!("{line}");
            }
            print_json(&report)?;
        }
        Command::Purge { yes } => {
            if !yes {
                bail!("purge deletes every ledger movement, instance and invoice; pass --yes");
            }
            let repo = ReconciliationRepository::new(db, reconciler, policy);
            print_json(&repo.purge().await?)?;
        }
        Command::Materialize { month } => {
            let repo = TemplateRepository::new(db);
            let outcomes = repo.materialize_month(month).await?;
            let lines: Vec<ExpansionLine> = outcomes.iter().map(ExpansionLine::from).collect();
            print_json(&lines)?;
        }
        Command::Project {
            holder,
            months,
            as_of,
        } => {
            let repo = ProjectionRepository::new(db, policy);
            let months = months.unwrap_or(config.projection.months_ahead);
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let projection = repo.project(holder.holder()?, months, as_of).await?;
            print_json(&projection)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reconcile_requires_one_holder() {
        assert!(Cli::try_parse_from(["ledgerctl", "reconcile"]).is_err());

        let id = BankAccountId::new();
        let account = id.to_string();
        let other = BoxId::new().to_string();
        let both = Cli::try_parse_from([
            "ledgerctl",
            "reconcile",
            "--bank-account",
            account.as_str(),
            "--box",
            other.as_str(),
        ]);
        assert!(both.is_err());

        let args = ["ledgerctl", "reconcile", "--bank-account", account.as_str()];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Reconcile(holder) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(holder.holder().unwrap(), HolderRef::BankAccount(id));
    }

    #[test]
    fn test_materialize_parses_month() {
        let cli = Cli::try_parse_from(["ledgerctl", "materialize", "--month", "2025-03"]).unwrap();
        let Command::Materialize { month } = cli.command else {
            panic!("expected materialize");
        };
        assert_eq!(month, MonthYear::new(2025, 3).unwrap());

        assert!(Cli::try_parse_from(["ledgerctl", "materialize", "--month", "2025-13"]).is_err());
    }

    #[test]
    fn test_project_defaults_are_optional() {
        let id = BoxId::new();
        let money_box = id.to_string();
        let args = ["ledgerctl", "project", "--box", money_box.as_str()];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Project {
            holder,
            months,
            as_of,
        } = cli.command
        else {
            panic!("expected project");
        };
        assert_eq!(holder.holder().unwrap(), HolderRef::Box(id));
        assert_eq!(months, None);
        assert_eq!(as_of, None);
    }

    #[test]
    fn test_purge_flag() {
        let cli = Cli::try_parse_from(["ledgerctl", "purge"]).unwrap();
        assert!(matches!(cli.command, Command::Purge { yes: false }));
    }
}
