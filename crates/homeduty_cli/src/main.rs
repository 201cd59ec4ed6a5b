//! CLI probe for the core crate.
//!
//! # Responsibility
//! - Wire config, logging, storage and services end to end.
//! - Print today's duty status, the deadline countdown, monthly stats and
//!   the open expense ledger.

use chrono::Local;
use homeduty_core::calendar::deadline_countdown;
use homeduty_core::db::{open_db, open_db_in_memory};
use homeduty_core::house::DAY_NAMES;
use homeduty_core::service::duty_service::DutyService;
use homeduty_core::service::expense_service::ExpenseService;
use homeduty_core::store::doc_store::SqliteDocumentStore;
use homeduty_core::{core_version, default_log_level, init_logging, Config, DutyStatus};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("homeduty: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("homeduty_core version={}", core_version());

    // Without environment configuration the probe runs against an
    // in-memory store, which is enough to verify the wiring.
    let config = Config::from_env().ok();

    if let Some(config) = &config {
        if let Some(log_dir) = &config.log_dir {
            let level = config
                .log_level
                .as_deref()
                .unwrap_or_else(|| default_log_level());
            init_logging(level, &log_dir.to_string_lossy())?;
        }
    }

    let conn = match &config {
        Some(config) => open_db(&config.db_path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteDocumentStore::new(&conn);
    let duty = DutyService::new(&store);
    let ledger = ExpenseService::new(&store);

    let now = Local::now().naive_local();
    let week = duty.ensure_current_week(now)?.value;

    let day_name = DAY_NAMES[usize::from(homeduty_core::calendar::day_of_week_index(now.date()))];
    println!("week {} starting {}", week.week_number, week.week_start_date);

    match week.entry_for_date(now.date()) {
        Some(entry) => {
            println!("{day_name}: {} ({:?})", entry.person, entry.status);
            if entry.status == DutyStatus::Pending {
                let countdown = deadline_countdown(now);
                println!(
                    "deadline in {} ({:?})",
                    countdown.formatted(),
                    countdown.urgency
                );
            }
        }
        None => println!("{day_name}: no entry scheduled"),
    }

    println!("monthly stats:");
    for (person, stats) in &week.monthly_stats {
        println!("  {person}: done={} missed={}", stats.done, stats.missed);
    }

    let expenses = ledger.list_expenses()?;
    println!("open expenses: {}", expenses.len());
    for (id, expense) in &expenses {
        println!(
            "  {id} {} DH by {} ({} confirmed) {}",
            expense.amount,
            expense.payer.label,
            expense.confirmed_by.len(),
            expense.note
        );
    }
    println!("outstanding total: {} DH", ledger.outstanding_total()?);

    Ok(())
}
