// src/io/reporting.rs

use crate::error::Result;
use crate::metrics::DailySnapshot;
use crate::model::ledger::{Transaction, TransactionKind};
use crate::simulation::engine::FinalReport;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes any serializable rows to a CSV file, one record per row.
fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    // Flush the buffer so a short run still ends up on disk.
    wtr.flush()?;
    info!(rows = rows.len(), path = %path.display(), "wrote CSV");
    Ok(())
}

/// CSV-friendly view of a transaction: money in dollars, SKU blank for
/// machine-wide entries.
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    seq: u64,
    day: u32,
    kind: TransactionKind,
    sku: &'a str,
    quantity: u32,
    amount: f64,
    balance_after: f64,
    note: &'a str,
}

#[derive(Debug, Serialize)]
struct SnapshotRow {
    day: u32,
    cash: f64,
    inventory_value: f64,
    net_worth: f64,
    units_on_hand: u64,
    units_sold: u32,
    revenue: f64,
    pending_orders: usize,
    active_events: usize,
}

/// Writes the full ledger to a CSV file.
pub fn write_transaction_log(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let rows: Vec<_> = transactions
        .iter()
        .map(|t| TransactionRow {
            seq: t.seq,
            day: t.day,
            kind: t.kind,
            sku: t.sku.as_deref().unwrap_or(""),
            quantity: t.quantity,
            amount: t.amount.as_dollars(),
            balance_after: t.balance_after.as_dollars(),
            note: &t.note,
        })
        .collect();
    write_csv(path, &rows)
}

/// Writes one row per simulated day.
pub fn write_daily_snapshots(path: &Path, snapshots: &[DailySnapshot]) -> Result<()> {
    let rows: Vec<_> = snapshots
        .iter()
        .map(|s| SnapshotRow {
            day: s.day,
            cash: s.cash.as_dollars(),
            inventory_value: s.inventory_value.as_dollars(),
            net_worth: s.net_worth.as_dollars(),
            units_on_hand: s.units_on_hand,
            units_sold: s.units_sold,
            revenue: s.revenue.as_dollars(),
            pending_orders: s.pending_orders,
            active_events: s.active_events,
        })
        .collect();
    write_csv(path, &rows)
}

/// Writes the whole report, feed included, as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &FinalReport) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

/// Where the three files of one run go.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub report: PathBuf,
    pub transactions: PathBuf,
    pub snapshots: PathBuf,
}

impl ReportPaths {
    /// `<dir>/<agent>-seed<seed>-{report.json,transactions.csv,daily.csv}`
    pub fn for_run(dir: &Path, report: &FinalReport) -> Self {
        let stem = format!("{}-seed{}", report.agent, report.seed);
        Self {
            report: dir.join(format!("{}-report.json", stem)),
            transactions: dir.join(format!("{}-transactions.csv", stem)),
            snapshots: dir.join(format!("{}-daily.csv", stem)),
        }
    }
}

/// Writes the JSON report and both CSV logs, creating `dir` if needed.
pub fn write_all(dir: &Path, report: &FinalReport) -> Result<ReportPaths> {
    fs::create_dir_all(dir)?;
    let paths = ReportPaths::for_run(dir, report);
    write_report_json(&paths.report, report)?;
    write_transaction_log(&paths.transactions, &report.transactions)?;
    write_daily_snapshots(&paths.snapshots, &report.snapshots)?;
    Ok(paths)
}
