use super::literal::inline_params;
use super::local::LocalStore;
use super::remote::RemoteConnection;
use super::shape;
use super::value::SqlValue;
use crate::error::DbError;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Per-table outcome of a local-to-remote copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub local_rows: usize,
    pub copied: usize,
    pub failed: usize,
    /// Row count read back from the remote after the copy; `None` if skipped or unreadable.
    pub remote_rows: Option<u64>,
    /// Set when reading or clearing the table failed; the copy moved on to the next table.
    pub error: Option<String>,
}

/// Replaces the remote contents of each table with the local rows.
///
/// Empty local tables are skipped and keep their remote rows. Row failures are counted; a
/// table that cannot be read or cleared is reported with its error and the copy continues.
pub async fn copy_tables(
    local: &LocalStore,
    remote: &dyn RemoteConnection,
    tables: &[&str],
) -> Vec<TableReport> {
    let mut reports = Vec::with_capacity(tables.len());
    for table in tables {
        let mut report = TableReport {
            table: (*table).to_string(),
            ..Default::default()
        };
        if let Err(e) = copy_table(local, remote, &mut report).await {
            warn!(table, error = %e, "Error migrating table");
            report.error = Some(e.to_string());
        }
        reports.push(report);
    }
    reports
}

async fn copy_table(
    local: &LocalStore,
    remote: &dyn RemoteConnection,
    report: &mut TableReport,
) -> Result<(), DbError> {
    let table = report.table.clone();
    let rows = local.fetch_all(&format!("SELECT * FROM {table}"), &[]).await?;
    report.local_rows = rows.len();
    info!(table = %table, records = rows.len(), "Migrating table");

    if rows.is_empty() {
        warn!(table = %table, "No data to migrate");
        return Ok(());
    }

    remote.execute(&format!("DELETE FROM {table}")).await?;

    for row in &rows {
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let values: Vec<SqlValue> = row.values().map(SqlValue::from_json).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        let result = match inline_params(&sql, &values) {
            Ok(text) => remote.execute(&text).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => report.copied += 1,
            Err(e) => {
                warn!(table = %table, error = %e, "Failed to insert record");
                report.failed += 1;
            }
        }
    }

    report.remote_rows = match remote
        .execute(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .await
    {
        Ok(raw) => shape::first_row(raw)
            .and_then(|row| row.get("count").and_then(Value::as_u64)),
        Err(e) => {
            warn!(table = %table, error = %e, "Failed to verify remote row count");
            None
        }
    };

    info!(
        table = %table,
        copied = report.copied,
        failed = report.failed,
        remote_rows = ?report.remote_rows,
        "Table migrated"
    );
    Ok(())
}
