//! Local invoice store updated by synchronization.
//!
//! The host ERP maps its own invoice records onto the `invoices` and
//! `invoice_events` tables; the sync subsystem only reads references and
//! writes the normalized PDP status and timeline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pdpsync_core::{Clock, InvoiceGateway};
use pdpsync_domain::{
    Invoice, InvoiceDirection, InvoiceStatusChange, LifecycleCode, PdpError, PdpInvoiceStatus,
    Result, TimelineEvent,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};
use super::rows::{conversion_error, parsed_column, time_column, to_millis};

const STATUS_LIFECYCLE: &str = "lifecycle";
const STATUS_ERROR: &str = "error";
const INVOICE_COLUMNS: &str =
    "id, reference, direction, pdp_status, pdp_status_code, pdp_status_reason, updated_at";

pub struct SqliteInvoiceGateway {
    db: Arc<DbManager>,
    clock: Arc<dyn Clock>,
}

impl SqliteInvoiceGateway {
    pub fn new(db: Arc<DbManager>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Register a local invoice and return its id.
    pub async fn insert_invoice(
        &self,
        reference: &str,
        direction: InvoiceDirection,
        source_file: Option<&str>,
    ) -> Result<i64> {
        let db = Arc::clone(&self.db);
        let reference = reference.to_owned();
        let source_file = source_file.map(str::to_owned);
        let now = self.clock.now();

        task::spawn_blocking(move || -> Result<i64> {
            let conn = db.get_connection()?;
            insert_invoice(&conn, &reference, direction, source_file.as_deref(), now)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Invoice registered under `reference` for one direction.
    pub async fn find_by_direction(
        &self,
        reference: &str,
        direction: InvoiceDirection,
    ) -> Result<Option<Invoice>> {
        let db = Arc::clone(&self.db);
        let reference = reference.to_owned();

        task::spawn_blocking(move || -> Result<Option<Invoice>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE reference = ?1 AND direction = ?2"),
                params![reference, direction.to_string()],
                map_invoice_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Timeline of an invoice, oldest first.
    pub async fn timeline(&self, invoice_id: i64) -> Result<Vec<TimelineEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<TimelineEvent>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT invoice_id, label, message FROM invoice_events
                     WHERE invoice_id = ?1 ORDER BY id",
                )
                .map_err(map_sql_error)?;
            let events = stmt
                .query_map(params![invoice_id], |row| {
                    Ok(TimelineEvent {
                        invoice_id: row.get(0)?,
                        label: row.get(1)?,
                        message: row.get(2)?,
                    })
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(events)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl InvoiceGateway for SqliteInvoiceGateway {
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Invoice>> {
        let db = Arc::clone(&self.db);
        let reference = reference.to_owned();

        task::spawn_blocking(move || -> Result<Option<Invoice>> {
            let conn = db.get_connection()?;
            find_by_reference(&conn, &reference)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_status(&self, change: &InvoiceStatusChange) -> Result<()> {
        let db = Arc::clone(&self.db);
        let change = change.clone();
        let now = self.clock.now();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            apply_status(&conn, &change, now)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn log_timeline_event(&self, event: &TimelineEvent) -> Result<()> {
        let db = Arc::clone(&self.db);
        let event = event.clone();
        let now = self.clock.now();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            insert_event(&conn, &event, now)
        })
        .await
        .map_err(map_join_error)?
    }
}

pub(crate) fn insert_invoice(
    conn: &Connection,
    reference: &str,
    direction: InvoiceDirection,
    source_file: Option<&str>,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO invoices (reference, direction, source_file, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![reference, direction.to_string(), source_file, to_millis(now)],
    )
    .map_err(map_sql_error)?;
    Ok(conn.last_insert_rowid())
}

/// Customer invoices win when a supplier shares the same reference.
pub(crate) fn find_by_reference(conn: &Connection, reference: &str) -> Result<Option<Invoice>> {
    conn.query_row(
        &format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE reference = ?1
             ORDER BY direction = 'customer' DESC, id LIMIT 1"
        ),
        params![reference],
        map_invoice_row,
    )
    .optional()
    .map_err(map_sql_error)
}

/// Write the normalized status; a missing invoice is `NotFound`.
pub(crate) fn apply_status(
    conn: &Connection,
    change: &InvoiceStatusChange,
    now: DateTime<Utc>,
) -> Result<()> {
    let (kind, code) = match change.status {
        PdpInvoiceStatus::Lifecycle(code) => (STATUS_LIFECYCLE, Some(code.code())),
        PdpInvoiceStatus::Error => (STATUS_ERROR, None),
    };
    let updated = conn
        .execute(
            "UPDATE invoices
             SET pdp_status = ?2, pdp_status_code = ?3, pdp_status_reason = ?4, updated_at = ?5
             WHERE id = ?1",
            params![change.invoice_id, kind, code, change.reason, to_millis(now)],
        )
        .map_err(map_sql_error)?;
    if updated == 0 {
        return Err(PdpError::NotFound(format!("invoice {}", change.invoice_id)));
    }
    Ok(())
}

pub(crate) fn insert_event(
    conn: &Connection,
    event: &TimelineEvent,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO invoice_events (invoice_id, label, message, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![event.invoice_id, event.label, event.message, to_millis(now)],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn map_invoice_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let kind: Option<String> = row.get(3)?;
    let code: Option<u16> = row.get(4)?;
    let pdp_status = match (kind.as_deref(), code) {
        (None, _) => None,
        (Some(STATUS_ERROR), _) => Some(PdpInvoiceStatus::Error),
        (Some(STATUS_LIFECYCLE), Some(code)) => {
            let code = LifecycleCode::try_from(code)
                .map_err(|e| conversion_error(4, Type::Integer, e.to_string()))?;
            Some(PdpInvoiceStatus::Lifecycle(code))
        }
        (Some(other), _) => {
            return Err(conversion_error(3, Type::Text, format!("unknown invoice status {other}")))
        }
    };

    Ok(Invoice {
        id: row.get(0)?,
        reference: row.get(1)?,
        direction: parsed_column(row, 2)?,
        pdp_status,
        pdp_status_reason: row.get(5)?,
        updated_at: time_column(row, 6)?,
    })
}
