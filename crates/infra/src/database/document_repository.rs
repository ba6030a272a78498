//! SQLite-backed document ledger and per-flow commit.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pdpsync_core::{Clock, DocumentRepository, FlowLedger};
use pdpsync_domain::{
    Document, FlowEffects, FlowType, LifecycleCode, PdpError, Result,
};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::task;
use tracing::debug;

use super::invoice_repository::{apply_status, insert_event};
use super::manager::{map_join_error, map_sql_error, DbManager};
use super::rows::{
    conversion_error, from_millis, optional_time_column, parsed_column, time_column, to_millis,
};

/// Flow ids looked up per statement in the idempotency filter.
const LOOKUP_CHUNK: usize = 500;

pub struct SqliteDocumentRepository {
    db: Arc<DbManager>,
}

impl SqliteDocumentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn known_flow_ids(&self, provider: &str, flow_ids: &[String]) -> Result<HashSet<String>> {
        if flow_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let db = Arc::clone(&self.db);
        let provider = provider.to_owned();
        let flow_ids = flow_ids.to_vec();

        task::spawn_blocking(move || -> Result<HashSet<String>> {
            let conn = db.get_connection()?;
            let mut known = HashSet::new();
            for chunk in flow_ids.chunks(LOOKUP_CHUNK) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!(
                    "SELECT DISTINCT flow_id FROM pdp_documents
                     WHERE provider = ? AND flow_type <> 'manual' AND flow_id IN ({placeholders})"
                );
                let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
                let values = std::iter::once(provider.as_str()).chain(chunk.iter().map(String::as_str));
                let rows = stmt
                    .query_map(params_from_iter(values), |row| row.get::<_, String>(0))
                    .map_err(map_sql_error)?;
                for flow_id in rows {
                    known.insert(flow_id.map_err(map_sql_error)?);
                }
            }
            Ok(known)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn tracking_ref_for_flow(
        &self,
        provider: &str,
        flow_id: &str,
    ) -> Result<Option<String>> {
        let db = Arc::clone(&self.db);
        let provider = provider.to_owned();
        let flow_id = flow_id.to_owned();

        task::spawn_blocking(move || -> Result<Option<String>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT tracking_id_ref FROM pdp_documents
                 WHERE provider = ?1 AND flow_id = ?2 AND tracking_id_ref IS NOT NULL
                 ORDER BY id LIMIT 1",
                params![provider, flow_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn watermark(&self, provider: &str) -> Result<Option<DateTime<Utc>>> {
        let db = Arc::clone(&self.db);
        let provider = provider.to_owned();

        task::spawn_blocking(move || -> Result<Option<DateTime<Utc>>> {
            let conn = db.get_connection()?;
            let millis: Option<i64> = conn
                .query_row(
                    "SELECT MAX(updated_at) FROM pdp_documents
                     WHERE provider = ?1 AND flow_type <> 'manual'",
                    params![provider],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            millis.map(|m| from_millis(m, 0)).transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn documents_for_flow(&self, flow_id: &str) -> Result<Vec<Document>> {
        let db = Arc::clone(&self.db);
        let flow_id = flow_id.to_owned();

        task::spawn_blocking(move || -> Result<Vec<Document>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM pdp_documents WHERE flow_id = ?1 ORDER BY id"
                ))
                .map_err(map_sql_error)?;
            let documents = stmt
                .query_map(params![flow_id], map_document_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(documents)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_manual_submission(&self, document: &Document) -> Result<i64> {
        if document.flow_type != FlowType::Manual {
            return Err(PdpError::Validation(format!(
                "manual submission recorded with flow type {}",
                document.flow_type
            )));
        }
        let db = Arc::clone(&self.db);
        let document = document.clone();

        task::spawn_blocking(move || -> Result<i64> {
            let conn = db.get_connection()?;
            insert_document(&conn, &document)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Applies the effects of one flow in a single transaction.
pub struct SqliteFlowLedger {
    db: Arc<DbManager>,
    clock: Arc<dyn Clock>,
}

impl SqliteFlowLedger {
    pub fn new(db: Arc<DbManager>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl FlowLedger for SqliteFlowLedger {
    async fn commit_flow(&self, effects: &FlowEffects) -> Result<i64> {
        let db = Arc::clone(&self.db);
        let effects = effects.clone();
        let now = self.clock.now();

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            if let Some(change) = &effects.invoice_status {
                apply_status(&tx, change, now)?;
            }
            if let Some(event) = &effects.timeline {
                insert_event(&tx, event, now)?;
            }
            let document_id = insert_document(&tx, &effects.document)?;

            tx.commit().map_err(map_sql_error)?;
            debug!(flow_id = %effects.document.flow_id, document_id, "flow committed");
            Ok(document_id)
        })
        .await
        .map_err(map_join_error)?
    }
}

const DOCUMENT_COLUMNS: &str = "id, flow_id, tracking_id_ref, flow_type, ack_status, ack_reason_code,
        ack_info, cdar_lifecycle_code, cdar_lifecycle_label, cdar_reason_code, cdar_reason_desc,
        cdar_reason_detail, linked_element_id, linked_element_type, submitted_at, updated_at,
        provider, entity, call_id";

fn insert_document(conn: &Connection, document: &Document) -> Result<i64> {
    conn.execute(
        "INSERT INTO pdp_documents (
            flow_id, tracking_id_ref, flow_type, ack_status, ack_reason_code, ack_info,
            cdar_lifecycle_code, cdar_lifecycle_label, cdar_reason_code, cdar_reason_desc,
            cdar_reason_detail, linked_element_id, linked_element_type, submitted_at, updated_at,
            provider, entity, call_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            document.flow_id,
            document.tracking_id_ref,
            document.flow_type.as_str(),
            document.ack_status.to_string(),
            document.ack_reason_code,
            document.ack_info,
            document.cdar_lifecycle_code.map(LifecycleCode::code),
            document.cdar_lifecycle_label,
            document.cdar_reason_code,
            document.cdar_reason_desc,
            document.cdar_reason_detail,
            document.linked_element_id,
            document.linked_element_type,
            document.submitted_at.map(to_millis),
            to_millis(document.updated_at),
            document.provider,
            document.entity,
            document.call_id,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(conn.last_insert_rowid())
}

fn map_document_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let flow_type: String = row.get(3)?;
    let cdar_lifecycle_code = row
        .get::<_, Option<u16>>(7)?
        .map(|code| {
            LifecycleCode::try_from(code).map_err(|e| conversion_error(7, Type::Integer, e.to_string()))
        })
        .transpose()?;

    Ok(Document {
        id: row.get(0)?,
        flow_id: row.get(1)?,
        tracking_id_ref: row.get(2)?,
        flow_type: FlowType::from(flow_type.as_str()),
        ack_status: parsed_column(row, 4)?,
        ack_reason_code: row.get(5)?,
        ack_info: row.get(6)?,
        cdar_lifecycle_code,
        cdar_lifecycle_label: row.get(8)?,
        cdar_reason_code: row.get(9)?,
        cdar_reason_desc: row.get(10)?,
        cdar_reason_detail: row.get(11)?,
        linked_element_id: row.get(12)?,
        linked_element_type: row.get(13)?,
        submitted_at: optional_time_column(row, 14)?,
        updated_at: time_column(row, 15)?,
        provider: row.get(16)?,
        entity: row.get(17)?,
        call_id: row.get(18)?,
    })
}
