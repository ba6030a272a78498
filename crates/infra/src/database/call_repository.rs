//! SQLite-backed audit trail of typed PDP calls.

use std::sync::Arc;

use async_trait::async_trait;
use pdpsync_core::CallRepository;
use pdpsync_domain::{ApiCall, PdpError, Result};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};
use super::rows::{parsed_column, time_column, to_millis};

pub struct SqliteCallRepository {
    db: Arc<DbManager>,
}

impl SqliteCallRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CallRepository for SqliteCallRepository {
    async fn insert_call(&self, call: &ApiCall) -> Result<i64> {
        let db = Arc::clone(&self.db);
        let call = call.clone();

        task::spawn_blocking(move || -> Result<i64> {
            let conn = db.get_connection()?;
            conn.execute(CALL_INSERT_SQL, params![
                call.call_type.to_string(),
                call.method.to_string(),
                call.endpoint,
                call.request_body,
                call.response_body,
                call.provider,
                call.tenant,
                call.status_code,
                call.success,
                call.summary,
                to_millis(call.started_at),
                to_millis(call.completed_at),
            ])
            .map_err(map_sql_error)?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_summary(&self, call_id: i64, summary: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let summary = summary.to_owned();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute("UPDATE pdp_calls SET summary = ?2 WHERE id = ?1", params![call_id, summary])
                .map_err(map_sql_error)?;
            if updated == 0 {
                return Err(PdpError::NotFound(format!("call {call_id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_call(&self, call_id: i64) -> Result<Option<ApiCall>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Option<ApiCall>> {
            let conn = db.get_connection()?;
            conn.query_row(CALL_SELECT_SQL, params![call_id], map_call_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

const CALL_INSERT_SQL: &str = "INSERT INTO pdp_calls (
        call_type, method, endpoint, request_body, response_body, provider, tenant,
        status_code, success, summary, started_at, completed_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const CALL_SELECT_SQL: &str = "SELECT
        id, call_type, method, endpoint, request_body, response_body, provider, tenant,
        status_code, success, summary, started_at, completed_at
    FROM pdp_calls WHERE id = ?1";

fn map_call_row(row: &Row<'_>) -> rusqlite::Result<ApiCall> {
    Ok(ApiCall {
        id: row.get(0)?,
        call_type: parsed_column(row, 1)?,
        method: parsed_column(row, 2)?,
        endpoint: row.get(3)?,
        request_body: row.get(4)?,
        response_body: row.get(5)?,
        provider: row.get(6)?,
        tenant: row.get(7)?,
        status_code: row.get(8)?,
        success: row.get(9)?,
        summary: row.get(10)?,
        started_at: time_column(row, 11)?,
        completed_at: time_column(row, 12)?,
    })
}
