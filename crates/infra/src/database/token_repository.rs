//! SQLite-backed token store, one row per service key.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pdpsync_core::TokenStore;
use pdpsync_domain::{Result, ServiceKey, TokenSet};
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};
use super::rows::{time_column, to_millis};

pub struct SqliteTokenStore {
    db: Arc<DbManager>,
}

impl SqliteTokenStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self, key: &ServiceKey) -> Result<Option<TokenSet>> {
        let db = Arc::clone(&self.db);
        let key = key.clone();

        task::spawn_blocking(move || -> Result<Option<TokenSet>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT access_token, refresh_token, expires_at FROM pdp_tokens
                 WHERE provider = ?1 AND environment = ?2 AND tenant = ?3",
                params![key.provider, key.environment, key.tenant],
                |row| {
                    Ok(TokenSet {
                        service_key: key.clone(),
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        expires_at: time_column(row, 2)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, token: &TokenSet) -> Result<()> {
        let db = Arc::clone(&self.db);
        let token = token.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let key = &token.service_key;
            conn.execute(
                "INSERT INTO pdp_tokens
                    (provider, environment, tenant, access_token, refresh_token, expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(provider, environment, tenant) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    updated_at = excluded.updated_at",
                params![
                    key.provider,
                    key.environment,
                    key.tenant,
                    token.access_token,
                    token.refresh_token,
                    to_millis(token.expires_at),
                    to_millis(Utc::now()),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, key: &ServiceKey) -> Result<()> {
        let db = Arc::clone(&self.db);
        let key = key.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM pdp_tokens WHERE provider = ?1 AND environment = ?2 AND tenant = ?3",
                params![key.provider, key.environment, key.tenant],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
