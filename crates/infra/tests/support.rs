#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use pdpsync_core::Clock;
use pdpsync_domain::{AckStatus, Acknowledgement, Flow, FlowType};
use pdpsync_infra::database::DbManager;
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("pdpsync-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), temp_dir }
    }

    /// Count rows of a table.
    pub fn count(&self, table: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock pinned half an hour after [`base_time`].
pub fn pinned_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(at(30)))
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    base_time() + chrono::Duration::minutes(minutes)
}

pub fn flow(flow_id: &str, flow_type: FlowType, updated_at: DateTime<Utc>) -> Flow {
    Flow {
        flow_id: flow_id.to_string(),
        tracking_id: None,
        flow_type,
        flow_direction: None,
        flow_syntax: None,
        flow_profile: None,
        submitted_at: Some(updated_at),
        updated_at,
        uuid: None,
        acknowledgement: Some(Acknowledgement {
            status: AckStatus::Ok,
            reason_code: None,
            info: None,
        }),
    }
}
