//! Results of flow synchronization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::invoice::{InvoiceStatusChange, TimelineEvent};

/// Side effects of one flow, committed together or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEffects {
    pub document: Document,
    pub invoice_status: Option<InvoiceStatusChange>,
    pub timeline: Option<TimelineEvent>,
}

impl FlowEffects {
    pub fn document(document: Document) -> Self {
        Self { document, invoice_status: None, timeline: None }
    }
}

/// Non-fatal result of classifying a flow. Fatal results are `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowOutcome {
    Synced(FlowEffects),
    /// Target already present; the ledger row is still recorded.
    Skipped { reason: String, effects: FlowEffects },
}

impl FlowOutcome {
    pub fn effects(&self) -> &FlowEffects {
        match self {
            Self::Synced(effects) | Self::Skipped { effects, .. } => effects,
        }
    }

    pub fn into_effects(self) -> FlowEffects {
        match self {
            Self::Synced(effects) | Self::Skipped { effects, .. } => effects,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}

/// Parameters of a synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncRequest {
    /// Lower `updatedAt` bound; epoch when absent.
    pub sync_from: Option<DateTime<Utc>>,
    /// Number of flows to request; `0` learns the total first.
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Completed,
    AlreadyRunning,
    Aborted,
}

impl SyncStatus {
    pub fn code(self) -> i8 {
        match self {
            Self::Completed => 1,
            Self::AlreadyRunning => 0,
            Self::Aborted => -1,
        }
    }
}

/// Aggregated, user-facing outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub provider: String,
    pub status: SyncStatus,
    pub messages: Vec<String>,
    pub discovered: usize,
    pub skipped: usize,
    pub synced: usize,
    pub failed: usize,
    pub last_synced_flow: Option<String>,
    pub suggestions: Vec<String>,
    /// Raw technical detail, only filled in debug mode.
    pub debug_detail: Option<String>,
    /// Anchor call of the run.
    pub call_id: Option<i64>,
}

impl SyncReport {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: SyncStatus::Completed,
            messages: Vec::new(),
            discovered: 0,
            skipped: 0,
            synced: 0,
            failed: 0,
            last_synced_flow: None,
            suggestions: Vec::new(),
            debug_detail: None,
            call_id: None,
        }
    }

    pub fn already_running(provider: impl Into<String>) -> Self {
        let mut report = Self::new(provider);
        report.status = SyncStatus::AlreadyRunning;
        report.messages.push("Synchronization already in progress".to_string());
        report
    }

    /// `1` completed, `0` nothing done, `-1` aborted.
    pub fn res(&self) -> i8 {
        self.status.code()
    }

    pub fn synced_flows(&self) -> usize {
        self.synced
    }

    pub fn already_exist(&self) -> usize {
        self.skipped
    }

    pub fn message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// One-line summary stored on the anchor call.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "status={} discovered={} synced={} skipped={} failed={}",
            self.res(),
            self.discovered,
            self.synced,
            self.skipped,
            self.failed
        );
        if let Some(flow_id) = &self.last_synced_flow {
            summary.push_str(&format!(" last_synced={flow_id}"));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn res_codes_follow_status() {
        let mut report = SyncReport::new("acme");
        assert_eq!(report.res(), 1);
        report.status = SyncStatus::Aborted;
        assert_eq!(report.res(), -1);
        assert_eq!(SyncReport::already_running("acme").res(), 0);
    }

    #[test]
    fn summary_mentions_last_synced_flow() {
        let mut report = SyncReport::new("acme");
        report.discovered = 3;
        report.synced = 2;
        report.skipped = 1;
        report.last_synced_flow = Some("f-2".into());
        assert_eq!(report.already_exist(), 1);
        assert_eq!(
            report.summary(),
            "status=1 discovered=3 synced=2 skipped=1 failed=0 last_synced=f-2"
        );
    }
}
