//! Flow synchronization engine
//!
//! Discovers flows updated since a lower bound, orders them by `updatedAt`,
//! drops the ones already in the ledger and classifies the rest one by one.
//! The first failing flow aborts the batch: the watermark is the highest
//! committed `updatedAt`, so continuing past a failure would skip it for good.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use pdpsync_domain::{
    CallType, Flow, FlowOutcome, FlowSearchQuery, FlowSearchResponse, PdpError, Result,
    SyncReport, SyncRequest, SyncStatus,
};
use tracing::{debug, error, info, instrument, warn};

use super::classifier::sync_flow;
use super::context::SyncContext;
use crate::provider::{search_request, FlowApi};

const NO_FLOWS: &str = "No flows to synchronize";

/// Runs synchronizations, at most one at a time per provider
#[derive(Debug, Default, Clone)]
pub struct SyncEngine {
    running: Arc<Mutex<HashSet<String>>>,
}

struct RunGuard {
    running: Arc<Mutex<HashSet<String>>>,
    provider: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.provider);
    }
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self, provider: &str) -> bool {
        self.running.lock().unwrap_or_else(PoisonError::into_inner).contains(provider)
    }

    fn try_acquire(&self, provider: &str) -> Option<RunGuard> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        running
            .insert(provider.to_string())
            .then(|| RunGuard { running: Arc::clone(&self.running), provider: provider.to_string() })
    }

    /// Synchronize flows updated after `request.sync_from`.
    ///
    /// Never fails: errors are folded into an aborted report. The report
    /// summary is written back onto the anchor call when one was recorded.
    #[instrument(skip(self, ctx), fields(provider = %ctx.provider_name()))]
    pub async fn sync_flows(&self, ctx: &SyncContext, request: SyncRequest) -> SyncReport {
        let provider = ctx.provider_name().to_string();
        let Some(_guard) = self.try_acquire(&provider) else {
            info!("Synchronization already in progress, skipping");
            return SyncReport::already_running(provider);
        };

        let mut report = SyncReport::new(&provider);
        if let Err(err) = run(ctx, request, &mut report).await {
            error!(error = %err, "Synchronization failed before processing flows");
            report.status = SyncStatus::Aborted;
            report.message(format!("Synchronization failed before processing flows: {err}"));
            report.suggestions.push(match &err {
                PdpError::Auth(_) => "Check the provider credentials and API key".to_string(),
                PdpError::Transport { .. } => {
                    "Re-run the synchronization later or widen the sync window".to_string()
                }
                _ => "Inspect the provider response before re-running".to_string(),
            });
            attach_debug(ctx, &mut report, &err);
        }

        if let Some(call_id) = report.call_id {
            if let Err(err) = ctx.calls.record_summary(call_id, &report.summary()).await {
                warn!(call_id, error = %err, "Failed to record synchronization summary");
            }
        }

        info!(
            res = report.res(),
            discovered = report.discovered,
            synced = report.synced,
            skipped = report.skipped,
            failed = report.failed,
            "Synchronization finished"
        );
        report
    }
}

/// Request resuming from the ledger watermark, `overlap` earlier.
///
/// Flows inside the overlap are filtered out by the ledger, so re-reading
/// them only costs the search.
pub async fn resume_request(ctx: &SyncContext, overlap: Duration, limit: u32) -> Result<SyncRequest> {
    let watermark = ctx.documents.watermark(ctx.provider_name()).await?;
    Ok(SyncRequest {
        sync_from: watermark.map(|mark| (mark - overlap).max(DateTime::UNIX_EPOCH)),
        limit,
    })
}

async fn run(ctx: &SyncContext, request: SyncRequest, report: &mut SyncReport) -> Result<()> {
    let updated_after = request.sync_from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let mut limit = request.limit;

    if limit == 0 {
        let page_size = ctx.provider.config().discovery_page_size.max(1);
        let discovery = ctx
            .provider
            .search_flows(&FlowSearchQuery { updated_after, limit: page_size }, None)
            .await?;
        debug!(total = discovery.total, "Discovery search");
        if discovery.total == 0 {
            report.message(NO_FLOWS);
            return Ok(());
        }
        limit = u32::try_from(discovery.total).unwrap_or(u32::MAX);
    }

    let response = ctx
        .provider
        .call_api(
            search_request(&FlowSearchQuery { updated_after, limit })
                .logged_as(CallType::Synchronization),
        )
        .await?;
    report.call_id = response.call_id;
    let page: FlowSearchResponse = response.json()?;

    report.discovered = page.results.len();
    if page.results.is_empty() {
        report.message(NO_FLOWS);
        return Ok(());
    }

    let pending = pending_flows(ctx, page.results).await?;
    report.skipped = report.discovered - pending.len();
    debug!(pending = pending.len(), already_present = report.skipped, "Idempotency filter applied");

    for flow in pending {
        match process_flow(ctx, &flow, report.call_id).await {
            Ok(FlowOutcome::Synced(_)) => {
                report.synced += 1;
                report.last_synced_flow = Some(flow.flow_id);
            }
            Ok(FlowOutcome::Skipped { reason, .. }) => {
                debug!(flow_id = %flow.flow_id, %reason, "Flow skipped");
                report.skipped += 1;
                report.last_synced_flow = Some(flow.flow_id);
            }
            Err(err) => {
                abort_on_flow(ctx, report, &flow, &err);
                return Ok(());
            }
        }
    }

    report.message(format!(
        "{} flow(s) synchronized, {} already present",
        report.synced, report.skipped
    ));
    Ok(())
}

/// Order by `updatedAt` and drop flows already in the ledger.
async fn pending_flows(ctx: &SyncContext, mut flows: Vec<Flow>) -> Result<Vec<Flow>> {
    // Stable sort keeps the remote order between equal timestamps.
    flows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));

    let ids: Vec<String> = flows.iter().map(|f| f.flow_id.clone()).collect();
    let known = ctx.documents.known_flow_ids(ctx.provider_name(), &ids).await?;

    let mut seen = HashSet::new();
    Ok(flows
        .into_iter()
        .filter(|flow| !known.contains(&flow.flow_id) && seen.insert(flow.flow_id.clone()))
        .collect())
}

async fn process_flow(ctx: &SyncContext, flow: &Flow, call_id: Option<i64>) -> Result<FlowOutcome> {
    let outcome = sync_flow(ctx, &flow.flow_id, call_id).await?;
    let document_id = ctx.ledger.commit_flow(outcome.effects()).await?;
    debug!(flow_id = %flow.flow_id, document_id, "Flow committed");
    Ok(outcome)
}

fn abort_on_flow(ctx: &SyncContext, report: &mut SyncReport, flow: &Flow, err: &PdpError) {
    error!(flow_id = %flow.flow_id, updated_at = %flow.updated_at, error = %err, "Flow failed, aborting batch");
    report.failed += 1;
    report.status = SyncStatus::Aborted;
    report.message(format!("Synchronization aborted on flow {}: {err}", flow.flow_id));
    report.message(match &report.last_synced_flow {
        Some(last) => format!("Last synchronized flow: {last}"),
        None => "No flow was synchronized in this run".to_string(),
    });
    report.suggestions.push(if err.is_retriable() {
        "Re-run the synchronization; it resumes after the last synchronized flow".to_string()
    } else {
        format!("Investigate flow {} before re-running the synchronization", flow.flow_id)
    });
    attach_debug(ctx, report, err);
}

fn attach_debug(ctx: &SyncContext, report: &mut SyncReport, err: &PdpError) {
    if ctx.debug {
        report.debug_detail = Some(format!("{err:?}"));
    }
}
