//! Per-flow lifecycle classification
//!
//! Routes one remote flow to the branch handling its type and returns the
//! effects to commit. Nothing is written locally here except by the supplier
//! invoice importer.

use pdpsync_domain::{
    AckStatus, DocType, Document, Flow, FlowEffects, FlowOutcome, FlowType, ImportOutcome,
    Invoice, InvoiceStatusChange, PdpError, PdpInvoiceStatus, ReceivedInvoice, Result,
    TimelineEvent,
};
use tracing::{debug, info, instrument};

use super::context::SyncContext;
use crate::cdar::parse_cdar;
use crate::provider::FlowApi;

/// Classify one flow fetched by id.
///
/// `call_id` is the anchor call of the run and ends up on the ledger row.
///
/// # Errors
/// Any error is fatal for the flow: missing invoice, transport failure,
/// undecodable acknowledgement.
#[instrument(skip(ctx), fields(provider = %ctx.provider_name()))]
pub async fn sync_flow(ctx: &SyncContext, flow_id: &str, call_id: Option<i64>) -> Result<FlowOutcome> {
    let flow = ctx.provider.fetch_flow_metadata(flow_id).await?;
    if flow.flow_id != flow_id {
        return Err(PdpError::Validation(format!(
            "metadata for flow {flow_id} describes flow {}",
            flow.flow_id
        )));
    }
    debug!(flow_type = %flow.flow_type, ack = %flow.ack_status(), "Classifying flow");

    let document = Document::from_flow(&flow, ctx.provider_name(), ctx.entity(), call_id);
    match flow.flow_type {
        FlowType::CustomerInvoice => customer_invoice(ctx, &flow, document).await,
        FlowType::SupplierInvoice => supplier_invoice(ctx, flow, document).await,
        FlowType::CustomerInvoiceLC | FlowType::SupplierInvoiceLC => {
            lifecycle_event(ctx, &flow, document).await
        }
        FlowType::Unclassified => acknowledgement(ctx, &flow, document).await,
        FlowType::Manual => Err(PdpError::Validation(format!(
            "flow {flow_id} has the local-only type 'manual'"
        ))),
    }
}

async fn customer_invoice(ctx: &SyncContext, flow: &Flow, document: Document) -> Result<FlowOutcome> {
    let reference = flow.tracking_id.as_deref().filter(|r| !r.is_empty()).ok_or_else(|| {
        PdpError::Validation(format!("customer invoice flow {} has no trackingId", flow.flow_id))
    })?;
    let invoice = find_invoice(ctx, reference).await?;

    let mut effects = FlowEffects::document(document.linked_to_invoice(invoice.id));
    apply_ack_error(flow, &invoice, &mut effects);
    Ok(FlowOutcome::Synced(effects))
}

async fn supplier_invoice(ctx: &SyncContext, flow: Flow, document: Document) -> Result<FlowOutcome> {
    let converted = ctx.provider.fetch_flow_document(&flow.flow_id, DocType::Converted).await?;
    let readable = ctx.provider.fetch_flow_document(&flow.flow_id, DocType::ReadableView).await?;

    let outcome = ctx
        .importer
        .import(&ReceivedInvoice { flow, document: converted, readable })
        .await?;

    let document = match outcome.invoice_id() {
        Some(invoice_id) => document.linked_to_invoice(invoice_id),
        None => document,
    };
    let effects = FlowEffects::document(document);

    Ok(match outcome {
        ImportOutcome::Created { invoice_id } => {
            info!(invoice_id, "Supplier invoice imported");
            FlowOutcome::Synced(effects)
        }
        ImportOutcome::AlreadyExists { .. } => FlowOutcome::Skipped {
            reason: "Supplier invoice already imported".to_string(),
            effects,
        },
    })
}

async fn lifecycle_event(ctx: &SyncContext, flow: &Flow, document: Document) -> Result<FlowOutcome> {
    let xml = ctx.provider.fetch_flow_document(&flow.flow_id, DocType::Original).await?;
    let cdar = parse_cdar(&xml)?;
    let referenced = cdar.referenced();

    // The flow's own trackingId is empty for life-cycle events.
    let invoice = find_invoice(ctx, &referenced.issuer_assigned_id).await?;
    let code = referenced.process_condition_code;

    let reason = referenced.status_reason.clone().or_else(|| referenced.status_reason_code.clone());
    let message = match &reason {
        Some(reason) => format!("{code}: {reason}"),
        None => code.to_string(),
    };
    info!(invoice = %invoice.reference, lifecycle = %code, "Life-cycle status received");

    Ok(FlowOutcome::Synced(FlowEffects {
        document: document.with_cdar(&cdar).linked_to_invoice(invoice.id),
        invoice_status: Some(InvoiceStatusChange {
            invoice_id: invoice.id,
            status: PdpInvoiceStatus::Lifecycle(code),
            reason,
        }),
        timeline: Some(TimelineEvent {
            invoice_id: invoice.id,
            label: format!("PDP status {}", code.label()),
            message,
        }),
    }))
}

async fn acknowledgement(ctx: &SyncContext, flow: &Flow, document: Document) -> Result<FlowOutcome> {
    let reference = ctx
        .documents
        .tracking_ref_for_flow(ctx.provider_name(), &flow.flow_id)
        .await?
        .ok_or_else(|| {
            PdpError::NotFound(format!("no submission recorded for flow {}", flow.flow_id))
        })?;
    let invoice = find_invoice(ctx, &reference).await?;

    let mut effects =
        FlowEffects::document(document.with_tracking_ref(reference).linked_to_invoice(invoice.id));
    apply_ack_error(flow, &invoice, &mut effects);
    Ok(FlowOutcome::Synced(effects))
}

async fn find_invoice(ctx: &SyncContext, reference: &str) -> Result<Invoice> {
    ctx.invoices
        .find_by_reference(reference)
        .await?
        .ok_or_else(|| PdpError::NotFound(format!("invoice with reference {reference}")))
}

fn apply_ack_error(flow: &Flow, invoice: &Invoice, effects: &mut FlowEffects) {
    if flow.ack_status() != AckStatus::Error {
        return;
    }
    let ack = flow.acknowledgement.clone().unwrap_or_default();
    let info = ack.info.or(ack.reason_code);

    effects.invoice_status = Some(InvoiceStatusChange {
        invoice_id: invoice.id,
        status: PdpInvoiceStatus::Error,
        reason: info.clone(),
    });
    effects.timeline = Some(TimelineEvent {
        invoice_id: invoice.id,
        label: "PDP acknowledgement error".to_string(),
        message: info.unwrap_or_else(|| format!("Flow {} rejected by the platform", flow.flow_id)),
    });
}
