//! Supplier invoice importer backed by an inbox directory.
//!
//! Received documents are written to `{inbox}/{flowId}.xml` and
//! `{inbox}/{flowId}.pdf` for the host ERP to pick up, and a supplier invoice
//! row is registered under the flow's tracking reference. The supplier row is
//! the only record of a finished import; files left by a failed attempt are
//! removed and overwritten on retry.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use pdpsync_core::{InvoiceGateway, InvoiceImporter};
use pdpsync_domain::{ImportOutcome, InvoiceDirection, ReceivedInvoice, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::database::SqliteInvoiceGateway;
use crate::errors::InfraError;

pub struct InboxImporter {
    inbox_dir: PathBuf,
    invoices: Arc<SqliteInvoiceGateway>,
}

impl InboxImporter {
    pub fn new(inbox_dir: impl Into<PathBuf>, invoices: Arc<SqliteInvoiceGateway>) -> Self {
        Self { inbox_dir: inbox_dir.into(), invoices }
    }

    fn document_path(&self, flow_id: &str, extension: &str) -> PathBuf {
        self.inbox_dir.join(format!("{}.{extension}", file_stem(flow_id)))
    }
}

#[async_trait]
impl InvoiceImporter for InboxImporter {
    async fn import(&self, received: &ReceivedInvoice) -> Result<ImportOutcome> {
        let flow = &received.flow;
        let reference = flow.tracking_id.as_deref().unwrap_or(&flow.flow_id);
        let document_path = self.document_path(&flow.flow_id, "xml");
        let readable_path = self.document_path(&flow.flow_id, "pdf");

        if let Some(existing) =
            self.invoices.find_by_direction(reference, InvoiceDirection::Supplier).await?
        {
            debug!(flow_id = %flow.flow_id, reference, "Supplier invoice already imported");
            return Ok(ImportOutcome::AlreadyExists { invoice_id: Some(existing.id) });
        }

        let imported = async {
            fs::create_dir_all(&self.inbox_dir).await.map_err(InfraError::from)?;
            fs::write(&document_path, &received.document).await.map_err(InfraError::from)?;
            if !received.readable.is_empty() {
                fs::write(&readable_path, &received.readable).await.map_err(InfraError::from)?;
            }

            let source = document_path.to_string_lossy();
            self.invoices
                .insert_invoice(reference, InvoiceDirection::Supplier, Some(source.as_ref()))
                .await
        }
        .await;

        match imported {
            Ok(invoice_id) => {
                info!(flow_id = %flow.flow_id, reference, invoice_id, "Supplier invoice imported");
                Ok(ImportOutcome::Created { invoice_id })
            }
            Err(err) => {
                remove_partial(&[document_path, readable_path]).await;
                Err(err)
            }
        }
    }
}

async fn remove_partial(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed partial import file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Could not remove partial import file"),
        }
    }
}

/// File name safe rendition of a flow id.
fn file_stem(flow_id: &str) -> String {
    flow_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_ids_become_safe_file_names() {
        assert_eq!(file_stem("f-1/2 x"), "f-1_2_x");
        assert_eq!(file_stem("abc.DEF_9"), "abc.DEF_9");
    }
}
