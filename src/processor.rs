//! Downstream ingestion seam
//!
//! Fetched page bodies are handed to a `DataProcessor`. Feed errors are
//! logged by the caller and never stall the pool.

use async_trait::async_trait;
use log::debug;

#[async_trait]
pub trait DataProcessor: Send + Sync {
    /// Ingest one fetched page body.
    async fn feed(&self, body: &str) -> anyhow::Result<()>;

    /// Release any downstream connections.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Sink that drops page bodies, recording only their size.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardProcessor;

#[async_trait]
impl DataProcessor for DiscardProcessor {
    async fn feed(&self, body: &str) -> anyhow::Result<()> {
        debug!("discarding {} bytes of page data", body.len());
        Ok(())
    }
}
