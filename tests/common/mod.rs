//! Shared helpers for integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use webcrawl::DataProcessor;

/// Processor that keeps every fed body so tests can count ingestions.
#[derive(Debug, Default)]
pub struct CollectingProcessor {
    bodies: Mutex<Vec<String>>,
}

impl CollectingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fed_count(&self) -> usize {
        self.bodies.lock().len()
    }
}

#[async_trait]
impl DataProcessor for CollectingProcessor {
    async fn feed(&self, body: &str) -> anyhow::Result<()> {
        self.bodies.lock().push(body.to_owned());
        Ok(())
    }
}
