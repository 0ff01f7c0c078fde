// src/ingest/ledger.rs

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;

use crate::errors::{CalcdagError, Result};
use crate::ingest::Submission;

/// Idempotency tokens already used for a submission.
///
/// An explicit store owned by whoever runs ingestion, not process-global
/// state. A repeated token maps back to the submission it first produced.
#[derive(Debug, Default)]
pub struct SubmissionLedger {
    seen: Mutex<HashMap<String, Submission>>,
}

impl SubmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, token: &str) -> Result<Option<Submission>> {
        Ok(self.lock()?.get(token).cloned())
    }

    pub fn record(&self, token: &str, submission: &Submission) -> Result<()> {
        self.lock()?
            .entry(token.to_string())
            .or_insert_with(|| submission.clone());
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Submission>>> {
        self.seen
            .lock()
            .map_err(|_| CalcdagError::Other(anyhow!("submission ledger lock poisoned")))
    }
}
