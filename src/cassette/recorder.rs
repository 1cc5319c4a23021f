//! Shared recording sink

use super::types::{Cassette, RecordedRequest, RecordedResponse};
use crate::error::Result;
use crate::redact::Scrubber;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Collects exchanges from one or more brokers into a cassette.
///
/// Cloning shares the underlying cassette, so a test can keep a handle
/// while the broker owns another.
#[derive(Clone, Default)]
pub struct CassetteRecorder {
    cassette: Arc<Mutex<Cassette>>,
}

impl CassetteRecorder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            cassette: Arc::new(Mutex::new(Cassette::new(name))),
        }
    }

    pub(crate) fn record(&self, request: RecordedRequest, response: RecordedResponse) {
        self.lock().push(request, response);
    }

    /// Copy of everything recorded so far, unscrubbed
    pub fn snapshot(&self) -> Cassette {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Scrub and save the recorded cassette
    pub fn save(&self, path: impl AsRef<Path>, scrubber: &Scrubber) -> Result<()> {
        self.snapshot().save(path, scrubber)
    }

    fn lock(&self) -> MutexGuard<'_, Cassette> {
        // a panic while pushing leaves a valid Vec behind
        self.cassette.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CassetteRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cassette = self.lock();
        f.debug_struct("CassetteRecorder")
            .field("name", &cassette.name)
            .field("interactions", &cassette.len())
            .finish()
    }
}
