//! ==============================================================================
//! store.rs - the latest-reading store
//! ==============================================================================
//!
//! purpose:
//!     holds the single most recent reading for the lifetime of the process.
//!     one writer (the device, via POST) races any number of readers (the
//!     dashboard, via GET). only the latest value is kept; there is no history.
//!
//! relationships:
//!     - uses: domain.rs (Reading, views, payload validation)
//!     - uses: clock.rs (capture time)
//!     - used by: server.rs (one handle per request via axum State)
//!     - created by: main.rs (composition root)
//!
//! locking:
//!     arc<rwlock<option<reading>>>, same shape as the dashboard state:
//!     - ingest holds the write lock across clock read + build + replace
//!     - snapshot/status hold the read lock just long enough to copy the reading
//!     a reader therefore sees either the whole old reading or the whole new one.
//!
//! ==============================================================================

use crate::clock::{Clock, SystemClock};
use crate::domain::{parse_pressure, Reading, ReadingView, StatusView};
use crate::error::IngestError;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// clone-able handle to the shared reading slot
#[derive(Clone)]
pub struct ReadingStore {
    current: Arc<RwLock<Option<Reading>>>,
    clock: Arc<dyn Clock>,
}

impl ReadingStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// validate a payload and replace the live reading with it
    ///
    /// `None` stands for a request with no (parseable) body.
    pub async fn ingest(&self, payload: Option<&Value>) -> Result<Reading, IngestError> {
        let pressure = parse_pressure(payload)?;

        let mut current = self.current.write().await;
        let now = self.clock.now();

        // capture time never moves backwards, even if the wall clock does
        let captured_at = match current.as_ref() {
            Some(previous) if previous.captured_at() > now => previous.captured_at(),
            _ => now,
        };

        let reading = Reading::new(pressure, captured_at);
        *current = Some(reading);
        Ok(reading)
    }

    /// copy of the live reading, if any
    pub async fn latest(&self) -> Option<Reading> {
        *self.current.read().await
    }

    pub async fn snapshot(&self, now: DateTime<Utc>) -> ReadingView {
        ReadingView::at(self.latest().await, now)
    }

    pub async fn status(&self, now: DateTime<Utc>) -> StatusView {
        StatusView::at(self.latest().await, now)
    }
}
