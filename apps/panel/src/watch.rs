//! Status polling driven through the canonicalizer.

use std::pin::pin;

use backend_client::{BackendError, Result};
use futures::{Stream, StreamExt};
use shared::{
    protocol::StatusSnapshot,
    status::{CanonicalStatus, StatusCanonicalizer},
};
use tracing::{info, warn};

/// Owns the canonicalizer for one poll loop and resets it whenever the
/// backend comes back after being unreachable.
#[derive(Debug)]
pub struct StatusWatcher {
    canonicalizer: StatusCanonicalizer,
    backend_reachable: bool,
    last: Option<CanonicalStatus>,
}

impl Default for StatusWatcher {
    fn default() -> Self {
        Self {
            canonicalizer: StatusCanonicalizer::new(),
            backend_reachable: true,
            last: None,
        }
    }
}

impl StatusWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<CanonicalStatus> {
        self.last
    }

    /// Folds one poll into the display state. Failed polls leave the state
    /// untouched and return `None`.
    pub fn observe(
        &mut self,
        poll: Result<StatusSnapshot>,
    ) -> Option<(StatusSnapshot, CanonicalStatus)> {
        let snapshot = match poll {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.record_failure(&err);
                return None;
            }
        };

        if !self.backend_reachable {
            info!("backend reachable again; clearing status history");
            self.canonicalizer.reset();
            self.backend_reachable = true;
        }

        let canonical = self.canonicalizer.canonicalize(&snapshot.raw);
        if self.last != Some(canonical) {
            info!(
                status = %canonical.status,
                cancel_latched = canonical.cancel_latched,
                state_code = snapshot.raw.state_code,
                "printer status changed"
            );
        }
        self.last = Some(canonical);
        Some((snapshot, canonical))
    }

    fn record_failure(&mut self, err: &BackendError) {
        if err.is_unavailable() {
            if self.backend_reachable {
                warn!(error = %err, "backend unreachable");
            }
            self.backend_reachable = false;
        } else {
            warn!(error = %err, "status poll failed");
        }
    }
}

/// Drains up to `limit` polls (all of them when `None`) and hands every
/// successful one to `render`. Returns how many were rendered.
pub async fn watch<S>(
    polls: S,
    limit: Option<usize>,
    mut render: impl FnMut(&StatusSnapshot, CanonicalStatus),
) -> usize
where
    S: Stream<Item = Result<StatusSnapshot>>,
{
    let mut watcher = StatusWatcher::new();
    let mut polls = pin!(polls.take(limit.unwrap_or(usize::MAX)));
    let mut rendered = 0;

    while let Some(poll) = polls.next().await {
        if let Some((snapshot, canonical)) = watcher.observe(poll) {
            render(&snapshot, canonical);
            rendered += 1;
        }
    }
    rendered
}

pub fn format_status(snapshot: &StatusSnapshot, canonical: CanonicalStatus) -> String {
    let mut line = format!("{:<9} z={:.2}mm", canonical.status.label(), snapshot.z_mm);
    if let (Some(layer), Some(count)) = (snapshot.layer, snapshot.layer_count) {
        line.push_str(&format!(" layer {layer}/{count}"));
    }
    if let Some(progress) = snapshot.progress() {
        line.push_str(&format!(" ({:.0}%)", progress * 100.0));
    }
    if let Some(path) = &snapshot.file_path {
        line.push_str(&format!(" file={path}"));
    }
    if let Some(temperature) = snapshot.temperature_c {
        line.push_str(&format!(" vat={temperature:.1}C"));
    }
    if canonical.cancel_latched {
        line.push_str(" [cancel latched]");
    }
    line
}

#[cfg(test)]
#[path = "tests/watch_tests.rs"]
mod tests;
