//! History view-model
//!
//! Fetch-and-cache layer over the service's history list and session stats.
//! A refresh issues both reads together; the view becomes `Ready` only when
//! both succeed. On failure whatever did arrive is applied and older data is
//! kept. Figures are never recomputed on the client.

use chrono::{DateTime, Local};
use truthlens_core::prelude::*;
use truthlens_core::{HistoryEntry, LoadState, SessionStats};

/// Identifier of one refresh round trip.
pub type RefreshId = u64;

#[derive(Debug)]
pub struct HistoryView {
    limit: usize,
    entries: Vec<HistoryEntry>,
    stats: Option<SessionStats>,
    load_state: LoadState,
    last_error: Option<DetectError>,
    last_updated: Option<DateTime<Local>>,
    activated: bool,
    next_refresh_id: RefreshId,
    in_flight: Option<RefreshId>,
    /// Bumped whenever a load result is applied.
    revision: u64,
}

impl HistoryView {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::new(),
            stats: None,
            load_state: LoadState::Idle,
            last_error: None,
            last_updated: None,
            activated: false,
            next_refresh_id: 1,
            in_flight: None,
            revision: 0,
        }
    }

    /// Newest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn stats(&self) -> Option<&SessionStats> {
        self.stats.as_ref()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn last_error(&self) -> Option<&DetectError> {
        self.last_error.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stats worth showing: present and non-empty.
    pub fn has_stats(&self) -> bool {
        self.stats.as_ref().is_some_and(|s| s.total_detections > 0)
    }

    /// The view became visible. Only the first activation refreshes.
    pub fn activate(&mut self) -> Option<RefreshId> {
        if self.activated {
            return None;
        }
        self.activated = true;
        self.refresh()
    }

    /// Start a refresh, unless one is already in flight.
    ///
    /// Returns the id the caller must hand back to [`HistoryView::apply`].
    pub fn refresh(&mut self) -> Option<RefreshId> {
        if let Some(id) = self.in_flight {
            debug!("History refresh {} in flight, coalescing", id);
            return None;
        }

        let id = self.next_refresh_id;
        self.next_refresh_id += 1;
        self.in_flight = Some(id);
        self.activated = true;
        self.load_state = LoadState::Loading;
        debug!("History refresh {} started (limit {})", id, self.limit);
        Some(id)
    }

    /// Apply the outcome of both reads.
    ///
    /// Results are applied in arrival order; each successful read replaces its
    /// cached value even when the other read failed.
    pub fn apply(
        &mut self,
        refresh_id: RefreshId,
        history: std::result::Result<Vec<HistoryEntry>, DetectError>,
        stats: std::result::Result<SessionStats, DetectError>,
    ) {
        if self.in_flight == Some(refresh_id) {
            self.in_flight = None;
        }

        let mut first_error = None;

        match history {
            Ok(entries) => self.entries = entries,
            Err(e) => {
                warn!("History fetch failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match stats {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => {
                warn!("Stats fetch failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        self.load_state = if first_error.is_some() {
            LoadState::Error
        } else {
            LoadState::Ready
        };
        self.last_error = first_error;
        self.last_updated = Some(Local::now());
        self.revision += 1;

        debug!(
            "History refresh {} applied: {:?}, {} entries",
            refresh_id,
            self.load_state,
            self.entries.len()
        );
    }
}
