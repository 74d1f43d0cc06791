//! Upload progress channel
//!
//! The transport reports progress through a [`ProgressReporter`] instead of a
//! callback closure. The reporter enforces the ordering guarantee at the
//! source: values are clamped to `0..=100` and never decrease. The receiving
//! side tags each value with the submission generation before it reaches the
//! upload session.

use tokio::sync::mpsc;

/// Sending half of an upload's progress channel.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<u8>,
    last: Option<u8>,
}

/// Receiving half of an upload's progress channel.
pub type ProgressReceiver = mpsc::UnboundedReceiver<u8>;

impl ProgressReporter {
    /// Create a reporter and the receiver that observes it.
    pub fn channel() -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, last: None }, rx)
    }

    /// Report a percentage. Values above 100 are clamped; repeats and
    /// regressions are dropped.
    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        // Receiver gone means nobody is interested any more (session reset).
        let _ = self.tx.send(percent);
    }

    /// Report progress as `sent` out of `total` bytes.
    ///
    /// A zero `total` counts as complete.
    pub fn report_bytes(&mut self, sent: u64, total: u64) {
        let percent = if total == 0 {
            100
        } else {
            (sent.min(total).saturating_mul(100) / total) as u8
        };
        self.report(percent);
    }

    /// Last value delivered, if any.
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Whether the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
