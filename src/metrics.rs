//! Per-node counters.
//!
//! Every [`Node`](crate::node::Node) keeps a [`NodeStats`] that is updated as rows flow through
//! it. The counters mirror the emission channels: `opened` counts entities handed to the
//! immediate emitter channel and `flushed` counts entities handed to the previous-entity channel,
//! whether or not a sink is registered on either.

/// Counters recorded by a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
  /// Rows routed to this node (by the driver or by its parent).
  pub rows: u64,
  /// Transitions run, including the end-of-stream transition.
  pub transitions: u64,
  /// Entities built and made current.
  pub opened: u64,
  /// Entities completed and demoted by a later transition.
  pub flushed: u64,
}

impl NodeStats {
  /// Number of entities opened but not yet flushed.
  ///
  /// This is at most one at any point in a stream, and zero once end-of-stream has been
  /// signaled.
  pub fn open(&self) -> u64 {
    self.opened - self.flushed
  }

  pub(crate) fn record_row(&mut self) {
    self.rows += 1;
  }

  pub(crate) fn record_transition(&mut self) {
    self.transitions += 1;
  }

  pub(crate) fn record_opened(&mut self) {
    self.opened += 1;
  }

  pub(crate) fn record_flushed(&mut self) {
    self.flushed += 1;
  }
}
