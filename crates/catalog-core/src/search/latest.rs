//! As-you-type query supersession.

use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks the most recently issued query.
///
/// Every search takes a ticket before it runs. When it finishes, its result
/// is delivered only if no newer ticket was issued meanwhile; a superseded
/// search still runs to completion, its result is just dropped.
#[derive(Debug, Default)]
pub struct LatestQuery {
    generation: AtomicU64,
}

/// Proof of which query generation a search belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

impl LatestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every earlier ticket.
    pub fn issue(&self) -> QueryTicket {
        QueryTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}
