use std::sync::atomic::{AtomicU64, Ordering};

/// Issued when a fetch or mutation starts; higher tickets were issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request counter. A response may be applied only if no request
/// issued after it has already been applied.
///
/// `admit` must run while holding the write lock of the state it guards,
/// otherwise two admitted responses could still land in the wrong order.
#[derive(Debug, Default)]
pub struct RequestGate {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn admit(&self, ticket: Ticket) -> bool {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        previous < ticket.0
    }
}
