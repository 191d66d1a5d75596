use std::sync::atomic::{AtomicU64, Ordering};

const IDLE: u64 = 0;

/// Non-blocking single-permit gate.
///
/// The holder slot stores the ticket of the flight that owns the permit (`0` = idle).
/// A permit only releases its own ticket, so after [`FlightGate::reset`] a late
/// finishing flight cannot free a newer flight's permit.
#[derive(Debug, Default)]
pub(crate) struct FlightGate {
    holder: AtomicU64,
    next_ticket: AtomicU64,
}

/// Proof of holding the gate; releases on drop (including unwinding).
#[derive(Debug)]
pub(crate) struct FlightPermit<'a> {
    gate: &'a FlightGate,
    ticket: u64,
}

impl FlightGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or `None` when another flight holds it.
    pub(crate) fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        self.holder
            .compare_exchange(IDLE, ticket, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { gate: self, ticket })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.holder.load(Ordering::Acquire) != IDLE
    }

    /// Force the gate idle regardless of who holds it.
    pub(crate) fn reset(&self) {
        self.holder.store(IDLE, Ordering::Release);
    }
}

impl FlightPermit<'_> {
    pub(crate) fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        let _ = self.gate.holder.compare_exchange(
            self.ticket,
            IDLE,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/flight.rs"]
mod tests;
