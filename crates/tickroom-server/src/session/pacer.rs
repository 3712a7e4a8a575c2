//! Tick pacing for outbound sends.
//!
//! Every paced send takes a ticket, then waits until (a) a `release()` has
//! happened after the ticket was issued and (b) every earlier ticket has
//! written or given up. (a) coalesces writes onto the room tick, (b) keeps
//! writes in registration order. State lives in a `watch` channel, which
//! doubles as lock and wake-up signal.

use std::collections::BTreeSet;

use tokio::sync::watch;

use tickroom_core::error::{Result, RoomError};

#[derive(Debug, Default)]
struct PacerState {
    /// Next ticket to hand out.
    next_ticket: u64,
    /// Tickets below this value have been released by a tick.
    released_below: u64,
    /// Ticket allowed to write now.
    next_write: u64,
    /// Tickets dropped before their turn came up.
    abandoned: BTreeSet<u64>,
    closed: bool,
}

impl PacerState {
    fn advance_past(&mut self, ticket: u64) {
        if self.next_write != ticket {
            self.abandoned.insert(ticket);
            return;
        }
        self.next_write += 1;
        while self.abandoned.remove(&self.next_write) {
            self.next_write += 1;
        }
    }
}

pub struct Pacer {
    state: watch::Sender<PacerState>,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PacerState::default());
        Self { state }
    }

    /// Register and wait for this caller's turn to write.
    ///
    /// The returned `Turn` must be held for the duration of the write; dropping
    /// it passes the turn on.
    pub async fn acquire(&self) -> Result<Turn<'_>> {
        let mut ticket = 0;
        self.state.send_if_modified(|s| {
            ticket = s.next_ticket;
            s.next_ticket += 1;
            false
        });
        let turn = Turn {
            pacer: self,
            ticket,
        };

        let mut rx = self.state.subscribe();
        let closed = match rx
            .wait_for(|s| s.closed || (ticket < s.released_below && s.next_write == ticket))
            .await
        {
            Ok(s) => s.closed,
            Err(_) => true,
        };

        if closed {
            return Err(RoomError::ConnectionClosed);
        }
        Ok(turn)
    }

    /// Release every ticket issued so far. No-op when nothing is waiting.
    pub fn release(&self) {
        self.state.send_if_modified(|s| {
            if s.released_below == s.next_ticket {
                return false;
            }
            s.released_below = s.next_ticket;
            true
        });
    }

    /// Fail all current and future waiters with `ConnectionClosed`.
    pub fn close(&self) {
        self.state.send_if_modified(|s| {
            if s.closed {
                return false;
            }
            s.closed = true;
            true
        });
    }

    /// Tickets issued but not yet released.
    pub fn waiting(&self) -> u64 {
        let s = self.state.borrow();
        s.next_ticket - s.released_below
    }
}

/// Permission to write, held by exactly one sender at a time.
pub struct Turn<'a> {
    pacer: &'a Pacer,
    ticket: u64,
}

impl Turn<'_> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.pacer.state.send_modify(|s| s.advance_past(ticket));
    }
}
