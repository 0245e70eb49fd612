//! Per-target request tickets.
//!
//! Requests are never cancelled, so responses can land in any order. Each
//! request takes a ticket for its target before suspending; when it resumes
//! it may only apply its result if no newer ticket for the same target has
//! already completed.
//!
//! A request either `complete`s its ticket, which shadows every older one,
//! or `abandon`s it, which shadows nothing. Page reads complete on failure
//! too, since an older slice may belong to a page the user has left. Writes
//! abandon on failure, so a rejected newer write never hides an older one
//! the backend accepted.
//!
//! A target's bookkeeping is dropped once it has no outstanding tickets.

use std::collections::HashMap;

/// What a request is about. Tickets only order requests with equal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Any page read that replaces the displayed slice.
    PageFetch,
    /// A write to one todo.
    Todo(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    target: Target,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct Slot {
    issued: u64,
    completed: u64,
    outstanding: usize,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    slots: HashMap<Target, Slot>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, target: Target) -> Ticket {
        let slot = self.slots.entry(target).or_default();
        slot.issued += 1;
        slot.outstanding += 1;
        Ticket {
            target,
            seq: slot.issued,
        }
    }

    /// Mark `ticket` complete. Returns false when a newer request for the
    /// same target already completed, in which case the caller must drop
    /// its result.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        let Some(slot) = self.slots.get_mut(&ticket.target) else {
            return false;
        };
        let current = ticket.seq > slot.completed;
        if current {
            slot.completed = ticket.seq;
        }
        self.release(ticket.target);
        current
    }

    /// Give up `ticket` without shadowing older requests.
    pub fn abandon(&mut self, ticket: Ticket) {
        if self.slots.contains_key(&ticket.target) {
            self.release(ticket.target);
        }
    }

    fn release(&mut self, target: Target) {
        if let Some(slot) = self.slots.get_mut(&target) {
            slot.outstanding = slot.outstanding.saturating_sub(1);
            if slot.outstanding == 0 {
                self.slots.remove(&target);
            }
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.len()
    }
}
