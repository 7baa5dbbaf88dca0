//! Authority-transfer cell: tracks which participant is currently
//! permitted to mutate shared agent state.
//!
//! Transfers are two-phase (begin, then commit or abort) so that at no
//! point do two participants both hold authority. Concurrent begins are
//! resolved first-writer-wins: the later request is rejected.

use std::sync::Mutex;

use thiserror::Error;

use crate::events::ParticipantId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("an authority transfer is already pending")]
    TransferPending,
}

/// A begun-but-uncommitted transfer. Consuming it via
/// [`AuthorityCell::commit`] or [`AuthorityCell::abort`] is the only way
/// to resolve it, so a pending transfer cannot be applied twice.
#[derive(Debug)]
pub struct PendingTransfer {
    ticket: u64,
    to: ParticipantId,
}

impl PendingTransfer {
    pub fn to(&self) -> ParticipantId {
        self.to
    }
}

#[derive(Debug)]
struct Inner {
    holder: Option<ParticipantId>,
    pending: Option<u64>,
    next_ticket: u64,
}

/// Single-holder authority record with atomic handoff.
#[derive(Debug)]
pub struct AuthorityCell {
    inner: Mutex<Inner>,
}

impl AuthorityCell {
    pub fn new(initial: Option<ParticipantId>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                holder: initial,
                pending: None,
                next_ticket: 0,
            }),
        }
    }

    /// The participant currently allowed to mutate agent state.
    pub fn holder(&self) -> Option<ParticipantId> {
        self.inner.lock().expect("authority lock poisoned").holder
    }

    /// Start a transfer to `to`. Fails if another transfer is in flight;
    /// the current holder keeps authority until the commit.
    pub fn begin_transfer(&self, to: ParticipantId) -> Result<PendingTransfer, AuthorityError> {
        let mut inner = self.inner.lock().expect("authority lock poisoned");
        if inner.pending.is_some() {
            return Err(AuthorityError::TransferPending);
        }
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.pending = Some(ticket);
        Ok(PendingTransfer { ticket, to })
    }

    /// Apply a begun transfer. The holder changes exactly here.
    pub fn commit(&self, transfer: PendingTransfer) {
        let mut inner = self.inner.lock().expect("authority lock poisoned");
        if inner.pending == Some(transfer.ticket) {
            inner.holder = Some(transfer.to);
            inner.pending = None;
        }
    }

    /// Discard a begun transfer, keeping the current holder.
    pub fn abort(&self, transfer: PendingTransfer) {
        let mut inner = self.inner.lock().expect("authority lock poisoned");
        if inner.pending == Some(transfer.ticket) {
            inner.pending = None;
        }
    }
}
