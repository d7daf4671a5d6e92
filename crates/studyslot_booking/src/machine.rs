// --- File: crates/studyslot_booking/src/machine.rs ---
//! Lifecycle rules of a single booking request.
//!
//! ```text
//! pending  -> approved | rejected | cancelled | expired
//! approved -> confirmed | pending | cancelled
//! confirmed, rejected, cancelled, expired: terminal
//! ```
//!
//! `confirmed` is only reachable through [`Transition::Confirm`], which carries the
//! external event reference, so a confirmed request always has one.

use chrono::{DateTime, Utc};
use studyslot_common::{BookingError, BookingEvent, BookingRequest, BookingStatus, EventReference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Approve { at: DateTime<Utc>, by: String },
    Reject { at: DateTime<Utc>, by: String },
    Confirm { event: EventReference },
    /// Back from `approved` to `pending` so the admin can decide again.
    Reopen,
    Cancel,
    Expire,
}

impl Transition {
    /// The domain event announcing this transition for the stored `request`.
    pub fn event(&self, request: BookingRequest) -> BookingEvent {
        match self {
            Transition::Approve { .. } => BookingEvent::BookingApproved(request),
            Transition::Reject { .. } => BookingEvent::BookingRejected(request),
            Transition::Confirm { .. } => BookingEvent::BookingConfirmed(request),
            Transition::Reopen => BookingEvent::BookingReopened(request),
            Transition::Cancel => BookingEvent::BookingCancelled(request),
            Transition::Expire => BookingEvent::BookingExpired(request),
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            Transition::Approve { .. } => BookingStatus::Approved,
            Transition::Reject { .. } => BookingStatus::Rejected,
            Transition::Confirm { .. } => BookingStatus::Confirmed,
            Transition::Reopen => BookingStatus::Pending,
            Transition::Cancel => BookingStatus::Cancelled,
            Transition::Expire => BookingStatus::Expired,
        }
    }
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Pending, Expired)
            | (Approved, Confirmed)
            | (Approved, Pending)
            | (Approved, Cancelled)
    )
}

/// Applies `transition` to `request` in place.
///
/// The request is left untouched when the move is not allowed.
pub fn apply(request: &mut BookingRequest, transition: &Transition) -> Result<(), BookingError> {
    let to = transition.target();
    if !can_transition(request.status, to) {
        return Err(BookingError::InvalidTransition {
            from: request.status,
            to,
        });
    }

    request.status = to;
    match transition {
        Transition::Approve { at, by } | Transition::Reject { at, by } => {
            request.decided_at = Some(*at);
            request.decided_by = Some(by.clone());
        }
        Transition::Confirm { event } => {
            request.external_event = Some(event.clone());
        }
        Transition::Reopen => {
            request.decided_at = None;
            request.decided_by = None;
        }
        Transition::Cancel | Transition::Expire => {}
    }
    Ok(())
}
