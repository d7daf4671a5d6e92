// --- File: crates/studyslot_booking/src/service.rs ---
//! Booking operations for the calling layer.
//!
//! Every check-then-act sequence runs while holding the slot's lock, so two callers can
//! never both see a slot as available and both claim it.

use crate::availability::{AvailabilityResolver, AvailabilitySnapshot, SlotState};
use crate::dispatcher::SyncDispatcher;
use crate::grid::Schedule;
use crate::locks::KeyedLocks;
use crate::machine::{self, Transition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use studyslot_common::{
    BookingError, BookingEvent, BookingId, BookingRequest, BookingStatus, Clock, EventReference,
    ExternalCalendar, NewBookingRequest, NotificationSink, Participant, ParticipantId,
    ParticipantStore, PersistenceStore, StoreError,
};
use studyslot_config::{AppConfig, SchedulingConfig};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOptions {
    pub allow_multiple_active_per_participant: bool,
    /// Bound on every external calendar call.
    pub calendar_timeout: StdDuration,
    pub event_summary: String,
    /// Linked from the event description.
    pub consent_url: Option<String>,
}

impl Default for BookingOptions {
    fn default() -> Self {
        Self {
            allow_multiple_active_per_participant: false,
            calendar_timeout: StdDuration::from_secs(10),
            event_summary: "User Study".to_string(),
            consent_url: None,
        }
    }
}

impl BookingOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let scheduling: &SchedulingConfig = &config.scheduling;
        Self {
            allow_multiple_active_per_participant: scheduling
                .allow_multiple_active_per_participant,
            calendar_timeout: StdDuration::from_secs(scheduling.sync_timeout_secs),
            event_summary: config
                .gcal
                .as_ref()
                .map(|g| g.event_summary.clone())
                .unwrap_or_else(|| BookingOptions::default().event_summary),
            consent_url: Some(config.consent_url()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Result of an admin decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Rejected(BookingRequest),
    /// Approved and present on the external calendar.
    Confirmed(BookingRequest),
    /// Approved, but the calendar event could not be created. Retry with
    /// [`BookingService::retry_sync`].
    AwaitingSync {
        request: BookingRequest,
        error: BookingError,
    },
}

impl DecisionOutcome {
    pub fn request(&self) -> &BookingRequest {
        match self {
            DecisionOutcome::Rejected(r) | DecisionOutcome::Confirmed(r) => r,
            DecisionOutcome::AwaitingSync { request, .. } => request,
        }
    }
}

/// The collaborators a [`BookingService`] is built from.
pub struct BookingDeps {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn PersistenceStore>,
    pub participants: Arc<dyn ParticipantStore>,
    pub calendar: Arc<dyn ExternalCalendar>,
    pub sink: Arc<dyn NotificationSink>,
}

pub struct BookingService {
    schedule: Schedule,
    options: BookingOptions,
    clock: Arc<dyn Clock>,
    store: Arc<dyn PersistenceStore>,
    participants: Arc<dyn ParticipantStore>,
    sink: Arc<dyn NotificationSink>,
    resolver: AvailabilityResolver,
    dispatcher: SyncDispatcher,
    slot_locks: KeyedLocks<DateTime<Utc>>,
    participant_locks: KeyedLocks<ParticipantId>,
}

impl BookingService {
    pub fn new(schedule: Schedule, options: BookingOptions, deps: BookingDeps) -> Self {
        let resolver = AvailabilityResolver::new(
            deps.store.clone(),
            deps.calendar.clone(),
            options.calendar_timeout,
        );
        let dispatcher = SyncDispatcher::new(
            deps.store.clone(),
            deps.participants.clone(),
            deps.calendar,
            deps.sink.clone(),
            options.calendar_timeout,
            options.event_summary.clone(),
            options.consent_url.clone(),
        );
        Self {
            schedule,
            options,
            clock: deps.clock,
            store: deps.store,
            participants: deps.participants,
            sink: deps.sink,
            resolver,
            dispatcher,
            slot_locks: KeyedLocks::new(),
            participant_locks: KeyedLocks::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    // --- Reads ---

    /// Fresh snapshot of the rolling window starting today.
    pub async fn availability(&self) -> Result<AvailabilitySnapshot, BookingError> {
        let now = self.clock.now();
        let grid = self.schedule.grid_for(now);
        self.resolver.snapshot(&grid, now.with_timezone(&Utc)).await
    }

    /// The participant behind a booking link. Revoked links are refused.
    pub async fn participant_by_token(&self, token: &str) -> Result<Participant, BookingError> {
        let participant = self
            .participants
            .find_by_token(token)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking link".to_string()))?;
        if participant.revoked {
            return Err(BookingError::ParticipantRevoked(participant.id));
        }
        Ok(participant)
    }

    pub async fn request(&self, id: BookingId) -> Result<BookingRequest, BookingError> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {id}")))
    }

    pub async fn list_requests(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, BookingError> {
        Ok(self.store.list_requests(status).await?)
    }

    // --- Participant operations ---

    /// Claims the slot starting at `slot_start` with a new `pending` request.
    pub async fn create(
        &self,
        participant_id: ParticipantId,
        slot_start: DateTime<Utc>,
    ) -> Result<BookingRequest, BookingError> {
        let grid = self.schedule.grid_for(self.clock.now());
        let slot = grid.slot_at(slot_start).ok_or_else(|| {
            BookingError::InvalidSlot(format!("{slot_start} is not a bookable slot"))
        })?;

        let _slot_guard = self.slot_locks.lock(slot.start).await;
        let _participant_guard = self.participant_locks.lock(participant_id).await;

        // Checked under the participant lock: revocation and deletion take it too
        let participant = self
            .participants
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("participant {participant_id}")))?;
        if participant.revoked {
            return Err(BookingError::ParticipantRevoked(participant_id));
        }

        if !self.options.allow_multiple_active_per_participant
            && !self
                .store
                .active_requests_for_participant(participant_id)
                .await?
                .is_empty()
        {
            return Err(BookingError::ActiveBookingExists(participant_id));
        }

        let now = self.now();
        let state = self.resolver.slot_state(&slot, now, None).await?;
        if state != SlotState::Available {
            debug!("Slot {} is {:?}, refusing participant {}", slot.start, state, participant_id);
            return Err(BookingError::SlotUnavailable(slot.start));
        }

        let stored = self
            .store
            .insert(NewBookingRequest {
                participant_id,
                slot,
                created_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => BookingError::SlotUnavailable(slot.start),
                other => other.into(),
            })?;

        info!(
            "Booking {} created for participant {} at {}",
            stored.id, participant_id, slot.start
        );
        self.sink.publish(BookingEvent::BookingCreated(stored.clone()));
        Ok(stored)
    }

    /// Cancels a `pending` or `approved` request.
    pub async fn cancel(&self, id: BookingId) -> Result<BookingRequest, BookingError> {
        self.transition_locked(id, None, Transition::Cancel).await
    }

    /// Like [`cancel`](Self::cancel), but only for the participant's own request.
    pub async fn cancel_as_participant(
        &self,
        participant_id: ParticipantId,
        id: BookingId,
    ) -> Result<BookingRequest, BookingError> {
        self.transition_locked(id, Some(participant_id), Transition::Cancel)
            .await
    }

    // --- System operations ---

    /// Expires a `pending` request whose slot started at or before `cutoff`
    /// (default: now).
    ///
    /// Already expired requests and requests not yet due are returned unchanged.
    pub async fn expire(
        &self,
        id: BookingId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<BookingRequest, BookingError> {
        let cutoff = cutoff.unwrap_or_else(|| self.now());
        let slot_start = self.request(id).await?.slot_start;
        let _guard = self.slot_locks.lock(slot_start).await;

        let request = self.request(id).await?;
        match request.status {
            BookingStatus::Expired => Ok(request),
            BookingStatus::Pending if request.slot_start > cutoff => Ok(request),
            _ => self.commit(request, Transition::Expire).await,
        }
    }

    /// Expires every due `pending` request. Failures are logged and skipped.
    pub async fn expire_due(&self) -> Result<Vec<BookingRequest>, BookingError> {
        let now = self.now();
        let pending = self
            .store
            .list_requests(Some(BookingStatus::Pending))
            .await?;

        let mut expired = Vec::new();
        for request in pending.into_iter().filter(|r| r.slot_start <= now) {
            match self.expire(request.id, Some(now)).await {
                Ok(r) if r.status == BookingStatus::Expired => expired.push(r),
                Ok(_) => {}
                Err(e) => warn!("Could not expire booking {}: {}", request.id, e),
            }
        }
        if !expired.is_empty() {
            info!("Expired {} pending bookings", expired.len());
        }
        Ok(expired)
    }

    // --- Admin operations ---

    /// Applies an admin decision to a `pending` request.
    ///
    /// Approval re-checks the slot against fresh store and calendar state; if it is no
    /// longer available the request stays `pending` and `SlotUnavailable` is returned.
    pub async fn decide(
        &self,
        id: BookingId,
        decision: Decision,
        admin: &str,
    ) -> Result<DecisionOutcome, BookingError> {
        let slot_start = self.request(id).await?.slot_start;
        let _guard = self.slot_locks.lock(slot_start).await;

        let request = self.request(id).await?;
        let now = self.now();
        let transition = match decision {
            Decision::Approve => Transition::Approve {
                at: now,
                by: admin.to_string(),
            },
            Decision::Reject => Transition::Reject {
                at: now,
                by: admin.to_string(),
            },
        };
        if request.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: request.status,
                to: transition.target(),
            });
        }

        if decision == Decision::Reject {
            let rejected = self.commit(request, transition).await?;
            info!("Booking {} rejected by {}", rejected.id, admin);
            return Ok(DecisionOutcome::Rejected(rejected));
        }

        let existing = self.recheck_slot(&request, now).await?;
        let approved = self.commit(request, transition).await?;
        info!("Booking {} approved by {}", approved.id, admin);

        match self.dispatcher.confirm(&approved, existing).await {
            Ok(confirmed) => Ok(DecisionOutcome::Confirmed(confirmed)),
            Err(error @ BookingError::Sync(_)) => {
                // Re-read: the approval is stored even if recording the confirmation failed.
                let request = self.request(approved.id).await.unwrap_or(approved);
                Ok(DecisionOutcome::AwaitingSync { request, error })
            }
            Err(error) => Err(error),
        }
    }

    /// Re-attempts calendar sync for an `approved` request.
    pub async fn retry_sync(&self, id: BookingId) -> Result<BookingRequest, BookingError> {
        let slot_start = self.request(id).await?.slot_start;
        let _guard = self.slot_locks.lock(slot_start).await;

        let request = self.request(id).await?;
        if request.status != BookingStatus::Approved {
            return Err(BookingError::InvalidTransition {
                from: request.status,
                to: BookingStatus::Confirmed,
            });
        }
        let existing = self.recheck_slot(&request, self.now()).await?;
        self.dispatcher.confirm(&request, existing).await
    }

    /// Revokes the participant's booking link and cancels their `pending` and `approved`
    /// requests. Confirmed bookings are kept.
    pub async fn revoke_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Participant, BookingError> {
        let participant = {
            let _guard = self.participant_locks.lock(participant_id).await;
            self.participants.revoke_participant(participant_id).await?
        };
        let cancelled = self.cancel_open_requests(participant_id).await?;
        info!(
            "Participant {} revoked, {} open requests cancelled",
            participant_id,
            cancelled.len()
        );
        Ok(participant)
    }

    /// Revokes the participant, cancels their open requests, then deletes them.
    ///
    /// If a cancellation fails the participant stays revoked but is not deleted.
    pub async fn delete_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), BookingError> {
        self.revoke_participant(participant_id).await?;
        if !self.participants.delete_participant(participant_id).await? {
            return Err(BookingError::NotFound(format!("participant {participant_id}")));
        }
        info!("Participant {} deleted", participant_id);
        Ok(())
    }

    /// Returns an `approved` request to `pending` so it can be decided again.
    pub async fn reopen(&self, id: BookingId) -> Result<BookingRequest, BookingError> {
        self.transition_locked(id, None, Transition::Reopen).await
    }

    // --- Internals ---

    /// Approval gate: the slot must still be free, except for an event a previous sync
    /// attempt already created for this request, which is returned for adoption.
    async fn recheck_slot(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<EventReference>, BookingError> {
        let existing = self
            .dispatcher
            .find_existing(request.id)
            .await
            .map_err(|e| BookingError::CalendarUnavailable(e.to_string()))?;
        if existing.is_some() {
            return Ok(existing);
        }

        let state = self
            .resolver
            .slot_state(&request.slot(), now, Some(request.id))
            .await?;
        if state != SlotState::Available {
            info!(
                "Booking {} cannot be approved, slot {} is {:?}",
                request.id, request.slot_start, state
            );
            return Err(BookingError::SlotUnavailable(request.slot_start));
        }
        Ok(None)
    }

    async fn cancel_open_requests(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<BookingRequest>, BookingError> {
        let mut cancelled = Vec::new();
        for open in self
            .store
            .active_requests_for_participant(participant_id)
            .await?
        {
            let _guard = self.slot_locks.lock(open.slot_start).await;
            let request = self.request(open.id).await?;
            if !matches!(
                request.status,
                BookingStatus::Pending | BookingStatus::Approved
            ) {
                continue;
            }
            cancelled.push(self.leave_approved(request, Transition::Cancel).await?);
        }
        Ok(cancelled)
    }

    /// Commits a move out of `approved` other than confirmation, removing any event a
    /// failed sync left behind. Other requests are committed as is.
    async fn leave_approved(
        &self,
        request: BookingRequest,
        transition: Transition,
    ) -> Result<BookingRequest, BookingError> {
        let was_approved = request.status == BookingStatus::Approved;
        let stored = self.commit(request, transition).await?;
        if was_approved {
            self.dispatcher.release(stored.id).await;
        }
        Ok(stored)
    }

    async fn transition_locked(
        &self,
        id: BookingId,
        owner: Option<ParticipantId>,
        transition: Transition,
    ) -> Result<BookingRequest, BookingError> {
        let slot_start = self.request(id).await?.slot_start;
        let _guard = self.slot_locks.lock(slot_start).await;

        let request = self.request(id).await?;
        if owner.is_some_and(|p| p != request.participant_id) {
            return Err(BookingError::NotFound(format!("booking {id}")));
        }
        self.leave_approved(request, transition).await
    }

    /// Applies, stores, and announces one transition. The slot lock must be held.
    async fn commit(
        &self,
        mut request: BookingRequest,
        transition: Transition,
    ) -> Result<BookingRequest, BookingError> {
        machine::apply(&mut request, &transition)?;
        let stored = self.store.update(&request).await?;
        debug!("Booking {} is now {}", stored.id, stored.status);
        self.sink.publish(transition.event(stored.clone()));
        Ok(stored)
    }
}
