// --- File: crates/studyslot_booking/src/memory.rs ---
//! In-process store implementing the storage traits.
//!
//! Enforces the same rules as the SQL store: one active request per slot and
//! version-checked updates.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use studyslot_common::{
    BookingId, BookingRequest, BookingStatus, Interval, NewBookingRequest, Participant,
    ParticipantId, ParticipantStore, PersistenceStore, SettingKey, SettingsStore, StoreError,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    next_booking_id: BookingId,
    next_participant_id: ParticipantId,
    bookings: BTreeMap<BookingId, BookingRequest>,
    participants: BTreeMap<ParticipantId, Participant>,
    settings: BTreeMap<SettingKey, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn list_active_requests(
        &self,
        window: &Interval,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        Ok(self
            .state()
            .bookings
            .values()
            .filter(|r| r.status.is_active() && r.interval().overlaps(window))
            .cloned()
            .collect())
    }

    async fn get_request(&self, id: BookingId) -> Result<Option<BookingRequest>, StoreError> {
        Ok(self.state().bookings.get(&id).cloned())
    }

    async fn list_requests(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        let mut requests: Vec<BookingRequest> = self
            .state()
            .bookings
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by_key(|r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn active_requests_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        Ok(self
            .state()
            .bookings
            .values()
            .filter(|r| r.participant_id == participant_id && r.status.is_active())
            .cloned()
            .collect())
    }

    async fn insert(&self, request: NewBookingRequest) -> Result<BookingRequest, StoreError> {
        let mut state = self.state();
        let interval = request.slot.interval();
        if state
            .bookings
            .values()
            .any(|r| r.status.is_active() && r.interval().overlaps(&interval))
        {
            return Err(StoreError::Conflict(format!(
                "slot {} already has an active request",
                request.slot.start
            )));
        }

        state.next_booking_id += 1;
        let stored = BookingRequest {
            id: state.next_booking_id,
            participant_id: request.participant_id,
            slot_start: request.slot.start,
            slot_end: request.slot.end,
            status: BookingStatus::Pending,
            created_at: request.created_at,
            decided_at: None,
            decided_by: None,
            external_event: None,
            version: 0,
        };
        state.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, request: &BookingRequest) -> Result<BookingRequest, StoreError> {
        let mut state = self.state();
        let current = state
            .bookings
            .get_mut(&request.id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", request.id)))?;
        if current.version != request.version {
            return Err(StoreError::ConcurrentModification(request.id));
        }
        let mut stored = request.clone();
        stored.version += 1;
        *current = stored.clone();
        Ok(stored)
    }
}

#[async_trait]
impl ParticipantStore for InMemoryStore {
    async fn create_participant(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Participant, StoreError> {
        let mut state = self.state();
        state.next_participant_id += 1;
        let participant = Participant {
            id: state.next_participant_id,
            name: name.to_string(),
            email: email.to_string(),
            token: Uuid::new_v4().simple().to_string(),
            revoked: false,
            created_at: Utc::now(),
        };
        state
            .participants
            .insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        Ok(self.state().participants.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .state()
            .participants
            .values()
            .find(|p| p.token == token)
            .cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        Ok(self.state().participants.values().cloned().collect())
    }

    async fn revoke_participant(&self, id: ParticipantId) -> Result<Participant, StoreError> {
        let mut state = self.state();
        let participant = state
            .participants
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("participant {id}")))?;
        participant.revoked = true;
        Ok(participant.clone())
    }

    async fn delete_participant(&self, id: ParticipantId) -> Result<bool, StoreError> {
        Ok(self.state().participants.remove(&id).is_some())
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn get_setting(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        Ok(self.state().settings.get(&key).cloned())
    }

    async fn put_setting(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        self.state().settings.insert(key, value.to_string());
        Ok(())
    }
}
