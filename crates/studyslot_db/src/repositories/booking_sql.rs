//! SQL implementation of [`PersistenceStore`].

use crate::error::{is_unique_violation, DbError};
use crate::repositories::codec::{booking_from_row, encode_time, BOOKING_COLUMNS};
use crate::DbClient;
use async_trait::async_trait;
use studyslot_common::{
    BookingId, BookingRequest, BookingStatus, Interval, NewBookingRequest, ParticipantId,
    PersistenceStore, StoreError,
};
use tracing::{debug, error, info};

const ACTIVE_STATUSES: &str = "('pending', 'approved', 'confirmed')";

#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch_all<'a>(
        &self,
        query: sqlx::query::Query<'a, sqlx::Any, sqlx::any::AnyArguments<'a>>,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        let rows = query
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list bookings: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        rows.iter()
            .map(booking_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl PersistenceStore for SqlBookingStore {
    async fn list_active_requests(
        &self,
        window: &Interval,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE status IN {ACTIVE_STATUSES} AND slot_start < $1 AND slot_end > $2 \
             ORDER BY slot_start"
        );
        self.fetch_all(
            sqlx::query(&query)
                .bind(encode_time(window.end))
                .bind(encode_time(window.start)),
        )
        .await
    }

    async fn get_request(&self, id: BookingId) -> Result<Option<BookingRequest>, StoreError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load booking {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(row.as_ref().map(booking_from_row).transpose()?)
    }

    async fn list_requests(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = $1 \
                     ORDER BY created_at, id"
                );
                self.fetch_all(sqlx::query(&query).bind(status.as_str()))
                    .await
            }
            None => {
                let query =
                    format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at, id");
                self.fetch_all(sqlx::query(&query)).await
            }
        }
    }

    async fn active_requests_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE participant_id = $1 AND status IN {ACTIVE_STATUSES} ORDER BY slot_start"
        );
        self.fetch_all(sqlx::query(&query).bind(participant_id))
            .await
    }

    async fn insert(&self, request: NewBookingRequest) -> Result<BookingRequest, StoreError> {
        debug!(
            "Inserting booking for participant {} at {}",
            request.participant_id, request.slot.start
        );
        let query = format!(
            "INSERT INTO bookings (participant_id, slot_start, slot_end, status, created_at, version) \
             VALUES ($1, $2, $3, 'pending', $4, 0) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(request.participant_id)
            .bind(encode_time(request.slot.start))
            .bind(encode_time(request.slot.end))
            .bind(encode_time(request.created_at))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return StoreError::Conflict(format!(
                        "slot {} already has an active request",
                        request.slot.start
                    ));
                }
                error!("Failed to insert booking: {}", e);
                DbError::QueryError(e.to_string()).into()
            })?;

        let stored = booking_from_row(&row)?;
        info!("Booking {} stored", stored.id);
        Ok(stored)
    }

    async fn update(&self, request: &BookingRequest) -> Result<BookingRequest, StoreError> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET status = $1, decided_at = $2, decided_by = $3, external_event_id = $4, \
                 version = version + 1 \
             WHERE id = $5 AND version = $6",
        )
        .bind(request.status.as_str())
        .bind(request.decided_at.map(encode_time))
        .bind(request.decided_by.clone())
        .bind(request.external_event.as_ref().map(|e| e.0.clone()))
        .bind(request.id)
        .bind(request.version)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return StoreError::Conflict(format!(
                    "slot {} already has an active request",
                    request.slot_start
                ));
            }
            error!("Failed to update booking {}: {}", request.id, e);
            DbError::QueryError(e.to_string()).into()
        })?;

        if result.rows_affected() == 0 {
            return match self.get_request(request.id).await? {
                Some(_) => Err(StoreError::ConcurrentModification(request.id)),
                None => Err(StoreError::NotFound(format!("booking {}", request.id))),
            };
        }

        debug!("Booking {} updated to {}", request.id, request.status);
        let mut stored = request.clone();
        stored.version += 1;
        Ok(stored)
    }
}
