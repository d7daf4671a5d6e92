//! Row mapping shared by the SQL stores.
//!
//! Instants are stored as RFC 3339 UTC text with second precision, so that string order
//! equals time order and range filters can run in SQL.

use crate::error::DbError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use studyslot_common::{BookingRequest, BookingStatus, EventReference, Participant};

pub(crate) const BOOKING_COLUMNS: &str = "id, participant_id, slot_start, slot_end, status, \
     created_at, decided_at, decided_by, external_event_id, version";

pub(crate) const PARTICIPANT_COLUMNS: &str = "id, name, email, token, revoked, created_at";

pub(crate) fn encode_time(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn decode_time(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::DecodeError(format!("bad timestamp {value:?}: {e}")))
}

fn get<'r, T>(row: &'r AnyRow, column: &str) -> Result<T, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get(column)
        .map_err(|e| DbError::DecodeError(format!("column {column}: {e}")))
}

pub(crate) fn booking_from_row(row: &AnyRow) -> Result<BookingRequest, DbError> {
    let status: String = get(row, "status")?;
    let decided_at: Option<String> = get(row, "decided_at")?;
    let external_event: Option<String> = get(row, "external_event_id")?;

    Ok(BookingRequest {
        id: get(row, "id")?,
        participant_id: get(row, "participant_id")?,
        slot_start: decode_time(&get::<String>(row, "slot_start")?)?,
        slot_end: decode_time(&get::<String>(row, "slot_end")?)?,
        status: status
            .parse::<BookingStatus>()
            .map_err(DbError::DecodeError)?,
        created_at: decode_time(&get::<String>(row, "created_at")?)?,
        decided_at: decided_at.as_deref().map(decode_time).transpose()?,
        decided_by: get(row, "decided_by")?,
        external_event: external_event.map(EventReference),
        version: get(row, "version")?,
    })
}

pub(crate) fn participant_from_row(row: &AnyRow) -> Result<Participant, DbError> {
    let revoked: i64 = get(row, "revoked")?;
    Ok(Participant {
        id: get(row, "id")?,
        name: get(row, "name")?,
        email: get(row, "email")?,
        token: get(row, "token")?,
        revoked: revoked != 0,
        created_at: decode_time(&get::<String>(row, "created_at")?)?,
    })
}
