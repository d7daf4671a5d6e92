//! SQL implementation of [`ParticipantStore`].

use crate::error::DbError;
use crate::repositories::codec::{encode_time, participant_from_row, PARTICIPANT_COLUMNS};
use crate::DbClient;
use async_trait::async_trait;
use chrono::Utc;
use studyslot_common::{Participant, ParticipantId, ParticipantStore, StoreError};
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SqlParticipantStore {
    db_client: DbClient,
}

impl SqlParticipantStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

#[async_trait]
impl ParticipantStore for SqlParticipantStore {
    async fn create_participant(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Participant, StoreError> {
        debug!("Creating participant {} <{}>", name, email);
        let query = format!(
            "INSERT INTO participants (name, email, token, revoked, created_at) \
             VALUES ($1, $2, $3, 0, $4) RETURNING {PARTICIPANT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(name)
            .bind(email)
            .bind(Uuid::new_v4().simple().to_string())
            .bind(encode_time(Utc::now()))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert participant: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let participant = participant_from_row(&row)?;
        info!("Participant {} created", participant.id);
        Ok(participant)
    }

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(row.as_ref().map(participant_from_row).transpose()?)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Participant>, StoreError> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE token = $1");
        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(row.as_ref().map(participant_from_row).transpose()?)
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY id");
        let rows = sqlx::query(&query)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(rows
            .iter()
            .map(participant_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn revoke_participant(&self, id: ParticipantId) -> Result<Participant, StoreError> {
        let query = format!(
            "UPDATE participants SET revoked = 1 WHERE id = $1 RETURNING {PARTICIPANT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to revoke participant {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?
            .ok_or_else(|| StoreError::NotFound(format!("participant {id}")))?;

        info!("Participant {} revoked", id);
        Ok(participant_from_row(&row)?)
    }

    async fn delete_participant(&self, id: ParticipantId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete participant {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(result.rows_affected() > 0)
    }
}
