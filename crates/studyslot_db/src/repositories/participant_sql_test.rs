#[cfg(test)]
mod tests {
    use crate::repositories::SqlParticipantStore;
    use crate::DbClient;
    use studyslot_common::{ParticipantStore, StoreError};

    async fn store() -> SqlParticipantStore {
        let client = DbClient::connect("sqlite::memory:", 1).await.unwrap();
        client.init_schema().await.unwrap();
        SqlParticipantStore::new(client)
    }

    #[tokio::test]
    async fn test_created_participants_get_distinct_tokens() {
        let store = store().await;
        let ada = store.create_participant("Ada", "ada@example.org").await.unwrap();
        let bob = store.create_participant("Bob", "bob@example.org").await.unwrap();

        assert_ne!(ada.token, bob.token);
        assert!(!ada.revoked);
        let found = store.find_by_token(&bob.token).await.unwrap().unwrap();
        assert_eq!(found, bob);
        assert!(store.find_by_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_keeps_participant_but_marks_it() {
        let store = store().await;
        let ada = store.create_participant("Ada", "ada@example.org").await.unwrap();

        let revoked = store.revoke_participant(ada.id).await.unwrap();
        assert!(revoked.revoked);
        assert!(store.get_participant(ada.id).await.unwrap().unwrap().revoked);

        let err = store.revoke_participant(404).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_participant() {
        let store = store().await;
        let ada = store.create_participant("Ada", "ada@example.org").await.unwrap();

        assert!(store.delete_participant(ada.id).await.unwrap());
        assert!(!store.delete_participant(ada.id).await.unwrap());
        assert!(store.list_participants().await.unwrap().is_empty());
    }
}
