#[cfg(test)]
mod tests {
    use crate::auth::{create_calendar_hub, GcalSetupError};
    use studyslot_config::GcalConfig;

    fn config(key_path: Option<&str>) -> GcalConfig {
        GcalConfig {
            key_path: key_path.map(str::to_string),
            calendar_id: Some("primary".to_string()),
            event_summary: "User Study".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_calendar_hub_missing_key_path() {
        let result = create_calendar_hub(&config(None)).await;
        assert!(matches!(result, Err(GcalSetupError::MissingKeyPath)));
    }

    #[tokio::test]
    async fn test_create_calendar_hub_invalid_key_path() {
        let result = create_calendar_hub(&config(Some("./does-not-exist/service_account.json"))).await;

        match result {
            Ok(_) => panic!("Expected an error but got Ok"),
            Err(err) => {
                assert!(matches!(err, GcalSetupError::Io(_)));
                let err_string = err.to_string();
                assert!(
                    err_string.contains("No such file") || err_string.contains("cannot find"),
                    "Error should mention the missing file, got: {}",
                    err_string
                );
            }
        }
    }
}
