#[cfg(test)]
mod tests {
    use crate::messages::MessageComposer;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;
    use studyslot_common::{BookingEvent, BookingRequest, BookingStatus, Participant, SettingKey};

    fn composer() -> MessageComposer {
        MessageComposer::new(
            Tz::America__Toronto,
            "User Study <no-reply@example.com>",
            "https://study.example.com/",
        )
    }

    fn ada() -> Participant {
        Participant {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            token: "tok123".to_string(),
            revoked: false,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn request(status: BookingStatus) -> BookingRequest {
        // 14:00 Toronto (EDT, UTC-4)
        let start = Utc.with_ymd_and_hms(2025, 5, 5, 18, 0, 0).unwrap();
        BookingRequest {
            id: 9,
            participant_id: 1,
            slot_start: start,
            slot_end: start + chrono::Duration::hours(1),
            status,
            created_at: start,
            decided_at: None,
            decided_by: None,
            external_event: None,
            version: 0,
        }
    }

    #[test]
    fn test_when_is_rendered_in_operating_timezone() {
        let r = request(BookingStatus::Confirmed);
        assert_eq!(
            composer().when(r.slot_start, r.slot_end),
            "Mon May 5, 2:00 PM – 3:00 PM (America/Toronto time)"
        );
    }

    #[test]
    fn test_confirmation_message() {
        let message = composer()
            .for_event(&BookingEvent::BookingConfirmed(request(BookingStatus::Confirmed)), &ada())
            .unwrap();

        assert_eq!(message.to, "Ada <ada@example.org>");
        assert!(message.subject.contains("CONFIRMED"));
        assert!(message.body.contains("Mon May 5, 2:00 PM"));
    }

    #[test]
    fn test_internal_transitions_send_nothing() {
        let r = request(BookingStatus::Approved);
        assert!(composer()
            .for_event(&BookingEvent::BookingApproved(r.clone()), &ada())
            .is_none());
        assert!(composer()
            .for_event(&BookingEvent::BookingSyncFailed(r), &ada())
            .is_none());
    }

    #[test]
    fn test_invitation_carries_booking_link() {
        let template = SettingKey::InvitationTemplate.default_value();
        let message = composer().invitation(&ada(), template);
        assert!(message.body.starts_with("Hi Ada,"));
        assert!(message.body.contains("https://study.example.com/invite/tok123"));
        assert!(message.body.contains("https://study.example.com/api/consent"));
    }

    #[test]
    fn test_invitation_uses_edited_template() {
        let message = composer().invitation(&ada(), "Dear {{name}}, book here: {{link}}");
        assert!(message
            .body
            .starts_with("Dear Ada, book here: https://study.example.com/invite/tok123"));
        assert!(!message.body.contains("{{"));
    }
}
