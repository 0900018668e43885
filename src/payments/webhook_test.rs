use super::*;

const SECRET: &str = "whsec_test_secret";
const NOW: i64 = 1_790_000_000;

fn header_for(payload: &[u8], timestamp: i64) -> String {
    format!("t={timestamp},v1={}", sign(SECRET, timestamp, payload))
}

#[test]
fn valid_signature_verifies() {
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let header = header_for(payload, NOW);
    assert_eq!(verify_signature(SECRET, &header, payload, NOW, DEFAULT_TOLERANCE_SECS), Ok(()));
}

#[test]
fn wrong_secret_is_rejected() {
    let payload = b"{}";
    let header = header_for(payload, NOW);
    assert_eq!(
        verify_signature("whsec_other", &header, payload, NOW, DEFAULT_TOLERANCE_SECS),
        Err(WebhookError::Mismatch)
    );
}

#[test]
fn tampered_payload_is_rejected() {
    let header = header_for(b"{\"amount\":100}", NOW);
    assert_eq!(
        verify_signature(SECRET, &header, b"{\"amount\":999}", NOW, DEFAULT_TOLERANCE_SECS),
        Err(WebhookError::Mismatch)
    );
}

#[test]
fn stale_timestamp_is_rejected() {
    let payload = b"{}";
    let header = header_for(payload, NOW - DEFAULT_TOLERANCE_SECS - 1);
    assert_eq!(
        verify_signature(SECRET, &header, payload, NOW, DEFAULT_TOLERANCE_SECS),
        Err(WebhookError::StaleTimestamp)
    );
}

#[test]
fn extreme_timestamps_are_stale_not_a_panic() {
    for t in [i64::MIN, i64::MAX] {
        let header = format!("t={t},v1={}", "00".repeat(32));
        assert_eq!(
            verify_signature(SECRET, &header, b"{}", NOW, DEFAULT_TOLERANCE_SECS),
            Err(WebhookError::StaleTimestamp),
            "t={t}"
        );
    }
}

#[test]
fn any_matching_v1_entry_is_enough() {
    let payload = b"{}";
    let good = sign(SECRET, NOW, payload);
    let header = format!("t={NOW},v1={},v1={good}", "00".repeat(32));
    assert_eq!(verify_signature(SECRET, &header, payload, NOW, DEFAULT_TOLERANCE_SECS), Ok(()));
}

#[test]
fn malformed_headers_are_rejected() {
    for header in ["", "v1=abcd", "t=123", "t=abc,v1=zz", "garbage"] {
        assert_eq!(
            verify_signature(SECRET, header, b"{}", NOW, DEFAULT_TOLERANCE_SECS),
            Err(WebhookError::MalformedHeader),
            "header {header:?}"
        );
    }
}

#[test]
fn parse_succeeded_event_extracts_booking() {
    let booking_id = Uuid::new_v4();
    let payload = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_42", "metadata": {"booking_id": booking_id.to_string()}}}
    })
    .to_string();
    assert_eq!(
        parse_event(payload.as_bytes()).unwrap(),
        PaymentEvent::Succeeded { intent_id: "pi_42".into(), booking_id: Some(booking_id) }
    );
}

#[test]
fn parse_refund_event_uses_charge_intent() {
    let payload = br#"{"type":"charge.refunded","data":{"object":{"id":"ch_1","payment_intent":"pi_9"}}}"#;
    assert_eq!(parse_event(payload).unwrap(), PaymentEvent::Refunded { intent_id: "pi_9".into() });
}

#[test]
fn parse_unrelated_event_is_ignored() {
    let payload = br#"{"type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;
    assert_eq!(parse_event(payload).unwrap(), PaymentEvent::Ignored("customer.created".into()));
}

#[test]
fn parse_rejects_garbage() {
    assert!(matches!(parse_event(b"not json"), Err(WebhookError::Payload(_))));
}
