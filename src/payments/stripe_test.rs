use super::*;
use crate::payments::IntentStatus;

#[test]
fn error_message_prefers_processor_message() {
    let body = r#"{"error":{"type":"card_error","message":"Your card was declined."}}"#;
    assert_eq!(error_message(body), "Your card was declined.");
}

#[test]
fn error_message_falls_back_to_truncated_body() {
    let body = "x".repeat(500);
    assert_eq!(error_message(&body).len(), 200);
    assert_eq!(error_message("bad gateway"), "bad gateway");
}

#[test]
fn create_intent_form_uses_whole_francs() {
    let booking_id = Uuid::nil();
    let form = create_intent_form(booking_id, 150_000);
    assert!(form.contains(&("amount", "150000".to_owned())));
    assert!(form.contains(&("currency", "bif".to_owned())));
    assert!(form.contains(&("metadata[booking_id]", booking_id.to_string())));
}

#[test]
fn create_intent_form_disables_redirect_methods() {
    let form = create_intent_form(Uuid::new_v4(), 10_000);
    assert!(form.contains(&("automatic_payment_methods[enabled]", "true".to_owned())));
    assert!(form.contains(&("automatic_payment_methods[allow_redirects]", "never".to_owned())));
}

#[test]
fn intent_parses_processor_payload() {
    let body = r#"{
        "id": "pi_123",
        "object": "payment_intent",
        "client_secret": "pi_123_secret_abc",
        "status": "requires_payment_method",
        "amount": 150000,
        "currency": "bif",
        "metadata": {"booking_id": "00000000-0000-0000-0000-000000000000"}
    }"#;
    let intent: PaymentIntent = serde_json::from_str(body).unwrap();
    assert_eq!(intent.id, "pi_123");
    assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);
    assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    assert!(!intent.status.is_paid());
}

#[test]
fn unknown_intent_status_does_not_fail_parsing() {
    let body = r#"{"id":"pi_1","client_secret":null,"status":"something_new","amount":1,"currency":"bif"}"#;
    let intent: PaymentIntent = serde_json::from_str(body).unwrap();
    assert_eq!(intent.status, IntentStatus::Unknown);
}

#[test]
fn gateway_builds_from_config() {
    let config = StripeConfig {
        secret_key: "sk_test_123".into(),
        webhook_secret: None,
        api_base: "https://api.stripe.test/v1".into(),
        timeout: Duration::from_secs(5),
    };
    let gateway = StripeGateway::new(&config).unwrap();
    assert_eq!(gateway.api_base, "https://api.stripe.test/v1");
}
