use super::*;
use std::sync::Arc;

use time::macros::{date, datetime};

use crate::services::booking::PaymentStatus;
use crate::state::test_helpers::{MockMailer, test_app_state};

fn confirmed_booking() -> Booking {
    Booking {
        id: Uuid::new_v4(),
        traveler_id: Uuid::new_v4(),
        traveler_name: "Amani".into(),
        traveler_email: "amani@example.com".into(),
        guide_id: Uuid::new_v4(),
        guide_name: "Eric".into(),
        destination_id: None,
        destination_name: Some("Kibira National Park".into()),
        tour_date: date!(2026 - 11 - 14),
        guests: 2,
        total_bif: 90_000,
        status: BookingStatus::Confirmed,
        payment_status: PaymentStatus::Unpaid,
        payment_intent_id: None,
        notes: None,
        created_at: datetime!(2026-10-19 08:30 UTC),
    }
}

#[tokio::test]
async fn confirmation_email_goes_to_traveler() {
    let mailer = Arc::new(MockMailer::default());
    let state = test_app_state().with_mailer(mailer.clone());

    notify_confirmed(&state, &confirmed_booking()).await;

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amani@example.com");
    assert!(sent[0].subject.contains("2026-11-14"));
    assert!(sent[0].html.contains("90,000 BIF"));
    assert!(sent[0].html.contains("Eric"));
}

#[tokio::test]
async fn confirmation_without_mailer_is_silent() {
    notify_confirmed(&test_app_state(), &confirmed_booking()).await;
}
