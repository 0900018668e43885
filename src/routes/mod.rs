//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! A single JSON API. Account routes keep the paths existing clients call
//! (`/signup`, `/api/login`, `/verifyToken`, `/register`); everything else
//! lives under `/api`.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod chats;
pub mod destinations;
pub mod error;
pub mod extract;
pub mod guides;
pub mod payments;
pub mod payouts;
pub mod quiz;
pub mod reviews;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // accounts
        .route("/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/verifyToken", post(auth::verify_token))
        .route("/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/password-reset/request", post(auth::request_password_reset))
        .route("/api/auth/password-reset/confirm", post(auth::confirm_password_reset))
        // catalog
        .route(
            "/api/destinations",
            get(destinations::list_destinations).post(destinations::create_destination),
        )
        .route(
            "/api/destinations/{id}",
            get(destinations::get_destination)
                .patch(destinations::update_destination)
                .delete(destinations::delete_destination),
        )
        .route(
            "/api/destinations/{id}/reviews",
            get(reviews::list_destination_reviews).post(reviews::create_destination_review),
        )
        .route("/api/guides", get(guides::list_guides))
        .route("/api/guides/me", put(guides::upsert_my_profile))
        .route("/api/guides/{id}", get(guides::get_guide))
        .route("/api/guides/{id}/approval", patch(guides::set_approval))
        .route(
            "/api/guides/{id}/reviews",
            get(reviews::list_guide_reviews).post(reviews::create_guide_review),
        )
        // bookings and payments
        .route("/api/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/api/bookings/{id}", get(bookings::get_booking))
        .route("/api/bookings/{id}/status", patch(bookings::update_status))
        .route("/api/bookings/{id}/payment-intent", post(payments::create_payment_intent))
        .route("/api/payments/confirm", post(payments::confirm_payment))
        .route("/api/payments/webhook", post(payments::webhook))
        // chat
        .route("/api/chats", get(chats::list_chats).post(chats::open_chat))
        .route(
            "/api/chats/{id}/messages",
            get(chats::list_messages).post(chats::post_message),
        )
        // revenue and payouts
        .route("/api/revenue", get(payouts::revenue))
        .route("/api/payouts", get(payouts::list_payouts).post(payouts::request_payout))
        .route("/api/payouts/{id}", patch(payouts::decide_payout))
        // quiz
        .route("/api/quiz/daily", get(quiz::daily))
        .route("/api/quiz/daily/answers", post(quiz::submit_answers))
        // admin
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
