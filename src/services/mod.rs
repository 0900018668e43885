//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.

pub mod account;
pub mod booking;
pub mod chat;
pub mod destination;
pub mod guide;
pub mod password_reset;
pub mod payout;
pub mod quiz;
pub mod review;
pub mod session;
pub mod validation;
