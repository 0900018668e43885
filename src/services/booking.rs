//! Bookings — creation, lifecycle transitions and payment state.
//!
//! DESIGN
//! ======
//! A booking moves `pending → confirmed → completed`, and may be cancelled
//! from either live state. Who may apply a transition depends on the caller's
//! relation to the booking (traveler, guide, admin). Status updates are
//! guarded on the previous status so two racing toggles cannot both win.
//!
//! Payment state is tracked separately (`unpaid → paid → refunded`) and is
//! driven by the payment processor, never by a client-supplied flag.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::account::Role;
use super::guide;
use super::session::SessionUser;
use super::validation::{self, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),
    #[error("guide not found: {0}")]
    GuideNotFound(Uuid),
    #[error("guide is not accepting bookings")]
    GuideUnavailable,
    #[error("destination not found: {0}")]
    DestinationNotFound(Uuid),
    #[error("only travelers can book tours")]
    NotATraveler,
    #[error("tour date is in the past")]
    DateInPast,
    #[error("booking total overflows")]
    TotalOverflow,
    #[error("not allowed to access this booking")]
    Forbidden,
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },
    #[error("booking was modified concurrently")]
    Conflict,
    #[error("booking cannot be paid in its current state")]
    NotPayable,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// The caller's relation to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Traveler,
    Guide,
    Admin,
}

/// Whether `party` may move a booking from `from` to `to`.
#[must_use]
pub fn transition_allowed(from: BookingStatus, to: BookingStatus, party: Party) -> bool {
    use BookingStatus::{Cancelled, Completed, Confirmed, Pending};
    match (from, to) {
        (Pending, Confirmed) | (Confirmed, Completed) => matches!(party, Party::Guide | Party::Admin),
        (Pending | Confirmed, Cancelled) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub traveler_id: Uuid,
    pub traveler_name: String,
    #[serde(skip)]
    pub traveler_email: String,
    pub guide_id: Uuid,
    pub guide_name: String,
    pub destination_id: Option<Uuid>,
    pub destination_name: Option<String>,
    pub tour_date: Date,
    pub guests: i32,
    pub total_bif: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip)]
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Booking {
    /// How `user` relates to this booking, if at all.
    #[must_use]
    pub fn party_for(&self, user: &SessionUser) -> Option<Party> {
        if user.role == Role::Admin {
            Some(Party::Admin)
        } else if user.id == self.guide_id {
            Some(Party::Guide)
        } else if user.id == self.traveler_id {
            Some(Party::Traveler)
        } else {
            None
        }
    }

    /// Only the booking traveler pays, and only for a live, unpaid booking.
    pub fn ensure_payable_by(&self, user: &SessionUser) -> Result<(), BookingError> {
        if user.id != self.traveler_id {
            return Err(BookingError::Forbidden);
        }
        let live = matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed);
        if !live || self.payment_status != PaymentStatus::Unpaid || self.total_bif <= 0 {
            return Err(BookingError::NotPayable);
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    traveler_id: Uuid,
    traveler_name: String,
    traveler_email: String,
    guide_id: Uuid,
    guide_name: String,
    destination_id: Option<Uuid>,
    destination_name: Option<String>,
    tour_date: Date,
    guests: i32,
    total_bif: i64,
    status: String,
    payment_status: String,
    payment_intent_id: Option<String>,
    notes: Option<String>,
    created_at: OffsetDateTime,
}

impl From<BookingRow> for Booking {
    fn from(r: BookingRow) -> Self {
        Self {
            id: r.id,
            traveler_id: r.traveler_id,
            traveler_name: r.traveler_name,
            traveler_email: r.traveler_email,
            guide_id: r.guide_id,
            guide_name: r.guide_name,
            destination_id: r.destination_id,
            destination_name: r.destination_name,
            tour_date: r.tour_date,
            guests: r.guests,
            total_bif: r.total_bif,
            // CHECK constraints keep these in range
            status: BookingStatus::parse(&r.status).unwrap_or(BookingStatus::Pending),
            payment_status: PaymentStatus::parse(&r.payment_status).unwrap_or(PaymentStatus::Unpaid),
            payment_intent_id: r.payment_intent_id,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}

const SELECT_BOOKINGS: &str = r"SELECT b.id, b.traveler_id, t.name AS traveler_name, t.email AS traveler_email,
           b.guide_id, g.name AS guide_name, b.destination_id, d.name AS destination_name,
           b.tour_date, b.guests, b.total_bif, b.status, b.payment_status, b.payment_intent_id,
           b.notes, b.created_at
    FROM bookings b
    JOIN users t ON t.id = b.traveler_id
    JOIN users g ON g.id = b.guide_id
    LEFT JOIN destinations d ON d.id = b.destination_id";

#[derive(Debug, Deserialize)]
pub struct NewBooking {
    pub guide_id: Uuid,
    pub destination_id: Option<Uuid>,
    pub tour_date: Date,
    pub guests: i32,
    pub notes: Option<String>,
}

/// `daily_rate × guests`, rejecting overflow.
pub fn booking_total(daily_rate_bif: i64, guests: i32) -> Result<i64, BookingError> {
    daily_rate_bif
        .checked_mul(i64::from(guests))
        .ok_or(BookingError::TotalOverflow)
}

/// Validate the parts of a booking request that need no database.
pub fn validate_request(user: &SessionUser, input: &NewBooking, today: Date) -> Result<(), BookingError> {
    if user.role != Role::Traveler || user.id == input.guide_id {
        return Err(BookingError::NotATraveler);
    }
    validation::validate_guests(input.guests)?;
    if input.tour_date < today {
        return Err(BookingError::DateInPast);
    }
    if let Some(notes) = input.notes.as_deref() {
        validation::max_len("notes", notes, validation::MAX_MESSAGE_LEN)?;
    }
    Ok(())
}

pub async fn create_booking(
    pool: &PgPool,
    user: &SessionUser,
    input: NewBooking,
    today: Date,
) -> Result<Booking, BookingError> {
    validate_request(user, &input, today)?;

    let rate = guide::guide_rate(pool, input.guide_id)
        .await?
        .ok_or(BookingError::GuideNotFound(input.guide_id))?;
    if !rate.is_approved {
        return Err(BookingError::GuideUnavailable);
    }
    if let Some(destination_id) = input.destination_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM destinations WHERE id = $1)")
            .bind(destination_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(BookingError::DestinationNotFound(destination_id));
        }
    }
    let total = booking_total(rate.daily_rate_bif, input.guests)?;

    let id: Uuid = sqlx::query_scalar(
        r"INSERT INTO bookings (traveler_id, guide_id, destination_id, tour_date, guests, total_bif, notes)
          VALUES ($1, $2, $3, $4, $5, $6, $7)
          RETURNING id",
    )
    .bind(user.id)
    .bind(input.guide_id)
    .bind(input.destination_id)
    .bind(input.tour_date)
    .bind(input.guests)
    .bind(total)
    .bind(validation::optional(input.notes.as_deref()))
    .fetch_one(pool)
    .await?;

    tracing::info!(booking_id = %id, guide_id = %input.guide_id, total_bif = total, "booking created");
    get_booking(pool, id).await
}

pub async fn get_booking(pool: &PgPool, id: Uuid) -> Result<Booking, BookingError> {
    let row = sqlx::query_as::<_, BookingRow>(&format!("{SELECT_BOOKINGS} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(BookingError::NotFound(id))?;
    Ok(row.into())
}

/// Fetch a booking the caller takes part in.
pub async fn get_booking_for(pool: &PgPool, user: &SessionUser, id: Uuid) -> Result<(Booking, Party), BookingError> {
    let booking = get_booking(pool, id).await?;
    let party = booking.party_for(user).ok_or(BookingError::Forbidden)?;
    Ok((booking, party))
}

/// Bookings where the caller is traveler or guide; admins see everything.
pub async fn list_bookings(pool: &PgPool, user: &SessionUser) -> Result<Vec<Booking>, BookingError> {
    let rows = if user.is_admin() {
        sqlx::query_as::<_, BookingRow>(&format!("{SELECT_BOOKINGS} ORDER BY b.created_at DESC"))
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_BOOKINGS} WHERE b.traveler_id = $1 OR b.guide_id = $1 ORDER BY b.tour_date DESC, b.created_at DESC"
        ))
        .bind(user.id)
        .fetch_all(pool)
        .await?
    };
    Ok(rows.into_iter().map(Booking::from).collect())
}

/// Apply a status toggle on behalf of `user`.
pub async fn update_status(
    pool: &PgPool,
    user: &SessionUser,
    id: Uuid,
    to: BookingStatus,
) -> Result<Booking, BookingError> {
    let (booking, party) = get_booking_for(pool, user, id).await?;
    let from = booking.status;
    if !transition_allowed(from, to, party) {
        return Err(BookingError::InvalidTransition { from, to });
    }

    set_status_if(pool, id, from, to).await?;
    tracing::info!(booking_id = %id, %from, %to, "booking status changed");
    get_booking(pool, id).await
}

/// Move `id` from `from` to `to`. Fails with `Conflict` when the row is no
/// longer in `from`.
pub(crate) async fn set_status_if(
    pool: &PgPool,
    id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), BookingError> {
    let result = sqlx::query("UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2")
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BookingError::Conflict);
    }
    Ok(())
}

pub async fn attach_payment_intent(pool: &PgPool, id: Uuid, intent_id: &str) -> Result<(), BookingError> {
    sqlx::query("UPDATE bookings SET payment_intent_id = $2 WHERE id = $1 AND payment_status = 'unpaid'")
        .bind(id)
        .bind(intent_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark the booking holding `intent_id` as paid. Returns its id when a row changed.
pub async fn mark_paid(pool: &PgPool, intent_id: &str) -> Result<Option<Uuid>, BookingError> {
    let id = sqlx::query_scalar(
        "UPDATE bookings SET payment_status = 'paid' WHERE payment_intent_id = $1 AND payment_status = 'unpaid' RETURNING id",
    )
    .bind(intent_id)
    .fetch_optional(pool)
    .await?;
    if let Some(id) = id {
        tracing::info!(booking_id = %id, intent_id, "booking paid");
    }
    Ok(id)
}

pub async fn mark_refunded(pool: &PgPool, intent_id: &str) -> Result<Option<Uuid>, BookingError> {
    let id = sqlx::query_scalar(
        "UPDATE bookings SET payment_status = 'refunded' WHERE payment_intent_id = $1 AND payment_status = 'paid' RETURNING id",
    )
    .bind(intent_id)
    .fetch_optional(pool)
    .await?;
    if let Some(id) = id {
        tracing::info!(booking_id = %id, intent_id, "booking refunded");
    }
    Ok(id)
}

/// Whether `traveler` has a completed tour with `guide`.
pub async fn has_completed_tour(pool: &PgPool, traveler: Uuid, guide: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM bookings WHERE traveler_id = $1 AND guide_id = $2 AND status = 'completed')",
    )
    .bind(traveler)
    .bind(guide)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
#[path = "booking_test.rs"]
mod tests;
