//! Revenue dashboards and guide payouts.
//!
//! DESIGN
//! ======
//! Every paid, non-refunded booking is split between the guide and the
//! platform. The split is computed per booking in integer BIF; the guide
//! share rounds down and the platform keeps the remainder, so the two parts
//! always add up to the booking total.
//!
//! A guide's available balance is their accumulated share minus every payout
//! that is still pending, approved or already paid. Requests are serialized
//! per guide with a row lock so two concurrent requests cannot overdraw.

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::session::SessionUser;
use super::validation::{self, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("payout not found: {0}")]
    NotFound(Uuid),
    #[error("only guides can request payouts")]
    NotAGuide,
    #[error("not allowed to view revenue")]
    Forbidden,
    #[error("amount exceeds available balance of {available} BIF")]
    InsufficientBalance { available: i64 },
    #[error("cannot move payout from {from} to {to}")]
    InvalidTransition { from: PayoutStatus, to: PayoutStatus },
    #[error("payout was modified concurrently")]
    Conflict,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    MobileMoney,
    BankTransfer,
}

impl PayoutMethod {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mobile_money" => Some(Self::MobileMoney),
            "bank_transfer" => Some(Self::BankTransfer),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MobileMoney => "mobile_money",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PayoutStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub fn payout_transition_allowed(from: PayoutStatus, to: PayoutStatus) -> bool {
    matches!(
        (from, to),
        (PayoutStatus::Pending, PayoutStatus::Approved | PayoutStatus::Rejected)
            | (PayoutStatus::Approved, PayoutStatus::Paid)
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSplit {
    pub gross_bif: i64,
    pub guide_share_bif: i64,
    pub platform_commission_bif: i64,
}

/// Split one booking total. The platform takes the rounding remainder.
#[must_use]
pub fn split(total_bif: i64, commission_percent: u8) -> RevenueSplit {
    let commission = i128::from(commission_percent.min(100));
    let guide_share = i128::from(total_bif) * (100 - commission) / 100;
    // guide_share <= total_bif, so it fits back into i64
    let guide_share = i64::try_from(guide_share).unwrap_or(total_bif);
    RevenueSplit {
        gross_bif: total_bif,
        guide_share_bif: guide_share,
        platform_commission_bif: total_bif - guide_share,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub paid_bookings: u64,
    #[serde(flatten)]
    pub totals: RevenueSplit,
}

/// Single pass over paid booking totals.
#[must_use]
pub fn summarize(totals: impl IntoIterator<Item = i64>, commission_percent: u8) -> RevenueSummary {
    totals.into_iter().fold(RevenueSummary::default(), |mut acc, total| {
        let part = split(total, commission_percent);
        acc.paid_bookings += 1;
        acc.totals.gross_bif += part.gross_bif;
        acc.totals.guide_share_bif += part.guide_share_bif;
        acc.totals.platform_commission_bif += part.platform_commission_bif;
        acc
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub scope: &'static str,
    pub commission_percent: u8,
    #[serde(flatten)]
    pub summary: RevenueSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_payouts_bif: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_bif: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payout {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub guide_name: String,
    pub amount_bif: i64,
    pub method: PayoutMethod,
    pub account_details: String,
    pub status: PayoutStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub decided_at: Option<OffsetDateTime>,
}

#[derive(sqlx::FromRow)]
struct PayoutRow {
    id: Uuid,
    guide_id: Uuid,
    guide_name: String,
    amount_bif: i64,
    method: String,
    account_details: String,
    status: String,
    created_at: OffsetDateTime,
    decided_at: Option<OffsetDateTime>,
}

impl From<PayoutRow> for Payout {
    fn from(r: PayoutRow) -> Self {
        Self {
            id: r.id,
            guide_id: r.guide_id,
            guide_name: r.guide_name,
            amount_bif: r.amount_bif,
            // CHECK constraints keep these in range
            method: PayoutMethod::parse(&r.method).unwrap_or(PayoutMethod::MobileMoney),
            account_details: r.account_details,
            status: PayoutStatus::parse(&r.status).unwrap_or(PayoutStatus::Pending),
            created_at: r.created_at,
            decided_at: r.decided_at,
        }
    }
}

const SELECT_PAYOUTS: &str = r"SELECT p.id, p.guide_id, u.name AS guide_name, p.amount_bif, p.method,
           p.account_details, p.status, p.created_at, p.decided_at
    FROM payout_requests p
    JOIN users u ON u.id = p.guide_id";

#[derive(Debug, Deserialize)]
pub struct PayoutInput {
    pub amount_bif: i64,
    pub method: String,
    pub account_details: String,
}

/// Field checks that need no database.
pub fn validate_request(input: &PayoutInput) -> Result<(PayoutMethod, String), ValidationError> {
    if input.amount_bif <= 0 {
        return Err(ValidationError::NotPositive("amount_bif"));
    }
    let method = PayoutMethod::parse(input.method.trim()).ok_or_else(|| ValidationError::Unknown {
        field: "method",
        value: input.method.clone(),
    })?;
    let account_details = validation::required("account_details", &input.account_details)?;
    Ok((method, account_details))
}

async fn paid_totals<'e>(executor: impl PgExecutor<'e>, guide_id: Option<Uuid>) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT total_bif FROM bookings WHERE payment_status = 'paid' AND ($1::uuid IS NULL OR guide_id = $1)",
    )
    .bind(guide_id)
    .fetch_all(executor)
    .await
}

async fn committed_payouts<'e>(executor: impl PgExecutor<'e>, guide_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r"SELECT COALESCE(SUM(amount_bif), 0)::bigint FROM payout_requests
          WHERE guide_id = $1 AND status IN ('pending', 'approved', 'paid')",
    )
    .bind(guide_id)
    .fetch_one(executor)
    .await
}

/// Revenue for the caller: own share for guides, platform totals for admins.
pub async fn revenue_report(pool: &PgPool, user: &SessionUser, commission_percent: u8) -> Result<RevenueReport, PayoutError> {
    if user.is_admin() {
        let summary = summarize(paid_totals(pool, None).await?, commission_percent);
        return Ok(RevenueReport {
            scope: "platform",
            commission_percent,
            summary,
            committed_payouts_bif: None,
            available_bif: None,
        });
    }
    if !user.is_guide() {
        return Err(PayoutError::Forbidden);
    }

    let summary = summarize(paid_totals(pool, Some(user.id)).await?, commission_percent);
    let committed = committed_payouts(pool, user.id).await?;
    Ok(RevenueReport {
        scope: "guide",
        commission_percent,
        summary,
        committed_payouts_bif: Some(committed),
        available_bif: Some(summary.totals.guide_share_bif - committed),
    })
}

pub async fn request_payout(
    pool: &PgPool,
    user: &SessionUser,
    input: PayoutInput,
    commission_percent: u8,
) -> Result<Payout, PayoutError> {
    if !user.is_guide() {
        return Err(PayoutError::NotAGuide);
    }
    let (method, account_details) = validate_request(&input)?;

    let mut tx = pool.begin().await?;
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    let earned = summarize(paid_totals(&mut *tx, Some(user.id)).await?, commission_percent);
    let available = earned.totals.guide_share_bif - committed_payouts(&mut *tx, user.id).await?;
    if input.amount_bif > available {
        return Err(PayoutError::InsufficientBalance { available: available.max(0) });
    }

    let id: Uuid = sqlx::query_scalar(
        r"INSERT INTO payout_requests (guide_id, amount_bif, method, account_details)
          VALUES ($1, $2, $3, $4)
          RETURNING id",
    )
    .bind(user.id)
    .bind(input.amount_bif)
    .bind(method.as_str())
    .bind(account_details)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(payout_id = %id, guide_id = %user.id, amount_bif = input.amount_bif, "payout requested");
    get_payout(pool, id).await
}

pub async fn get_payout(pool: &PgPool, id: Uuid) -> Result<Payout, PayoutError> {
    let row = sqlx::query_as::<_, PayoutRow>(&format!("{SELECT_PAYOUTS} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PayoutError::NotFound(id))?;
    Ok(row.into())
}

/// Guides see their own requests; admins see all.
pub async fn list_payouts(pool: &PgPool, user: &SessionUser) -> Result<Vec<Payout>, PayoutError> {
    let rows = if user.is_admin() {
        sqlx::query_as::<_, PayoutRow>(&format!("{SELECT_PAYOUTS} ORDER BY p.created_at DESC"))
            .fetch_all(pool)
            .await?
    } else if user.is_guide() {
        sqlx::query_as::<_, PayoutRow>(&format!("{SELECT_PAYOUTS} WHERE p.guide_id = $1 ORDER BY p.created_at DESC"))
            .bind(user.id)
            .fetch_all(pool)
            .await?
    } else {
        return Err(PayoutError::Forbidden);
    };
    Ok(rows.into_iter().map(Payout::from).collect())
}

/// Admin decision on a payout request.
pub async fn decide_payout(pool: &PgPool, id: Uuid, to: PayoutStatus) -> Result<Payout, PayoutError> {
    let current = get_payout(pool, id).await?;
    let from = current.status;
    if !payout_transition_allowed(from, to) {
        return Err(PayoutError::InvalidTransition { from, to });
    }

    let result = sqlx::query("UPDATE payout_requests SET status = $3, decided_at = now() WHERE id = $1 AND status = $2")
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PayoutError::Conflict);
    }

    tracing::info!(payout_id = %id, %from, %to, "payout decided");
    get_payout(pool, id).await
}

#[cfg(test)]
#[path = "payout_test.rs"]
mod tests;
