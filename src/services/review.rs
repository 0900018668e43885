//! Reviews on destinations and guides.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::booking;
use super::session::SessionUser;
use super::validation::{self, ValidationError};

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("{kind} not found: {id}")]
    TargetNotFound { kind: ReviewTarget, id: Uuid },
    #[error("guide reviews require a completed tour with that guide")]
    NoCompletedTour,
    #[error("guides cannot review themselves")]
    SelfReview,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget {
    Destination,
    Guide,
}

impl ReviewTarget {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::Guide => "guide",
        }
    }

    fn exists_sql(self) -> &'static str {
        match self {
            Self::Destination => "SELECT EXISTS (SELECT 1 FROM destinations WHERE id = $1)",
            Self::Guide => "SELECT EXISTS (SELECT 1 FROM guides WHERE user_id = $1)",
        }
    }
}

impl std::fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub rating: i16,
    pub comment: String,
}

/// Rating range and comment length.
pub fn validate_review(input: &NewReview) -> Result<(i16, String), ValidationError> {
    let rating = validation::validate_rating(input.rating)?;
    let comment = validation::required("comment", &input.comment)?;
    validation::max_len("comment", &comment, MAX_COMMENT_LEN)?;
    Ok((rating, comment))
}

pub async fn list_reviews(pool: &PgPool, target: ReviewTarget, target_id: Uuid) -> Result<Vec<Review>, ReviewError> {
    ensure_target(pool, target, target_id).await?;
    let reviews = sqlx::query_as::<_, Review>(
        r"SELECT r.id, r.author_id, u.name AS author_name, r.rating, r.comment, r.created_at
          FROM reviews r
          JOIN users u ON u.id = r.author_id
          WHERE r.target_kind = $1 AND r.target_id = $2
          ORDER BY r.created_at DESC",
    )
    .bind(target.as_str())
    .bind(target_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

pub async fn create_review(
    pool: &PgPool,
    author: &SessionUser,
    target: ReviewTarget,
    target_id: Uuid,
    input: NewReview,
) -> Result<Review, ReviewError> {
    let (rating, comment) = validate_review(&input)?;
    if target == ReviewTarget::Guide && author.id == target_id {
        return Err(ReviewError::SelfReview);
    }
    ensure_target(pool, target, target_id).await?;
    if target == ReviewTarget::Guide && !booking::has_completed_tour(pool, author.id, target_id).await? {
        return Err(ReviewError::NoCompletedTour);
    }

    let (id, created_at): (Uuid, OffsetDateTime) = sqlx::query_as(
        r"INSERT INTO reviews (author_id, target_kind, target_id, rating, comment)
          VALUES ($1, $2, $3, $4, $5)
          RETURNING id, created_at",
    )
    .bind(author.id)
    .bind(target.as_str())
    .bind(target_id)
    .bind(rating)
    .bind(&comment)
    .fetch_one(pool)
    .await?;

    tracing::info!(review_id = %id, kind = %target, %target_id, rating, "review posted");
    Ok(Review {
        id,
        author_id: author.id,
        author_name: author.name.clone(),
        rating,
        comment,
        created_at,
    })
}

async fn ensure_target(pool: &PgPool, target: ReviewTarget, id: Uuid) -> Result<(), ReviewError> {
    let exists: bool = sqlx::query_scalar(target.exists_sql())
        .bind(id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(ReviewError::TargetNotFound { kind: target, id })
    }
}

#[cfg(test)]
#[path = "review_test.rs"]
mod tests;
