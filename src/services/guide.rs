//! Guide profiles.
//!
//! A guide profile is keyed by the guide's user id. Guides write their own
//! profile; only approved profiles are listed publicly, and only admins flip
//! approval.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::session::SessionUser;
use super::validation::{self, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    #[error("guide not found: {0}")]
    NotFound(Uuid),
    #[error("only guide accounts can publish a guide profile")]
    NotAGuide,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuideProfile {
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub location: String,
    pub languages: Vec<String>,
    pub specialties: Vec<String>,
    pub daily_rate_bif: i64,
    pub is_approved: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideSort {
    Rating,
    Rate,
    Name,
}

impl GuideSort {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("" | "rating") => Some(Self::Rating),
            Some("rate" | "price") => Some(Self::Rate),
            Some("name") => Some(Self::Name),
            Some(_) => None,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Rating => " ORDER BY average_rating DESC NULLS LAST, review_count DESC, u.name ASC",
            Self::Rate => " ORDER BY g.daily_rate_bif ASC, u.name ASC",
            Self::Name => " ORDER BY u.name ASC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GuideFilter {
    pub location: Option<String>,
    pub language: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuideInput {
    pub bio: String,
    pub location: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub daily_rate_bif: i64,
}

/// Pricing facts needed to book a guide.
#[derive(Debug, Clone, Copy)]
pub struct GuideRate {
    pub daily_rate_bif: i64,
    pub is_approved: bool,
}

const SELECT_GUIDES: &str = r"SELECT g.user_id, u.name, u.avatar_url, g.bio, g.location, g.languages,
           g.specialties, g.daily_rate_bif, g.is_approved,
           AVG(r.rating)::float8 AS average_rating,
           COUNT(r.id) AS review_count
    FROM guides g
    JOIN users u ON u.id = g.user_id
    LEFT JOIN reviews r ON r.target_kind = 'guide' AND r.target_id = g.user_id";

const GROUP_GUIDES: &str = " GROUP BY g.user_id, u.name, u.avatar_url";

/// Trim, drop blanks and de-duplicate (case-insensitively) a tag list.
#[must_use]
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_owned());
    }
    out
}

pub async fn list_guides(pool: &PgPool, filter: &GuideFilter) -> Result<Vec<GuideProfile>, GuideError> {
    let sort = GuideSort::parse(filter.sort.as_deref()).ok_or_else(|| ValidationError::Unknown {
        field: "sort",
        value: filter.sort.clone().unwrap_or_default(),
    })?;

    let mut builder = QueryBuilder::new(SELECT_GUIDES);
    builder.push(" WHERE g.is_approved");
    if let Some(location) = validation::optional(filter.location.as_deref()) {
        builder.push(" AND g.location ILIKE ");
        builder.push_bind(super::destination::like_pattern(&location));
    }
    if let Some(language) = validation::optional(filter.language.as_deref()) {
        builder.push(" AND EXISTS (SELECT 1 FROM unnest(g.languages) AS l(lang) WHERE lower(l.lang) = lower(");
        builder.push_bind(language);
        builder.push("))");
    }
    builder.push(GROUP_GUIDES);
    builder.push(sort.order_by());

    Ok(builder.build_query_as::<GuideProfile>().fetch_all(pool).await?)
}

pub async fn get_guide(pool: &PgPool, user_id: Uuid) -> Result<GuideProfile, GuideError> {
    let mut builder = QueryBuilder::new(SELECT_GUIDES);
    builder.push(" WHERE g.user_id = ");
    builder.push_bind(user_id);
    builder.push(GROUP_GUIDES);

    builder
        .build_query_as::<GuideProfile>()
        .fetch_optional(pool)
        .await?
        .ok_or(GuideError::NotFound(user_id))
}

pub async fn guide_rate(pool: &PgPool, user_id: Uuid) -> Result<Option<GuideRate>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, bool)>("SELECT daily_rate_bif, is_approved FROM guides WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(daily_rate_bif, is_approved)| GuideRate { daily_rate_bif, is_approved }))
}

/// Create or update the caller's guide profile. Approval is left as is.
pub async fn upsert_profile(pool: &PgPool, user: &SessionUser, input: GuideInput) -> Result<GuideProfile, GuideError> {
    if !user.is_guide() {
        return Err(GuideError::NotAGuide);
    }
    let bio = validation::required("bio", &input.bio)?;
    let location = validation::required("location", &input.location)?;
    if input.daily_rate_bif <= 0 {
        return Err(ValidationError::NotPositive("daily_rate_bif").into());
    }

    sqlx::query(
        r"INSERT INTO guides (user_id, bio, location, languages, specialties, daily_rate_bif)
          VALUES ($1, $2, $3, $4, $5, $6)
          ON CONFLICT (user_id) DO UPDATE SET
              bio = EXCLUDED.bio,
              location = EXCLUDED.location,
              languages = EXCLUDED.languages,
              specialties = EXCLUDED.specialties,
              daily_rate_bif = EXCLUDED.daily_rate_bif",
    )
    .bind(user.id)
    .bind(bio)
    .bind(location)
    .bind(clean_tags(&input.languages))
    .bind(clean_tags(&input.specialties))
    .bind(input.daily_rate_bif)
    .execute(pool)
    .await?;

    get_guide(pool, user.id).await
}

pub async fn set_approval(pool: &PgPool, user_id: Uuid, approved: bool) -> Result<GuideProfile, GuideError> {
    let result = sqlx::query("UPDATE guides SET is_approved = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(approved)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(GuideError::NotFound(user_id));
    }
    tracing::info!(guide_id = %user_id, approved, "guide approval changed");
    get_guide(pool, user_id).await
}

#[cfg(test)]
#[path = "guide_test.rs"]
mod tests;
