//! Destination listings.
//!
//! DESIGN
//! ======
//! Listings are read by everyone and written by admins. Rating summaries are
//! computed on read from `reviews` so they never drift from the reviews
//! themselves.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::validation::{self, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("destination not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Destination {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub description: String,
    pub image_url: Option<String>,
    pub entry_fee_bif: i64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestinationSort {
    #[default]
    Name,
    Rating,
    Fee,
}

impl DestinationSort {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("" | "name") => Some(Self::Name),
            Some("rating") => Some(Self::Rating),
            Some("fee" | "price") => Some(Self::Fee),
            Some(_) => None,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Name => " ORDER BY d.name ASC",
            Self::Rating => " ORDER BY average_rating DESC NULLS LAST, review_count DESC, d.name ASC",
            Self::Fee => " ORDER BY d.entry_fee_bif ASC, d.name ASC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DestinationFilter {
    pub q: Option<String>,
    pub region: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewDestination {
    pub name: String,
    pub region: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub entry_fee_bif: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct DestinationPatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub entry_fee_bif: Option<i64>,
}

const SELECT_DESTINATIONS: &str = r"SELECT d.id, d.name, d.region, d.description, d.image_url, d.entry_fee_bif,
           d.created_at,
           AVG(r.rating)::float8 AS average_rating,
           COUNT(r.id) AS review_count
    FROM destinations d
    LEFT JOIN reviews r ON r.target_kind = 'destination' AND r.target_id = d.id";

const GROUP_DESTINATIONS: &str = " GROUP BY d.id";

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
#[must_use]
pub fn like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 2);
    escaped.push('%');
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn validate_fee(fee: i64) -> Result<i64, ValidationError> {
    if fee < 0 { Err(ValidationError::Negative("entry_fee_bif")) } else { Ok(fee) }
}

/// List destinations matching a search filter.
///
/// # Errors
///
/// Returns `Invalid` for an unknown sort key, or a database error.
pub async fn list_destinations(pool: &PgPool, filter: &DestinationFilter) -> Result<Vec<Destination>, DestinationError> {
    let sort = DestinationSort::parse(filter.sort.as_deref()).ok_or_else(|| ValidationError::Unknown {
        field: "sort",
        value: filter.sort.clone().unwrap_or_default(),
    })?;

    let mut builder = QueryBuilder::new(SELECT_DESTINATIONS);
    builder.push(" WHERE TRUE");
    if let Some(q) = validation::optional(filter.q.as_deref()) {
        let pattern = like_pattern(&q);
        builder.push(" AND (d.name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR d.description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(region) = validation::optional(filter.region.as_deref()) {
        builder.push(" AND lower(d.region) = lower(");
        builder.push_bind(region);
        builder.push(")");
    }
    builder.push(GROUP_DESTINATIONS);
    builder.push(sort.order_by());

    Ok(builder.build_query_as::<Destination>().fetch_all(pool).await?)
}

pub async fn get_destination(pool: &PgPool, id: Uuid) -> Result<Destination, DestinationError> {
    let mut builder = QueryBuilder::new(SELECT_DESTINATIONS);
    builder.push(" WHERE d.id = ");
    builder.push_bind(id);
    builder.push(GROUP_DESTINATIONS);

    builder
        .build_query_as::<Destination>()
        .fetch_optional(pool)
        .await?
        .ok_or(DestinationError::NotFound(id))
}

pub async fn create_destination(
    pool: &PgPool,
    input: NewDestination,
    created_by: Uuid,
) -> Result<Destination, DestinationError> {
    let name = validation::required("name", &input.name)?;
    let region = validation::required("region", &input.region)?;
    let description = validation::required("description", &input.description)?;
    let fee = validate_fee(input.entry_fee_bif)?;

    let id: Uuid = sqlx::query_scalar(
        r"INSERT INTO destinations (name, region, description, image_url, entry_fee_bif, created_by)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING id",
    )
    .bind(name)
    .bind(region)
    .bind(description)
    .bind(validation::optional(input.image_url.as_deref()))
    .bind(fee)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    tracing::info!(destination_id = %id, "destination created");
    get_destination(pool, id).await
}

pub async fn update_destination(
    pool: &PgPool,
    id: Uuid,
    patch: DestinationPatch,
) -> Result<Destination, DestinationError> {
    let name = patch.name.as_deref().map(|v| validation::required("name", v)).transpose()?;
    let region = patch.region.as_deref().map(|v| validation::required("region", v)).transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(|v| validation::required("description", v))
        .transpose()?;
    let fee = patch.entry_fee_bif.map(validate_fee).transpose()?;

    let result = sqlx::query(
        r"UPDATE destinations
          SET name = COALESCE($2, name),
              region = COALESCE($3, region),
              description = COALESCE($4, description),
              image_url = COALESCE($5, image_url),
              entry_fee_bif = COALESCE($6, entry_fee_bif)
          WHERE id = $1",
    )
    .bind(id)
    .bind(name)
    .bind(region)
    .bind(description)
    .bind(validation::optional(patch.image_url.as_deref()))
    .bind(fee)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DestinationError::NotFound(id));
    }
    get_destination(pool, id).await
}

pub async fn delete_destination(pool: &PgPool, id: Uuid) -> Result<(), DestinationError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM reviews WHERE target_kind = 'destination' AND target_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM destinations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DestinationError::NotFound(id));
    }
    tx.commit().await?;
    tracing::info!(destination_id = %id, "destination deleted");
    Ok(())
}

#[cfg(test)]
#[path = "destination_test.rs"]
mod tests;
