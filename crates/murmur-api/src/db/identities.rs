//! Identity persistence operations on the `identities` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Raw `identities` row. The origin column is text; mapping it back to a
/// `NetworkOrigin` is the caller's job.
#[derive(Debug, sqlx::FromRow)]
pub struct IdentityRow {
    pub id: Uuid,
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

/// Insert an identity for `origin`, or return the one already registered.
///
/// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on
/// conflict, so concurrent first contacts resolve to a single identity.
pub async fn upsert(
    pool: &PgPool,
    candidate: Uuid,
    origin: &str,
) -> Result<IdentityRow, sqlx::Error> {
    sqlx::query_as::<_, IdentityRow>(
        "INSERT INTO identities (id, origin) VALUES ($1, $2)
         ON CONFLICT (origin) DO UPDATE SET origin = EXCLUDED.origin
         RETURNING id, origin, created_at",
    )
    .bind(candidate)
    .bind(origin)
    .fetch_one(pool)
    .await
}
