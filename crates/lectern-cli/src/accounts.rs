//! User and moderator-group management straight against the database.

use anyhow::{Context, bail};
use sqlx::PgPool;
use uuid::Uuid;

use lectern_core::hash_password;
use lectern_models::{MODERATOR_GROUP, UserId};

/// Creates a user, optionally placing them in the moderator group.
///
/// Fails if the email is already taken.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    moderator: bool,
) -> anyhow::Result<UserId> {
    let email = normalize_email(email)?;
    let hashed_password = hash_password(password).map_err(|e| e.error)?;

    let mut tx = pool.begin().await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password)
         VALUES ($1, $2)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&email)
    .bind(&hashed_password)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        tx.rollback().await?;
        bail!("User with email {email} already exists");
    };

    if moderator {
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_id)
             SELECT $1, id FROM groups WHERE name = $2
             ON CONFLICT (user_id, group_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(MODERATOR_GROUP)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(UserId::from_uuid(user_id))
}

/// Grants or revokes moderator membership. Returns whether anything changed.
pub async fn set_moderator(pool: &PgPool, email: &str, moderator: bool) -> anyhow::Result<bool> {
    let email = normalize_email(email)?;

    let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("No user with email {email}"))?;

    let result = if moderator {
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_id)
             SELECT $1, id FROM groups WHERE name = $2
             ON CONFLICT (user_id, group_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(MODERATOR_GROUP)
        .execute(pool)
        .await?
    } else {
        sqlx::query(
            "DELETE FROM user_groups
             WHERE user_id = $1
               AND group_id IN (SELECT id FROM groups WHERE name = $2)",
        )
        .bind(user_id)
        .bind(MODERATOR_GROUP)
        .execute(pool)
        .await?
    };

    Ok(result.rows_affected() > 0)
}

/// Trims the address and rejects anything that is obviously not an email.
pub fn normalize_email(email: &str) -> anyhow::Result<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email.to_string()),
        _ => bail!("'{email}' is not a valid email address"),
    }
}
