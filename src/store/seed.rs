/// Initial data seeding
///
/// On an empty users table, creates a default admin and a default user
/// so a fresh deployment is usable immediately. Development
/// credentials only; override or delete these accounts in production.

use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};
use crate::store::users::{create_user, Role};

const SEED_ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("user", "user123", Role::User),
];

pub async fn seed_initial_users(pool: &PgPool) -> Result<(), AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        tracing::debug!(count = count, "Users table already populated, skipping seed");
        return Ok(());
    }

    for (username, password, role) in SEED_ACCOUNTS {
        match create_user(pool, username, password, *role).await {
            Ok(user) => {
                tracing::info!(username = %user.username, role = %user.role, "Seed account created");
            }
            // Two instances racing on an empty table is fine; the
            // loser just observes the winner's row.
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => {
                tracing::warn!(username = username, "Seed account already exists");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!("Initial data created");
    Ok(())
}
