use crate::error::{CantDoReason, Result};
use crate::models::{NewUser, Rating, Reputation, User};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
              SELECT *
              FROM users
              WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
              SELECT *
              FROM users
              WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Register a user. The email is checked first and the UNIQUE constraint
    /// catches a concurrent registration that slips past the check.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        if self.find_by_email(&new_user.email).await?.is_some() {
            return Err(CantDoReason::EmailInUse.into());
        }
        let password_hash = new_user.password_hash()?;

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, profile_picture, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(new_user.profile_picture.as_ref())
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CantDoReason::EmailInUse.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Count and sum of every rating the user has received
    pub async fn reputation(&self, user_id: i64) -> Result<Reputation> {
        let (total, sum): (i64, i64) = sqlx::query_as(
            r#"
              SELECT COUNT(rating), COALESCE(SUM(rating), 0)
              FROM user_ratings
              WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Reputation::from_totals(total, sum))
    }

    /// Append a rating. Runs on the caller's connection so it can share the
    /// accept transaction.
    pub async fn add_rating(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        trade_id: i64,
        rating: i64,
    ) -> Result<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO user_ratings (user_id, trade_id, rating, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(trade_id)
        .bind(rating)
        .bind(Utc::now().timestamp())
        .fetch_one(conn)
        .await?;

        Ok(rating)
    }
}
