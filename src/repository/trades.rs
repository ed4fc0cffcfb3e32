use crate::error::Result;
use crate::models::trade::{TradeListingRow, TradeRow};
use crate::models::{Trade, TradeListing, TradeStatus};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone)]
pub struct TradeRepository {
    pool: SqlitePool,
}

impl TradeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a new proposal. Trades always start pending.
    pub async fn create(
        &self,
        proposer_id: i64,
        product_id: i64,
        offered_product_id: i64,
        message: Option<&str>,
    ) -> Result<Trade> {
        let now = Utc::now().timestamp();
        let row = sqlx::query_as::<_, TradeRow>(
            r#"
            INSERT INTO trades (
              user_id,
              product_id,
              offered_product_id,
              message,
              status,
              created_at,
              updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING *
            "#,
        )
        .bind(proposer_id)
        .bind(product_id)
        .bind(offered_product_id)
        .bind(message)
        .bind(TradeStatus::Pending.as_i64())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(Trade::try_from(row)?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Trade>> {
        let mut conn = self.pool.acquire().await?;
        self.get_in(&mut conn, id).await
    }

    pub async fn get_in(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Trade>> {
        let row = sqlx::query_as::<_, TradeRow>(
            r#"
              SELECT *
              FROM trades
              WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(Trade::try_from).transpose()?)
    }

    /// Every trade with both products joined in, newest first
    pub async fn list(&self) -> Result<Vec<TradeListing>> {
        let rows = sqlx::query_as::<_, TradeListingRow>(
            r#"
              SELECT
                t.id AS id,
                t.user_id AS user_sender,
                p1.user_id AS user_receiver,
                t.message AS message,
                t.status AS status,
                t.created_at AS created_at,
                t.updated_at AS updated_at,
                p1.id AS id1,
                p1.name AS name1,
                p1.description AS description1,
                p1.value AS value1,
                p1.photos AS photos1,
                p2.id AS id2,
                p2.name AS name2,
                p2.description AS description2,
                p2.value AS value2,
                p2.photos AS photos2
              FROM trades t
              JOIN products p1 ON p1.id = t.product_id
              JOIN products p2 ON p2.id = t.offered_product_id
              ORDER BY t.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| TradeListing::try_from(row).map_err(Into::into))
            .collect()
    }

    /// Move a trade from `from` to `to`. Returns false when the trade was no
    /// longer in `from`, in which case nothing was written.
    pub async fn set_status(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trades
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to.as_i64())
        .bind(Utc::now().timestamp())
        .bind(id)
        .bind(from.as_i64())
        .execute(conn)
        .await?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    /// Reject every other pending trade that involves either product.
    /// Returns how many trades were closed.
    pub async fn close_competing(
        &self,
        conn: &mut SqliteConnection,
        accepted_id: i64,
        first: i64,
        second: i64,
    ) -> Result<u64> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trades
            SET status = ?1, updated_at = ?2
            WHERE status = ?3
              AND id != ?4
              AND (product_id IN (?5, ?6) OR offered_product_id IN (?5, ?6))
            "#,
        )
        .bind(TradeStatus::Rejected.as_i64())
        .bind(Utc::now().timestamp())
        .bind(TradeStatus::Pending.as_i64())
        .bind(accepted_id)
        .bind(first)
        .bind(second)
        .execute(conn)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::NewUser;
    use crate::repository::products::tests::listing;
    use crate::repository::{ProductRepository, UserRepository};

    struct Fixture {
        pool: SqlitePool,
        trades: TradeRepository,
        alice: i64,
        bob: i64,
        lamp: i64,
        radio: i64,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await;
        let users = UserRepository::new(pool.clone());
        let products = ProductRepository::new(pool.clone());
        let alice = users
            .create(&NewUser::new("Alice", "alice@example.com", "pw"))
            .await
            .unwrap()
            .id;
        let bob = users
            .create(&NewUser::new("Bob", "bob@example.com", "pw"))
            .await
            .unwrap()
            .id;
        let lamp = products
            .create(&listing(alice, "Lamp", 30, "Recife", "PE"))
            .await
            .unwrap()
            .id;
        let radio = products
            .create(&listing(bob, "Radio", 25, "Recife", "PE"))
            .await
            .unwrap()
            .id;
        Fixture {
            trades: TradeRepository::new(pool.clone()),
            pool,
            alice,
            bob,
            lamp,
            radio,
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let f = fixture().await;
        let trade = f
            .trades
            .create(f.bob, f.lamp, f.radio, Some("swap?"))
            .await
            .unwrap();

        assert_eq!(trade.status, TradeStatus::Pending);
        assert_eq!(trade.proposer_id, f.bob);
        assert_eq!(trade.message.as_deref(), Some("swap?"));
        assert_eq!(trade.created_at, trade.updated_at);
        assert_eq!(f.trades.get(trade.id).await.unwrap(), Some(trade));
        assert!(f.trades.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_joins_both_products() {
        let f = fixture().await;
        let trade = f.trades.create(f.bob, f.lamp, f.radio, None).await.unwrap();

        let listed = f.trades.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        let entry = &listed[0];
        assert_eq!(entry.id, trade.id);
        assert_eq!(entry.sender_id, f.bob);
        assert_eq!(entry.receiver_id, f.alice);
        assert_eq!(entry.target.id, f.lamp);
        assert_eq!(entry.target.name, "Lamp");
        assert_eq!(entry.offered.id, f.radio);
        assert_eq!(entry.offered.value, 25);
        assert_eq!(entry.offered.photos.len(), 2);
    }

    #[tokio::test]
    async fn test_set_status_only_from_expected_state() {
        let f = fixture().await;
        let trade = f.trades.create(f.bob, f.lamp, f.radio, None).await.unwrap();

        let mut conn = f.pool.acquire().await.unwrap();
        let moved = f
            .trades
            .set_status(&mut conn, trade.id, TradeStatus::Pending, TradeStatus::Cancelled)
            .await
            .unwrap();
        assert!(moved);

        let again = f
            .trades
            .set_status(&mut conn, trade.id, TradeStatus::Pending, TradeStatus::Accepted)
            .await
            .unwrap();
        assert!(!again);

        let stored = f.trades.get_in(&mut conn, trade.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TradeStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_close_competing_spares_unrelated_and_closed_trades() {
        let f = fixture().await;
        let products = ProductRepository::new(f.pool.clone());
        let kettle = products
            .create(&listing(f.bob, "Kettle", 12, "Recife", "PE"))
            .await
            .unwrap()
            .id;
        let book = products
            .create(&listing(f.alice, "Book", 8, "Recife", "PE"))
            .await
            .unwrap()
            .id;

        let accepted = f.trades.create(f.bob, f.lamp, f.radio, None).await.unwrap();
        let same_target = f.trades.create(f.bob, f.lamp, kettle, None).await.unwrap();
        let reverse = f.trades.create(f.alice, f.radio, book, None).await.unwrap();
        let unrelated = f.trades.create(f.alice, kettle, book, None).await.unwrap();
        let cancelled = f.trades.create(f.bob, f.lamp, kettle, None).await.unwrap();

        let mut conn = f.pool.acquire().await.unwrap();
        f.trades
            .set_status(&mut conn, cancelled.id, TradeStatus::Pending, TradeStatus::Cancelled)
            .await
            .unwrap();
        let closed = f
            .trades
            .close_competing(&mut conn, accepted.id, f.lamp, f.radio)
            .await
            .unwrap();
        assert_eq!(closed, 2);

        let status = |t: Option<Trade>| t.unwrap().status;
        assert_eq!(
            status(f.trades.get_in(&mut conn, accepted.id).await.unwrap()),
            TradeStatus::Pending
        );
        assert_eq!(
            status(f.trades.get_in(&mut conn, same_target.id).await.unwrap()),
            TradeStatus::Rejected
        );
        assert_eq!(
            status(f.trades.get_in(&mut conn, reverse.id).await.unwrap()),
            TradeStatus::Rejected
        );
        assert_eq!(
            status(f.trades.get_in(&mut conn, unrelated.id).await.unwrap()),
            TradeStatus::Pending
        );
        assert_eq!(
            status(f.trades.get_in(&mut conn, cancelled.id).await.unwrap()),
            TradeStatus::Cancelled
        );
    }
}
