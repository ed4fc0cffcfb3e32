//! Trade lifecycle service.
//!
//! Every status write on trades and products goes through [`Marketplace`].
//! Cancel and reject are single guarded updates; accept records the rating,
//! closes the trade and retires both products inside one transaction.

use crate::config::ReuseSettings;
use crate::error::{CantDoReason, ErrorKind, ReuseError, Result};
use crate::models::rating::is_valid_rating;
use crate::models::{
    InvalidTransition, NewProduct, NewTrade, NewUser, Product, ProductDetail, ProductFilter,
    Reputation, Trade, TradeEvent, TradeListing, User,
};
use crate::repository::{ProductRepository, TradeRepository, UserRepository};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct Marketplace {
    pool: SqlitePool,
    users: UserRepository,
    products: ProductRepository,
    trades: TradeRepository,
    settings: ReuseSettings,
}

fn closed(id: i64, e: InvalidTransition) -> ReuseError {
    warn!("Trade {id}: {e}");
    CantDoReason::TradeClosed { id, status: e.from }.into()
}

fn required(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CantDoReason::MissingField(field).into());
    }
    Ok(())
}

impl Marketplace {
    pub fn new(
        pool: SqlitePool,
        users: UserRepository,
        products: ProductRepository,
        trades: TradeRepository,
        settings: ReuseSettings,
    ) -> Self {
        Self {
            pool,
            users,
            products,
            trades,
            settings,
        }
    }

    /// Wire a marketplace with fresh repositories over `pool`
    pub fn from_pool(pool: SqlitePool, settings: ReuseSettings) -> Self {
        Self::new(
            pool.clone(),
            UserRepository::new(pool.clone()),
            ProductRepository::new(pool.clone()),
            TradeRepository::new(pool),
            settings,
        )
    }

    pub fn settings(&self) -> &ReuseSettings {
        &self.settings
    }

    pub async fn register_user(&self, new_user: &NewUser) -> Result<User> {
        required(&new_user.name, "name")?;
        required(&new_user.email, "email")?;
        if new_user.password.expose_secret().is_empty() {
            return Err(CantDoReason::MissingField("password").into());
        }

        let user = self.users.create(new_user).await?;
        info!("User {} registered with email {}", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CantDoReason::UserNotFound(user_id).into())
    }

    /// Resolve the caller's identity. Unknown identities and wrong passwords
    /// are both unauthorized, not missing.
    pub async fn authenticate(&self, email: &str, password: &SecretString) -> Result<User> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Rejected unknown identity {email}");
            return Err(CantDoReason::Unauthorized.into());
        };
        if !user.verify_password(password)? {
            warn!("Rejected wrong password for {email}");
            return Err(CantDoReason::Unauthorized.into());
        }
        Ok(user)
    }

    pub async fn reputation(&self, user_id: i64) -> Result<Reputation> {
        self.get_user(user_id).await?;
        self.users.reputation(user_id).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        required(&product.name, "name")?;
        if product.condition.is_none() {
            return Err(CantDoReason::MissingField("condition").into());
        }
        required(&product.city, "city")?;
        required(&product.state, "state")?;
        if product.value < 0 {
            return Err(CantDoReason::InvalidValue(product.value).into());
        }
        self.get_user(product.user_id).await?;

        let created = self.products.create(product).await?;
        info!("User {} listed product {}", created.user_id, created.id);
        Ok(created)
    }

    pub async fn list_available_products(&self) -> Result<Vec<Product>> {
        self.products.list_available().await
    }

    pub async fn get_product(&self, product_id: i64) -> Result<ProductDetail> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CantDoReason::ProductNotFound(product_id))?;
        let reputation = self.users.reputation(product.user_id).await?;

        Ok(ProductDetail {
            product,
            owner_reputation: reputation.average,
        })
    }

    pub async fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.products.filter(filter).await
    }

    pub async fn list_user_products(&self, user_id: i64) -> Result<Vec<Product>> {
        self.get_user(user_id).await?;
        self.products.list_by_owner(user_id).await
    }

    /// Create a pending trade. References are checked for existence; with
    /// `strict_proposals` ownership and availability are checked as well.
    pub async fn propose_trade(&self, proposal: &NewTrade) -> Result<Trade> {
        let proposer_id = proposal
            .proposer_id
            .ok_or(CantDoReason::MissingField("proposer_id"))?;
        let product_id = proposal
            .product_id
            .ok_or(CantDoReason::MissingField("product_id"))?;
        let offered_id = proposal
            .offered_product_id
            .ok_or(CantDoReason::MissingField("offered_product_id"))?;

        self.get_user(proposer_id).await?;
        let target = self
            .products
            .get(product_id)
            .await?
            .ok_or(CantDoReason::ProductNotFound(product_id))?;
        let offered = self
            .products
            .get(offered_id)
            .await?
            .ok_or(CantDoReason::ProductNotFound(offered_id))?;

        if target.id == offered.id {
            return Err(CantDoReason::SelfTrade.into());
        }
        if self.settings.strict_proposals {
            if offered.user_id != proposer_id {
                return Err(CantDoReason::NotProductOwner.into());
            }
            if target.user_id == proposer_id {
                return Err(CantDoReason::SelfTrade.into());
            }
            for product in [&target, &offered] {
                if !product.is_available() {
                    return Err(CantDoReason::ProductUnavailable(product.id).into());
                }
            }
        }

        let message = proposal
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        let trade = self
            .trades
            .create(proposer_id, target.id, offered.id, message)
            .await?;
        info!(
            "User {} proposed trade {}: product {} for product {}",
            proposer_id, trade.id, offered.id, target.id
        );
        Ok(trade)
    }

    pub async fn list_trades(&self) -> Result<Vec<TradeListing>> {
        self.trades.list().await
    }

    pub async fn get_trade(&self, trade_id: i64) -> Result<Trade> {
        self.trades
            .get(trade_id)
            .await?
            .ok_or_else(|| CantDoReason::TradeNotFound(trade_id).into())
    }

    /// Proposer withdraws a pending trade
    pub async fn cancel_trade(&self, trade_id: i64) -> Result<Trade> {
        self.close_trade(trade_id, TradeEvent::Cancel).await
    }

    /// Recipient declines a pending trade
    pub async fn reject_trade(&self, trade_id: i64) -> Result<Trade> {
        self.close_trade(trade_id, TradeEvent::Reject).await
    }

    async fn close_trade(&self, trade_id: i64, event: TradeEvent) -> Result<Trade> {
        let mut conn = self.pool.acquire().await?;
        let trade = self
            .trades
            .get_in(&mut conn, trade_id)
            .await?
            .ok_or(CantDoReason::TradeNotFound(trade_id))?;
        let next = trade
            .status
            .transition(event)
            .map_err(|e| closed(trade_id, e))?;

        if !self
            .trades
            .set_status(&mut conn, trade_id, trade.status, next)
            .await?
        {
            return Err(self.lost_race(&mut conn, trade_id).await);
        }
        info!("Trade {trade_id} is now {next}");

        self.trades
            .get_in(&mut conn, trade_id)
            .await?
            .ok_or_else(|| CantDoReason::TradeNotFound(trade_id).into())
    }

    /// Accept a pending trade and rate its proposer.
    ///
    /// The rating, the status change and the retirement of both products
    /// commit together or not at all. A product that was traded away in the
    /// meantime fails the whole call with `ProductUnavailable`.
    pub async fn accept_trade(&self, trade_id: i64, rated_user_id: i64, rating: i64) -> Result<()> {
        if !is_valid_rating(rating) {
            return Err(CantDoReason::InvalidRating(rating).into());
        }

        // take the write lock before the first read so concurrent accepts
        // queue on busy_timeout instead of failing to upgrade a read lock
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = match self
            .accept_in(&mut conn, trade_id, rated_user_id, rating)
            .await
        {
            Ok(trade) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| trade)
                .map_err(ReuseError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(trade) => {
                info!(
                    "Trade {} accepted, products {} and {} traded, user {} rated {}",
                    trade.id, trade.product_id, trade.offered_product_id, rated_user_id, rating
                );
                Ok(())
            }
            Err(e) => {
                let rolled_back = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                if let Err(rollback) = rolled_back {
                    error!("Trade {trade_id}: rollback failed: {rollback}");
                    // never hand a connection with an open transaction back to the pool
                    drop(conn.detach());
                }
                match e.kind() {
                    ErrorKind::Server => {
                        error!("Trade {trade_id}: accept aborted: {e}")
                    }
                    _ => warn!("Trade {trade_id}: accept refused: {e}"),
                }
                Err(e)
            }
        }
    }

    async fn accept_in(
        &self,
        conn: &mut SqliteConnection,
        trade_id: i64,
        rated_user_id: i64,
        rating: i64,
    ) -> Result<Trade> {
        let trade = self
            .trades
            .get_in(conn, trade_id)
            .await?
            .ok_or(CantDoReason::TradeNotFound(trade_id))?;
        let next = trade
            .status
            .transition(TradeEvent::Accept)
            .map_err(|e| closed(trade_id, e))?;
        if rated_user_id != trade.proposer_id {
            return Err(CantDoReason::NotTradeProposer.into());
        }

        self.users
            .add_rating(conn, rated_user_id, trade_id, rating)
            .await?;

        if !self
            .trades
            .set_status(conn, trade_id, trade.status, next)
            .await?
        {
            return Err(self.lost_race(conn, trade_id).await);
        }

        self.products
            .retire_pair(conn, trade.product_id, trade.offered_product_id)
            .await?;

        if self.settings.close_competing_trades {
            let closed = self
                .trades
                .close_competing(conn, trade_id, trade.product_id, trade.offered_product_id)
                .await?;
            if closed > 0 {
                info!("Trade {trade_id}: rejected {closed} competing pending trades");
            }
        }

        Ok(trade)
    }

    /// The guarded update matched nothing: someone else moved the trade
    /// between our read and our write.
    async fn lost_race(&self, conn: &mut SqliteConnection, trade_id: i64) -> ReuseError {
        match self.trades.get_in(conn, trade_id).await {
            Ok(Some(current)) => {
                warn!("Trade {trade_id} changed concurrently, now {}", current.status);
                CantDoReason::TradeClosed {
                    id: trade_id,
                    status: current.status,
                }
                .into()
            }
            Ok(None) => CantDoReason::TradeNotFound(trade_id).into(),
            Err(e) => e,
        }
    }
}
