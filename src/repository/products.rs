use crate::error::{CantDoReason, Result};
use crate::models::product::ProductRow;
use crate::models::{NewProduct, Product, ProductFilter, ProductStatus};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter()
        .map(|row| Product::try_from(row).map_err(Into::into))
        .collect()
}

/// Escape LIKE wildcards so user input only ever matches literally
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Available products, newest first
    pub async fn list_available(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
              SELECT *
              FROM products
              WHERE status = ?1
              ORDER BY id DESC
            "#,
        )
        .bind(ProductStatus::Available.as_i64())
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        self.get_in(&mut conn, id).await
    }

    pub async fn get_in(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
              SELECT *
              FROM products
              WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(Product::try_from).transpose()?)
    }

    /// Every product of an owner, whatever its status, newest first
    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
              SELECT *
              FROM products
              WHERE user_id = ?1
              ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    /// Available products matching every filter that is set. Name matching
    /// is a case-insensitive substring match against the folded name.
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM products WHERE status = ");
        query.push_bind(ProductStatus::Available.as_i64());

        if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
            query
                .push(" AND name_folded LIKE ")
                .push_bind(like_pattern(&name.to_lowercase()))
                .push(" ESCAPE '\\'");
        }
        if let Some(city) = filter.city.as_deref().filter(|c| !c.is_empty()) {
            query.push(" AND city = ").push_bind(city.to_string());
        }
        if let Some(state) = filter.state.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND state = ").push_bind(state.to_string());
        }
        if let Some(min) = filter.min_value {
            query.push(" AND value >= ").push_bind(min);
        }
        if let Some(max) = filter.max_value {
            query.push(" AND value <= ").push_bind(max);
        }
        query.push(" ORDER BY id DESC");

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    /// Insert a new listing. New products always start available.
    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let condition = product
            .condition
            .ok_or(CantDoReason::MissingField("condition"))?;
        let created_at = Utc::now().timestamp();

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
              user_id,
              name,
              description,
              condition,
              value,
              city,
              state,
              tags,
              photos,
              status,
              created_at,
              name_folded
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING *
            "#,
        )
        .bind(product.user_id)
        .bind(&product.name)
        .bind(product.description.as_ref())
        .bind(condition.to_string())
        .bind(product.value)
        .bind(&product.city)
        .bind(&product.state)
        .bind(Json(&product.tags))
        .bind(Json(&product.photos))
        .bind(ProductStatus::Available.as_i64())
        .bind(created_at)
        .bind(product.name.to_lowercase())
        .fetch_one(&self.pool)
        .await?;

        Ok(Product::try_from(row)?)
    }

    /// Flip both products of an accepted trade to traded. Each flip only
    /// applies to a product that is still available, otherwise the whole
    /// call fails and the caller must roll back.
    pub async fn retire_pair(
        &self,
        conn: &mut SqliteConnection,
        first: i64,
        second: i64,
    ) -> Result<()> {
        for id in [first, second] {
            let rows_affected = sqlx::query(
                r#"
                UPDATE products
                SET status = ?1
                WHERE id = ?2 AND status = ?3
                "#,
            )
            .bind(ProductStatus::Traded.as_i64())
            .bind(id)
            .bind(ProductStatus::Available.as_i64())
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                return Err(CantDoReason::ProductUnavailable(id).into());
            }
            debug!("Product {id} retired");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::models::{Condition, NewUser};
    use crate::repository::UserRepository;

    pub(crate) fn listing(user_id: i64, name: &str, value: i64, city: &str, state: &str) -> NewProduct {
        NewProduct {
            user_id,
            name: name.to_string(),
            description: Some(format!("{name} in good shape")),
            condition: Some(Condition::Used),
            value,
            city: city.to_string(),
            state: state.to_string(),
            tags: vec!["books".to_string(), "tools".to_string()],
            photos: vec![
                "/product-pictures/product-1.jpg".to_string(),
                "/product-pictures/product-2.jpg".to_string(),
            ],
        }
    }

    async fn setup() -> (ProductRepository, i64) {
        let pool = memory_pool().await;
        let users = UserRepository::new(pool.clone());
        let owner = users
            .create(&NewUser::new("Ana", "ana@example.com", "pw"))
            .await
            .unwrap();
        (ProductRepository::new(pool), owner.id)
    }

    #[tokio::test]
    async fn test_create_stores_lists_and_starts_available() {
        let (repo, owner) = setup().await;
        let created = repo
            .create(&listing(owner, "Office chair", 100, "Recife", "PE"))
            .await
            .unwrap();

        assert_eq!(created.status, ProductStatus::Available);
        assert_eq!(created.tags, vec!["books", "tools"]);
        assert_eq!(
            created.photos,
            vec![
                "/product-pictures/product-1.jpg",
                "/product-pictures/product-2.jpg"
            ]
        );

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_condition() {
        let (repo, owner) = setup().await;
        let mut product = listing(owner, "Desk", 10, "Recife", "PE");
        product.condition = None;
        let err = repo.create(&product).await.unwrap_err();
        assert_eq!(err.reason(), Some(&CantDoReason::MissingField("condition")));
    }

    #[tokio::test]
    async fn test_list_available_newest_first() {
        let (repo, owner) = setup().await;
        let first = repo.create(&listing(owner, "Lamp", 10, "Recife", "PE")).await.unwrap();
        let second = repo.create(&listing(owner, "Rug", 20, "Recife", "PE")).await.unwrap();
        let third = repo.create(&listing(owner, "Vase", 30, "Recife", "PE")).await.unwrap();

        let mut conn = repo.pool.acquire().await.unwrap();
        repo.retire_pair(&mut conn, second.id, third.id).await.unwrap();
        drop(conn);

        let available = repo.list_available().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, first.id);

        let owned = repo.list_by_owner(owner).await.unwrap();
        let ids: Vec<i64> = owned.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_filter_composition() {
        let (repo, owner) = setup().await;
        repo.create(&listing(owner, "Office Chair", 40, "Recife", "PE")).await.unwrap();
        repo.create(&listing(owner, "rocking chair", 80, "Olinda", "PE")).await.unwrap();
        repo.create(&listing(owner, "Chairman poster", 5, "Natal", "RN")).await.unwrap();
        repo.create(&listing(owner, "Table", 30, "Recife", "PE")).await.unwrap();

        let names = |products: Vec<Product>| -> Vec<String> {
            products.into_iter().map(|p| p.name).collect()
        };

        let by_name = repo.filter(&ProductFilter::default().name("chair")).await.unwrap();
        assert_eq!(
            names(by_name),
            vec!["Chairman poster", "rocking chair", "Office Chair"]
        );

        let in_range = repo
            .filter(&ProductFilter::default().value_range(Some(10), Some(50)))
            .await
            .unwrap();
        assert_eq!(names(in_range), vec!["Table", "Office Chair"]);

        let combined = repo
            .filter(
                &ProductFilter::default()
                    .name("CHAIR")
                    .state("PE")
                    .value_range(None, Some(50)),
            )
            .await
            .unwrap();
        assert_eq!(names(combined), vec!["Office Chair"]);

        let by_city = repo.filter(&ProductFilter::default().city("Olinda")).await.unwrap();
        assert_eq!(names(by_city), vec!["rocking chair"]);

        let everything = repo.filter(&ProductFilter::default()).await.unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[tokio::test]
    async fn test_filter_excludes_traded_and_escapes_wildcards() {
        let (repo, owner) = setup().await;
        let a = repo.create(&listing(owner, "100% cotton shirt", 15, "Recife", "PE")).await.unwrap();
        let b = repo.create(&listing(owner, "cotton_bag", 15, "Recife", "PE")).await.unwrap();
        repo.create(&listing(owner, "cotton socks", 15, "Recife", "PE")).await.unwrap();

        let percent = repo.filter(&ProductFilter::default().name("0% c")).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].id, a.id);

        let underscore = repo.filter(&ProductFilter::default().name("n_b")).await.unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].id, b.id);

        let mut conn = repo.pool.acquire().await.unwrap();
        repo.retire_pair(&mut conn, a.id, b.id).await.unwrap();
        drop(conn);
        let cotton = repo.filter(&ProductFilter::default().name("cotton")).await.unwrap();
        assert_eq!(cotton.len(), 1);
        assert_eq!(cotton[0].name, "cotton socks");
    }

    #[tokio::test]
    async fn test_filter_folds_accented_names() {
        let (repo, owner) = setup().await;
        let stove = repo.create(&listing(owner, "Fogão antigo", 120, "Recife", "PE")).await.unwrap();
        let tree = repo.create(&listing(owner, "ÁRVORE de Natal", 60, "Natal", "RN")).await.unwrap();
        repo.create(&listing(owner, "Fogareiro", 20, "Recife", "PE")).await.unwrap();

        for needle in ["FOGÃO", "fogão", "Fogão Antigo"] {
            let found = repo.filter(&ProductFilter::default().name(needle)).await.unwrap();
            assert_eq!(found.len(), 1, "needle {needle}");
            assert_eq!(found[0].id, stove.id);
        }

        let found = repo.filter(&ProductFilter::default().name("árvore")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tree.id);
        assert_eq!(found[0].name, "ÁRVORE de Natal");
    }

    #[tokio::test]
    async fn test_retire_pair_is_one_way() {
        let (repo, owner) = setup().await;
        let a = repo.create(&listing(owner, "Bike", 300, "Recife", "PE")).await.unwrap();
        let b = repo.create(&listing(owner, "Helmet", 50, "Recife", "PE")).await.unwrap();
        let c = repo.create(&listing(owner, "Pump", 20, "Recife", "PE")).await.unwrap();

        let mut conn = repo.pool.acquire().await.unwrap();
        repo.retire_pair(&mut conn, a.id, b.id).await.unwrap();

        let err = repo.retire_pair(&mut conn, c.id, a.id).await.unwrap_err();
        assert_eq!(err.reason(), Some(&CantDoReason::ProductUnavailable(a.id)));
        drop(conn);

        assert_eq!(repo.get(a.id).await.unwrap().unwrap().status, ProductStatus::Traded);
        assert_eq!(repo.get(b.id).await.unwrap().unwrap().status, ProductStatus::Traded);
    }
}
