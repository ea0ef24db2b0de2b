use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::AuthConfig;
use crate::entities::{dishes, order_items, orders, users};

pub mod migrator;
pub mod repositories;

pub use repositories::dish::{DishPatch, NewDish, TopDishRow};
pub use repositories::order::{BestDayRow, NewOrderRecord, OrderPatch, TopCustomerRow};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn dish_repo(&self) -> repositories::dish::DishRepository {
        repositories::dish::DishRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        config: Option<&AuthConfig>,
    ) -> Result<users::Model> {
        self.user_repo().create(name, email, password, config).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_active().await
    }

    pub async fn update_user_profile(
        &self,
        user: users::Model,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<users::Model> {
        self.user_repo().update_profile(user, name, email).await
    }

    pub async fn deactivate_user(&self, user: users::Model) -> Result<()> {
        self.user_repo().deactivate(user).await
    }

    pub async fn set_user_password(
        &self,
        user: users::Model,
        new_password: &str,
        config: Option<&AuthConfig>,
    ) -> Result<users::Model> {
        self.user_repo()
            .set_password(user, new_password, config)
            .await
    }

    pub async fn set_user_reset_token(
        &self,
        user: users::Model,
        token_digest: &str,
        expires_at: &str,
    ) -> Result<users::Model> {
        self.user_repo()
            .set_reset_token(user, token_digest, expires_at)
            .await
    }

    pub async fn clear_user_reset_token(&self, user: users::Model) -> Result<()> {
        self.user_repo().clear_reset_token(user).await
    }

    pub async fn get_user_by_reset_digest(&self, digest: &str) -> Result<Option<users::Model>> {
        self.user_repo().find_by_reset_digest(digest).await
    }

    // ========== Dishes ==========

    pub async fn create_dish(&self, dish: NewDish) -> Result<dishes::Model> {
        self.dish_repo().create(dish).await
    }

    pub async fn get_dish(&self, id: i32) -> Result<Option<dishes::Model>> {
        self.dish_repo().get(id).await
    }

    pub async fn get_dish_by_name(&self, name: &str) -> Result<Option<dishes::Model>> {
        self.dish_repo().get_by_name(name).await
    }

    pub async fn list_dishes(&self) -> Result<Vec<dishes::Model>> {
        self.dish_repo().list().await
    }

    pub async fn update_dish(
        &self,
        dish: dishes::Model,
        patch: DishPatch,
    ) -> Result<dishes::Model> {
        self.dish_repo().update(dish, patch).await
    }

    pub async fn delete_dish(&self, id: i32) -> Result<bool> {
        self.dish_repo().delete(id).await
    }

    pub async fn record_dishes_ordered(&self, dish_ids: &[i32]) -> Result<()> {
        self.dish_repo().record_ordered(dish_ids).await
    }

    pub async fn top_dishes(&self, limit: u64) -> Result<Vec<TopDishRow>> {
        self.dish_repo().top_dishes(limit).await
    }

    // ========== Orders ==========

    pub async fn insert_order(&self, record: NewOrderRecord) -> Result<orders::Model> {
        self.order_repo().insert_with_items(record).await
    }

    pub async fn get_order(&self, id: i32) -> Result<Option<orders::Model>> {
        self.order_repo().get(id).await
    }

    pub async fn get_order_items(&self, order_id: i32) -> Result<Vec<order_items::Model>> {
        self.order_repo().items_for(order_id).await
    }

    pub async fn list_orders_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<(orders::Model, Vec<order_items::Model>)>> {
        self.order_repo().list_for_user(user_id).await
    }

    pub async fn list_all_orders(
        &self,
    ) -> Result<Vec<(orders::Model, Vec<order_items::Model>)>> {
        self.order_repo().list_all().await
    }

    pub async fn patch_order(
        &self,
        order: orders::Model,
        patch: OrderPatch,
    ) -> Result<orders::Model> {
        self.order_repo().apply_patch(order, patch).await
    }

    pub async fn delete_order(&self, id: i32) -> Result<bool> {
        self.order_repo().delete(id).await
    }

    pub async fn top_customers(&self, limit: u64) -> Result<Vec<TopCustomerRow>> {
        self.order_repo().top_customers(limit).await
    }

    pub async fn best_day(&self, since: &str) -> Result<Option<BestDayRow>> {
        self.order_repo().best_day(since).await
    }
}
