use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    NotSet, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{order_items, orders, users};

/// Everything the pricing engine resolved for a new order. Totals arrive
/// precomputed; this layer only persists.
#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub user_id: i32,
    pub order_time: String,
    pub order_scheduled: String,
    pub is_self_collection: bool,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub total_price: f64,
    pub items: Vec<(i32, i32)>,
}

/// Admin patch; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub order_scheduled: Option<String>,
    pub is_self_collection: Option<bool>,
    pub location_address: Option<Option<String>>,
    pub location_lat: Option<Option<f64>>,
    pub location_lng: Option<Option<f64>>,
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct TopCustomerRow {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub orders_count: i64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct BestDayRow {
    pub day: String,
    pub orders_count: i64,
    pub income: f64,
}

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the order and its line items atomically.
    pub async fn insert_with_items(&self, record: NewOrderRecord) -> Result<orders::Model> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        let order = orders::ActiveModel {
            id: NotSet,
            user_id: Set(record.user_id),
            order_time: Set(record.order_time),
            order_scheduled: Set(record.order_scheduled),
            is_self_collection: Set(record.is_self_collection),
            location_address: Set(record.location_address),
            location_lat: Set(record.location_lat),
            location_lng: Set(record.location_lng),
            total_price: Set(record.total_price),
            is_done: Set(false),
        };

        let order = order.insert(&txn).await.context("Failed to insert order")?;

        for (dish_id, quantity) in record.items {
            let item = order_items::ActiveModel {
                id: NotSet,
                order_id: Set(order.id),
                dish_id: Set(dish_id),
                quantity: Set(quantity),
            };
            item.insert(&txn)
                .await
                .context("Failed to insert order item")?;
        }

        txn.commit().await.context("Failed to commit order")?;
        Ok(order)
    }

    pub async fn get(&self, id: i32) -> Result<Option<orders::Model>> {
        orders::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query order")
    }

    pub async fn items_for(&self, order_id: i32) -> Result<Vec<order_items::Model>> {
        order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order_id))
            .all(&self.conn)
            .await
            .context("Failed to query order items")
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<(orders::Model, Vec<order_items::Model>)>> {
        orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .order_by_desc(orders::Column::OrderTime)
            .find_with_related(order_items::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list orders for user")
    }

    /// Full listing for the kitchen: pending orders first, newest within
    /// each group.
    pub async fn list_all(&self) -> Result<Vec<(orders::Model, Vec<order_items::Model>)>> {
        orders::Entity::find()
            .order_by_asc(orders::Column::IsDone)
            .order_by_desc(orders::Column::OrderTime)
            .find_with_related(order_items::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list orders")
    }

    pub async fn apply_patch(
        &self,
        order: orders::Model,
        patch: OrderPatch,
    ) -> Result<orders::Model> {
        let mut active: orders::ActiveModel = order.into();
        if let Some(scheduled) = patch.order_scheduled {
            active.order_scheduled = Set(scheduled);
        }
        if let Some(self_collection) = patch.is_self_collection {
            active.is_self_collection = Set(self_collection);
        }
        if let Some(address) = patch.location_address {
            active.location_address = Set(address);
        }
        if let Some(lat) = patch.location_lat {
            active.location_lat = Set(lat);
        }
        if let Some(lng) = patch.location_lng {
            active.location_lng = Set(lng);
        }
        if let Some(is_done) = patch.is_done {
            active.is_done = Set(is_done);
        }

        active
            .update(&self.conn)
            .await
            .context("Failed to update order")
    }

    /// Hard delete, items included.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        order_items::Entity::delete_many()
            .filter(order_items::Column::OrderId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete order items")?;

        let result = orders::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete order")?;

        txn.commit().await.context("Failed to commit delete")?;
        Ok(result.rows_affected > 0)
    }

    /// Customers ranked by spend over completed orders.
    pub async fn top_customers(&self, limit: u64) -> Result<Vec<TopCustomerRow>> {
        orders::Entity::find()
            .select_only()
            .column_as(orders::Column::UserId, "user_id")
            .column_as(users::Column::Name, "name")
            .column_as(users::Column::Email, "email")
            .column_as(orders::Column::Id.count(), "orders_count")
            .column_as(orders::Column::TotalPrice.sum(), "total_spent")
            .join(JoinType::InnerJoin, orders::Relation::User.def())
            .filter(orders::Column::IsDone.eq(true))
            .group_by(orders::Column::UserId)
            .order_by_desc(Expr::cust("total_spent"))
            .limit(limit)
            .into_model::<TopCustomerRow>()
            .all(&self.conn)
            .await
            .context("Failed to compute top customers")
    }

    /// Most profitable calendar day over completed orders since `since`
    /// (RFC3339). Dates are grouped on the first ten characters of the
    /// stored UTC timestamp.
    pub async fn best_day(&self, since: &str) -> Result<Option<BestDayRow>> {
        orders::Entity::find()
            .select_only()
            .column_as(Expr::cust("substr(order_time, 1, 10)"), "day")
            .column_as(orders::Column::Id.count(), "orders_count")
            .column_as(orders::Column::TotalPrice.sum(), "income")
            .filter(orders::Column::IsDone.eq(true))
            .filter(orders::Column::OrderTime.gte(since))
            .group_by(Expr::cust("substr(order_time, 1, 10)"))
            .order_by_desc(Expr::cust("income"))
            .limit(1)
            .into_model::<BestDayRow>()
            .one(&self.conn)
            .await
            .context("Failed to compute best day")
    }
}
