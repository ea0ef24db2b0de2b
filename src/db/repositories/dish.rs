use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    NotSet, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{dishes, order_items};

/// Fields accepted when creating a dish.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDish {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub inventory: i32,
    #[serde(default)]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub inventory: Option<i32>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
}

/// One row of the best-sellers report.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct TopDishRow {
    pub dish_id: i32,
    pub name: String,
    pub price: f64,
    pub times_ordered: i64,
    pub total_quantity: i64,
}

pub struct DishRepository {
    conn: DatabaseConnection,
}

impl DishRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, dish: NewDish) -> Result<dishes::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let images =
            serde_json::to_string(&dish.images).context("Failed to encode dish images")?;

        let model = dishes::ActiveModel {
            id: NotSet,
            name: Set(dish.name),
            description: Set(dish.description),
            price: Set(dish.price),
            inventory: Set(dish.inventory),
            image_cover: Set(dish.image_cover),
            images: Set(images),
            order_count: Set(0),
            last_order_date: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert dish")
    }

    pub async fn get(&self, id: i32) -> Result<Option<dishes::Model>> {
        dishes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query dish")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<dishes::Model>> {
        dishes::Entity::find()
            .filter(dishes::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query dish by name")
    }

    pub async fn list(&self) -> Result<Vec<dishes::Model>> {
        dishes::Entity::find()
            .order_by_asc(dishes::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list dishes")
    }

    pub async fn update(&self, dish: dishes::Model, patch: DishPatch) -> Result<dishes::Model> {
        let mut active: dishes::ActiveModel = dish.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(inventory) = patch.inventory {
            active.inventory = Set(inventory);
        }
        if let Some(image_cover) = patch.image_cover {
            active.image_cover = Set(image_cover);
        }
        if let Some(images) = patch.images {
            active.images =
                Set(serde_json::to_string(&images).context("Failed to encode dish images")?);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update dish")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = dishes::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete dish")?;
        Ok(result.rows_affected > 0)
    }

    /// Bump `order_count` and stamp `last_order_date` for every dish that
    /// appears in a newly created order.
    pub async fn record_ordered(&self, dish_ids: &[i32]) -> Result<()> {
        if dish_ids.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        dishes::Entity::update_many()
            .col_expr(
                dishes::Column::OrderCount,
                Expr::col(dishes::Column::OrderCount).add(1),
            )
            .col_expr(dishes::Column::LastOrderDate, Expr::value(now.clone()))
            .col_expr(dishes::Column::UpdatedAt, Expr::value(now))
            .filter(dishes::Column::Id.is_in(dish_ids.to_vec()))
            .exec(&self.conn)
            .await
            .context("Failed to bump dish order counts")?;

        Ok(())
    }

    /// Best-selling dishes: group order lines by dish, ranked by how many
    /// orders each dish appeared in.
    pub async fn top_dishes(&self, limit: u64) -> Result<Vec<TopDishRow>> {
        order_items::Entity::find()
            .select_only()
            .column_as(order_items::Column::DishId, "dish_id")
            .column_as(dishes::Column::Name, "name")
            .column_as(dishes::Column::Price, "price")
            .column_as(order_items::Column::OrderId.count(), "times_ordered")
            .column_as(order_items::Column::Quantity.sum(), "total_quantity")
            .join(JoinType::InnerJoin, order_items::Relation::Dish.def())
            .group_by(order_items::Column::DishId)
            .order_by_desc(Expr::cust("times_ordered"))
            .limit(limit)
            .into_model::<TopDishRow>()
            .all(&self.conn)
            .await
            .context("Failed to compute top dishes")
    }
}
