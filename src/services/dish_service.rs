//! Domain service for the dish catalog.

use serde::Serialize;
use thiserror::Error;

use crate::db::{DishPatch, NewDish, TopDishRow};
use crate::entities::dishes;

#[derive(Debug, Error)]
pub enum DishError {
    #[error("Dish not found")]
    NotFound,

    #[error("A dish with this name already exists")]
    NameTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for DishError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DishError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Full record, admin eyes only.
#[derive(Debug, Clone, Serialize)]
pub struct DishDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub inventory: i32,
    pub image_cover: String,
    pub images: Vec<String>,
    pub order_count: i32,
    pub last_order_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<dishes::Model> for DishDto {
    fn from(model: dishes::Model) -> Self {
        let images = serde_json::from_str(&model.images).unwrap_or_default();
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            inventory: model.inventory,
            image_cover: model.image_cover,
            images,
            order_count: model.order_count,
            last_order_date: model.last_order_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Menu projection shown to customers and anonymous callers.
#[derive(Debug, Clone, Serialize)]
pub struct DishSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_cover: String,
}

impl From<dishes::Model> for DishSummary {
    fn from(model: dishes::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_cover: model.image_cover,
        }
    }
}

/// Role-dependent view of a dish or listing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DishView {
    Full(DishDto),
    Public(DishSummary),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DishListing {
    Full(Vec<DishDto>),
    Public(Vec<DishSummary>),
}

/// Domain service trait for the catalog.
#[async_trait::async_trait]
pub trait DishService: Send + Sync {
    /// List the catalog; `admin_view` selects the full record set.
    async fn list_dishes(&self, admin_view: bool) -> Result<DishListing, DishError>;

    async fn get_dish(&self, id: i32, admin_view: bool) -> Result<DishView, DishError>;

    /// Admin: add a dish to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`DishError::NameTaken`] on duplicate names and
    /// [`DishError::Validation`] for negative price or inventory.
    async fn create_dish(&self, dish: NewDish) -> Result<DishDto, DishError>;

    async fn update_dish(&self, id: i32, patch: DishPatch) -> Result<DishDto, DishError>;

    async fn delete_dish(&self, id: i32) -> Result<(), DishError>;

    /// Best-selling dishes report, capped at the configured limit.
    async fn top_dishes(&self) -> Result<Vec<TopDishRow>, DishError>;
}
