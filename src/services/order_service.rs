//! Domain service for orders: pricing, scheduling, and the completion
//! state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{BestDayRow, TopCustomerRow};
use crate::entities::{order_items, orders};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("Dish {0} not found")]
    DishNotFound(i32),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Delivery orders require an address and coordinates")]
    MissingLocation,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for OrderError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for OrderError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub dish_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// What a customer submits. Totals are never accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderItemInput>,

    /// RFC3339; defaults to one hour from now when omitted.
    pub order_scheduled: Option<String>,

    #[serde(default)]
    pub is_self_collection: bool,

    pub location: Option<LocationInput>,
}

/// Admin patch for an existing order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub order_scheduled: Option<String>,
    pub is_self_collection: Option<bool>,
    pub location: Option<LocationInput>,
    pub is_done: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDto {
    pub dish_id: i32,
    pub quantity: i32,
}

impl From<order_items::Model> for OrderItemDto {
    fn from(model: order_items::Model) -> Self {
        Self {
            dish_id: model.dish_id,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub id: i32,
    pub user_id: i32,
    pub order_time: String,
    pub order_scheduled: String,
    pub is_self_collection: bool,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub total_price: f64,
    pub is_done: bool,
    pub items: Vec<OrderItemDto>,
}

impl OrderDto {
    #[must_use]
    pub fn from_parts(order: orders::Model, items: Vec<order_items::Model>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            order_time: order.order_time,
            order_scheduled: order.order_scheduled,
            is_self_collection: order.is_self_collection,
            location_address: order.location_address,
            location_lat: order.location_lat,
            location_lng: order.location_lng,
            total_price: order.total_price,
            is_done: order.is_done,
            items: items.into_iter().map(OrderItemDto::from).collect(),
        }
    }
}

/// Domain service trait for orders.
#[async_trait::async_trait]
pub trait OrderService: Send + Sync {
    /// Validates, prices, and persists a new order, then notifies the
    /// customer. Notification failure is logged and swallowed; the order
    /// stands.
    async fn create_order(
        &self,
        user_id: i32,
        user_email: &str,
        order: NewOrder,
    ) -> Result<OrderDto, OrderError>;

    /// Orders belonging to one customer, newest first.
    async fn list_mine(&self, user_id: i32) -> Result<Vec<OrderDto>, OrderError>;

    /// Admin: every order, pending before completed.
    async fn list_all(&self) -> Result<Vec<OrderDto>, OrderError>;

    async fn get_order(&self, id: i32) -> Result<OrderDto, OrderError>;

    /// Admin patch. When `is_done` flips to true the customer gets a
    /// completion email, otherwise a generic update email; dispatch
    /// failure never rolls back the change.
    async fn update_order(&self, id: i32, update: OrderUpdate) -> Result<OrderDto, OrderError>;

    /// Admin: hard delete.
    async fn delete_order(&self, id: i32) -> Result<(), OrderError>;

    /// Report: customers ranked by spend over completed orders.
    async fn top_customers(&self) -> Result<Vec<TopCustomerRow>, OrderError>;

    /// Report: most profitable day in the trailing window.
    async fn best_day(&self) -> Result<Option<BestDayRow>, OrderError>;
}
