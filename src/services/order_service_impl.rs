//! `SeaORM` implementation of the `OrderService` trait.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::config::OrderConfig;
use crate::constants::reports::{PROFIT_WINDOW_DAYS, TOP_CUSTOMERS_LIMIT};
use crate::db::{BestDayRow, NewOrderRecord, OrderPatch, Store, TopCustomerRow};
use crate::services::notifier::{Notifier, messages};
use crate::services::order_service::{
    NewOrder, OrderDto, OrderError, OrderService, OrderUpdate,
};

pub struct SeaOrmOrderService {
    store: Store,
    notifier: Arc<dyn Notifier>,
    order_config: OrderConfig,
}

impl SeaOrmOrderService {
    #[must_use]
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, order_config: OrderConfig) -> Self {
        Self {
            store,
            notifier,
            order_config,
        }
    }

    /// Resolve the requested schedule against the allowed window, or
    /// default to the earliest slot.
    fn resolve_schedule(
        &self,
        requested: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, OrderError> {
        let earliest = now + Duration::hours(self.order_config.min_schedule_hours);
        let latest = now + Duration::hours(self.order_config.max_schedule_hours);

        let Some(requested) = requested else {
            return Ok(earliest.to_rfc3339());
        };

        let scheduled = DateTime::parse_from_rfc3339(requested).map_err(|_| {
            OrderError::InvalidSchedule("order_scheduled must be an RFC3339 timestamp".to_string())
        })?;

        if scheduled.timestamp() < earliest.timestamp()
            || scheduled.timestamp() > latest.timestamp()
        {
            return Err(OrderError::InvalidSchedule(format!(
                "Orders must be scheduled between {} and {} hours from now",
                self.order_config.min_schedule_hours, self.order_config.max_schedule_hours
            )));
        }

        Ok(scheduled.to_rfc3339())
    }

    async fn notify(&self, to: &str, subject: &str, body: &str) {
        // Order state never depends on email delivery.
        if let Err(e) = self.notifier.send(to, subject, body).await {
            warn!(to = %to, "Order notification failed: {e}");
        }
    }
}

#[async_trait]
impl OrderService for SeaOrmOrderService {
    async fn create_order(
        &self,
        user_id: i32,
        user_email: &str,
        order: NewOrder,
    ) -> Result<OrderDto, OrderError> {
        if order.items.is_empty() {
            return Err(OrderError::Validation(
                "An order needs at least one dish".to_string(),
            ));
        }
        for item in &order.items {
            if item.quantity < 1 {
                return Err(OrderError::Validation(
                    "Quantities must be at least 1".to_string(),
                ));
            }
        }

        let mut subtotal = 0.0;
        for item in &order.items {
            let dish = self
                .store
                .get_dish(item.dish_id)
                .await?
                .ok_or(OrderError::DishNotFound(item.dish_id))?;
            subtotal += dish.price * f64::from(item.quantity);
        }

        let now = Utc::now();
        let order_scheduled = self.resolve_schedule(order.order_scheduled.as_deref(), now)?;

        if !order.is_self_collection {
            let location = order.location.as_ref().ok_or(OrderError::MissingLocation)?;
            if location.address.trim().is_empty() {
                return Err(OrderError::MissingLocation);
            }
            if !location.lat.is_finite() || !location.lng.is_finite() {
                return Err(OrderError::Validation(
                    "Delivery coordinates must be finite numbers".to_string(),
                ));
            }
        }

        let delivery_fee = if order.is_self_collection {
            0.0
        } else {
            self.order_config.delivery_fee
        };
        let total_price = subtotal + delivery_fee;

        let (location_address, location_lat, location_lng) = match order.location {
            Some(location) => (
                Some(location.address),
                Some(location.lat),
                Some(location.lng),
            ),
            None => (None, None, None),
        };

        let items: Vec<(i32, i32)> = order
            .items
            .iter()
            .map(|item| (item.dish_id, item.quantity))
            .collect();

        let record = NewOrderRecord {
            user_id,
            order_time: now.to_rfc3339(),
            order_scheduled,
            is_self_collection: order.is_self_collection,
            location_address,
            location_lat,
            location_lng,
            total_price,
            items,
        };

        let created = self.store.insert_order(record).await?;

        let ordered_dishes: Vec<i32> = order
            .items
            .iter()
            .map(|item| item.dish_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        self.store.record_dishes_ordered(&ordered_dishes).await?;

        let (subject, body) = messages::order_received(created.id, created.total_price);
        self.notify(user_email, &subject, &body).await;

        let items = self.store.get_order_items(created.id).await?;
        Ok(OrderDto::from_parts(created, items))
    }

    async fn list_mine(&self, user_id: i32) -> Result<Vec<OrderDto>, OrderError> {
        let orders = self.store.list_orders_for_user(user_id).await?;
        Ok(orders
            .into_iter()
            .map(|(order, items)| OrderDto::from_parts(order, items))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<OrderDto>, OrderError> {
        let orders = self.store.list_all_orders().await?;
        Ok(orders
            .into_iter()
            .map(|(order, items)| OrderDto::from_parts(order, items))
            .collect())
    }

    async fn get_order(&self, id: i32) -> Result<OrderDto, OrderError> {
        let order = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
        let items = self.store.get_order_items(id).await?;
        Ok(OrderDto::from_parts(order, items))
    }

    async fn update_order(&self, id: i32, update: OrderUpdate) -> Result<OrderDto, OrderError> {
        let order = self.store.get_order(id).await?.ok_or(OrderError::NotFound)?;
        let was_done = order.is_done;

        let (location_address, location_lat, location_lng) = match update.location {
            Some(location) => (
                Some(Some(location.address)),
                Some(Some(location.lat)),
                Some(Some(location.lng)),
            ),
            None => (None, None, None),
        };

        let patch = OrderPatch {
            order_scheduled: update.order_scheduled,
            is_self_collection: update.is_self_collection,
            location_address,
            location_lat,
            location_lng,
            is_done: update.is_done,
        };

        let updated = self.store.patch_order(order, patch).await?;

        // The persisted change stands whether or not the email goes out.
        if let Some(user) = self.store.get_user_by_id(updated.user_id).await? {
            let (subject, body) = if !was_done && updated.is_done {
                messages::order_completed(updated.id)
            } else {
                messages::order_updated(updated.id)
            };
            self.notify(&user.email, &subject, &body).await;
        }

        let items = self.store.get_order_items(updated.id).await?;
        Ok(OrderDto::from_parts(updated, items))
    }

    async fn delete_order(&self, id: i32) -> Result<(), OrderError> {
        if !self.store.delete_order(id).await? {
            return Err(OrderError::NotFound);
        }
        Ok(())
    }

    async fn top_customers(&self) -> Result<Vec<TopCustomerRow>, OrderError> {
        Ok(self.store.top_customers(TOP_CUSTOMERS_LIMIT).await?)
    }

    async fn best_day(&self) -> Result<Option<BestDayRow>, OrderError> {
        let since = (Utc::now() - Duration::days(PROFIT_WINDOW_DAYS)).to_rfc3339();
        Ok(self.store.best_day(&since).await?)
    }
}
