//! `SeaORM` implementation of the `DishService` trait.

use async_trait::async_trait;

use crate::constants::reports::TOP_DISHES_LIMIT;
use crate::db::{DishPatch, NewDish, Store, TopDishRow};
use crate::services::dish_service::{
    DishDto, DishError, DishListing, DishService, DishSummary, DishView,
};

pub struct SeaOrmDishService {
    store: Store,
}

impl SeaOrmDishService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn validate_dish_fields(
    name: Option<&str>,
    price: Option<f64>,
    inventory: Option<i32>,
) -> Result<(), DishError> {
    if let Some(name) = name
        && name.trim().is_empty()
    {
        return Err(DishError::Validation("Dish name is required".to_string()));
    }
    if let Some(price) = price
        && !(price >= 0.0)
    {
        return Err(DishError::Validation(
            "Price must be zero or positive".to_string(),
        ));
    }
    if let Some(inventory) = inventory
        && inventory < 0
    {
        return Err(DishError::Validation(
            "Inventory cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl DishService for SeaOrmDishService {
    async fn list_dishes(&self, admin_view: bool) -> Result<DishListing, DishError> {
        let dishes = self.store.list_dishes().await?;

        Ok(if admin_view {
            DishListing::Full(dishes.into_iter().map(DishDto::from).collect())
        } else {
            DishListing::Public(dishes.into_iter().map(DishSummary::from).collect())
        })
    }

    async fn get_dish(&self, id: i32, admin_view: bool) -> Result<DishView, DishError> {
        let dish = self.store.get_dish(id).await?.ok_or(DishError::NotFound)?;

        Ok(if admin_view {
            DishView::Full(DishDto::from(dish))
        } else {
            DishView::Public(DishSummary::from(dish))
        })
    }

    async fn create_dish(&self, dish: NewDish) -> Result<DishDto, DishError> {
        validate_dish_fields(Some(&dish.name), Some(dish.price), Some(dish.inventory))?;

        if self.store.get_dish_by_name(&dish.name).await?.is_some() {
            return Err(DishError::NameTaken);
        }

        let created = self.store.create_dish(dish).await?;
        Ok(DishDto::from(created))
    }

    async fn update_dish(&self, id: i32, patch: DishPatch) -> Result<DishDto, DishError> {
        validate_dish_fields(patch.name.as_deref(), patch.price, patch.inventory)?;

        let dish = self.store.get_dish(id).await?.ok_or(DishError::NotFound)?;

        if let Some(name) = &patch.name
            && let Some(existing) = self.store.get_dish_by_name(name).await?
            && existing.id != dish.id
        {
            return Err(DishError::NameTaken);
        }

        let updated = self.store.update_dish(dish, patch).await?;
        Ok(DishDto::from(updated))
    }

    async fn delete_dish(&self, id: i32) -> Result<(), DishError> {
        if !self.store.delete_dish(id).await? {
            return Err(DishError::NotFound);
        }
        Ok(())
    }

    async fn top_dishes(&self) -> Result<Vec<TopDishRow>, DishError> {
        Ok(self.store.top_dishes(TOP_DISHES_LIMIT).await?)
    }
}
