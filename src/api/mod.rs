use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod dishes;
mod error;
mod orders;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared).await)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    // Menu routes are public but render differently for admins.
    let dish_routes = Router::new()
        .route("/dishes", get(dishes::list_dishes))
        .route("/dishes/top", get(dishes::top_dishes))
        .route("/dishes/{id}", get(dishes::get_dish))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::attach_user,
        ));

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(dish_routes)
        .merge(protected_routes)
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password/{token}", patch(auth::reset_password))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/dishes", post(dishes::create_dish))
        .route("/dishes/{id}", patch(dishes::update_dish))
        .route("/dishes/{id}", delete(dishes::delete_dish))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}", patch(orders::update_order))
        .route("/orders/{id}", delete(orders::delete_order))
        .route("/orders/reports/top-customers", get(orders::top_customers))
        .route("/orders/reports/best-day", get(orders::best_day))
        .route_layer(middleware::from_fn(auth::require_admin));

    Router::new()
        .route("/users/me", get(users::get_me))
        .route("/users/me", patch(users::update_me))
        .route("/users/me", delete(users::delete_me))
        .route("/auth/password", patch(auth::change_password))
        .route("/orders", post(orders::create_order))
        .route("/orders/mine", get(orders::list_my_orders))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}
