pub mod tokens;
pub use tokens::{ResetToken, SessionClaims, TokenError, TokenService};

pub mod notifier;
pub use notifier::{LogNotifier, Notifier, NotifyError, SmtpNotifier};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession, CurrentUser, SignupRequest, UserProfile};
pub use auth_service_impl::SeaOrmAuthService;

pub mod dish_service;
pub mod dish_service_impl;
pub use dish_service::{DishDto, DishError, DishListing, DishService, DishSummary, DishView};
pub use dish_service_impl::SeaOrmDishService;

pub mod order_service;
pub mod order_service_impl;
pub use order_service::{
    LocationInput, NewOrder, OrderDto, OrderError, OrderItemInput, OrderService, OrderUpdate,
};
pub use order_service_impl::SeaOrmOrderService;
