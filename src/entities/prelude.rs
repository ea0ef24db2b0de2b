pub use super::dishes::Entity as Dishes;
pub use super::order_items::Entity as OrderItems;
pub use super::orders::Entity as Orders;
pub use super::users::Entity as Users;
