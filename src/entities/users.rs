use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access role attached to every account. Admin-only operations compare
/// against this enum directly rather than a dynamic role list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "customer")]
    Customer,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: UserRole,

    /// Stamped on every password change; tokens issued before it are dead.
    pub password_changed_at: Option<String>,

    /// sha256 hex of the outstanding reset token, if any
    pub password_reset_token: Option<String>,

    pub password_reset_expires: Option<String>,

    /// Soft-delete flag; self-service deletion only flips this.
    pub active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
