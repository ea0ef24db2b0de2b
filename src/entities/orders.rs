use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Creation stamp (RFC3339)
    pub order_time: String,

    /// Requested delivery/collection time; validated into the
    /// one-to-six-hour window at creation.
    pub order_scheduled: String,

    pub is_self_collection: bool,

    pub location_address: Option<String>,

    pub location_lat: Option<f64>,

    pub location_lng: Option<f64>,

    /// Always computed server-side from current dish prices.
    pub total_price: f64,

    pub is_done: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::order_items::Entity")]
    Items,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
