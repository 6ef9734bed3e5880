use sea_orm::entity::prelude::*;

/// One row per (user, product); `product_id` is a weak pointer with no
/// foreign key so catalog deletes never touch carts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: Uuid,
    pub product_title: String,
    pub image: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price_at_time: Decimal,
    pub quantity: i32,
    pub product_ref: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
