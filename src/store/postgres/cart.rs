use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::NotSet,
    ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use super::{PgStore, from_db_time, to_db_time};
use crate::{
    entity::cart_items::{self, ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    error::{AppError, AppResult},
    models::{CartItem, MAX_LINE_QUANTITY, bumped_quantity},
    store::CartRepository,
};

#[async_trait]
impl CartRepository for PgStore {
    async fn list_cart_items(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        let items = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .order_by_asc(CartCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(cart_item_from_entity)
            .collect();
        Ok(items)
    }

    async fn upsert_cart_item(&self, user_id: &str, item: CartItem) -> AppResult<CartItem> {
        let quantity = bumped_quantity(0, item.quantity)?;
        let active = CartActive {
            user_id: Set(user_id.to_owned()),
            product_id: Set(item.product_id),
            product_title: Set(item.product_title),
            image: Set(item.image),
            price_at_time: Set(item.price_at_time),
            quantity: Set(quantity),
            product_ref: Set(item.product_ref),
            created_at: NotSet,
            updated_at: Set(to_db_time(item.updated_at)),
        };

        // The increment happens inside Postgres so concurrent adds never lose a unit.
        // The WHERE guard skips the update when the bump would pass the line limit.
        let bumped = Expr::col((CartItems, CartCol::Quantity)).add(quantity);
        let on_conflict = OnConflict::columns([CartCol::UserId, CartCol::ProductId])
            .value(CartCol::Quantity, bumped.clone())
            .update_column(CartCol::UpdatedAt)
            .action_and_where(Expr::expr(bumped).lte(MAX_LINE_QUANTITY))
            .to_owned();

        let model = CartItems::insert(active)
            .on_conflict(on_conflict)
            .exec_with_returning(&self.orm)
            .await
            .map_err(|err| match err {
                DbErr::RecordNotInserted | DbErr::RecordNotFound(_) => AppError::validation(
                    format!("a cart line holds at most {MAX_LINE_QUANTITY} units"),
                ),
                other => other.into(),
            })?;
        Ok(cart_item_from_entity(model))
    }

    async fn set_cart_quantity(
        &self,
        user_id: &str,
        product_id: Uuid,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<CartItem>> {
        let updated = CartItems::update_many()
            .col_expr(CartCol::Quantity, Expr::value(quantity))
            .col_expr(CartCol::UpdatedAt, Expr::value(to_db_time(at)))
            .filter(CartCol::UserId.eq(user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .exec_with_returning(&self.orm)
            .await?;
        Ok(updated.into_iter().next().map(cart_item_from_entity))
    }

    async fn delete_cart_item(&self, user_id: &str, product_id: Uuid) -> AppResult<()> {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .exec(&self.orm)
            .await?;
        Ok(())
    }
}

pub(super) fn cart_item_from_entity(model: cart_items::Model) -> CartItem {
    CartItem {
        product_id: model.product_id,
        product_title: model.product_title,
        image: model.image,
        price_at_time: model.price_at_time,
        quantity: model.quantity,
        product_ref: model.product_ref,
        updated_at: from_db_time(model.updated_at),
    }
}
