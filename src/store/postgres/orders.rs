use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use super::{PgStore, cart::cart_item_from_entity, decode, from_db_time, to_db_time};
use crate::{
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::AppResult,
    models::{CartItem, Order, OrderDraft, OrderItem, OrderStatus, PaymentStatus},
    store::{OrderFilter, OrderRepository, OrderTotals, Page, Paged},
};

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(&self, draft: OrderDraft) -> AppResult<Order> {
        let txn = self.orm.begin().await?;

        // A second checkout of the same cart blocks here and then finds it empty.
        let lines: Vec<CartItem> = CartItems::find()
            .filter(CartCol::UserId.eq(draft.user_id.clone()))
            .order_by_asc(CartCol::CreatedAt)
            .lock(LockType::Update)
            .all(&txn)
            .await?
            .into_iter()
            .map(cart_item_from_entity)
            .collect();
        let order = draft.freeze(&lines)?;

        let model = OrderActive {
            id: Set(order.id),
            user_id: Set(order.user_id.clone()),
            user_email: Set(order.user_email.clone()),
            order_number: Set(order.order_number.clone()),
            name: Set(order.name.clone()),
            surname: Set(order.surname.clone()),
            phone: Set(order.phone.clone()),
            address: Set(order.address.clone()),
            city: Set(order.city.clone()),
            payment_method: Set(order.payment_method.as_str().to_string()),
            payment_status: Set(order.payment_status.as_str().to_string()),
            status: Set(order.status.as_str().to_string()),
            total_price: Set(order.total_price),
            currency: Set(order.currency.clone()),
            coupon: Set(order.coupon.clone()),
            created_at: Set(to_db_time(order.created_at)),
            updated_at: Set(to_db_time(order.updated_at)),
            shipped_at: Set(order.shipped_at.map(to_db_time)),
            delivered_at: Set(order.delivered_at.map(to_db_time)),
        }
        .insert(&txn)
        .await?;

        if !order.items.is_empty() {
            let rows = order.items.iter().enumerate().map(|(position, item)| OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                position: Set(position as i32),
                product_id: Set(item.product_id),
                product_ref: Set(item.product_ref.clone()),
                title: Set(item.title.clone()),
                image_url: Set(item.image_url.clone()),
                price_at_time: Set(item.price_at_time),
                quantity: Set(item.quantity),
            });
            OrderItems::insert_many(rows).exec(&txn).await?;
        }

        let ordered: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(order.user_id.clone()))
            .filter(CartCol::ProductId.is_in(ordered))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        order_from_entity(model, order.items)
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        let Some(model) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let items = self.load_items(model.id).await?;
        order_from_entity(model, items).map(Some)
    }

    async fn list_orders(&self, filter: OrderFilter, page: Page) -> AppResult<Paged<Order>> {
        let mut condition = Condition::all();
        if let Some(user_id) = filter.user_id {
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = if filter.oldest_first {
            finder.order_by_asc(OrderCol::CreatedAt)
        } else {
            finder.order_by_desc(OrderCol::CreatedAt)
        };

        let total = finder.clone().count(&self.orm).await?;
        let models = finder
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.orm)
            .await?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Position)
            .all(&self.orm)
            .await?
        {
            grouped
                .entry(row.order_id)
                .or_default()
                .push(order_item_from_entity(row));
        }

        let items = models
            .into_iter()
            .map(|model| {
                let lines = grouped.remove(&model.id).unwrap_or_default();
                order_from_entity(model, lines)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Paged { items, total })
    }

    async fn transition_order(
        &self,
        id: Uuid,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>> {
        let txn = self.orm.begin().await?;

        let Some(existing) = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let mut order = order_from_entity(existing.clone(), Vec::new())?;
        order.advance(next, at)?;

        let mut active: OrderActive = existing.into();
        active.status = Set(order.status.as_str().to_string());
        active.shipped_at = Set(order.shipped_at.map(to_db_time));
        active.delivered_at = Set(order.delivered_at.map(to_db_time));
        active.updated_at = Set(to_db_time(order.updated_at));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        let items = self.load_items(updated.id).await?;
        order_from_entity(updated, items).map(Some)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Order>> {
        let Some(existing) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };

        let mut active: OrderActive = existing.into();
        active.payment_status = Set(status.as_str().to_string());
        active.updated_at = Set(to_db_time(at));
        let updated = active.update(&self.orm).await?;

        let items = self.load_items(updated.id).await?;
        order_from_entity(updated, items).map(Some)
    }

    async fn order_totals(&self) -> AppResult<OrderTotals> {
        #[derive(Debug, FromQueryResult)]
        struct TotalsRow {
            count: i64,
            revenue: Option<Decimal>,
        }

        let row = Orders::find()
            .select_only()
            .column_as(Expr::col(OrderCol::Id).count(), "count")
            .column_as(Expr::col(OrderCol::TotalPrice).sum(), "revenue")
            .into_model::<TotalsRow>()
            .one(&self.orm)
            .await?;

        Ok(match row {
            Some(row) => OrderTotals {
                count: u64::try_from(row.count).unwrap_or_default(),
                revenue: row.revenue.unwrap_or_default(),
            },
            None => OrderTotals {
                count: 0,
                revenue: Decimal::ZERO,
            },
        })
    }
}

impl PgStore {
    async fn load_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::Position)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();
        Ok(items)
    }
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItem>) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        user_email: model.user_email,
        order_number: model.order_number,
        name: model.name,
        surname: model.surname,
        phone: model.phone,
        address: model.address,
        city: model.city,
        payment_method: decode("orders.payment_method", &model.payment_method)?,
        payment_status: decode("orders.payment_status", &model.payment_status)?,
        status: decode("orders.status", &model.status)?,
        total_price: model.total_price,
        currency: model.currency,
        coupon: model.coupon,
        items,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
        shipped_at: model.shipped_at.map(from_db_time),
        delivered_at: model.delivered_at.map(from_db_time),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        product_ref: model.product_ref,
        title: model.title,
        image_url: model.image_url,
        price_at_time: model.price_at_time,
        quantity: model.quantity,
    }
}
