use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use serde_json::Value;
use uuid::Uuid;

use super::{PgStore, conflict_as_validation, from_db_time, to_db_time};
use crate::{
    entity::{
        categories::{self, Column as CategoryCol, Entity as Categories},
        products::{self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        services::{self, Column as ServiceCol, Entity as Services},
    },
    error::AppResult,
    models::{Category, Product, Service},
    store::{CatalogRepository, Page, Paged, ProductChanges, ProductFilter},
};

#[async_trait]
impl CatalogRepository for PgStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = Products::find_by_id(id).one(&self.orm).await?;
        Ok(product.map(product_from_entity))
    }

    async fn list_products(&self, filter: ProductFilter, page: Page) -> AppResult<Paged<Product>> {
        let mut condition = Condition::all();
        if filter.active_only {
            condition = condition.add(ProdCol::IsActive.eq(true));
        }
        if let Some(category_id) = filter.category_id {
            condition = condition.add(ProdCol::CategoryId.eq(category_id));
        }
        if let Some(featured) = filter.featured {
            condition = condition.add(ProdCol::Featured.eq(featured));
        }
        if let Some(q) = filter.search.as_deref().filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(q));
            condition = condition.add(Expr::col(ProdCol::Title).ilike(pattern));
        }

        let finder = Products::find()
            .filter(condition)
            .order_by_desc(ProdCol::CreatedAt)
            .order_by_asc(ProdCol::Id);

        let total = finder.clone().count(&self.orm).await?;
        let items = finder
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();

        Ok(Paged { items, total })
    }

    async fn create_product(&self, product: Product) -> AppResult<Product> {
        let model = ProductActive {
            id: Set(product.id),
            title: Set(product.title.clone()),
            brand: Set(product.brand.clone()),
            sku: Set(product.sku.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            discount: Set(product.discount),
            stock: Set(product.stock),
            category_id: Set(product.category_id),
            images: Set(strings_to_json(&product.images)),
            tags: Set(strings_to_json(&product.tags)),
            is_active: Set(product.is_active),
            featured: Set(product.featured),
            created_at: Set(to_db_time(product.created_at)),
            updated_at: Set(to_db_time(product.updated_at)),
        }
        .insert(&self.orm)
        .await
        .map_err(|err| conflict_as_validation(err, "product sku already exists"))?;

        Ok(product_from_entity(model))
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Product>> {
        let Some(existing) = Products::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };

        let mut active: ProductActive = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(discount) = changes.discount {
            active.discount = Set(discount);
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(featured) = changes.featured {
            active.featured = Set(featured);
        }
        active.updated_at = Set(to_db_time(at));

        let updated = active.update(&self.orm).await?;
        Ok(Some(product_from_entity(updated)))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = Categories::find()
            .order_by_asc(CategoryCol::Name)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(|model| Category {
                id: model.id,
                name: model.name,
            })
            .collect();
        Ok(categories)
    }

    async fn create_category(&self, category: Category) -> AppResult<Category> {
        categories::ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
            created_at: Set(to_db_time(Utc::now())),
        }
        .insert(&self.orm)
        .await
        .map_err(|err| conflict_as_validation(err, "category already exists"))?;
        Ok(category)
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        let service = Services::find_by_id(id).one(&self.orm).await?;
        Ok(service.map(service_from_entity))
    }

    async fn list_services(&self, active_only: bool) -> AppResult<Vec<Service>> {
        let mut finder = Services::find();
        if active_only {
            finder = finder.filter(ServiceCol::IsActive.eq(true));
        }
        let services = finder
            .order_by_asc(ServiceCol::Title)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(service_from_entity)
            .collect();
        Ok(services)
    }

    async fn create_service(&self, service: Service) -> AppResult<Service> {
        let model = services::ActiveModel {
            id: Set(service.id),
            title: Set(service.title),
            description: Set(service.description),
            duration_minutes: Set(service.duration_minutes),
            price: Set(service.price),
            currency: Set(service.currency),
            image: Set(service.image),
            is_active: Set(service.is_active),
            created_at: Set(to_db_time(Utc::now())),
        }
        .insert(&self.orm)
        .await?;
        Ok(service_from_entity(model))
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn strings_to_json(values: &[String]) -> Value {
    Value::from(values.to_vec())
}

fn json_to_strings(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        title: model.title,
        brand: model.brand,
        sku: model.sku,
        description: model.description,
        price: model.price,
        discount: model.discount,
        stock: model.stock,
        category_id: model.category_id,
        images: json_to_strings(model.images),
        tags: json_to_strings(model.tags),
        is_active: model.is_active,
        featured: model.featured,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    }
}

fn service_from_entity(model: services::Model) -> Service {
    Service {
        id: model.id,
        title: model.title,
        description: model.description,
        duration_minutes: model.duration_minutes,
        price: model.price,
        currency: model.currency,
        image: model.image,
        is_active: model.is_active,
    }
}
