use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryList, ProductList, ServiceList},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
    store::{CatalogRepository, ProductFilter},
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page, window) = query.pagination().window();
    let filter = ProductFilter {
        active_only: true,
        search: query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned),
        category_id: query.category_id,
        featured: query.featured,
    };

    let result = state.store.list_products(filter, window).await?;
    let total = i64::try_from(result.total).unwrap_or(i64::MAX);
    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList {
            items: result.items,
        },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = state
        .store
        .get_product(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = state.store.list_categories().await?;
    let meta = Meta::whole(items.len());
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn list_services(state: &AppState) -> AppResult<ApiResponse<ServiceList>> {
    let items = state.store.list_services(true).await?;
    let meta = Meta::whole(items.len());
    Ok(ApiResponse::success("Services", ServiceList { items }, Some(meta)))
}
