use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{AppointmentStatus, OrderStatus},
    store::Page,
};

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }

    /// Normalized page number, page size and the store window they select.
    pub fn window(&self) -> (i64, i64, Page) {
        let (page, per_page, offset) = self.normalize();
        (page, per_page, Page::new(per_page as u64, offset as u64))
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

// Query strings are flat: `serde(flatten)` would break numeric parsing in
// `serde_urlencoded`, so every query carries its own page fields.

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive title search.
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub featured: Option<bool>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn status(&self) -> AppResult<Option<OrderStatus>> {
        parse_status(self.status.as_deref())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl AppointmentListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn status(&self) -> AppResult<Option<AppointmentStatus>> {
        parse_status(self.status.as_deref())
    }
}

fn parse_status<T>(raw: Option<&str>) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = crate::error::AppError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(0, 500).normalize(), (1, 100, 0));
        let (page, per_page, window) = Pagination::new(3, 10).window();
        assert_eq!((page, per_page), (3, 10));
        assert_eq!(window, Page::new(10, 20));
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let (page, per_page, offset) = Pagination::new(i64::MAX, 100).normalize();
        assert_eq!((page, per_page, offset), (i64::MAX, 100, i64::MAX));
        let (_, _, window) = Pagination::new(i64::MAX, 100).window();
        assert_eq!(window, Page::new(100, i64::MAX as u64));
    }

    #[test]
    fn blank_status_filter_means_all() {
        let query = OrderListQuery {
            status: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(query.status().unwrap(), None);

        let query = OrderListQuery {
            status: Some("shipped".into()),
            ..Default::default()
        };
        assert_eq!(query.status().unwrap(), Some(OrderStatus::Shipped));

        let query = AppointmentListQuery {
            status: Some("bogus".into()),
            ..Default::default()
        };
        assert!(query.status().is_err());
    }
}
