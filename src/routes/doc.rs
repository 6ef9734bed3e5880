use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{
            DashboardStats, UpdateAppointmentStatusRequest, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
        },
        appointments::{AppointmentList, BookAppointmentRequest},
        cart::{AddToCartRequest, CartList, UpdateQuantityRequest},
        catalog::{CategoryList, ProductList, ServiceList},
        orders::{CheckoutRequest, OrderList},
        profile::{CreateProfileRequest, UpdateProfileRequest},
    },
    models::{
        AppointmentRequest, AppointmentStatus, CartItem, Category, Order, OrderItem, OrderStatus,
        PaymentMethod, PaymentStatus, Product, Service, UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{admin, appointments, cart, catalog, health, orders, params, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        catalog::list_services,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::cart_stream,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        appointments::book_appointment,
        profile::get_profile,
        profile::create_profile,
        profile::update_profile,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_payment_status,
        admin::list_appointments,
        admin::update_appointment_status,
        admin::dashboard_stats
    ),
    components(
        schemas(
            Product,
            Category,
            Service,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            AppointmentRequest,
            AppointmentStatus,
            UserProfile,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartList,
            CheckoutRequest,
            OrderList,
            BookAppointmentRequest,
            AppointmentList,
            CreateProfileRequest,
            UpdateProfileRequest,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            UpdateAppointmentStatusRequest,
            DashboardStats,
            ProductList,
            CategoryList,
            ServiceList,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<UserProfile>,
            ApiResponse<DashboardStats>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Products, categories and services"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Appointments", description = "Salon booking requests"),
        (name = "Profile", description = "Shopper profile"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
