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
    domain::{
        capabilities::{AdminEntity, Capability},
        order::{OrderStatus, PaymentMethod, ShippingType},
    },
    dto::{
        addresses::{AddressList, AddressRequest},
        admin::{
            CapabilityList, InventoryAdjustRequest, LowStockQuery, PhoneOtpList,
            UpdateOrderStatusRequest, UpdateSettingsRequest,
        },
        auth::{LoginRequest, LoginResponse, OtpIssued, OtpRequest, OtpVerifyRequest, SessionResponse},
        blog::{
            BlogCategory, CreateCategoryRequest, CreateCommentRequest, CreatePostRequest,
            PostDetail, PostList, PostStatus,
        },
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartLineRequest},
        dashboard::Dashboard,
        favorites::{FavoriteToggle, ToggleFavoriteRequest},
        orders::{CheckoutResponse, CreateOrderRequest, OrderList, OrderWithItems, RetryPaymentResponse},
        payments::{PaymentDispatch, PaymentOutcome, PaymentOutcomeStatus},
        products::{ColorList, CreateColorRequest, CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Address, Color, Order, OrderItem, PhoneOtp, Post, PostComment, Product, SiteSettings, User},
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, blog, cart, dashboard, favorites, health, orders, params, payments,
        products,
    },
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
        auth::open_session,
        auth::request_otp,
        auth::verify_otp,
        auth::login,
        products::list_products,
        products::get_product,
        products::list_colors,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::create_color,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_line,
        cart::remove_line,
        cart::clear_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::retry_payment,
        payments::payment_callback,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        favorites::toggle_favorite,
        favorites::list_favorites,
        dashboard::dashboard,
        blog::list_posts,
        blog::get_post,
        blog::add_comment,
        blog::list_categories,
        blog::create_post,
        blog::publish_post,
        blog::approve_comment,
        blog::create_category,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::get_settings,
        admin::create_settings,
        admin::update_settings,
        admin::list_capabilities,
        admin::list_phone_otps
    ),
    components(
        schemas(
            User,
            Address,
            Color,
            Product,
            Order,
            OrderItem,
            SiteSettings,
            PhoneOtp,
            Post,
            PostComment,
            OrderStatus,
            PaymentMethod,
            ShippingType,
            AdminEntity,
            Capability,
            OtpRequest,
            OtpIssued,
            OtpVerifyRequest,
            LoginRequest,
            LoginResponse,
            SessionResponse,
            AddToCartRequest,
            UpdateCartLineRequest,
            CartLine,
            CartView,
            CreateOrderRequest,
            OrderWithItems,
            OrderList,
            CheckoutResponse,
            RetryPaymentResponse,
            PaymentDispatch,
            PaymentOutcome,
            PaymentOutcomeStatus,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateColorRequest,
            ColorList,
            AddressRequest,
            AddressList,
            ToggleFavoriteRequest,
            FavoriteToggle,
            Dashboard,
            PostStatus,
            PostList,
            PostDetail,
            CreatePostRequest,
            CreateCommentRequest,
            CreateCategoryRequest,
            BlogCategory,
            UpdateOrderStatusRequest,
            LowStockQuery,
            InventoryAdjustRequest,
            UpdateSettingsRequest,
            CapabilityList,
            PhoneOtpList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentOutcome>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Guest sessions, OTP and password login"),
        (name = "Products", description = "Catalog and colors"),
        (name = "Cart", description = "Session and user carts"),
        (name = "Orders", description = "Checkout, order history and payment retry"),
        (name = "Payments", description = "Zarinpal callback"),
        (name = "Addresses", description = "Shipping addresses"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Dashboard", description = "Account summary"),
        (name = "Blog", description = "Posts, comments and categories"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
