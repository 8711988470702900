use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::envelope;
use crate::web::handlers::{
  admin_handlers, auth_handlers, cart_handlers, order_handlers, product_handlers, taxonomy_handlers, user_handlers,
};

async fn health_check_handler() -> HttpResponse {
  envelope::ok(serde_json::json!({ "status": "ok" }))
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

/// Mounts every route under `/api`. Malformed bodies, query strings and path
/// segments are answered through the envelope like any other `BadRequest`.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error))
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/refresh", web::post().to(auth_handlers::refresh_handler))
            .route("/logout", web::post().to(auth_handlers::logout_handler))
            .route("/profile", web::get().to(auth_handlers::profile_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/slug/{slug}", web::get().to(product_handlers::get_product_by_slug_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/categories")
            .route("", web::get().to(taxonomy_handlers::list_categories_handler))
            .route("", web::post().to(taxonomy_handlers::create_category_handler))
            .route("/{category_id}", web::get().to(taxonomy_handlers::get_category_handler))
            .route("/{category_id}", web::put().to(taxonomy_handlers::update_category_handler))
            .route("/{category_id}", web::delete().to(taxonomy_handlers::delete_category_handler)),
        )
        .service(
          web::scope("/brands")
            .route("", web::get().to(taxonomy_handlers::list_brands_handler))
            .route("", web::post().to(taxonomy_handlers::create_brand_handler))
            .route("/{brand_id}", web::get().to(taxonomy_handlers::get_brand_handler))
            .route("/{brand_id}", web::put().to(taxonomy_handlers::update_brand_handler))
            .route("/{brand_id}", web::delete().to(taxonomy_handlers::delete_brand_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::view_cart_handler))
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("", web::delete().to(cart_handlers::clear_cart_handler))
            .route("/{item_id}", web::put().to(cart_handlers::update_cart_item_handler))
            .route("/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::post().to(order_handlers::place_order_handler))
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
        )
        .service(
          web::scope("/users")
            .route("/profile", web::put().to(user_handlers::update_profile_handler))
            .route("/change-password", web::put().to(user_handlers::change_password_handler))
            .route("/addresses", web::get().to(user_handlers::list_addresses_handler))
            .route("/addresses", web::post().to(user_handlers::create_address_handler))
            .route("/addresses/{address_id}", web::put().to(user_handlers::update_address_handler))
            .route("/addresses/{address_id}", web::delete().to(user_handlers::delete_address_handler))
            .route("/wishlist", web::get().to(user_handlers::wishlist_handler))
            .route("/wishlist", web::post().to(user_handlers::add_to_wishlist_handler))
            .route("/wishlist/{product_id}", web::delete().to(user_handlers::remove_from_wishlist_handler)),
        )
        .service(
          web::scope("/admin")
            .route("/dashboard", web::get().to(admin_handlers::dashboard_handler))
            .route("/orders", web::get().to(admin_handlers::list_orders_handler))
            .route("/orders/{order_id}/status", web::put().to(admin_handlers::update_order_status_handler))
            .route("/users", web::get().to(admin_handlers::list_users_handler))
            .route("/users/{user_id}/block", web::put().to(admin_handlers::toggle_block_handler))
            .route("/users/{user_id}/orders", web::get().to(admin_handlers::user_orders_handler)),
        ),
    );
}
