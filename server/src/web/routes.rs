// server/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::web::handlers::{cart_handlers, dish_handlers, metrics_handlers, user_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/dishes")
          .route("", web::get().to(dish_handlers::list_dishes_handler))
          .route("", web::post().to(dish_handlers::create_dish_handler))
          .route("/{dish_id}", web::put().to(dish_handlers::update_dish_handler))
          .route("/{dish_id}", web::delete().to(dish_handlers::delete_dish_handler)),
      )
      .service(
        web::scope("/customer")
          // Orders
          .route("/cart", web::post().to(cart_handlers::submit_order_handler))
          .route("/carts", web::get().to(cart_handlers::list_carts_handler))
          .route("/cart/{user}", web::get().to(cart_handlers::get_cart_by_user_handler))
          .route("/carts/accept/{cart_id}", web::put().to(cart_handlers::accept_order_handler))
          .route("/carts/decline/{cart_id}", web::put().to(cart_handlers::decline_order_handler))
          .route(
            "/carts/move-to-history/{cart_id}",
            web::delete().to(cart_handlers::move_to_history_handler),
          )
          .route("/carts/{cart_id}", web::delete().to(cart_handlers::delete_cart_handler))
          // Identity
          .route("/register/request-otp", web::post().to(user_handlers::request_otp_handler))
          .route("/register/verify-otp", web::post().to(user_handlers::verify_otp_handler))
          .route("/register", web::post().to(user_handlers::register_user_handler))
          .route("/login", web::post().to(user_handlers::login_handler))
          .route("/all", web::get().to(user_handlers::list_users_handler))
          .route("/edit/{user_id}", web::put().to(user_handlers::edit_user_handler))
          .route("/delete/{user_id}", web::delete().to(user_handlers::delete_user_handler))
          .route("/admin/test", web::get().to(user_handlers::admin_test_handler))
          // Dashboard metrics
          .route("/today-revenue", web::get().to(metrics_handlers::today_revenue_handler))
          .route("/total-orders", web::get().to(metrics_handlers::total_orders_handler))
          .route("/usercount", web::get().to(metrics_handlers::user_count_handler))
          .route("/avg-order-value-inweek", web::get().to(metrics_handlers::avg_order_value_handler))
          .route("/recent-orders-today", web::get().to(metrics_handlers::recent_orders_today_handler))
          .route("/popular-items", web::get().to(metrics_handlers::popular_items_handler))
          .route("/orderHistories", web::get().to(metrics_handlers::order_histories_handler)),
      ),
  );
}
