use crate::handlers;
use actix_web::web::{self, ServiceConfig};

pub fn config(cfg: &mut ServiceConfig) {
    cfg.service(web::scope("/health").route("", web::get().to(handlers::health::health)))
        .route("/dashboard", web::get().to(handlers::reports::dashboard))
        .service(
            web::scope("/api")
                .service(
                    // Fixed segments before `/{id}`.
                    web::scope("/orders")
                        .route("", web::get().to(handlers::orders::list_orders))
                        .route("", web::post().to(handlers::orders::create_order))
                        .route("/register", web::post().to(handlers::orders::create_order))
                        .route("/active", web::get().to(handlers::orders::list_active))
                        .route("/inactive", web::get().to(handlers::orders::list_inactive))
                        .route("/{id}", web::get().to(handlers::orders::get_order))
                        .route("/{id}", web::put().to(handlers::orders::update_order))
                        .route("/{id}", web::delete().to(handlers::orders::delete_order)),
                )
                .route(
                    "/reports/cancellation",
                    web::get().to(handlers::reports::cancellation_report),
                )
                .route("/order-status", web::get().to(handlers::reports::order_status))
                .route("/filter-options", web::get().to(handlers::reports::filter_options))
                .route("/reason-options", web::get().to(handlers::reports::reason_options))
                .route("/login", web::post().to(handlers::auth::login))
                .route("/check-auth", web::get().to(handlers::auth::check_auth))
                .route("/logout", web::get().to(handlers::auth::logout))
                .route("/signup", web::post().to(handlers::auth::signup)),
        );
}
