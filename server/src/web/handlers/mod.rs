// server/src/web/handlers/mod.rs

pub mod cart_handlers;
pub mod dish_handlers;
pub mod metrics_handlers;
pub mod user_handlers;
