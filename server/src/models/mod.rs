// baattak/server/src/models/mod.rs

//! Records persisted by the repositories and returned by the HTTP API.

pub mod cart;
pub mod dish;
pub mod order_history;
pub mod user;

pub use cart::{Cart, CartStatus, LineItem, NewCart};
pub use dish::{Dish, DishUpdate, NewDish};
pub use order_history::OrderHistory;
pub use user::{NewUser, ProfileUpdate, PublicUser, User};
