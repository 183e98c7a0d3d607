// baattak/server/src/lib.rs

//! Baattak ordering backend: dish catalog, order lifecycle, identity and
//! dashboard metrics over a REST API.

pub mod config;
pub mod errors;
pub mod flows;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod web;
