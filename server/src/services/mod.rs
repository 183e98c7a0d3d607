// baattak/server/src/services/mod.rs

pub mod auth_service;
pub mod mailer;
pub mod metrics;
pub mod sweeper;
pub mod token_service;
