pub mod auth;
pub mod metrics_store;
