pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod drivers;
pub mod emergency;
pub mod error;
pub mod fare;
pub mod geo;
pub mod kafka;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod processor;
pub mod retry;
pub mod store;
