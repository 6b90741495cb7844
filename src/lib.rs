pub mod app;
pub mod config;
pub mod db;
pub mod http_client;
pub mod state;
pub mod users;
