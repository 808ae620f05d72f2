pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod domain;
pub mod middleware;
pub mod models;
pub mod money;
pub mod routes;
pub mod schema;
pub mod services;
pub mod stores;
pub mod swagger;
pub mod validation;
