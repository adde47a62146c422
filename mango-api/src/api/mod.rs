//! HTTP API handlers for mango-api

pub mod health;
pub mod prescription;

pub use health::health_routes;
pub use prescription::prescription_routes;
