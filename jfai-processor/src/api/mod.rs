//! HTTP API handlers

pub mod health;
pub mod media;

pub use health::health_routes;
pub use media::media_routes;
