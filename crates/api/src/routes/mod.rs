//! HTTP route handlers.

pub mod cart;
pub mod events;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod recommendations;
