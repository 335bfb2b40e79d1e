//! Products module for cositas
//!
//! REST API endpoints for the public catalog and its admin operations.

pub mod api;

pub use api::{ContactLink, ProductApiState, product_api_router};
