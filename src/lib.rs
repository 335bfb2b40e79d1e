//! Cositas - Product Catalog
//!
//! A small second-hand catalog with a session-guarded admin back-office,
//! served by axum on top of PostgreSQL.

pub mod app;
pub mod core;
