//! Core domain models and business logic for the catalog and its admin area

pub mod auth;
pub mod config;
pub mod db;
pub mod products;
