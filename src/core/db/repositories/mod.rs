//! Database repositories for cositas
//!
//! Repositories encapsulate data access logic. The user and session
//! repositories also implement the auth store traits.

pub mod product;
pub mod session;
pub mod user;

pub use product::{ProductRepository, ProductRepositoryError};
pub use session::{SessionRepository, SessionRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
