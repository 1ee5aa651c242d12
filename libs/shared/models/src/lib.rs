pub mod auth;
pub mod entities;
pub mod error;

pub use auth::{RequestContext, Role};
pub use entities::*;
pub use error::AppError;
