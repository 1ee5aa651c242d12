pub mod error;
pub mod repository;
pub mod seed;
pub mod sqlite;
pub mod state;

pub use error::DatabaseError;
pub use sqlite::Database;
pub use state::AppState;
