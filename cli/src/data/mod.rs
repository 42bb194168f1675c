//! Local cache data layer

pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqliteService};
