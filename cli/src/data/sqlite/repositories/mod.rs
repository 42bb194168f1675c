//! Entity repositories for SQLite operations
//!
//! One module per cached entity. Replace operations open their own
//! transaction: the delete and the inserts either all commit or none do,
//! so a failed sync never leaves a half-replaced snapshot.

pub mod collaborators;
pub mod memberships;
pub mod repos;
pub mod teams;
pub mod token;
pub mod users;
