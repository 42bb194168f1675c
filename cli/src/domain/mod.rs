//! Core domain logic: identifier grammar, fetch engine, cache
//! reconciliation, mutation executor and audit phrase construction.

pub mod audit;
pub mod fetch;
pub mod ident;
pub mod mutate;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
