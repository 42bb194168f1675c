//! External-facing adapters

pub mod mcp;
