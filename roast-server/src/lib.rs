// Types shared across the server
pub mod common;
mod error;

pub mod server;

// Mock collaborators and a router harness for tests
pub mod testing;

pub use common::{ProfileSnapshot, RoastResult, TokenGrant, TokenInfo};
pub use error::RoastError;
