mod models;

pub use models::{ProfileSnapshot, RoastResult, TokenGrant, TokenInfo, EXPIRY_MARGIN};
