pub mod conversions;
pub mod reference;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;

// Re-export main components
pub use builder::{build_connector, MaxBuilder, DEFAULT_RATE_LIMIT_MS};
pub use connector::{Account, MarketData, MaxConnector, MaxContext, Trading};
pub use reference::{ReferenceCache, ReferenceTables};
pub use rest::{MaxRest, DEFAULT_BASE_URL, EXCHANGE_ID};
pub use signer::MaxSigner;
pub use types::MaxOrderRequest;
