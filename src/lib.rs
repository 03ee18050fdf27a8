pub mod core;
pub mod exchanges;

pub use core::{errors::ExchangeError, traits::ExchangeConnector, types::*};
pub use exchanges::max::{build_connector, MaxBuilder, MaxConnector};
