pub mod engine;
pub mod exchange_client;

pub use engine::{run_auction, AuctionOutcome};
pub use exchange_client::{ExchangeClient, Transport};
