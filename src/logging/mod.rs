pub mod auction_log;
pub mod runtime_logger;

pub use auction_log::AuctionLog;
pub use runtime_logger::RuntimeLogger;
