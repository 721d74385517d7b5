pub mod response;
pub mod traits;
pub mod yahoo;

pub use traits::MarketDataProvider;
pub use yahoo::YahooProvider;
