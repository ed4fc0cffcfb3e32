pub mod products;
pub mod trades;
pub mod users;

pub use products::ProductRepository;
pub use trades::TradeRepository;
pub use users::UserRepository;
