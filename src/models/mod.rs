//! Domain records and the typed views the repositories hand out.

pub mod product;
pub mod rating;
pub mod trade;
pub mod user;

pub use product::{Condition, NewProduct, Product, ProductDetail, ProductFilter, ProductStatus};
pub use rating::{Rating, Reputation};
pub use trade::{
    InvalidTransition, NewTrade, ProductSummary, Trade, TradeEvent, TradeListing, TradeStatus,
};
pub use user::{NewUser, User};
