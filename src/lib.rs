//! Item-for-item bartering marketplace.
//!
//! Users list products, propose trades of one of their products for
//! someone else's, and the counterparty accepts or rejects while the
//! proposer may cancel. Acceptance retires both products and rates the
//! proposer in one transaction.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pretty_table;
pub mod repository;
pub mod service;

pub use error::{ReuseError, Result};
pub use service::Marketplace;
