// Configuration settings for the marketplace daemon
pub mod settings;
/// Typed sections of `settings.toml`
pub mod types;
pub mod util;

pub use settings::Settings;
pub use types::{DatabaseSettings, ReuseSettings};
pub use util::init_default_dir;
