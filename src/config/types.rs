// Types for the configuration settings

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://reuse.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

/// Marketplace behaviour knobs
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReuseSettings {
    pub log_level: String,
    /// Refuse proposals where the offered product is not the proposer's,
    /// the target is the proposer's own, or either product is already traded
    pub strict_proposals: bool,
    /// On accept, reject every other pending trade touching either product
    pub close_competing_trades: bool,
}

impl Default for ReuseSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            strict_proposals: false,
            close_competing_trades: false,
        }
    }
}
