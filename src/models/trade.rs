use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt::Display;

/// Each status a trade can have. `Pending` is the only non-terminal one.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TradeStatus {
    Pending = 0,
    Accepted = 1,
    Rejected = 2,
    Cancelled = 3,
}

/// What a participant asks to happen to a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeEvent {
    Accept,
    Reject,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {event:?} a trade that is {from}")]
pub struct InvalidTransition {
    pub from: TradeStatus,
    pub event: TradeEvent,
}

impl TradeStatus {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn is_terminal(self) -> bool {
        self != TradeStatus::Pending
    }

    /// Guarded state machine. Every status write goes through here first.
    pub fn transition(self, event: TradeEvent) -> Result<TradeStatus, InvalidTransition> {
        if self.is_terminal() {
            return Err(InvalidTransition { from: self, event });
        }
        Ok(match event {
            TradeEvent::Accept => TradeStatus::Accepted,
            TradeEvent::Reject => TradeStatus::Rejected,
            TradeEvent::Cancel => TradeStatus::Cancelled,
        })
    }
}

impl TryFrom<i64> for TradeStatus {
    type Error = ServiceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Accepted),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::Cancelled),
            other => Err(ServiceError::MalformedData(format!(
                "unknown trade status {other}"
            ))),
        }
    }
}

impl Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "pending"),
            TradeStatus::Accepted => write!(f, "accepted"),
            TradeStatus::Rejected => write!(f, "rejected"),
            TradeStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A barter proposal: `proposer_id` offers `offered_product_id` (their own)
/// for `product_id` (owned by the recipient).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: i64,
    pub proposer_id: i64,
    pub product_id: i64,
    pub offered_product_id: i64,
    pub message: Option<String>,
    pub status: TradeStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, FromRow)]
pub(crate) struct TradeRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub offered_product_id: i64,
    pub message: Option<String>,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<TradeRow> for Trade {
    type Error = ServiceError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        Ok(Trade {
            id: row.id,
            proposer_id: row.user_id,
            product_id: row.product_id,
            offered_product_id: row.offered_product_id,
            message: row.message,
            status: TradeStatus::try_from(row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Proposal as it arrives from the boundary. The ids are optional here so a
/// missing one can be reported as a validation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTrade {
    pub proposer_id: Option<i64>,
    pub product_id: Option<i64>,
    pub offered_product_id: Option<i64>,
    pub message: Option<String>,
}

impl NewTrade {
    pub fn new(proposer_id: i64, product_id: i64, offered_product_id: i64) -> Self {
        Self {
            proposer_id: Some(proposer_id),
            product_id: Some(product_id),
            offered_product_id: Some(offered_product_id),
            message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// Display fields of one side of a trade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub value: i64,
    pub photos: Vec<String>,
}

/// A trade joined with both products. `receiver_id` is never stored, it is
/// the owner of the targeted product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeListing {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub message: Option<String>,
    pub status: TradeStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub target: ProductSummary,
    pub offered: ProductSummary,
}

#[derive(Debug, FromRow)]
pub(crate) struct TradeListingRow {
    pub id: i64,
    pub user_sender: i64,
    pub user_receiver: i64,
    pub message: Option<String>,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub id1: i64,
    pub name1: String,
    pub description1: Option<String>,
    pub value1: i64,
    pub photos1: Json<Vec<String>>,
    pub id2: i64,
    pub name2: String,
    pub description2: Option<String>,
    pub value2: i64,
    pub photos2: Json<Vec<String>>,
}

impl TryFrom<TradeListingRow> for TradeListing {
    type Error = ServiceError;

    fn try_from(row: TradeListingRow) -> Result<Self, Self::Error> {
        Ok(TradeListing {
            id: row.id,
            sender_id: row.user_sender,
            receiver_id: row.user_receiver,
            message: row.message,
            status: TradeStatus::try_from(row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            target: ProductSummary {
                id: row.id1,
                name: row.name1,
                description: row.description1,
                value: row.value1,
                photos: row.photos1.0,
            },
            offered: ProductSummary {
                id: row.id2,
                name: row.name2,
                description: row.description2,
                value: row.value2,
                photos: row.photos2.0,
            },
        })
    }
}
