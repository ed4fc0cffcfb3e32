use crate::models::TradeStatus;
use serde::Serialize;
use std::fmt;

/// Reasons a request is refused. These are expected outcomes and their
/// message is safe to hand back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CantDoReason {
    MissingField(&'static str),
    InvalidRating(i64),
    InvalidValue(i64),
    UserNotFound(i64),
    ProductNotFound(i64),
    TradeNotFound(i64),
    EmailInUse,
    ProductUnavailable(i64),
    TradeClosed { id: i64, status: TradeStatus },
    NotTradeProposer,
    NotProductOwner,
    SelfTrade,
    Unauthorized,
}

impl fmt::Display for CantDoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CantDoReason::MissingField(field) => write!(f, "{field} is required"),
            CantDoReason::InvalidRating(r) => write!(f, "rating must be between 1 and 5, got {r}"),
            CantDoReason::InvalidValue(v) => write!(f, "value must not be negative, got {v}"),
            CantDoReason::UserNotFound(id) => write!(f, "user {id} does not exist"),
            CantDoReason::ProductNotFound(id) => write!(f, "product {id} does not exist"),
            CantDoReason::TradeNotFound(id) => write!(f, "trade {id} does not exist"),
            CantDoReason::EmailInUse => write!(f, "email is already in use"),
            CantDoReason::ProductUnavailable(id) => {
                write!(f, "product {id} is no longer available")
            }
            CantDoReason::TradeClosed { id, status } => {
                write!(f, "trade {id} is already {status}")
            }
            CantDoReason::NotTradeProposer => {
                write!(f, "only the trade proposer can receive this rating")
            }
            CantDoReason::NotProductOwner => {
                write!(f, "offered product does not belong to the proposer")
            }
            CantDoReason::SelfTrade => write!(f, "cannot propose a trade for your own product"),
            CantDoReason::Unauthorized => write!(f, "missing or invalid credentials"),
        }
    }
}

/// Failures that are not the caller's fault.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("database access error: {0}")]
    DbAccessError(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("malformed stored value: {0}")]
    MalformedData(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("password hashing error: {0}")]
    HashError(String),
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReuseError {
    #[error("{0}")]
    CantDo(CantDoReason),
    #[error(transparent)]
    Internal(#[from] ServiceError),
}

/// Coarse classification used by the boundary to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Server,
}

/// Structured failure result handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub success: bool,
    pub kind: ErrorKind,
    pub message: String,
}

impl ReuseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReuseError::CantDo(reason) => match reason {
                CantDoReason::MissingField(_)
                | CantDoReason::InvalidRating(_)
                | CantDoReason::InvalidValue(_)
                | CantDoReason::NotTradeProposer
                | CantDoReason::NotProductOwner
                | CantDoReason::SelfTrade => ErrorKind::Validation,
                CantDoReason::UserNotFound(_)
                | CantDoReason::ProductNotFound(_)
                | CantDoReason::TradeNotFound(_) => ErrorKind::NotFound,
                CantDoReason::EmailInUse
                | CantDoReason::ProductUnavailable(_)
                | CantDoReason::TradeClosed { .. } => ErrorKind::Conflict,
                CantDoReason::Unauthorized => ErrorKind::Unauthorized,
            },
            ReuseError::Internal(_) => ErrorKind::Server,
        }
    }

    pub fn reason(&self) -> Option<&CantDoReason> {
        match self {
            ReuseError::CantDo(reason) => Some(reason),
            ReuseError::Internal(_) => None,
        }
    }

    /// Internal details never leave the process; they are logged here instead.
    pub fn to_failure(&self) -> Failure {
        let message = match self {
            ReuseError::CantDo(reason) => reason.to_string(),
            ReuseError::Internal(e) => {
                tracing::error!(error = %e, "request failed with internal error");
                "server error".to_string()
            }
        };
        Failure {
            success: false,
            kind: self.kind(),
            message,
        }
    }
}

impl From<CantDoReason> for ReuseError {
    fn from(reason: CantDoReason) -> Self {
        ReuseError::CantDo(reason)
    }
}

impl From<sqlx::Error> for ReuseError {
    fn from(e: sqlx::Error) -> Self {
        ReuseError::Internal(ServiceError::DbAccessError(e))
    }
}

pub type Result<T, E = ReuseError> = std::result::Result<T, E>;
