use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::{fmt::Display, str::FromStr};

/// Condition tag declared by the owner when listing
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    Unmarked,
    Marked,
    Used,
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::New => write!(f, "new"),
            Condition::Unmarked => write!(f, "unmarked"),
            Condition::Marked => write!(f, "marked"),
            Condition::Used => write!(f, "used"),
        }
    }
}

impl FromStr for Condition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "unmarked" => Ok(Self::Unmarked),
            "marked" => Ok(Self::Marked),
            "used" => Ok(Self::Used),
            _ => Err(()),
        }
    }
}

/// Availability flag. Only ever moves from `Available` to `Traded`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    Traded = 0,
    Available = 1,
}

impl ProductStatus {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for ProductStatus {
    type Error = ServiceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Traded),
            1 => Ok(Self::Available),
            other => Err(ServiceError::MalformedData(format!(
                "unknown product status {other}"
            ))),
        }
    }
}

impl Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Traded => write!(f, "traded"),
            ProductStatus::Available => write!(f, "available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub condition: Condition,
    pub value: i64,
    pub city: String,
    pub state: String,
    pub tags: Vec<String>,
    pub photos: Vec<String>,
    pub status: ProductStatus,
    pub created_at: i64,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

/// Stored shape of a product. Lists are JSON text, enums are plain columns.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub condition: String,
    pub value: i64,
    pub city: String,
    pub state: String,
    pub tags: Json<Vec<String>>,
    pub photos: Json<Vec<String>>,
    pub status: i64,
    pub created_at: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = ServiceError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let condition = Condition::from_str(&row.condition).map_err(|_| {
            ServiceError::MalformedData(format!(
                "product {} has unknown condition {}",
                row.id, row.condition
            ))
        })?;
        Ok(Product {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            condition,
            value: row.value,
            city: row.city,
            state: row.state,
            tags: row.tags.0,
            photos: row.photos.0,
            status: ProductStatus::try_from(row.status)?,
            created_at: row.created_at,
        })
    }
}

/// Listing payload. Photo references are the relative paths returned by the
/// upload storage and are kept in upload order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub condition: Option<Condition>,
    pub value: i64,
    pub city: String,
    pub state: String,
    pub tags: Vec<String>,
    pub photos: Vec<String>,
}

/// Optional search criteria, AND-composed. `None` means unconstrained.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl ProductFilter {
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn value_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }
}

/// A product together with its owner's reputation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub owner_reputation: u8,
}
