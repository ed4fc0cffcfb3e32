use serde::Serialize;
use sqlx::FromRow;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Append-only rating fact, recorded when a trade is accepted
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub trade_id: i64,
    pub rating: i64,
    pub created_at: i64,
}

/// Aggregate over every rating a user has received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reputation {
    pub total_ratings: i64,
    pub sum_ratings: i64,
    /// Rounded mean clamped to 1..=5, or 0 when there are no ratings
    pub average: u8,
}

impl Reputation {
    pub fn from_totals(total_ratings: i64, sum_ratings: i64) -> Self {
        let average = if total_ratings > 0 {
            // round half up: floor(sum / count + 1/2)
            let rounded = (2 * sum_ratings + total_ratings).div_euclid(2 * total_ratings);
            rounded.clamp(MIN_RATING, MAX_RATING) as u8
        } else {
            0
        };
        Self {
            total_ratings,
            sum_ratings,
            average,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.total_ratings > 0
    }
}

pub fn is_valid_rating(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
