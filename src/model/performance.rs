use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::Workflow;
use crate::error::ApiError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewFrequency {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CycleStatus {
    Active,
    Inactive,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ReviewCycle {
    pub id: u64,
    #[schema(example = "2026 H1")]
    pub name: String,
    #[schema(example = "half_yearly")]
    pub frequency: String,
    pub description: Option<String>,
    #[schema(example = "active")]
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InProgress,
    Completed,
}

impl Workflow for ReviewStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            ReviewStatus::Pending => &[ReviewStatus::InProgress],
            ReviewStatus::InProgress => &[ReviewStatus::Completed],
            ReviewStatus::Completed => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PerformanceReview {
    pub id: u64,
    pub review_cycle_id: u64,
    pub employee_id: u64,
    pub reviewer_id: Option<u64>,
    pub review_date: NaiveDate,
    #[schema(example = 4)]
    pub rating: Option<u8>,
    pub comments: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

pub fn validate_rating(rating: u8) -> Result<u8, ApiError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ApiError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert_eq!(validate_rating(1).unwrap(), 1);
        assert_eq!(validate_rating(5).unwrap(), 5);
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn reviews_move_forward_one_step() {
        assert!(ReviewStatus::Pending.can_transition_to(ReviewStatus::InProgress));
        assert!(!ReviewStatus::Pending.can_transition_to(ReviewStatus::Completed));
        assert_eq!(
            ReviewStatus::predecessors(ReviewStatus::Completed),
            vec![ReviewStatus::InProgress]
        );
    }

    #[test]
    fn frequency_names() {
        assert_eq!(ReviewFrequency::HalfYearly.as_ref(), "half_yearly");
        assert_eq!("quarterly".parse::<ReviewFrequency>(), Ok(ReviewFrequency::Quarterly));
    }
}
