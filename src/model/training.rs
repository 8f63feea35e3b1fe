use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::Workflow;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TrainingType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Compliance")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainingStatus {
    Pending,
    Started,
    Completed,
    Terminated,
}

impl Workflow for TrainingStatus {
    fn allowed_next(self) -> &'static [Self] {
        match self {
            TrainingStatus::Pending => &[TrainingStatus::Started, TrainingStatus::Terminated],
            TrainingStatus::Started => &[TrainingStatus::Completed, TrainingStatus::Terminated],
            TrainingStatus::Completed | TrainingStatus::Terminated => &[],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Training {
    pub id: u64,
    #[schema(example = "Data protection essentials")]
    pub title: String,
    pub training_type_id: Option<u64>,
    pub trainer: Option<String>,
    pub employee_id: Option<u64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(example = 350.0)]
    pub cost: f64,
    #[schema(example = "pending")]
    pub status: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_is_possible_until_completion() {
        assert!(TrainingStatus::Pending.can_transition_to(TrainingStatus::Terminated));
        assert!(TrainingStatus::Started.can_transition_to(TrainingStatus::Terminated));
        assert!(!TrainingStatus::Completed.can_transition_to(TrainingStatus::Terminated));
        assert_eq!(
            TrainingStatus::predecessors(TrainingStatus::Terminated),
            vec![TrainingStatus::Pending, TrainingStatus::Started]
        );
    }
}
