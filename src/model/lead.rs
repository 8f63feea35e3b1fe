use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeadStage {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Qualified")]
    pub name: String,
    #[schema(example = 2)]
    pub sort_order: u32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Lead {
    pub id: u64,
    #[schema(example = "Maria Lopez")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "ERP rollout for 40 seats")]
    pub subject: String,
    pub company: Option<String>,
    pub stage_id: Option<u64>,
    pub stage_name: Option<String>,
    pub owner_id: Option<u64>,
    pub follow_up_date: Option<NaiveDate>,
    pub is_converted: bool,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
