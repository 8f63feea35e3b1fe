use chrono::NaiveDate;
use serde::Serialize;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::{Arguments, FromRow, MySqlPool};
use tracing::debug;
use utoipa::ToSchema;

use crate::model::{
    account::{ChartOfAccount, Vendor},
    budget::Budget,
    hrm::{Department, Employee, LeaveRequest, PayrollEntry, Resignation},
    lead::Lead,
    performance::{PerformanceReview, ReviewCycle},
    training::Training,
};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// One page of a list endpoint.
#[derive(Serialize, ToSchema)]
#[aliases(
    DepartmentPage = Paginated<Department>,
    EmployeePage = Paginated<Employee>,
    LeavePage = Paginated<LeaveRequest>,
    ResignationPage = Paginated<Resignation>,
    PayrollEntryPage = Paginated<PayrollEntry>,
    ChartOfAccountPage = Paginated<ChartOfAccount>,
    VendorPage = Paginated<Vendor>,
    BudgetPage = Paginated<Budget>,
    LeadPage = Paginated<Lead>,
    ReviewCyclePage = Paginated<ReviewCycle>,
    PerformanceReviewPage = Paginated<PerformanceReview>,
    TrainingPage = Paginated<Training>
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

/// ORDER BY resolved against a whitelist of `(public name, sql column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub descending: bool,
}

impl Sort {
    /// Unknown columns fall back to the first whitelist entry; direction
    /// defaults to descending.
    pub fn resolve(
        sort: Option<&str>,
        direction: Option<&str>,
        allowed: &[(&'static str, &'static str)],
    ) -> Self {
        let column = sort
            .and_then(|s| allowed.iter().find(|(name, _)| *name == s))
            .or_else(|| allowed.first())
            .map(|(_, column)| *column)
            .unwrap_or("id");
        let descending = !matches!(
            direction.map(|d| d.to_ascii_lowercase()).as_deref(),
            Some("asc")
        );
        Self { column, descending }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "ORDER BY {} {}",
            self.column,
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

// Helper enum for typed SQLx binding
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    U64(u64),
    Str(String),
    Bool(bool),
    Date(NaiveDate),
}

impl From<u64> for FilterValue {
    fn from(v: u64) -> Self {
        FilterValue::U64(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Str(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        FilterValue::Date(v)
    }
}

/// WHERE clause builder; columns are always code-supplied, values are bound.
#[derive(Debug, Default)]
pub struct Filter {
    conditions: Vec<String>,
    args: Vec<FilterValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Into<FilterValue>>(mut self, column: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.conditions.push(format!("{column} = ?"));
            self.args.push(value.into());
        }
        self
    }

    pub fn on_or_after(mut self, column: &str, value: Option<NaiveDate>) -> Self {
        if let Some(value) = value {
            self.conditions.push(format!("{column} >= ?"));
            self.args.push(value.into());
        }
        self
    }

    pub fn on_or_before(mut self, column: &str, value: Option<NaiveDate>) -> Self {
        if let Some(value) = value {
            self.conditions.push(format!("{column} <= ?"));
            self.args.push(value.into());
        }
        self
    }

    /// `(a LIKE ? OR b LIKE ? ...)` over the given columns; blank terms are ignored.
    pub fn search(mut self, columns: &[&str], term: Option<&str>) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        if columns.is_empty() {
            return self;
        }
        let like = format!("%{}%", term);
        let clause = columns
            .iter()
            .map(|c| format!("{c} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({clause})"));
        self.args
            .extend(columns.iter().map(|_| FilterValue::Str(like.clone())));
        self
    }

    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn args(&self) -> &[FilterValue] {
        &self.args
    }

    pub fn arguments(&self) -> MySqlArguments {
        let mut arguments = MySqlArguments::default();
        for arg in &self.args {
            match arg {
                FilterValue::U64(v) => arguments.add(*v),
                FilterValue::Str(v) => arguments.add(v.clone()),
                FilterValue::Bool(v) => arguments.add(*v),
                FilterValue::Date(v) => arguments.add(*v),
            }
        }
        arguments
    }
}

/// Counts and fetches one page from `from` (a table or join expression).
pub async fn fetch_page<T>(
    pool: &MySqlPool,
    select: &str,
    from: &str,
    filter: &Filter,
    sort: Sort,
    page: Page,
) -> Result<Paginated<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let where_sql = filter.where_sql();

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM {from} {where_sql}");
    debug!(sql = %count_sql, bindings = ?filter.args(), "Counting rows");
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, filter.arguments())
        .fetch_one(pool)
        .await?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {select} FROM {from} {where_sql} {} LIMIT ? OFFSET ?",
        sort.to_sql()
    );
    debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching page");

    let mut arguments = filter.arguments();
    arguments.add(page.per_page as i64);
    arguments.add(page.offset() as i64);

    let data = sqlx::query_as_with::<_, T, _>(&data_sql, arguments)
        .fetch_all(pool)
        .await?;

    Ok(Paginated {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SORTS: [(&str, &str); 2] = [("id", "v.id"), ("company_name", "v.company_name")];

    #[test]
    fn page_is_clamped() {
        assert_eq!(Page::new(None, None), Page { page: 1, per_page: 10 });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(Some(3), Some(500)).per_page, MAX_PER_PAGE);
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn sort_falls_back_to_default_column() {
        let sort = Sort::resolve(Some("password; DROP TABLE x"), None, &SORTS);
        assert_eq!(sort.column, "v.id");
        assert!(sort.descending);
        assert_eq!(sort.to_sql(), "ORDER BY v.id DESC");
    }

    #[test]
    fn sort_accepts_whitelisted_column_and_direction() {
        let sort = Sort::resolve(Some("company_name"), Some("ASC"), &SORTS);
        assert_eq!(sort.to_sql(), "ORDER BY v.company_name ASC");
    }

    #[test]
    fn filter_collects_only_present_values() {
        let filter = Filter::new()
            .eq("status", Some("active"))
            .eq::<u64>("department_id", None)
            .search(&["first_name", "email"], Some("  ann "));
        assert_eq!(
            filter.where_sql(),
            "WHERE status = ? AND (first_name LIKE ? OR email LIKE ?)"
        );
        assert_eq!(
            filter.args(),
            &[
                FilterValue::Str("active".into()),
                FilterValue::Str("%ann%".into()),
                FilterValue::Str("%ann%".into()),
            ]
        );
    }

    #[test]
    fn blank_search_adds_nothing() {
        let filter = Filter::new().search(&["name"], Some("   "));
        assert_eq!(filter.where_sql(), "");
        assert!(filter.args().is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1);
        let filter = Filter::new()
            .on_or_after("start_date", from)
            .on_or_before("end_date", None);
        assert_eq!(filter.where_sql(), "WHERE start_date >= ?");
    }
}
