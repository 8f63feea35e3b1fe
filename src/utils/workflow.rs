use sqlx::MySqlConnection;
use tracing::debug;

use crate::error::ApiError;
use crate::model::Workflow;

/// Extra columns written alongside a status change.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stamp {
    /// `approved_by = ?`
    pub approved_by: Option<u64>,
    /// `<column> = NOW()`
    pub timestamp_column: Option<&'static str>,
}

pub fn transition_sql<S: Workflow>(table: &str, target: S, stamp: &Stamp) -> (String, Vec<S>) {
    let from = S::predecessors(target);
    let mut set = String::from("status = ?");
    if stamp.approved_by.is_some() {
        set.push_str(", approved_by = ?");
    }
    if let Some(column) = stamp.timestamp_column {
        set.push_str(&format!(", {column} = NOW()"));
    }
    let placeholders = vec!["?"; from.len().max(1)].join(", ");
    let sql = format!("UPDATE {table} SET {set} WHERE id = ? AND status IN ({placeholders})");
    (sql, from)
}

/// Moves row `id` to `target` only if its current status is a legal
/// predecessor; a stale or illegal move yields 409, a missing row 404.
pub async fn apply_transition<S: Workflow>(
    conn: &mut MySqlConnection,
    table: &'static str,
    resource: &'static str,
    id: u64,
    target: S,
    stamp: Stamp,
) -> Result<(), ApiError> {
    let (sql, from) = transition_sql(table, target, &stamp);
    debug!(sql = %sql, id, target = target.as_ref(), "Applying status transition");

    let mut query = sqlx::query(&sql).bind(target.as_ref().to_string());
    if let Some(approver) = stamp.approved_by {
        query = query.bind(approver);
    }
    query = query.bind(id);
    if from.is_empty() {
        // unreachable target; keeps the IN list well-formed
        query = query.bind(String::new());
    }
    for status in &from {
        query = query.bind(status.as_ref().to_string());
    }

    let result = query.execute(&mut *conn).await?;
    if result.rows_affected() > 0 {
        return Ok(());
    }

    let current = sqlx::query_scalar::<_, String>(&format!(
        "SELECT status FROM {table} WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Err(rejected_transition(resource, current.as_deref(), target.as_ref()))
}

/// Error for a conditional UPDATE that touched nothing, given the row's status after the fact.
fn rejected_transition(resource: &'static str, current: Option<&str>, target: &str) -> ApiError {
    match current {
        None => ApiError::NotFound(resource),
        Some(current) => ApiError::conflict(format!(
            "{resource} cannot move from '{current}' to '{target}'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::budget::BudgetStatus;
    use crate::model::hrm::PayrollStatus;

    #[test]
    fn sql_includes_stamp_columns_and_predecessors() {
        let stamp = Stamp {
            approved_by: Some(3),
            timestamp_column: None,
        };
        let (sql, from) = transition_sql("budgets", BudgetStatus::Approved, &stamp);
        assert_eq!(
            sql,
            "UPDATE budgets SET status = ?, approved_by = ? WHERE id = ? AND status IN (?)"
        );
        assert_eq!(from, vec![BudgetStatus::Draft]);
    }

    #[test]
    fn timestamp_column_is_set_server_side() {
        let stamp = Stamp {
            approved_by: None,
            timestamp_column: Some("paid_at"),
        };
        let (sql, _) = transition_sql("payroll_entries", PayrollStatus::Paid, &stamp);
        assert_eq!(
            sql,
            "UPDATE payroll_entries SET status = ?, paid_at = NOW() WHERE id = ? AND status IN (?)"
        );
    }

    #[test]
    fn unreachable_target_keeps_placeholder() {
        let (sql, from) = transition_sql("budgets", BudgetStatus::Draft, &Stamp::default());
        assert!(from.is_empty());
        assert!(sql.ends_with("status IN (?)"));
    }

    #[test]
    fn stale_move_is_a_conflict_and_missing_row_not_found() {
        assert!(matches!(
            rejected_transition("Budget", Some("approved"), "approved"),
            ApiError::Conflict(m) if m.contains("from 'approved'")
        ));
        assert!(matches!(
            rejected_transition("Budget", None, "approved"),
            ApiError::NotFound("Budget")
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a MySQL DATABASE_URL"]
    async fn second_approval_of_the_same_row_conflicts(pool: sqlx::MySqlPool) {
        let id = sqlx::query(
            "INSERT INTO budgets (budget_name, period_start, period_end) \
             VALUES ('FY26', '2026-01-01', '2026-12-31')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_id();

        let mut conn = pool.acquire().await.unwrap();
        apply_transition(&mut conn, "budgets", "Budget", id, BudgetStatus::Approved, Stamp::default())
            .await
            .unwrap();
        let second = apply_transition(
            &mut conn,
            "budgets",
            "Budget",
            id,
            BudgetStatus::Approved,
            Stamp::default(),
        )
        .await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));

        let missing = apply_transition(
            &mut conn,
            "budgets",
            "Budget",
            id + 1000,
            BudgetStatus::Approved,
            Stamp::default(),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::NotFound("Budget"))));
    }
}
