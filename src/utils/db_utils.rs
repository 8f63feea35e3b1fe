use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// `YYYY-MM-DD` prefix, digits only; says nothing about calendar validity.
fn has_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Date-shaped strings must name a real calendar day.
fn parse_temporal(key: &str, s: &str) -> Result<SqlValue, ApiError> {
    if s.len() == 10 {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| ApiError::validation(format!("Invalid date for {key}: {s}")));
    }
    if s.as_bytes()[10] == b'T' {
        return NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(SqlValue::DateTime)
            .map_err(|_| ApiError::validation(format!("Invalid datetime for {key}: {s}")));
    }
    Ok(SqlValue::String(s.to_string()))
}

fn to_sql_value(key: &str, value: &Value) -> Result<SqlValue, ApiError> {
    Ok(match value {
        Value::String(s) if has_date_shape(s) => parse_temporal(key, s)?,
        Value::String(s) => SqlValue::String(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ApiError::validation(format!("Invalid number for {key}")));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        Value::Array(_) | Value::Object(_) => {
            return Err(ApiError::validation(format!(
                "Unsupported value type for {key}"
            )));
        }
    })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed` may be written; anything else is a 400.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    id_column: &str,
    id_value: u64,
    allowed: &[&str],
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::validation("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::validation(format!(
            "Field cannot be updated: {unknown}"
        )));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for (key, value) in obj {
        values.push(to_sql_value(key, value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Runs a whitelisted partial update and maps "no row" to 404.
///
/// MySQL reports zero affected rows when the values are unchanged, so a
/// zero count is confirmed with an existence check before answering 404.
pub async fn update_by_id(
    pool: &MySqlPool,
    table: &'static str,
    id: u64,
    payload: &Value,
    allowed: &[&str],
    resource: &'static str,
) -> Result<(), ApiError> {
    let update = build_update_sql(table, payload, "id", id, allowed)?;
    if execute_update(pool, update).await? == 0 && !exists(pool, table, id).await? {
        return Err(ApiError::NotFound(resource));
    }
    Ok(())
}

pub async fn exists(pool: &MySqlPool, table: &'static str, id: u64) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Fails with 404 naming `resource` when the row is absent.
pub async fn ensure_exists(
    pool: &MySqlPool,
    table: &'static str,
    id: u64,
    resource: &'static str,
) -> Result<(), ApiError> {
    if exists(pool, table, id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound(resource))
    }
}

pub async fn delete_by_id(
    pool: &MySqlPool,
    table: &'static str,
    id: u64,
    resource: &'static str,
) -> Result<(), ApiError> {
    let sql = format!("DELETE FROM {table} WHERE id = ?");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(resource));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: [&str; 3] = ["company_name", "credit_limit", "is_active"];

    #[test]
    fn builds_set_clause_for_allowed_fields() {
        let payload = json!({"company_name": "Acme", "credit_limit": 2500.5});
        let update = build_update_sql("vendors", &payload, "id", 9, &ALLOWED).unwrap();
        assert_eq!(
            update.sql,
            "UPDATE vendors SET company_name = ?, credit_limit = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Acme".into()),
                SqlValue::F64(2500.5),
                SqlValue::U64(9),
            ]
        );
    }

    #[test]
    fn rejects_unknown_columns() {
        let payload = json!({"company_name": "Acme", "id = 1; --": 1});
        assert!(matches!(
            build_update_sql("vendors", &payload, "id", 1, &ALLOWED),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("vendors", &json!({}), "id", 1, &ALLOWED).is_err());
        assert!(build_update_sql("vendors", &json!([1, 2]), "id", 1, &ALLOWED).is_err());
    }

    #[test]
    fn rejects_nested_values() {
        let payload = json!({"company_name": {"nested": true}});
        assert!(build_update_sql("vendors", &payload, "id", 1, &ALLOWED).is_err());
    }

    #[test]
    fn converts_dates_bools_and_nulls() {
        let payload = json!({"company_name": "2026-02-01", "is_active": false, "credit_limit": null});
        let update = build_update_sql("vendors", &payload, "id", 1, &ALLOWED).unwrap();
        assert!(update
            .values
            .contains(&SqlValue::Date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())));
        assert!(update.values.contains(&SqlValue::Bool(false)));
        assert!(update.values.contains(&SqlValue::Null));
    }

    #[test]
    fn impossible_dates_are_validation_errors() {
        for bad in ["2026-13-45", "2026-02-30", "2026-01-01T25:00:00"] {
            let payload = json!({"company_name": bad});
            assert!(
                matches!(
                    build_update_sql("vendors", &payload, "id", 1, &ALLOWED),
                    Err(ApiError::Validation(m)) if m.contains("company_name")
                ),
                "{bad} was accepted"
            );
        }
    }

    #[test]
    fn date_like_text_stays_a_string() {
        let payload = json!({"company_name": "2026-Q1 Supplies"});
        let update = build_update_sql("vendors", &payload, "id", 1, &ALLOWED).unwrap();
        assert_eq!(update.values[0], SqlValue::String("2026-Q1 Supplies".into()));
        let datetime = json!({"company_name": "2026-01-01T08:30:00"});
        let update = build_update_sql("vendors", &datetime, "id", 1, &ALLOWED).unwrap();
        assert!(matches!(update.values[0], SqlValue::DateTime(_)));
    }
}
