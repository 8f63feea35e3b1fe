pub mod account;
pub mod budget_planner;
pub mod hrm;
pub mod lead;
pub mod performance;
pub mod roles;
pub mod training;

use actix_web::HttpResponse;
use serde_json::{Value, json};
use std::str::FromStr;

use crate::error::ApiError;

pub(crate) fn created(resource: &str, id: u64) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "message": format!("{resource} created successfully"),
        "id": id,
    }))
}

pub(crate) fn message(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": text.into() }))
}

/// Trims and rejects blank required text.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn non_negative(field: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

pub(crate) fn parse_enum<E: FromStr>(field: &str, value: &str) -> Result<E, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid {field}: {value}")))
}

/// Validates enum-typed keys of a dynamic update payload before it is written.
pub(crate) fn check_enum_field<E: FromStr>(payload: &Value, field: &str) -> Result<(), ApiError> {
    match payload.get(field) {
        None => Ok(()),
        Some(Value::String(s)) => parse_enum::<E>(field, s).map(|_| ()),
        Some(_) => Err(ApiError::validation(format!("{field} must be a string"))),
    }
}

pub(crate) fn check_non_negative_field(payload: &Value, field: &str) -> Result<(), ApiError> {
    match payload.get(field) {
        None => Ok(()),
        Some(v) => match v.as_f64() {
            Some(n) => non_negative(field, n).map(|_| ()),
            None => Err(ApiError::validation(format!("{field} must be a number"))),
        },
    }
}

pub(crate) fn check_required_text_field(payload: &Value, field: &str) -> Result<(), ApiError> {
    match payload.get(field) {
        None => Ok(()),
        Some(Value::String(s)) => required_text(field, s).map(|_| ()),
        Some(_) => Err(ApiError::validation(format!("{field} must be a non-empty string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hrm::EmployeeStatus;

    #[test]
    fn text_is_trimmed_and_required() {
        assert_eq!(required_text("name", "  Ops ").unwrap(), "Ops");
        assert!(required_text("name", "   ").is_err());
    }

    #[test]
    fn enum_fields_in_payload_are_checked() {
        let ok = json!({"status": "inactive"});
        let bad = json!({"status": "retired"});
        let wrong_type = json!({"status": 3});
        assert!(check_enum_field::<EmployeeStatus>(&ok, "status").is_ok());
        assert!(check_enum_field::<EmployeeStatus>(&bad, "status").is_err());
        assert!(check_enum_field::<EmployeeStatus>(&wrong_type, "status").is_err());
        assert!(check_enum_field::<EmployeeStatus>(&json!({}), "status").is_ok());
    }

    #[test]
    fn numeric_fields_in_payload_are_checked() {
        assert!(check_non_negative_field(&json!({"cost": 10}), "cost").is_ok());
        assert!(check_non_negative_field(&json!({"cost": -1}), "cost").is_err());
        assert!(check_non_negative_field(&json!({"cost": "ten"}), "cost").is_err());
    }
}
