use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::info;

use crate::model::{
    budget::BudgetStatus,
    hrm::EmployeeStatus,
    performance::{CycleStatus, ReviewFrequency},
};

// (code, first, last, email, department, designation, salary)
const EMPLOYEES: [(&str, &str, &str, &str, &str, &str, f64); 4] = [
    ("EMP-0001", "Amina", "Rahman", "amina.rahman@example.com", "Human Resources", "HR Manager", 52000.0),
    ("EMP-0002", "Daniel", "Okafor", "daniel.okafor@example.com", "Finance", "Accountant", 48000.0),
    ("EMP-0003", "Sofia", "Lindqvist", "sofia.lindqvist@example.com", "Sales", "Account Executive", 45000.0),
    ("EMP-0004", "Kenji", "Watanabe", "kenji.watanabe@example.com", "Engineering", "Software Engineer", 61000.0),
];

// (code, company, contact, email, payment terms, credit limit)
const VENDORS: [(&str, &str, &str, &str, u32, f64); 2] = [
    ("VEN-0001", "Northwind Supplies", "Laura Chen", "orders@northwind.example", 30, 15000.0),
    ("VEN-0002", "Contoso Facilities", "Marc Dubois", "billing@contoso.example", 45, 8000.0),
];

// (name, email, subject, company, stage)
const LEADS: [(&str, &str, &str, &str, &str); 2] = [
    ("Maria Lopez", "maria@fabrikam.example", "ERP rollout for 40 seats", "Fabrikam", "Qualified"),
    ("Tom Becker", "tom@adatum.example", "Payroll outsourcing", "Adatum", "New"),
];

async fn seed_employees(pool: &MySqlPool, hire_date: NaiveDate) -> Result<()> {
    for (code, first, last, email, department, designation, salary) in EMPLOYEES {
        sqlx::query(
            r#"
            INSERT IGNORE INTO employees
            (employee_code, first_name, last_name, email, department_id, designation,
             hire_date, basic_salary, status)
            SELECT ?, ?, ?, ?, (SELECT id FROM departments WHERE name = ?), ?, ?, ?, ?
            "#,
        )
        .bind(code)
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(department)
        .bind(designation)
        .bind(hire_date)
        .bind(salary)
        .bind(EmployeeStatus::Active.as_ref())
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_vendors(pool: &MySqlPool) -> Result<()> {
    for (code, company, contact, email, terms, limit) in VENDORS {
        sqlx::query(
            r#"
            INSERT IGNORE INTO vendors
            (vendor_code, company_name, contact_person, email, payment_terms, credit_limit)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(code)
        .bind(company)
        .bind(contact)
        .bind(email)
        .bind(terms)
        .bind(limit)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_leads(pool: &MySqlPool) -> Result<()> {
    for (name, email, subject, company, stage) in LEADS {
        // leads have no natural key
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM leads WHERE email = ?)",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;
        if exists {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO leads (name, email, subject, company, stage_id, is_converted)
            SELECT ?, ?, ?, ?, (SELECT id FROM lead_stages WHERE name = ?), FALSE
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(company)
        .bind(stage)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_review_cycle(pool: &MySqlPool, year: i32) -> Result<()> {
    let name = format!("{year} Annual Review");
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM review_cycles WHERE name = ?)",
    )
    .bind(&name)
    .fetch_one(pool)
    .await?;

    if !exists {
        sqlx::query("INSERT INTO review_cycles (name, frequency, status) VALUES (?, ?, ?)")
            .bind(&name)
            .bind(ReviewFrequency::Yearly.as_ref())
            .bind(CycleStatus::Active.as_ref())
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_budget(pool: &MySqlPool, year: i32) -> Result<()> {
    let name = format!("FY{year} Operations");
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM budgets WHERE budget_name = ?)",
    )
    .bind(&name)
    .fetch_one(pool)
    .await?;
    if exists {
        return Ok(());
    }

    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Ok(());
    };

    sqlx::query(
        r#"
        INSERT INTO budgets (budget_name, period_start, period_end, total_budget, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&name)
    .bind(start)
    .bind(end)
    .bind(120_000.0_f64)
    .bind(BudgetStatus::Draft.as_ref())
    .execute(pool)
    .await?;
    Ok(())
}

/// Sample records for local development; never enabled by default.
pub async fn seed(pool: &MySqlPool) -> Result<()> {
    let today = Utc::now().date_naive();
    let year = today.year();

    seed_employees(pool, today).await?;
    seed_vendors(pool).await?;
    seed_leads(pool).await?;
    seed_review_cycle(pool, year).await?;
    seed_budget(pool, year).await?;

    info!("Demo data seeded");
    Ok(())
}
