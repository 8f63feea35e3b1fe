use anyhow::{Context, Result};
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use tracing::info;

use crate::model::permission::{self, ACCOUNT, BUDGET_PLANNER, HRM, LEAD, PERFORMANCE, TRAINING};
use crate::model::role::Role;

/// Self-service grants every employee account receives.
const EMPLOYEE_SELF_SERVICE: [&str; 13] = [
    "view-departments",
    "create-leaves",
    "view-leaves",
    "delete-leaves",
    "create-resignations",
    "edit-resignations",
    "view-resignations",
    "view-payroll-entries",
    "view-review-cycles",
    "view-reviews",
    "view-trainings",
    "view-training-types",
    "view-account-types",
];

fn is_view(name: &str) -> bool {
    name.starts_with("view-")
}

/// Default grants installed for `role` on a fresh database.
pub fn default_grants(role: Role) -> Vec<&'static str> {
    match role {
        Role::Admin => permission::all().map(|(_, name)| name).collect(),
        Role::Hr => HRM
            .permissions
            .iter()
            .chain(PERFORMANCE.permissions)
            .chain(TRAINING.permissions)
            .copied()
            .chain(["view-roles"])
            .collect(),
        Role::Employee => EMPLOYEE_SELF_SERVICE.to_vec(),
        Role::System => permission::all()
            .map(|(_, name)| name)
            .filter(|name| is_view(name))
            .collect(),
        Role::ApiUser => ACCOUNT
            .permissions
            .iter()
            .chain(LEAD.permissions)
            .copied()
            .filter(|name| is_view(name))
            .collect(),
        Role::Accountant => ACCOUNT
            .permissions
            .iter()
            .chain(BUDGET_PLANNER.permissions)
            .copied()
            .filter(|name| *name != "approve-budgets")
            .chain([
                "manage-payroll-entries",
                "view-payroll-entries",
                "pay-payroll-entries",
            ])
            .collect(),
        Role::Sales => LEAD
            .permissions
            .iter()
            .copied()
            .chain(["view-vendors"])
            .collect(),
    }
}

pub async fn seed_roles(pool: &MySqlPool) -> Result<()> {
    for role in Role::iter() {
        sqlx::query("INSERT IGNORE INTO roles (id, name) VALUES (?, ?)")
            .bind(role.id())
            .bind(role.as_ref())
            .execute(pool)
            .await
            .with_context(|| format!("Failed to seed role {}", role.as_ref()))?;
    }
    Ok(())
}

pub async fn seed_permissions(pool: &MySqlPool) -> Result<()> {
    let mut count = 0;
    for (module, name) in permission::all() {
        sqlx::query(
            r#"
            INSERT INTO permissions (name, module) VALUES (?, ?)
            ON DUPLICATE KEY UPDATE module = VALUES(module)
            "#,
        )
        .bind(name)
        .bind(module)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to seed permission {name}"))?;
        count += 1;
    }
    info!(count, "Permission catalogue seeded");
    Ok(())
}

async fn grant(pool: &MySqlPool, role: Role, names: &[&str]) -> Result<()> {
    for name in names {
        sqlx::query(
            r#"
            INSERT IGNORE INTO role_has_permissions (role_id, permission_id)
            SELECT ?, id FROM permissions WHERE name = ?
            "#,
        )
        .bind(role.id())
        .bind(*name)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Admin is always topped up to the full catalogue; other roles receive
/// their defaults only while they have no grants, so edits made through
/// the roles API survive restarts.
pub async fn seed_role_grants(pool: &MySqlPool) -> Result<()> {
    for role in Role::iter() {
        let has_grants = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM role_has_permissions WHERE role_id = ?)",
        )
        .bind(role.id())
        .fetch_one(pool)
        .await?;

        if role == Role::Admin || !has_grants {
            let grants = default_grants(role);
            grant(pool, role, &grants)
                .await
                .with_context(|| format!("Failed to grant permissions to {}", role.as_ref()))?;
            info!(role = role.as_ref(), grants = grants.len(), "Role grants seeded");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn admin_holds_the_whole_catalogue() {
        let admin: HashSet<_> = default_grants(Role::Admin).into_iter().collect();
        let catalogue: HashSet<_> = permission::all().map(|(_, name)| name).collect();
        assert_eq!(admin, catalogue);
    }

    #[test]
    fn every_role_grant_is_in_the_catalogue() {
        for role in Role::iter() {
            let grants = default_grants(role);
            let unique: HashSet<_> = grants.iter().collect();
            assert_eq!(unique.len(), grants.len(), "duplicate grant for {}", role.as_ref());
            for name in grants {
                assert!(permission::exists(name), "{name} granted to {} is unknown", role.as_ref());
            }
        }
    }

    #[test]
    fn only_admin_manages_roles() {
        for role in Role::iter().filter(|r| *r != Role::Admin) {
            assert!(!default_grants(role).contains(&"manage-roles"));
        }
    }

    #[test]
    fn read_only_roles_only_view() {
        for role in [Role::System, Role::ApiUser] {
            assert!(default_grants(role).iter().all(|name| is_view(name)));
        }
    }

    #[test]
    fn budget_approval_stays_with_admin() {
        assert!(!default_grants(Role::Accountant).contains(&"approve-budgets"));
        assert!(default_grants(Role::Accountant).contains(&"create-budgets"));
    }
}
