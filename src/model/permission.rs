use serde::Serialize;
use utoipa::ToSchema;

/// Permission strings owned by one business module.
pub struct ModulePermissions {
    pub module: &'static str,
    pub permissions: &'static [&'static str],
}

pub const CORE: ModulePermissions = ModulePermissions {
    module: "core",
    permissions: &["manage-roles", "view-roles", "manage-permissions"],
};

pub const HRM: ModulePermissions = ModulePermissions {
    module: "hrm",
    permissions: &[
        "manage-departments",
        "create-departments",
        "edit-departments",
        "delete-departments",
        "view-departments",
        "manage-employees",
        "create-employees",
        "edit-employees",
        "delete-employees",
        "view-employees",
        "manage-leaves",
        "create-leaves",
        "view-leaves",
        "delete-leaves",
        "approve-leaves",
        "manage-resignations",
        "create-resignations",
        "edit-resignations",
        "delete-resignations",
        "view-resignations",
        "approve-resignations",
        "manage-payroll-entries",
        "create-payroll-entries",
        "edit-payroll-entries",
        "delete-payroll-entries",
        "view-payroll-entries",
        "pay-payroll-entries",
    ],
};

pub const ACCOUNT: ModulePermissions = ModulePermissions {
    module: "account",
    permissions: &[
        "view-account-types",
        "manage-chart-of-accounts",
        "create-chart-of-accounts",
        "edit-chart-of-accounts",
        "delete-chart-of-accounts",
        "view-chart-of-accounts",
        "manage-vendors",
        "create-vendors",
        "edit-vendors",
        "delete-vendors",
        "view-vendors",
    ],
};

pub const BUDGET_PLANNER: ModulePermissions = ModulePermissions {
    module: "budget-planner",
    permissions: &[
        "manage-budgets",
        "create-budgets",
        "edit-budgets",
        "delete-budgets",
        "view-budgets",
        "approve-budgets",
    ],
};

pub const LEAD: ModulePermissions = ModulePermissions {
    module: "lead",
    permissions: &[
        "view-lead-stages",
        "manage-leads",
        "create-leads",
        "edit-leads",
        "delete-leads",
        "view-leads",
        "convert-leads",
    ],
};

pub const PERFORMANCE: ModulePermissions = ModulePermissions {
    module: "performance",
    permissions: &[
        "manage-review-cycles",
        "create-review-cycles",
        "edit-review-cycles",
        "delete-review-cycles",
        "view-review-cycles",
        "manage-reviews",
        "create-reviews",
        "edit-reviews",
        "delete-reviews",
        "view-reviews",
    ],
};

pub const TRAINING: ModulePermissions = ModulePermissions {
    module: "training",
    permissions: &[
        "view-training-types",
        "manage-trainings",
        "create-trainings",
        "edit-trainings",
        "delete-trainings",
        "view-trainings",
    ],
};

pub static CATALOGUE: [&ModulePermissions; 7] = [
    &CORE,
    &HRM,
    &ACCOUNT,
    &BUDGET_PLANNER,
    &LEAD,
    &PERFORMANCE,
    &TRAINING,
];

pub const ACTIONS: [&str; 8] = [
    "manage", "create", "edit", "delete", "view", "approve", "pay", "convert",
];

/// Every permission string with the module that owns it.
pub fn all() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOGUE
        .iter()
        .flat_map(|m| m.permissions.iter().map(move |p| (m.module, *p)))
}

pub fn exists(name: &str) -> bool {
    all().any(|(_, p)| p == name)
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct PermissionRow {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "create-vendors")]
    pub name: String,
    #[schema(example = "account")]
    pub module: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn permission_names_are_unique() {
        let mut seen = HashSet::new();
        for (_, name) in all() {
            assert!(seen.insert(name), "duplicate permission {name}");
        }
    }

    #[test]
    fn permission_names_follow_action_resource() {
        for (_, name) in all() {
            let (action, resource) = name.split_once('-').expect("action-resource");
            assert!(ACTIONS.contains(&action), "unknown action in {name}");
            assert!(!resource.is_empty());
            assert_eq!(name, name.to_lowercase());
        }
    }

    #[test]
    fn exists_checks_the_catalogue() {
        assert!(exists("approve-budgets"));
        assert!(exists("edit-vendors"));
        assert!(!exists("launch-rockets"));
    }
}
