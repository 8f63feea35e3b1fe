use crate::api::{
    account::{chart_of_account::CreateChartOfAccount, vendor::CreateVendor},
    budget_planner::budget::{CreateAllocation, CreateBudget, UpdateBudget},
    hrm::{
        department::CreateDepartment,
        employee::{CreateEmployee, LinkUser},
        leave_request::CreateLeave,
        payroll::{CreatePayrollEntry, UpdatePayrollEntry},
        resignation::{CreateResignation, UpdateResignation},
    },
    lead::lead::{CreateLead, MoveStage},
    performance::{
        review::{CompleteReview, CreateReview, UpdateReview},
        review_cycle::CreateReviewCycle,
    },
    roles::{PermissionGroup, RolePermissions},
    training::training::CreateTraining,
};
use crate::auth::handlers::LoginResponse;
use crate::model::{
    account::{AccountCategory, AccountType, ChartOfAccount, NormalBalance, Vendor},
    budget::{Budget, BudgetAllocation, BudgetDetail, BudgetStatus, BudgetSummary},
    hrm::{
        Department, Employee, EmployeeStatus, LeaveRequest, LeaveStatus, LeaveType, LineItem,
        OvertimeItem, PayrollEntry, PayrollStatus, PayrollTotals, Resignation, ResignationStatus,
    },
    lead::{Lead, LeadStage},
    performance::{CycleStatus, PerformanceReview, ReviewCycle, ReviewFrequency, ReviewStatus},
    permission::PermissionRow,
    role::RoleRow,
    training::{Training, TrainingStatus, TrainingType},
};
use crate::models::{LoginReqDto, UserReq};
use crate::utils::pagination::{
    BudgetPage, ChartOfAccountPage, DepartmentPage, EmployeePage, LeadPage, LeavePage,
    PayrollEntryPage, PerformanceReviewPage, ResignationPage, ReviewCyclePage, TrainingPage,
    VendorPage,
};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::{
    self,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Business Suite API",
        version = "1.0.0",
        description = r#"
## Business Suite

One API for the back office: people, money and pipeline.

### 🔹 Modules
- **HRM**
  - Departments, employees, leave, resignations and payroll entries
- **Account**
  - Account types, chart of accounts and vendors
- **Budget Planner**
  - Budgets with an approval workflow and per-account allocations
- **Lead**
  - Sales pipeline stages, leads and conversion
- **Performance**
  - Review cycles and employee reviews
- **Training**
  - Training types and scheduled trainings

### 🔐 Security
Every endpoint outside `/auth` requires a **JWT Bearer** access token.
Each operation checks a named permission (`view-vendors`, `approve-budgets`, ...)
granted to the caller's role; roles and grants are managed under `/api/roles`.

### 📦 Response Format
- JSON-based RESTful responses
- List endpoints accept `page`, `per_page`, `search`, `sort` and `direction`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::hrm::department::list_departments,
        crate::api::hrm::department::create_department,
        crate::api::hrm::department::get_department,
        crate::api::hrm::department::update_department,
        crate::api::hrm::department::delete_department,

        crate::api::hrm::employee::create_employee,
        crate::api::hrm::employee::list_employees,
        crate::api::hrm::employee::get_employee,
        crate::api::hrm::employee::update_employee,
        crate::api::hrm::employee::delete_employee,
        crate::api::hrm::employee::link_user,

        crate::api::hrm::leave_request::leave_list,
        crate::api::hrm::leave_request::create_leave,
        crate::api::hrm::leave_request::get_leave,
        crate::api::hrm::leave_request::approve_leave,
        crate::api::hrm::leave_request::reject_leave,
        crate::api::hrm::leave_request::delete_leave,

        crate::api::hrm::resignation::list_resignations,
        crate::api::hrm::resignation::create_resignation,
        crate::api::hrm::resignation::get_resignation,
        crate::api::hrm::resignation::update_resignation,
        crate::api::hrm::resignation::delete_resignation,
        crate::api::hrm::resignation::accept_resignation,
        crate::api::hrm::resignation::reject_resignation,

        crate::api::hrm::payroll::list_payroll_entries,
        crate::api::hrm::payroll::create_payroll_entry,
        crate::api::hrm::payroll::get_payroll_entry,
        crate::api::hrm::payroll::update_payroll_entry,
        crate::api::hrm::payroll::delete_payroll_entry,
        crate::api::hrm::payroll::pay_payroll_entry,

        crate::api::account::account_type::list_account_types,
        crate::api::account::account_type::get_account_type,
        crate::api::account::chart_of_account::list_chart_of_accounts,
        crate::api::account::chart_of_account::create_chart_of_account,
        crate::api::account::chart_of_account::get_chart_of_account,
        crate::api::account::chart_of_account::update_chart_of_account,
        crate::api::account::chart_of_account::delete_chart_of_account,
        crate::api::account::vendor::list_vendors,
        crate::api::account::vendor::create_vendor,
        crate::api::account::vendor::get_vendor,
        crate::api::account::vendor::update_vendor,
        crate::api::account::vendor::delete_vendor,

        crate::api::budget_planner::budget::list_budgets,
        crate::api::budget_planner::budget::create_budget,
        crate::api::budget_planner::budget::get_budget,
        crate::api::budget_planner::budget::update_budget,
        crate::api::budget_planner::budget::delete_budget,
        crate::api::budget_planner::budget::approve_budget,
        crate::api::budget_planner::budget::activate_budget,
        crate::api::budget_planner::budget::close_budget,
        crate::api::budget_planner::budget::list_allocations,
        crate::api::budget_planner::budget::add_allocation,
        crate::api::budget_planner::budget::delete_allocation,

        crate::api::lead::lead_stage::list_lead_stages,
        crate::api::lead::lead_stage::get_lead_stage,
        crate::api::lead::lead::list_leads,
        crate::api::lead::lead::create_lead,
        crate::api::lead::lead::get_lead,
        crate::api::lead::lead::update_lead,
        crate::api::lead::lead::delete_lead,
        crate::api::lead::lead::move_lead_stage,
        crate::api::lead::lead::convert_lead,

        crate::api::performance::review_cycle::list_review_cycles,
        crate::api::performance::review_cycle::create_review_cycle,
        crate::api::performance::review_cycle::get_review_cycle,
        crate::api::performance::review_cycle::update_review_cycle,
        crate::api::performance::review_cycle::delete_review_cycle,
        crate::api::performance::review::list_reviews,
        crate::api::performance::review::create_review,
        crate::api::performance::review::get_review,
        crate::api::performance::review::update_review,
        crate::api::performance::review::delete_review,
        crate::api::performance::review::start_review,
        crate::api::performance::review::complete_review,

        crate::api::training::training_type::list_training_types,
        crate::api::training::training_type::get_training_type,
        crate::api::training::training::list_trainings,
        crate::api::training::training::create_training,
        crate::api::training::training::get_training,
        crate::api::training::training::update_training,
        crate::api::training::training::delete_training,
        crate::api::training::training::start_training,
        crate::api::training::training::complete_training,
        crate::api::training::training::terminate_training,

        crate::api::roles::list_roles,
        crate::api::roles::get_role_permissions,
        crate::api::roles::update_role_permissions,
        crate::api::roles::list_permissions
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            LoginResponse,

            Department,
            CreateDepartment,
            DepartmentPage,
            Employee,
            EmployeeStatus,
            CreateEmployee,
            LinkUser,
            EmployeePage,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            LeavePage,
            Resignation,
            ResignationStatus,
            CreateResignation,
            UpdateResignation,
            ResignationPage,
            PayrollEntry,
            PayrollStatus,
            LineItem,
            OvertimeItem,
            PayrollTotals,
            CreatePayrollEntry,
            UpdatePayrollEntry,
            PayrollEntryPage,

            AccountType,
            AccountCategory,
            NormalBalance,
            ChartOfAccount,
            CreateChartOfAccount,
            ChartOfAccountPage,
            Vendor,
            CreateVendor,
            VendorPage,

            Budget,
            BudgetStatus,
            BudgetAllocation,
            BudgetSummary,
            BudgetDetail,
            CreateBudget,
            UpdateBudget,
            CreateAllocation,
            BudgetPage,

            LeadStage,
            Lead,
            CreateLead,
            MoveStage,
            LeadPage,

            ReviewCycle,
            ReviewFrequency,
            CycleStatus,
            CreateReviewCycle,
            ReviewCyclePage,
            PerformanceReview,
            ReviewStatus,
            CreateReview,
            UpdateReview,
            CompleteReview,
            PerformanceReviewPage,

            TrainingType,
            Training,
            TrainingStatus,
            CreateTraining,
            TrainingPage,

            RoleRow,
            PermissionRow,
            RolePermissions,
            PermissionGroup
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "Hrm", description = "Departments, employees, leave, resignations and payroll"),
        (name = "Account", description = "Account types, chart of accounts and vendors"),
        (name = "BudgetPlanner", description = "Budgets, approvals and allocations"),
        (name = "Lead", description = "Sales pipeline"),
        (name = "Performance", description = "Review cycles and reviews"),
        (name = "Training", description = "Training types and trainings"),
        (name = "Roles", description = "Roles and permission grants"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for prefix in [
            "/auth/login",
            "/api/hrm/",
            "/api/account/",
            "/api/budget-planner/",
            "/api/lead/",
            "/api/performance/",
            "/api/training/",
            "/api/roles",
        ] {
            assert!(
                paths.iter().any(|p| p.starts_with(prefix)),
                "no documented path under {prefix}"
            );
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
