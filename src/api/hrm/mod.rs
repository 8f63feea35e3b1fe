pub mod department;
pub mod employee;
pub mod leave_request;
pub mod payroll;
pub mod resignation;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/hrm")
            .service(
                web::scope("/departments")
                    // /departments
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    // /departments/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    // /employees/{id}/user
                    .service(web::resource("/{id}/user").route(web::put().to(employee::link_user))),
            )
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leaves/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    // /leaves/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leaves/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/resignations")
                    .service(
                        web::resource("")
                            .route(web::get().to(resignation::list_resignations))
                            .route(web::post().to(resignation::create_resignation)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(resignation::get_resignation))
                            .route(web::put().to(resignation::update_resignation))
                            .route(web::delete().to(resignation::delete_resignation)),
                    )
                    .service(
                        web::resource("/{id}/accept")
                            .route(web::put().to(resignation::accept_resignation)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(resignation::reject_resignation)),
                    ),
            )
            .service(
                web::scope("/payroll-entries")
                    .service(
                        web::resource("")
                            .route(web::get().to(payroll::list_payroll_entries))
                            .route(web::post().to(payroll::create_payroll_entry)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll_entry))
                            .route(web::put().to(payroll::update_payroll_entry))
                            .route(web::delete().to(payroll::delete_payroll_entry)),
                    )
                    // /payroll-entries/{id}/pay
                    .service(web::resource("/{id}/pay").route(web::put().to(payroll::pay_payroll_entry))),
            ),
    );
}
