pub mod budget;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/budget-planner/budgets")
            // /budgets
            .service(
                web::resource("")
                    .route(web::get().to(budget::list_budgets))
                    .route(web::post().to(budget::create_budget)),
            )
            // /budgets/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(budget::get_budget))
                    .route(web::put().to(budget::update_budget))
                    .route(web::delete().to(budget::delete_budget)),
            )
            .service(web::resource("/{id}/approve").route(web::put().to(budget::approve_budget)))
            .service(web::resource("/{id}/activate").route(web::put().to(budget::activate_budget)))
            .service(web::resource("/{id}/close").route(web::put().to(budget::close_budget)))
            // /budgets/{id}/allocations
            .service(
                web::resource("/{id}/allocations")
                    .route(web::get().to(budget::list_allocations))
                    .route(web::post().to(budget::add_allocation)),
            )
            .service(
                web::resource("/{id}/allocations/{allocation_id}")
                    .route(web::delete().to(budget::delete_allocation)),
            ),
    );
}
