pub mod account_type;
pub mod chart_of_account;
pub mod vendor;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/account")
            // read-only reference data
            .service(
                web::scope("/account-types")
                    .service(web::resource("").route(web::get().to(account_type::list_account_types)))
                    .service(web::resource("/{id}").route(web::get().to(account_type::get_account_type))),
            )
            .service(
                web::scope("/chart-of-accounts")
                    .service(
                        web::resource("")
                            .route(web::get().to(chart_of_account::list_chart_of_accounts))
                            .route(web::post().to(chart_of_account::create_chart_of_account)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(chart_of_account::get_chart_of_account))
                            .route(web::put().to(chart_of_account::update_chart_of_account))
                            .route(web::delete().to(chart_of_account::delete_chart_of_account)),
                    ),
            )
            .service(
                web::scope("/vendors")
                    .service(
                        web::resource("")
                            .route(web::get().to(vendor::list_vendors))
                            .route(web::post().to(vendor::create_vendor)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(vendor::get_vendor))
                            .route(web::put().to(vendor::update_vendor))
                            .route(web::delete().to(vendor::delete_vendor)),
                    ),
            ),
    );
}
