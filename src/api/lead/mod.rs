pub mod lead;
pub mod lead_stage;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lead")
            .service(
                web::scope("/lead-stages")
                    .service(web::resource("").route(web::get().to(lead_stage::list_lead_stages)))
                    .service(web::resource("/{id}").route(web::get().to(lead_stage::get_lead_stage))),
            )
            .service(
                web::scope("/leads")
                    // /leads
                    .service(
                        web::resource("")
                            .route(web::get().to(lead::list_leads))
                            .route(web::post().to(lead::create_lead)),
                    )
                    // /leads/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(lead::get_lead))
                            .route(web::put().to(lead::update_lead))
                            .route(web::delete().to(lead::delete_lead)),
                    )
                    .service(web::resource("/{id}/stage").route(web::put().to(lead::move_lead_stage)))
                    .service(web::resource("/{id}/convert").route(web::put().to(lead::convert_lead))),
            ),
    );
}
