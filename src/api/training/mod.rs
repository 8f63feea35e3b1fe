pub mod training;
pub mod training_type;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/training")
            .service(
                web::scope("/training-types")
                    .service(web::resource("").route(web::get().to(training_type::list_training_types)))
                    .service(
                        web::resource("/{id}").route(web::get().to(training_type::get_training_type)),
                    ),
            )
            .service(
                web::scope("/trainings")
                    .service(
                        web::resource("")
                            .route(web::get().to(training::list_trainings))
                            .route(web::post().to(training::create_training)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(training::get_training))
                            .route(web::put().to(training::update_training))
                            .route(web::delete().to(training::delete_training)),
                    )
                    .service(web::resource("/{id}/start").route(web::put().to(training::start_training)))
                    .service(
                        web::resource("/{id}/complete").route(web::put().to(training::complete_training)),
                    )
                    .service(
                        web::resource("/{id}/terminate")
                            .route(web::put().to(training::terminate_training)),
                    ),
            ),
    );
}
